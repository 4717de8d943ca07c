use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use vkx_app::outer_app::OuterApp;
use vkx_app::render_app::RenderApp;
use vkx_crate_tools::resource::VkxPath;
use winit::window::Window;
use winit::{
    application::ApplicationHandler,
    event::{StartCause, WindowEvent},
    event_loop::ActiveEventLoop,
    window::WindowId,
};

use crate::winit_event_adapter::WinitEventAdapter;

pub struct UserEvent;

pub struct WinitApp {
    render_app: RenderApp,

    window: Option<Window>,
}
// 总的 main 函数
impl WinitApp {
    /// 整个程序的入口
    pub fn run(outer_app: Box<dyn OuterApp>) {
        RenderApp::init_env();

        let event_loop = winit::event_loop::EventLoop::<UserEvent>::with_user_event().build().unwrap();
        let raw_display_handle = event_loop.display_handle().unwrap().as_raw();

        let mut app = Self {
            render_app: RenderApp::new(raw_display_handle, outer_app),
            window: None,
        };

        event_loop.run_app(&mut app).unwrap();

        log::info!("end run.");

        app.destroy();
    }
}
// new & init
impl WinitApp {
    /// 在 window 创建之后调用，初始化 Renderer、GUI 以及 demo
    fn init_after_window(&mut self, event_loop: &ActiveEventLoop) {
        let _span = tracy_client::span!("WinitApp::init_after_window");
        let window_config = self.render_app.renderer.config.window.clone();
        let window = Self::create_window(
            event_loop,
            self.render_app.window_title(),
            [window_config.width as f64, window_config.height as f64],
        );

        let inner_size = window.inner_size();
        self.render_app.init_after_window(
            window.display_handle().unwrap().as_raw(),
            window.window_handle().unwrap().as_raw(),
            window.scale_factor(),
            vk::Extent2D {
                width: inner_size.width,
                height: inner_size.height,
            },
        );

        self.window = Some(window);
    }

    fn create_window(event_loop: &ActiveEventLoop, window_title: String, window_extent: [f64; 2]) -> Window {
        let window_attr = Window::default_attributes()
            .with_title(window_title)
            .with_window_icon(Some(Self::load_icon()))
            .with_inner_size(winit::dpi::LogicalSize::new(window_extent[0], window_extent[1]));

        #[cfg(target_os = "windows")]
        let window_attr = {
            use winit::platform::windows::WindowAttributesExtWindows;
            window_attr.with_taskbar_icon(Some(Self::load_icon()))
        };

        event_loop.create_window(window_attr).unwrap()
    }

    /// 读取 `resources/vkx-icon.png`，读取失败时使用一个纯色图标
    fn load_icon() -> winit::window::Icon {
        let image = match image::open(VkxPath::resources_path("vkx-icon.png")) {
            Ok(image) => image.into_rgba8(),
            Err(err) => {
                log::warn!("failed to load window icon: {}", err);
                image::RgbaImage::from_pixel(32, 32, image::Rgba([60, 120, 200, 255]))
            }
        };
        let (width, height) = image.dimensions();
        winit::window::Icon::from_rgba(image.into_raw(), width, height).unwrap()
    }
}
// destroy
impl WinitApp {
    fn destroy(mut self) {
        self.render_app.destroy();
        self.window = None;
    }
}
// 各种 winit 的事件处理
impl ApplicationHandler<UserEvent> for WinitApp {
    fn new_events(&mut self, _event_loop: &ActiveEventLoop, _cause: StartCause) {}

    // 在这里创建 window 和 Renderer
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        log::info!("winit event: resumed");

        self.init_after_window(event_loop);
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, _event: UserEvent) {}

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let input_event = WinitEventAdapter::from_winit_event(&event);
        self.render_app.handle_event(&input_event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.render_app.big_update();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        log::warn!("winit event: suspended");
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        log::info!("loop exiting");
    }

    fn memory_warning(&mut self, _event_loop: &ActiveEventLoop) {
        log::warn!("memory warning");
    }
}

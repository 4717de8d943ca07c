use std::ffi::CStr;

use ash::vk;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use vkx_crate_tools::init_log::init_log;
use vkx_gfx::gfx::Gfx;

use crate::{
    gui_host::GuiHost,
    outer_app::OuterApp,
    platform::{camera_controller::CameraController, input_event::InputEvent, input_manager::InputManager},
    renderer::renderer::Renderer,
};

pub fn panic_handler(info: &std::panic::PanicHookInfo) {
    log::error!("{}", info);
}

/// 驱动一个 [`OuterApp`]：输入 -> GUI -> 相机 -> 绘制 -> present
pub struct RenderApp {
    pub renderer: Renderer,
    pub camera_controller: CameraController,
    pub input_manager: InputManager,
    pub gui_host: GuiHost,

    /// 最近一次 Resized 事件给出的窗口大小
    window_extent: vk::Extent2D,

    pub outer_app: Option<Box<dyn OuterApp>>,
}
// new & init
impl RenderApp {
    pub fn new(raw_display_handle: RawDisplayHandle, outer_app: Box<dyn OuterApp>) -> Self {
        // 追加 window system 需要的 extension，在 windows 下也就是 khr::Surface
        let extra_instance_ext = ash_window::enumerate_required_extensions(raw_display_handle)
            .unwrap()
            .iter()
            .map(|ext| unsafe { CStr::from_ptr(*ext) })
            .collect();

        let renderer = Renderer::new(outer_app.name().to_string(), extra_instance_ext);

        Self {
            renderer,
            camera_controller: CameraController::new(),
            input_manager: InputManager::new(),
            gui_host: GuiHost::new(),
            window_extent: vk::Extent2D::default(),
            outer_app: Some(outer_app),
        }
    }

    /// 窗口标题：demo 名字加上配置中的后缀
    pub fn window_title(&self) -> String {
        let name = self.outer_app.as_ref().unwrap().name();
        let suffix = &self.renderer.config.window.title_suffix;
        if suffix.is_empty() { name.to_string() } else { format!("{} {}", name, suffix) }
    }

    pub fn init_after_window(
        &mut self,
        raw_display_handle: RawDisplayHandle,
        raw_window_handle: RawWindowHandle,
        window_scale_factor: f64,
        window_extent: vk::Extent2D,
    ) {
        self.gui_host.hidpi_factor = window_scale_factor;
        self.window_extent = window_extent;
        self.gui_host.imgui_ctx.io_mut().display_size = [window_extent.width as f32, window_extent.height as f32];

        self.renderer.init_after_window(raw_display_handle, raw_window_handle, window_extent);

        let (fonts_atlas, font_tex_id) = self.gui_host.init_font();
        self.renderer.render_present.as_mut().unwrap().gui_backend.register_font(fonts_atlas, font_tex_id);

        {
            let _span = tracy_client::span!("OuterApp::init");
            self.outer_app.as_mut().unwrap().init(&mut self.renderer, self.camera_controller.camera_mut());
        }
    }

    pub fn init_env() {
        std::panic::set_hook(Box::new(panic_handler));

        init_log();

        tracy_client::Client::start();
        tracy_client::set_thread_name!("RenderThread");
    }
}
// destroy
impl RenderApp {
    pub fn destroy(mut self) {
        Gfx::get().wait_idel();

        if let Some(mut outer_app) = self.outer_app.take() {
            outer_app.destroy();
        }
        self.renderer.destroy();

        Gfx::destroy();
    }
}
// update
impl RenderApp {
    pub fn handle_event(&mut self, event: &InputEvent) {
        self.gui_host.handle_event(event);

        if let InputEvent::Resized {
            physical_width,
            physical_height,
        } = event
        {
            self.window_extent = vk::Extent2D {
                width: *physical_width,
                height: *physical_height,
            };
        }

        self.input_manager.push_event(event.clone());
    }

    fn build_ui(&mut self) {
        let elapsed = self.renderer.timer.delta_time();
        let fps = self.renderer.timer.fps();
        let frame_extent = self.renderer.frame_extent();
        let camera = self.camera_controller.camera();
        let outer_app = self.outer_app.as_mut().unwrap();

        self.gui_host.new_frame(elapsed, |ui| {
            ui.window(outer_app.name())
                .position([10.0, 10.0], imgui::Condition::FirstUseEver)
                .size([320.0, 360.0], imgui::Condition::FirstUseEver)
                .build(|| {
                    ui.text(format!("FPS: {:.2}", fps));
                    ui.text(format!("size: {}x{}", frame_extent.width, frame_extent.height));
                    ui.text(format!(
                        "CameraPos: ({:.2}, {:.2}, {:.2})",
                        camera.position.x, camera.position.y, camera.position.z
                    ));
                    ui.text(format!(
                        "CameraEuler: ({:.2}, {:.2}, {:.2})",
                        camera.euler_yaw_deg, camera.euler_pitch_deg, camera.euler_roll_deg
                    ));
                    ui.text(format!("CameraFov(Vertical): {:.2}°", camera.fov_deg_vertical));
                    ui.separator();

                    outer_app.draw_ui(ui);
                });
        });
    }

    /// 窗口被最小化或者大小变化之后，先重建 swapchain 再继续渲染
    ///
    /// return: 本帧是否可以继续
    fn sync_window_extent(&mut self) -> bool {
        if self.window_extent.width == 0 || self.window_extent.height == 0 {
            return false;
        }
        if self.window_extent != self.renderer.frame_extent() {
            self.rebuild_swapchain();
        }
        true
    }

    fn rebuild_swapchain(&mut self) {
        let _span = tracy_client::span!("rebuild swapchain");
        self.renderer.resize_frame_buffer(self.window_extent);
        self.outer_app.as_mut().unwrap().on_window_resized(&mut self.renderer);
    }

    pub fn big_update(&mut self) {
        // Begin Frame ============================
        if !self.renderer.time_to_render() {
            return;
        }
        if !self.sync_window_extent() {
            return;
        }
        if !self.renderer.begin_frame() {
            self.rebuild_swapchain();
            return;
        }

        // build Gui ==================================
        {
            let _span = tracy_client::span!("Update Gui");
            self.build_ui();
        }

        // Update ==================================
        {
            let _span = tracy_client::span!("Update");
            self.update();
        }

        // Draw ================================
        {
            let _span = tracy_client::span!("OuterApp::draw");
            self.renderer.before_render(self.camera_controller.camera());
            let frame = self.renderer.current_frame();
            self.outer_app.as_mut().unwrap().draw(&mut self.renderer, &frame);
        }

        // Present ===============================
        let need_rebuild = {
            let _span = tracy_client::span!("Present");
            let ui_draw_data = self.gui_host.compile_ui();
            self.renderer.present(ui_draw_data)
        };

        // End Frame ===================================
        self.renderer.end_frame();
        if need_rebuild {
            self.rebuild_swapchain();
        }

        tracy_client::frame_mark();
    }

    fn update(&mut self) {
        self.input_manager.process_events();

        // imgui 占用鼠标时不驱动相机
        if !self.gui_host.want_capture_mouse() {
            let extent = self.renderer.frame_extent();
            self.camera_controller.update(
                self.input_manager.state(),
                glam::vec2(extent.width as f32, extent.height as f32),
                self.renderer.timer.delta_time(),
            );
        }

        self.outer_app.as_mut().unwrap().update(&mut self.renderer);
    }
}

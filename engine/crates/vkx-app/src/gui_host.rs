use imgui::{DrawData, FontAtlasTexture, TextureId};

use crate::platform::input_event::{ElementState, InputEvent, MouseButton};

const FONT_TEXTURE_ID: usize = 0;

/// imgui 上下文，负责输入转发和每帧 UI 的构建
pub struct GuiHost {
    pub imgui_ctx: imgui::Context,
    pub hidpi_factor: f64,
}
// new & init
impl Default for GuiHost {
    fn default() -> Self {
        Self::new()
    }
}
impl GuiHost {
    pub fn new() -> Self {
        let mut imgui_ctx = imgui::Context::create();
        // 不需要保存 .ini 文件
        imgui_ctx.set_ini_filename(None);

        {
            let style = imgui_ctx.style_mut();
            style.use_dark_colors();
            // WindowBg: 半透明深色背景
            style.colors[imgui::StyleColor::WindowBg as usize] = [0.1, 0.1, 0.1, 0.9];
        }

        imgui_ctx.io_mut().display_size = [800.0, 600.0];

        Self {
            imgui_ctx,
            hidpi_factor: 1.0,
        }
    }

    /// 只使用 imgui 内置字体，返回需要上传到 GPU 的字体图集
    pub fn init_font(&mut self) -> (FontAtlasTexture<'_>, TextureId) {
        let font_size = (13.0 * self.hidpi_factor) as f32;
        self.imgui_ctx.fonts().add_font(&[imgui::FontSource::DefaultFontData {
            config: Some(imgui::FontConfig {
                size_pixels: font_size,
                ..Default::default()
            }),
        }]);

        let font_texture_id = TextureId::new(FONT_TEXTURE_ID);
        self.imgui_ctx.fonts().tex_id = font_texture_id;
        self.imgui_ctx.io_mut().font_global_scale = 1.0;

        let atlas_texture = self.imgui_ctx.fonts().build_rgba32_texture();
        (atlas_texture, font_texture_id)
    }
}
// update
impl GuiHost {
    pub fn handle_event(&mut self, event: &InputEvent) {
        let io = self.imgui_ctx.io_mut();
        match event {
            InputEvent::Resized {
                physical_width,
                physical_height,
            } => {
                io.display_size = [*physical_width as f32, *physical_height as f32];
            }
            InputEvent::MouseMoved { physical_position } => {
                io.add_mouse_pos_event([physical_position[0] as f32, physical_position[1] as f32]);
            }
            InputEvent::MouseButtonInput { button, state } => {
                let mb = match button {
                    MouseButton::Left => Some(imgui::MouseButton::Left),
                    MouseButton::Right => Some(imgui::MouseButton::Right),
                    MouseButton::Middle => Some(imgui::MouseButton::Middle),
                    _ => None,
                };
                if let Some(mb) = mb {
                    io.add_mouse_button_event(mb, *state == ElementState::Pressed);
                }
            }
            InputEvent::MouseWheel { delta } => {
                io.add_mouse_wheel_event([0.0, *delta as f32]);
            }
            _ => {}
        }
    }

    /// 鼠标是否落在 imgui 窗口上，此时不应该驱动相机
    #[inline]
    pub fn want_capture_mouse(&self) -> bool {
        self.imgui_ctx.io().want_capture_mouse
    }

    pub fn new_frame(&mut self, duration: std::time::Duration, ui_func: impl FnOnce(&imgui::Ui)) {
        self.imgui_ctx.io_mut().update_delta_time(duration);
        let ui = self.imgui_ctx.new_frame();
        ui_func(ui);
    }

    /// 结束本帧 UI，没有任何顶点时返回 None
    pub fn compile_ui(&mut self) -> Option<&DrawData> {
        let draw_data = self.imgui_ctx.render();
        if draw_data.total_vtx_count == 0 { None } else { Some(draw_data) }
    }
}

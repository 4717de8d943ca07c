use ash::vk;
use vkx_gfx::{commands::submit_info::GfxSubmitInfo, gfx::Gfx};

use crate::{
    outer_app::{
        OuterApp,
        postprocess::{graying_pass::GrayingPass, init_orbit_camera, model_cycle, offscreen_pass::OffscreenPass},
    },
    platform::camera::Camera,
    renderer::renderer::{RenderFrame, Renderer},
    settings::PostprocessConfig,
};

pub struct PostprocessApp {
    tint: [f32; 3],
    paused: bool,
    /// 暂停时冻结的动画进度
    cycle: f32,

    offscreen: Option<OffscreenPass>,
    graying: Option<GrayingPass>,
}
impl Default for PostprocessApp {
    fn default() -> Self {
        Self {
            tint: PostprocessConfig::default().tint,
            paused: false,
            cycle: 0.0,
            offscreen: None,
            graying: None,
        }
    }
}
impl OuterApp for PostprocessApp {
    fn name(&self) -> &'static str {
        "Postprocess"
    }

    fn init(&mut self, renderer: &mut Renderer, camera: &mut Camera) {
        init_orbit_camera(camera);
        self.tint = renderer.config.postprocess.tint;

        let offscreen = OffscreenPass::new(renderer.frame_settings.depth_format, renderer.frame_extent());
        self.graying = Some(GrayingPass::new(offscreen.color()));
        self.offscreen = Some(offscreen);
    }

    fn draw_ui(&mut self, ui: &imgui::Ui) {
        ui.color_edit3("Tint", &mut self.tint);
        ui.checkbox("Pause", &mut self.paused);
    }

    fn update(&mut self, renderer: &mut Renderer) {
        if !self.paused {
            self.cycle = model_cycle(renderer.timer.total_time_s());
        }
    }

    fn draw(&mut self, renderer: &mut Renderer, frame: &RenderFrame) {
        let (Some(offscreen), Some(graying)) = (self.offscreen.as_mut(), self.graying.as_mut()) else {
            return;
        };
        offscreen.update(frame.frame_label, renderer.camera(), self.cycle);
        graying.update(frame.frame_label, self.tint);

        let cmd = renderer.cmd_allocator.alloc_command_buffer(frame.frame_label, "postprocess");
        cmd.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT, "postprocess");
        offscreen.record(&cmd, frame.frame_label);
        graying.record(&cmd, frame);
        cmd.end();
        Gfx::get().gfx_queue().submit(vec![GfxSubmitInfo::new(std::slice::from_ref(&cmd))], None);
    }

    fn on_window_resized(&mut self, renderer: &mut Renderer) {
        let (Some(offscreen), Some(graying)) = (self.offscreen.as_mut(), self.graying.as_ref()) else {
            return;
        };
        offscreen.rebuild(renderer.frame_extent());
        graying.bind_scene(offscreen.color());
    }

    fn destroy(&mut self) {
        self.graying = None;
        if let Some(offscreen) = self.offscreen.take() {
            offscreen.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tint_is_white() {
        let app = PostprocessApp::default();
        assert_eq!(app.tint, [1.0, 1.0, 1.0]);
        assert!(!app.paused);
    }
}

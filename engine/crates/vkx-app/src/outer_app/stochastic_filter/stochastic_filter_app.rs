use ash::vk;
use vkx_gfx::{commands::submit_info::GfxSubmitInfo, gfx::Gfx};

use crate::{
    outer_app::{
        OuterApp,
        stochastic_filter::{FilterMode, FrameClock, stochastic_pass::StochasticPass},
    },
    platform::camera::Camera,
    renderer::renderer::{RenderFrame, Renderer},
    settings::StochasticConfig,
};

pub struct StochasticFilterApp {
    mode: FilterMode,
    clock: FrameClock,
    pass: Option<StochasticPass>,
}
impl Default for StochasticFilterApp {
    fn default() -> Self {
        let config = StochasticConfig::default();
        Self {
            mode: FilterMode::from_use_fis(config.use_fis),
            clock: FrameClock::new(config.time_step),
            pass: None,
        }
    }
}
impl OuterApp for StochasticFilterApp {
    fn name(&self) -> &'static str {
        "Stochastic Filter"
    }

    fn init(&mut self, renderer: &mut Renderer, _camera: &mut Camera) {
        let config = &renderer.config.stochastic;
        self.mode = FilterMode::from_use_fis(config.use_fis);
        self.clock = FrameClock::new(config.time_step);
        self.pass = Some(StochasticPass::new());
    }

    fn draw_ui(&mut self, ui: &imgui::Ui) {
        let mut use_fis = self.mode == FilterMode::Fis;
        if ui.checkbox("FIS (off: Catmull-Rom)", &mut use_fis) {
            self.mode = FilterMode::from_use_fis(use_fis);
            log::info!("stochastic filter mode: {:?}", self.mode);
        }
        let params = self.clock.params();
        ui.text(format!("frame: {}, time: {:.2}", params.frame_number(), params.time()));
    }

    fn draw(&mut self, renderer: &mut Renderer, frame: &RenderFrame) {
        let Some(pass) = self.pass.as_mut() else {
            return;
        };
        let params = self.clock.advance();
        pass.update(frame.frame_label, &params);

        let cmd = renderer.cmd_allocator.alloc_command_buffer(frame.frame_label, "stochastic");
        cmd.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT, "stochastic");
        pass.record(&cmd, frame, self.mode);
        cmd.end();
        Gfx::get().gfx_queue().submit(vec![GfxSubmitInfo::new(std::slice::from_ref(&cmd))], None);
    }

    fn destroy(&mut self) {
        if let Some(pass) = self.pass.take() {
            pass.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_fis() {
        let app = StochasticFilterApp::default();
        assert_eq!(app.mode, FilterMode::Fis);
        assert_eq!(app.clock.params().frame_number(), 0);
        assert!(app.pass.is_none());
    }
}

use ash::vk;
use itertools::Itertools;
use vkx_gfx::{
    commands::{semaphore::GfxSemaphore, submit_info::GfxSubmitInfo},
    gfx::Gfx,
};
use vkx_render_interface::frame_counter::FrameCounter;

use crate::{
    outer_app::{
        OuterApp,
        subsurface::{
            DebugTarget, SssMode,
            blur_pass::BlurPass,
            burley::{BurleyParams, BurleyTable, DEFAULT_SHAPE},
            composite_pass::CompositePass,
            gbuffer_pass::GBufferPass,
            lighting_pass::{LightingPass, LightingUniform},
            preintegrate::{PreintegratePass, PreintegrateParams},
            ssss_kernel::{SsssKernel, SsssParams},
        },
    },
    platform::camera::Camera,
    renderer::renderer::{RenderFrame, Renderer},
    scene::lights::{animate_lights, light_cycle},
    settings::SubsurfaceConfig,
};

/// 每个 frame in flight 的阶段间同步
struct StageSemaphores {
    gbuffer_done: GfxSemaphore,
    lighting_done: GfxSemaphore,
    blur_done: GfxSemaphore,
}
impl StageSemaphores {
    fn new(label: impl std::fmt::Display) -> Self {
        Self {
            gbuffer_done: GfxSemaphore::new(&format!("sss-gbuffer-done-{}", label)),
            lighting_done: GfxSemaphore::new(&format!("sss-lighting-done-{}", label)),
            blur_done: GfxSemaphore::new(&format!("sss-blur-done-{}", label)),
        }
    }

    fn destroy(self) {
        self.gbuffer_done.destroy();
        self.lighting_done.destroy();
        self.blur_done.destroy();
    }
}

/// 延迟管线中的所有 pass
struct DeferredPasses {
    gbuffer: GBufferPass,
    lighting: LightingPass,
    blur: BlurPass,
    composite: CompositePass,
    semaphores: Vec<StageSemaphores>,
}
impl DeferredPasses {
    fn new(depth_format: vk::Format) -> Self {
        let gbuffer = GBufferPass::new(depth_format);
        let lighting = LightingPass::new(gbuffer.gbuffer());
        let blur = BlurPass::new(gbuffer.gbuffer(), lighting.diffuse());
        let composite = CompositePass::new(blur.blurred(), lighting.diffuse(), lighting.specular());
        let semaphores = FrameCounter::frame_labels().iter().map(StageSemaphores::new).collect_vec();
        Self {
            gbuffer,
            lighting,
            blur,
            composite,
            semaphores,
        }
    }

    fn destroy(self) {
        self.gbuffer.destroy();
        self.lighting.destroy();
        self.blur.destroy();
        self.semaphores.into_iter().for_each(StageSemaphores::destroy);
    }
}

/// UI 可以修改的参数
#[derive(Debug, Clone, PartialEq)]
struct SubsurfaceSettings {
    mode: SssMode,
    debug_target: DebugTarget,
    config: SubsurfaceConfig,
}

#[derive(Default)]
pub struct SubsurfaceApp {
    settings: Option<SubsurfaceSettings>,

    /// 缓存的 SSSS kernel，以及生成它的 (color, falloff)
    ssss_kernel: Option<(SsssKernel, [f32; 3], [f32; 3])>,
    burley_table: Option<BurleyTable>,

    deferred: Option<DeferredPasses>,
    preintegrate: Option<PreintegratePass>,
}
// new & init
impl SubsurfaceApp {
    /// 从侧前方看向三个头部
    fn init_camera(camera: &mut Camera) {
        camera.position = glam::vec3(-2.15, 0.3, 8.75);
        camera.euler_yaw_deg = (-12.5f32).rem_euclid(360.0);
        camera.euler_pitch_deg = -0.75;
        camera.euler_roll_deg = 0.0;
        camera.set_perspective(60.0, 0.1, 256.0);
    }
}
// update
impl SubsurfaceApp {
    fn ssss_kernel(&mut self, config: &SubsurfaceConfig) -> &SsssKernel {
        let stale = !matches!(
            &self.ssss_kernel,
            Some((_, color, falloff)) if *color == config.ssss_color && *falloff == config.ssss_falloff
        );
        if stale {
            log::info!("ssss kernel rebuilt: color {:?}, falloff {:?}", config.ssss_color, config.ssss_falloff);
            let kernel = SsssKernel::compute(config.ssss_color.into(), config.ssss_falloff.into());
            self.ssss_kernel = Some((kernel, config.ssss_color, config.ssss_falloff));
        }
        &self.ssss_kernel.as_ref().unwrap().0
    }

    fn draw_deferred(&mut self, renderer: &mut Renderer, frame: &RenderFrame, settings: &SubsurfaceSettings) {
        let camera = renderer.camera().clone();
        let lights = animate_lights(light_cycle(renderer.timer.total_time_s()));
        let ssss_params = SsssParams::new(self.ssss_kernel(&settings.config), settings.config.sss_strength, &camera);
        let burley_params =
            BurleyParams::new(self.burley_table.as_ref().unwrap(), settings.config.world_scale, &camera);

        let passes = self.deferred.as_mut().unwrap();
        let label = frame.frame_label;
        passes.gbuffer.update(label, &camera);
        passes.lighting.update(label, &LightingUniform::new(lights, camera.position, settings.debug_target));
        passes.blur.update_ssss(label, &ssss_params);
        passes.blur.update_burley(label, &burley_params);

        let cmd_allocator = &mut renderer.cmd_allocator;
        let semaphores = &passes.semaphores[*label];

        let gbuffer_cmd = cmd_allocator.alloc_command_buffer(label, "sss-gbuffer");
        gbuffer_cmd.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT, "sss-gbuffer");
        passes.gbuffer.record(&gbuffer_cmd, label);
        gbuffer_cmd.end();

        let lighting_cmd = cmd_allocator.alloc_command_buffer(label, "sss-lighting");
        lighting_cmd.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT, "sss-lighting");
        passes.lighting.record(&lighting_cmd, label);
        lighting_cmd.end();

        let blur_cmd = cmd_allocator.alloc_command_buffer(label, "sss-blur");
        blur_cmd.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT, "sss-blur");
        passes.blur.record(&blur_cmd, label, settings.mode);
        blur_cmd.end();

        let composite_cmd = cmd_allocator.alloc_command_buffer(label, "sss-composite");
        composite_cmd.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT, "sss-composite");
        passes.composite.record(&composite_cmd, frame, settings.debug_target);
        composite_cmd.end();

        let fragment = vk::PipelineStageFlags2::FRAGMENT_SHADER;
        let color_output = vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT;
        Gfx::get().gfx_queue().submit(
            vec![
                GfxSubmitInfo::new(std::slice::from_ref(&gbuffer_cmd)).signal(&semaphores.gbuffer_done, color_output),
                GfxSubmitInfo::new(std::slice::from_ref(&lighting_cmd))
                    .wait(&semaphores.gbuffer_done, fragment)
                    .signal(&semaphores.lighting_done, color_output),
                GfxSubmitInfo::new(std::slice::from_ref(&blur_cmd))
                    .wait(&semaphores.lighting_done, fragment)
                    .signal(&semaphores.blur_done, color_output),
                GfxSubmitInfo::new(std::slice::from_ref(&composite_cmd)).wait(&semaphores.blur_done, fragment),
            ],
            None,
        );
    }
}
impl OuterApp for SubsurfaceApp {
    fn name(&self) -> &'static str {
        "Subsurface Scattering"
    }

    fn init(&mut self, renderer: &mut Renderer, camera: &mut Camera) {
        let config = renderer.config.subsurface.clone();
        log::info!("subsurface demo, mode: {}", config.mode.label());
        Self::init_camera(camera);

        self.settings = Some(SubsurfaceSettings {
            mode: config.mode,
            debug_target: DebugTarget::Final,
            config,
        });
        self.burley_table = Some(BurleyTable::compute(DEFAULT_SHAPE));
        self.deferred = Some(DeferredPasses::new(renderer.frame_settings.depth_format));
        self.preintegrate = Some(PreintegratePass::new());
    }

    fn draw_ui(&mut self, ui: &imgui::Ui) {
        let Some(settings) = self.settings.as_mut() else {
            return;
        };

        let mut mode_idx = SssMode::ALL.iter().position(|m| *m == settings.mode).unwrap_or_default();
        let mode_labels = SssMode::ALL.map(SssMode::label);
        if ui.combo_simple_string("SSS mode", &mut mode_idx, &mode_labels) {
            settings.mode = SssMode::ALL[mode_idx];
        }

        if settings.mode == SssMode::Preintegrate {
            ui.color_edit3("Scatter color", &mut settings.config.scatter_color);
            ui.input_float3("Scatter distance", &mut settings.config.scatter_distance).build();
            return;
        }

        let mut target_idx = DebugTarget::ALL.iter().position(|t| *t == settings.debug_target).unwrap_or_default();
        let target_labels = DebugTarget::ALL.map(DebugTarget::label);
        if ui.combo_simple_string("Display", &mut target_idx, &target_labels) {
            settings.debug_target = DebugTarget::ALL[target_idx];
        }

        match settings.mode {
            SssMode::Ssss => {
                ui.slider("Strength", 0.0, 4.0, &mut settings.config.sss_strength);
                ui.color_edit3("Scatter color", &mut settings.config.ssss_color);
                ui.input_float3("Falloff", &mut settings.config.ssss_falloff).build();
            }
            SssMode::Burley => {
                ui.slider("World scale", 0.01, 4.0, &mut settings.config.world_scale);
            }
            SssMode::Preintegrate => {}
        }
    }

    fn draw(&mut self, renderer: &mut Renderer, frame: &RenderFrame) {
        let Some(settings) = self.settings.clone() else {
            return;
        };

        match settings.mode {
            SssMode::Preintegrate => {
                let params = PreintegrateParams::from(&settings.config);
                let camera = renderer.camera().clone();
                self.preintegrate.as_mut().unwrap().draw(&mut renderer.cmd_allocator, frame, &camera, params);
            }
            SssMode::Burley | SssMode::Ssss => self.draw_deferred(renderer, frame, &settings),
        }
    }

    fn destroy(&mut self) {
        if let Some(deferred) = self.deferred.take() {
            deferred.destroy();
        }
        if let Some(preintegrate) = self.preintegrate.take() {
            preintegrate.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_camera_looks_at_heads() {
        let mut camera = Camera::default();
        SubsurfaceApp::init_camera(&mut camera);
        assert_eq!(camera.euler_yaw_deg, 347.5);
        // 相机在 +Z 一侧，朝 -Z 看，中间的头部位于视野前方
        let to_head = (glam::Vec3::ZERO - camera.position).normalize();
        assert!(camera.camera_forward().dot(to_head) > 0.9);
    }

    #[test]
    fn kernel_is_cached_until_params_change() {
        let mut app = SubsurfaceApp::default();
        let mut config = SubsurfaceConfig::default();
        let first = app.ssss_kernel(&config).clone();
        assert_eq!(app.ssss_kernel(&config), &first);

        config.ssss_color = [0.5, 0.5, 0.5];
        let second = app.ssss_kernel(&config).clone();
        assert_ne!(first, second);
        assert_eq!(app.ssss_kernel.as_ref().unwrap().1, [0.5, 0.5, 0.5]);
    }
}

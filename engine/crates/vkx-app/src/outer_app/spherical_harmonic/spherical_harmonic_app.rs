use ash::vk;
use itertools::Itertools;
use vkx_gfx::{
    commands::{semaphore::GfxSemaphore, submit_info::GfxSubmitInfo},
    gfx::Gfx,
    resources::texture::GfxTextureCube,
};
use vkx_render_interface::frame_counter::FrameCounter;

use crate::{
    outer_app::{
        OuterApp,
        spherical_harmonic::{
            sh_project_pass::ShProjectPass,
            sh_scene_pass::{ReflectObject, ShScenePass, ShSceneSettings},
        },
    },
    platform::camera::Camera,
    renderer::renderer::{RenderFrame, Renderer},
    scene::textures::sky_cubemap_rgba8,
    settings::SphericalHarmonicConfig,
};

const SKY_FACE_SIZE: u32 = 256;
const SAMPLE_SEED: u64 = 0x5348;

impl From<&SphericalHarmonicConfig> for ShSceneSettings {
    fn from(config: &SphericalHarmonicConfig) -> Self {
        Self {
            object: ReflectObject::default(),
            show_skybox: true,
            lod_bias: config.lod_bias,
        }
    }
}

pub struct SphericalHarmonicApp {
    settings: ShSceneSettings,

    environment: Option<GfxTextureCube>,
    project: Option<ShProjectPass>,
    scene: Option<ShScenePass>,
    /// compute 完成后 signal，同一帧的 graphics 在 VERTEX_INPUT 等待
    compute_done: Vec<GfxSemaphore>,
}
impl Default for SphericalHarmonicApp {
    fn default() -> Self {
        Self {
            settings: ShSceneSettings::from(&SphericalHarmonicConfig::default()),
            environment: None,
            project: None,
            scene: None,
            compute_done: vec![],
        }
    }
}
// new & init
impl SphericalHarmonicApp {
    fn init_camera(camera: &mut Camera) {
        camera.position = glam::vec3(1.0, 0.0, 5.0);
        camera.euler_yaw_deg = 0.0;
        camera.euler_pitch_deg = 0.0;
        camera.euler_roll_deg = 0.0;
        camera.set_perspective(60.0, 0.1, 256.0);
    }
}
impl OuterApp for SphericalHarmonicApp {
    fn name(&self) -> &'static str {
        "Spherical Harmonics"
    }

    fn init(&mut self, renderer: &mut Renderer, camera: &mut Camera) {
        let config = renderer.config.spherical_harmonic.clone();
        Self::init_camera(camera);
        self.settings = ShSceneSettings::from(&config);

        let environment =
            GfxTextureCube::from_rgba8(SKY_FACE_SIZE, &sky_cubemap_rgba8(SKY_FACE_SIZE), "sh-environment");
        let project = ShProjectPass::new(&environment, config.band, config.sample_count, SAMPLE_SEED);
        let coefficients = FrameCounter::frame_labels().map(|label| project.coefficients(label));
        let scene = ShScenePass::new(
            &environment,
            &coefficients,
            renderer.frame_settings.depth_format,
            renderer.frame_extent(),
        );

        self.compute_done = FrameCounter::frame_labels()
            .iter()
            .map(|label| GfxSemaphore::new(&format!("sh-compute-done-{}", label)))
            .collect_vec();
        self.environment = Some(environment);
        self.project = Some(project);
        self.scene = Some(scene);
    }

    fn draw_ui(&mut self, ui: &imgui::Ui) {
        let mut object_idx = ReflectObject::ALL.iter().position(|o| *o == self.settings.object).unwrap_or_default();
        let object_labels = ReflectObject::ALL.map(ReflectObject::label);
        if ui.combo_simple_string("Object", &mut object_idx, &object_labels) {
            self.settings.object = ReflectObject::ALL[object_idx];
        }
        ui.checkbox("Skybox", &mut self.settings.show_skybox);
        ui.slider("LOD bias", 0.0, 8.0, &mut self.settings.lod_bias);

        if let Some(project) = &self.project {
            let control = project.control();
            ui.text(format!("band: {}, coefficients: {}", control.band(), control.coefficient_count()));
            ui.text(format!("samples: {}", control.0.y as u32));
        }
    }

    fn draw(&mut self, renderer: &mut Renderer, frame: &RenderFrame) {
        let (Some(project), Some(scene)) = (self.project.as_mut(), self.scene.as_mut()) else {
            return;
        };
        let label = frame.frame_label;
        let compute_done = &self.compute_done[*label];

        // compute: 投影 SH 系数
        let compute_cmd = renderer.cmd_allocator.alloc_compute_command_buffer(label, "sh-project");
        compute_cmd.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT, "sh-project");
        project.record_project(&compute_cmd, label);
        compute_cmd.end();
        Gfx::get().compute_queue().submit(
            vec![GfxSubmitInfo::new(std::slice::from_ref(&compute_cmd)).signal(
                compute_done,
                vk::PipelineStageFlags2::COMPUTE_SHADER,
            )],
            None,
        );

        // graphics: 天空盒、反射物体、SH 球体
        scene.update(label, renderer.camera(), project.control(), &self.settings);
        let cmd = renderer.cmd_allocator.alloc_command_buffer(label, "sh-scene");
        cmd.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT, "sh-scene");
        project.record_acquire_for_graphics(&cmd, label);
        scene.record(&cmd, frame, &self.settings);
        project.record_release_to_compute(&cmd, label);
        cmd.end();
        Gfx::get().gfx_queue().submit(
            vec![GfxSubmitInfo::new(std::slice::from_ref(&cmd)).wait(
                compute_done,
                vk::PipelineStageFlags2::VERTEX_INPUT,
            )],
            None,
        );
    }

    fn on_window_resized(&mut self, renderer: &mut Renderer) {
        if let Some(scene) = self.scene.as_mut() {
            scene.rebuild_depth(renderer.frame_extent());
        }
    }

    fn destroy(&mut self) {
        if let Some(scene) = self.scene.take() {
            scene.destroy();
        }
        self.project = None;
        if let Some(environment) = self.environment.take() {
            environment.destroy();
        }
        std::mem::take(&mut self.compute_done).into_iter().for_each(GfxSemaphore::destroy);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_sees_both_objects() {
        let mut camera = Camera::default();
        SphericalHarmonicApp::init_camera(&mut camera);
        camera.set_aspect_ratio(16.0 / 9.0);
        let view_proj = camera.get_projection_matrix() * camera.get_view_matrix();
        for center in [glam::Vec3::ZERO, crate::outer_app::spherical_harmonic::sh_scene_pass::SH_SPHERE_TRANSLATION] {
            let clip = view_proj * center.extend(1.0);
            let ndc = clip.truncate() / clip.w;
            assert!(clip.w > 0.0);
            assert!(ndc.x.abs() < 1.0 && ndc.y.abs() < 1.0);
        }
    }

    #[test]
    fn settings_follow_config() {
        let config = SphericalHarmonicConfig {
            lod_bias: 2.5,
            ..Default::default()
        };
        let settings = ShSceneSettings::from(&config);
        assert_eq!(settings.lod_bias, 2.5);
        assert!(settings.show_skybox);
        assert_eq!(settings.object, ReflectObject::Sphere);
    }
}

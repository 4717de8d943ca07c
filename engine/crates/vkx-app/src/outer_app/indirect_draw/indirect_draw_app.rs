use ash::vk;
use vkx_gfx::{
    commands::{semaphore::GfxSemaphore, submit_info::GfxSubmitInfo},
    gfx::Gfx,
};

use crate::{
    outer_app::{
        OuterApp,
        indirect_draw::{
            IndirectCommands,
            instance_pass::InstancePass,
            plant_scene_pass::{PlantScenePass, plant_meshes},
        },
    },
    platform::camera::Camera,
    renderer::renderer::{RenderFrame, Renderer},
    scene::mesh::MeshData,
};

const INSTANCE_SEED: u64 = 0x1d1d;

/// 实例数据只有一份，compute 和 graphics 通过两个 semaphore 交替访问
struct PingPong {
    compute_done: GfxSemaphore,
    graphics_done: GfxSemaphore,
    /// 第一帧之前没有 graphics 提交过，compute 不能等待 `graphics_done`
    first_frame: bool,
}
impl PingPong {
    fn new() -> Self {
        Self {
            compute_done: GfxSemaphore::new("indirect-compute-done"),
            graphics_done: GfxSemaphore::new("indirect-graphics-done"),
            first_frame: true,
        }
    }

    fn compute_submit(&mut self, submit: GfxSubmitInfo) -> GfxSubmitInfo {
        let submit = if std::mem::take(&mut self.first_frame) {
            submit
        } else {
            submit.wait(&self.graphics_done, vk::PipelineStageFlags2::COMPUTE_SHADER)
        };
        submit.signal(&self.compute_done, vk::PipelineStageFlags2::COMPUTE_SHADER)
    }

    fn graphics_submit(&self, submit: GfxSubmitInfo) -> GfxSubmitInfo {
        submit.wait(&self.compute_done, vk::PipelineStageFlags2::VERTEX_INPUT).signal(
            &self.graphics_done,
            vk::PipelineStageFlags2::ALL_GRAPHICS,
        )
    }

    fn destroy(self) {
        self.compute_done.destroy();
        self.graphics_done.destroy();
    }
}

#[derive(Default)]
pub struct IndirectDrawApp {
    commands: Option<IndirectCommands>,
    multi_draw_indirect: bool,

    instance_pass: Option<InstancePass>,
    scene_pass: Option<PlantScenePass>,
    ping_pong: Option<PingPong>,
}
// new & init
impl IndirectDrawApp {
    fn init_camera(camera: &mut Camera) {
        camera.position = glam::vec3(0.0, 1.25, 0.0);
        camera.euler_yaw_deg = 0.0;
        camera.euler_pitch_deg = -12.0;
        camera.euler_roll_deg = 0.0;
        camera.set_perspective(60.0, 0.1, 512.0);
    }
}
impl OuterApp for IndirectDrawApp {
    fn name(&self) -> &'static str {
        "Indirect Draw"
    }

    fn init(&mut self, renderer: &mut Renderer, camera: &mut Camera) {
        let config = renderer.config.indirect.clone();
        Self::init_camera(camera);

        let (plants, ranges) = MeshData::merge(&plant_meshes());
        let commands = IndirectCommands::build(&ranges, config.instances_per_mesh);
        log::info!("indirect draw: {} commands, {} objects", commands.draw_count(), commands.object_count);

        self.instance_pass =
            Some(InstancePass::new(&commands, config.plant_radius, config.instances_per_mesh, INSTANCE_SEED));
        self.scene_pass = Some(PlantScenePass::new(
            &plants,
            &commands,
            config.plant_radius,
            renderer.frame_settings.depth_format,
            renderer.frame_extent(),
        ));
        self.multi_draw_indirect = Gfx::get().device_features().multi_draw_indirect;
        self.commands = Some(commands);
        self.ping_pong = Some(PingPong::new());
    }

    fn draw_ui(&mut self, ui: &imgui::Ui) {
        let Some(commands) = &self.commands else {
            return;
        };
        if !self.multi_draw_indirect {
            ui.text_colored([1.0, 0.0, 0.0, 1.0], "multiDrawIndirect not supported");
        }
        ui.text(format!("Objects: {}", commands.object_count));
        ui.text(format!("Indirect commands: {}", commands.draw_count()));
        if let Some(scene_pass) = &self.scene_pass {
            ui.text(format!("Draw calls: {}", scene_pass.draw_call_count()));
        }
    }

    fn draw(&mut self, renderer: &mut Renderer, frame: &RenderFrame) {
        let (Some(instance_pass), Some(scene_pass), Some(ping_pong)) =
            (self.instance_pass.as_mut(), self.scene_pass.as_mut(), self.ping_pong.as_mut())
        else {
            return;
        };
        let label = frame.frame_label;

        let compute_cmd = renderer.cmd_allocator.alloc_compute_command_buffer(label, "indirect-instance");
        compute_cmd.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT, "indirect-instance");
        instance_pass.record(&compute_cmd);
        compute_cmd.end();
        Gfx::get()
            .compute_queue()
            .submit(vec![ping_pong.compute_submit(GfxSubmitInfo::new(std::slice::from_ref(&compute_cmd)))], None);

        scene_pass.update(label, renderer.camera());
        let cmd = renderer.cmd_allocator.alloc_command_buffer(label, "indirect-scene");
        cmd.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT, "indirect-scene");
        instance_pass.record_acquire_for_graphics(&cmd);
        scene_pass.record(&cmd, frame, instance_pass.instance_buffer());
        instance_pass.record_release_to_compute(&cmd);
        cmd.end();
        Gfx::get()
            .gfx_queue()
            .submit(vec![ping_pong.graphics_submit(GfxSubmitInfo::new(std::slice::from_ref(&cmd)))], None);
    }

    fn on_window_resized(&mut self, renderer: &mut Renderer) {
        if let Some(scene_pass) = self.scene_pass.as_mut() {
            scene_pass.rebuild_depth(renderer.frame_extent());
        }
    }

    fn destroy(&mut self) {
        if let Some(scene_pass) = self.scene_pass.take() {
            scene_pass.destroy();
        }
        self.instance_pass = None;
        if let Some(ping_pong) = self.ping_pong.take() {
            ping_pong.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_looks_down_at_plants() {
        let mut camera = Camera::default();
        IndirectDrawApp::init_camera(&mut camera);
        camera.set_aspect_ratio(16.0 / 9.0);
        assert!(camera.camera_forward().y < 0.0);

        // 相机前方地面上的一点
        let view_proj = camera.get_projection_matrix() * camera.get_view_matrix();
        let clip = view_proj * glam::vec4(0.0, 0.0, -8.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(clip.w > 0.0);
        assert!(ndc.x.abs() < 1.0 && ndc.y.abs() < 1.0 && (0.0..1.0).contains(&ndc.z));
    }

    #[test]
    fn default_config_object_count() {
        let config = crate::settings::IndirectConfig::default();
        let (_, ranges) = MeshData::merge(&plant_meshes());
        let commands = IndirectCommands::build(&ranges, config.instances_per_mesh);
        assert_eq!(commands.object_count, 3 * 2048);
        assert_eq!(commands.dispatch_groups(), 24);
    }
}

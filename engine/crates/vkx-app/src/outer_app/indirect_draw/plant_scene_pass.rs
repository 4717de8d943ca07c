use std::rc::Rc;

use ash::vk;
use itertools::Itertools;
use vkx_crate_tools::resource::VkxPath;
use vkx_descriptor_layout_macro::DescriptorLayout;
use vkx_descriptor_layout_trait::DescriptorBindingLayout;
use vkx_gfx::{
    basic::color::LabelColor,
    commands::command_buffer::GfxCommandBuffer,
    descriptors::{
        descriptor::{GfxDescriptorSet, GfxDescriptorSetLayout},
        descriptor_cursor::GfxDescriptorCursor,
        descriptor_pool::{GfxDescriptorPool, GfxDescriptorPoolCreateInfo},
        sampler::GfxSamplerCreateInfo,
    },
    gfx::Gfx,
    pipelines::{
        graphics_pipeline::{GfxGraphicsPipeline, GfxGraphicsPipelineCreateInfo, GfxPipelineLayout},
        rendering_info::GfxRenderingInfo,
    },
    resources::{
        special_buffers::structured_buffer::GfxStructuredBuffer, texture::GfxTexture2D,
        vertex_layout::pos_normal_uv::VertexLayoutPosNormalUv,
    },
};
use vkx_render_interface::{frame_counter::FrameCounter, pipeline_settings::FrameLabel};

use crate::{
    outer_app::indirect_draw::{DrawIndexedIndirect, IndirectCommands, InstanceData},
    platform::camera::Camera,
    renderer::{
        render_target::RenderTarget,
        renderer::{RENDER_TARGET_FORMAT, RenderFrame},
    },
    scene::{
        mesh::{GpuMesh, MeshData},
        shapes::{Plane, Plant, UvSphere},
        textures::{plant_texture_array_rgba8, value_noise_rgba8},
    },
};

const PLANT_TEXTURE_SIZE: u32 = 128;
const GROUND_TEXTURE_SIZE: u32 = 256;
const SKY_RADIUS: f32 = 400.0;

/// 不同外形的草丛，每一种对应一个 indirect command 和一层纹理
pub fn plant_meshes() -> Vec<MeshData> {
    vec![
        Plant::mesh(),
        Plant::mesh().transformed(glam::Mat4::from_scale(glam::vec3(0.7, 1.6, 0.7))),
        Plant::mesh().transformed(glam::Mat4::from_scale_rotation_translation(
            glam::vec3(1.5, 0.6, 1.5),
            glam::Quat::from_rotation_y(0.5),
            glam::Vec3::ZERO,
        )),
    ]
}

/// 每次 indirect draw 的 (buffer offset, draw count)
///
/// 不支持 multiDrawIndirect 时每个 command 单独提交
pub fn indirect_draw_calls(multi_draw_indirect: bool, draw_count: u32) -> Vec<(vk::DeviceSize, u32)> {
    if multi_draw_indirect {
        vec![(0, draw_count)]
    } else {
        (0..draw_count).map(|i| (i as vk::DeviceSize * size_of::<DrawIndexedIndirect>() as vk::DeviceSize, 1)).collect()
    }
}

#[derive(DescriptorLayout)]
struct PlantSceneDescriptorLayout {
    #[binding = 0]
    #[descriptor_type = "UNIFORM_BUFFER"]
    #[stage = "VERTEX"]
    _ubo: (),

    #[binding = 1]
    #[descriptor_type = "COMBINED_IMAGE_SAMPLER"]
    #[stage = "FRAGMENT"]
    _plants: (),

    #[binding = 2]
    #[descriptor_type = "COMBINED_IMAGE_SAMPLER"]
    #[stage = "FRAGMENT"]
    _ground: (),
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct SceneUniform {
    projection: glam::Mat4,
    view: glam::Mat4,
}

struct SceneFrame {
    ubo: GfxStructuredBuffer<SceneUniform>,
    set: GfxDescriptorSet<PlantSceneDescriptorLayout>,
}

/// 天空、地面、以及 indirect 绘制的草丛
pub struct PlantScenePass {
    plant_pipeline: GfxGraphicsPipeline,
    ground_pipeline: GfxGraphicsPipeline,
    sky_pipeline: GfxGraphicsPipeline,
    pipeline_layout: Rc<GfxPipelineLayout>,
    frames: Vec<SceneFrame>,

    plants: GpuMesh,
    ground: GpuMesh,
    sky: GpuMesh,
    indirect_buffer: GfxStructuredBuffer<DrawIndexedIndirect>,
    draw_calls: Vec<(vk::DeviceSize, u32)>,

    plant_texture: Option<GfxTexture2D>,
    ground_texture: Option<GfxTexture2D>,
    depth: RenderTarget,
    depth_format: vk::Format,

    _set_layout: GfxDescriptorSetLayout<PlantSceneDescriptorLayout>,
    _descriptor_pool: GfxDescriptorPool,
}
// new & init
impl PlantScenePass {
    /// `plants` 为 [`plant_meshes`] 合并后的网格，`commands` 与之对应
    pub fn new(
        plants: &MeshData,
        commands: &IndirectCommands,
        plant_radius: f32,
        depth_format: vk::Format,
        extent: vk::Extent2D,
    ) -> Self {
        let layers = commands.draw_count().max(1);
        let plant_texture = GfxTexture2D::from_rgba8(
            PLANT_TEXTURE_SIZE,
            PLANT_TEXTURE_SIZE,
            layers,
            &plant_texture_array_rgba8(PLANT_TEXTURE_SIZE, layers, 11),
            &GfxSamplerCreateInfo::new().clamp_to_edge(),
            "indirect-plant-texture",
        );
        let ground_texture = GfxTexture2D::from_rgba8(
            GROUND_TEXTURE_SIZE,
            GROUND_TEXTURE_SIZE,
            1,
            &value_noise_rgba8(GROUND_TEXTURE_SIZE, 4, 5),
            &GfxSamplerCreateInfo::new(),
            "indirect-ground-texture",
        );

        let mut indirect_buffer = GfxStructuredBuffer::<DrawIndexedIndirect>::new(
            "indirect-commands",
            commands.commands.len(),
            vk::BufferUsageFlags::INDIRECT_BUFFER,
            true,
        );
        indirect_buffer.transfer_data_by_mmap(&commands.commands);

        let features = Gfx::get().device_features();
        if !features.multi_draw_indirect {
            log::warn!("multiDrawIndirect not supported, one indirect draw per command");
        }
        if !features.draw_indirect_first_instance {
            log::warn!("drawIndirectFirstInstance not supported, every plant type reads the first instances");
        }
        let draw_calls = indirect_draw_calls(features.multi_draw_indirect, commands.draw_count());

        let fif = FrameCounter::fif_count() as u32;
        let descriptor_pool = GfxDescriptorPool::new(
            &GfxDescriptorPoolCreateInfo::new(
                vk::DescriptorPoolCreateFlags::empty(),
                fif,
                PlantSceneDescriptorLayout::pool_sizes(fif),
            ),
            "indirect-scene",
        );
        let set_layout = GfxDescriptorSetLayout::<PlantSceneDescriptorLayout>::new(
            vk::DescriptorSetLayoutCreateFlags::empty(),
            "indirect-scene",
        );
        let pipeline_layout = Rc::new(GfxPipelineLayout::new(&[set_layout.handle()], &[], "indirect-scene"));

        let base_create_info = |shader: &str| {
            let mut create_info = GfxGraphicsPipelineCreateInfo::default();
            create_info
                .vertex_shader_stage(VkxPath::shader_build_path_str(&format!("indirect/{}.vert", shader)), c"main")
                .fragment_shader_stage(VkxPath::shader_build_path_str(&format!("indirect/{}.frag", shader)), c"main")
                .vertex_layout::<VertexLayoutPosNormalUv>()
                .attach_info(vec![RENDER_TARGET_FORMAT], Some(depth_format), None);
            create_info
        };

        let mut plant_ci = base_create_info("plant");
        plant_ci
            .instance_input(InstanceData::vertex_binding(1), InstanceData::vertex_attributes(1))
            .cull_mode(vk::CullModeFlags::NONE, vk::FrontFace::COUNTER_CLOCKWISE);
        let plant_pipeline = GfxGraphicsPipeline::new(&plant_ci, pipeline_layout.clone(), "indirect-plant");

        let mut ground_ci = base_create_info("ground");
        ground_ci.cull_mode(vk::CullModeFlags::BACK, vk::FrontFace::COUNTER_CLOCKWISE);
        let ground_pipeline = GfxGraphicsPipeline::new(&ground_ci, pipeline_layout.clone(), "indirect-ground");

        let mut sky_ci = base_create_info("sky");
        sky_ci
            .cull_mode(vk::CullModeFlags::FRONT, vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_test(Some(vk::CompareOp::LESS_OR_EQUAL), false, false);
        let sky_pipeline = GfxGraphicsPipeline::new(&sky_ci, pipeline_layout.clone(), "indirect-sky");

        let frames = FrameCounter::frame_labels()
            .iter()
            .map(|label| {
                let ubo = GfxStructuredBuffer::<SceneUniform>::new_ubo(1, format!("indirect-scene-{}", label));
                let set = GfxDescriptorSet::new(&descriptor_pool, &set_layout, format!("indirect-scene-{}", label));
                Gfx::get().gfx_device().write_descriptor_sets(&[
                    PlantSceneDescriptorLayout::ubo().write_buffer(set.handle(), 0, vec![ubo.descriptor_info()]),
                    PlantSceneDescriptorLayout::plants().write_image(
                        set.handle(),
                        0,
                        vec![plant_texture.descriptor_image_info()],
                    ),
                    PlantSceneDescriptorLayout::ground().write_image(
                        set.handle(),
                        0,
                        vec![ground_texture.descriptor_image_info()],
                    ),
                ]);
                SceneFrame { ubo, set }
            })
            .collect_vec();

        let ground_size = plant_radius * 2.0 + 10.0;
        Self {
            plant_pipeline,
            ground_pipeline,
            sky_pipeline,
            pipeline_layout,
            frames,
            plants: plants.upload("indirect-plants"),
            ground: Plane::mesh(ground_size, ground_size / 4.0).upload("indirect-ground"),
            sky: UvSphere::mesh(32, 16)
                .transformed(glam::Mat4::from_scale(glam::Vec3::splat(SKY_RADIUS)))
                .upload("indirect-sky"),
            indirect_buffer,
            draw_calls,
            plant_texture: Some(plant_texture),
            ground_texture: Some(ground_texture),
            depth: RenderTarget::new_depth(extent, depth_format, "indirect-depth"),
            depth_format,
            _set_layout: set_layout,
            _descriptor_pool: descriptor_pool,
        }
    }

    pub fn rebuild_depth(&mut self, extent: vk::Extent2D) {
        let depth =
            std::mem::replace(&mut self.depth, RenderTarget::new_depth(extent, self.depth_format, "indirect-depth"));
        depth.destroy();
    }
}
// getters
impl PlantScenePass {
    /// 实际提交的 indirect draw 次数
    #[inline]
    pub fn draw_call_count(&self) -> usize {
        self.draw_calls.len()
    }
}
// update
impl PlantScenePass {
    pub fn update(&mut self, frame_label: FrameLabel, camera: &Camera) {
        self.frames[*frame_label].ubo.write(&SceneUniform {
            projection: camera.get_projection_matrix(),
            view: camera.get_view_matrix(),
        });
    }
}
// draw
impl PlantScenePass {
    pub fn record(&self, cmd: &GfxCommandBuffer, frame: &RenderFrame, instance_buffer: vk::Buffer) {
        let scene = &self.frames[*frame.frame_label];
        cmd.image_memory_barrier(
            vk::DependencyFlags::empty(),
            &[frame.target_barrier(), self.depth.barrier_to_attachment()],
        );

        cmd.begin_label("indirect-scene", LabelColor::COLOR_PASS);
        cmd.cmd_begin_rendering2(
            &GfxRenderingInfo::new_full(vec![frame.target_view], Some(self.depth.view()), frame.extent)
                .clear_color([0.18, 0.27, 0.5, 1.0]),
        );
        cmd.cmd_set_viewport_scissor(frame.extent);
        cmd.bind_descriptor_sets(
            vk::PipelineBindPoint::GRAPHICS,
            self.pipeline_layout.handle(),
            0,
            &[scene.set.handle()],
            None,
        );

        cmd.cmd_bind_pipeline(vk::PipelineBindPoint::GRAPHICS, self.sky_pipeline.handle());
        self.sky.draw(cmd, 1, 0);

        cmd.cmd_bind_pipeline(vk::PipelineBindPoint::GRAPHICS, self.ground_pipeline.handle());
        self.ground.draw(cmd, 1, 0);

        cmd.scope_label("indirect-plants", LabelColor::COLOR_CMD, |cmd| {
            cmd.cmd_bind_pipeline(vk::PipelineBindPoint::GRAPHICS, self.plant_pipeline.handle());
            self.plants.bind(cmd);
            cmd.cmd_bind_vertex_buffers(1, &[instance_buffer], &[0]);
            for (offset, count) in &self.draw_calls {
                cmd.draw_indexed_indirect(&self.indirect_buffer, *offset, *count, size_of::<DrawIndexedIndirect>() as u32);
            }
        });

        cmd.end_rendering();
        cmd.end_label();
    }
}
// destroy
impl PlantScenePass {
    pub fn destroy(mut self) {
        if let Some(texture) = self.plant_texture.take() {
            texture.destroy();
        }
        if let Some(texture) = self.ground_texture.take() {
            texture.destroy();
        }
        self.depth.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::mesh::MeshData;

    #[test]
    fn fallback_issues_one_draw_per_command() {
        assert_eq!(indirect_draw_calls(true, 3), vec![(0, 3)]);
        assert_eq!(indirect_draw_calls(false, 3), vec![(0, 1), (20, 1), (40, 1)]);
        assert!(indirect_draw_calls(false, 0).is_empty());
    }

    #[test]
    fn plant_variants_merge_into_commands() {
        let meshes = plant_meshes();
        let (merged, ranges) = MeshData::merge(&meshes);
        let commands = IndirectCommands::build(&ranges, 2048);
        assert_eq!(commands.draw_count() as usize, meshes.len());
        let last = commands.commands.last().unwrap();
        assert_eq!(last.first_index + last.index_count, merged.index_cnt());
        assert_eq!(commands.object_count, 2048 * meshes.len() as u32);
    }
}

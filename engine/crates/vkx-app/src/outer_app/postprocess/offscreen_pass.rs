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
    },
    gfx::Gfx,
    pipelines::{
        graphics_pipeline::{GfxGraphicsPipeline, GfxGraphicsPipelineCreateInfo, GfxPipelineLayout},
        rendering_info::GfxRenderingInfo,
    },
    resources::{
        special_buffers::structured_buffer::GfxStructuredBuffer, texture::GfxTextureCube,
        vertex_layout::pos_normal_uv::VertexLayoutPosNormalUv,
    },
};
use vkx_render_interface::{frame_counter::FrameCounter, pipeline_settings::FrameLabel};

use crate::{
    outer_app::postprocess::{SceneUniform, potted_plant_mesh},
    platform::camera::Camera,
    renderer::{render_target::RenderTarget, renderer::RENDER_TARGET_FORMAT},
    scene::{
        mesh::GpuMesh,
        shapes::Cube,
        textures::sky_cubemap_rgba8,
    },
};

const SKY_FACE_SIZE: u32 = 256;

#[derive(DescriptorLayout)]
struct OffscreenDescriptorLayout {
    #[binding = 0]
    #[descriptor_type = "UNIFORM_BUFFER"]
    #[stage = "VERTEX"]
    _ubo: (),

    #[binding = 1]
    #[descriptor_type = "COMBINED_IMAGE_SAMPLER"]
    #[stage = "FRAGMENT"]
    _environment: (),
}

struct OffscreenFrame {
    skybox_ubo: GfxStructuredBuffer<SceneUniform>,
    model_ubo: GfxStructuredBuffer<SceneUniform>,
    skybox_set: GfxDescriptorSet<OffscreenDescriptorLayout>,
    model_set: GfxDescriptorSet<OffscreenDescriptorLayout>,
}

/// 离屏 color/depth 的尺寸与 swapchain 相同，窗口大小改变时重建
struct OffscreenTargets {
    color: RenderTarget,
    depth: RenderTarget,
}
impl OffscreenTargets {
    fn new(extent: vk::Extent2D, depth_format: vk::Format) -> Self {
        Self {
            color: RenderTarget::new_color(extent, RENDER_TARGET_FORMAT, "postprocess-offscreen-color"),
            depth: RenderTarget::new_depth(extent, depth_format, "postprocess-offscreen-depth"),
        }
    }

    fn destroy(self) {
        self.color.destroy();
        self.depth.destroy();
    }
}

pub struct OffscreenPass {
    skybox_pipeline: GfxGraphicsPipeline,
    phong_pipeline: GfxGraphicsPipeline,
    pipeline_layout: Rc<GfxPipelineLayout>,
    frames: Vec<OffscreenFrame>,

    skybox: GpuMesh,
    model: GpuMesh,
    environment: Option<GfxTextureCube>,
    targets: OffscreenTargets,
    depth_format: vk::Format,

    _set_layout: GfxDescriptorSetLayout<OffscreenDescriptorLayout>,
    _descriptor_pool: GfxDescriptorPool,
}
// new & init
impl OffscreenPass {
    pub fn new(depth_format: vk::Format, extent: vk::Extent2D) -> Self {
        let environment =
            GfxTextureCube::from_rgba8(SKY_FACE_SIZE, &sky_cubemap_rgba8(SKY_FACE_SIZE), "postprocess-environment");

        let set_count = FrameCounter::fif_count() as u32 * 2;
        let descriptor_pool = GfxDescriptorPool::new(
            &GfxDescriptorPoolCreateInfo::new(
                vk::DescriptorPoolCreateFlags::empty(),
                set_count,
                OffscreenDescriptorLayout::pool_sizes(set_count),
            ),
            "postprocess-offscreen",
        );
        let set_layout = GfxDescriptorSetLayout::<OffscreenDescriptorLayout>::new(
            vk::DescriptorSetLayoutCreateFlags::empty(),
            "postprocess-offscreen",
        );
        let pipeline_layout = Rc::new(GfxPipelineLayout::new(&[set_layout.handle()], &[], "postprocess-offscreen"));

        let mut skybox_ci = GfxGraphicsPipelineCreateInfo::default();
        skybox_ci
            .vertex_shader_stage(VkxPath::shader_build_path_str("postprocess/skybox.vert"), c"main")
            .fragment_shader_stage(VkxPath::shader_build_path_str("postprocess/skybox.frag"), c"main")
            .vertex_layout::<VertexLayoutPosNormalUv>()
            .attach_info(vec![RENDER_TARGET_FORMAT], Some(depth_format), None)
            .cull_mode(vk::CullModeFlags::FRONT, vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_test(Some(vk::CompareOp::LESS_OR_EQUAL), false, false);
        let skybox_pipeline = GfxGraphicsPipeline::new(&skybox_ci, pipeline_layout.clone(), "postprocess-skybox");

        // 草叶是单面的，不做剔除
        let mut phong_ci = GfxGraphicsPipelineCreateInfo::default();
        phong_ci
            .vertex_shader_stage(VkxPath::shader_build_path_str("postprocess/phong.vert"), c"main")
            .fragment_shader_stage(VkxPath::shader_build_path_str("postprocess/phong.frag"), c"main")
            .vertex_layout::<VertexLayoutPosNormalUv>()
            .attach_info(vec![RENDER_TARGET_FORMAT], Some(depth_format), None)
            .cull_mode(vk::CullModeFlags::NONE, vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_test(Some(vk::CompareOp::LESS_OR_EQUAL), true, false);
        let phong_pipeline = GfxGraphicsPipeline::new(&phong_ci, pipeline_layout.clone(), "postprocess-phong");

        let frames = FrameCounter::frame_labels()
            .iter()
            .map(|label| {
                let skybox_ubo =
                    GfxStructuredBuffer::<SceneUniform>::new_ubo(1, format!("postprocess-skybox-ubo-{}", label));
                let model_ubo =
                    GfxStructuredBuffer::<SceneUniform>::new_ubo(1, format!("postprocess-model-ubo-{}", label));
                let skybox_set =
                    GfxDescriptorSet::new(&descriptor_pool, &set_layout, format!("postprocess-skybox-{}", label));
                let model_set =
                    GfxDescriptorSet::new(&descriptor_pool, &set_layout, format!("postprocess-model-{}", label));

                let env_info = environment.descriptor_image_info();
                Gfx::get().gfx_device().write_descriptor_sets(&[
                    OffscreenDescriptorLayout::ubo().write_buffer(
                        skybox_set.handle(),
                        0,
                        vec![skybox_ubo.descriptor_info()],
                    ),
                    OffscreenDescriptorLayout::environment().write_image(skybox_set.handle(), 0, vec![env_info]),
                    OffscreenDescriptorLayout::ubo().write_buffer(model_set.handle(), 0, vec![model_ubo.descriptor_info()]),
                    OffscreenDescriptorLayout::environment().write_image(model_set.handle(), 0, vec![env_info]),
                ]);

                OffscreenFrame {
                    skybox_ubo,
                    model_ubo,
                    skybox_set,
                    model_set,
                }
            })
            .collect_vec();

        Self {
            skybox_pipeline,
            phong_pipeline,
            pipeline_layout,
            frames,
            skybox: Cube::mesh().upload("postprocess-skybox"),
            model: potted_plant_mesh().upload("postprocess-model"),
            environment: Some(environment),
            targets: OffscreenTargets::new(extent, depth_format),
            depth_format,
            _set_layout: set_layout,
            _descriptor_pool: descriptor_pool,
        }
    }

    /// 旧的 target 被 graying pass 的 descriptor 引用，调用者需要随后更新 descriptor
    pub fn rebuild(&mut self, extent: vk::Extent2D) {
        let targets = std::mem::replace(&mut self.targets, OffscreenTargets::new(extent, self.depth_format));
        targets.destroy();
    }
}
// getters
impl OffscreenPass {
    /// 离屏 color，graying pass 的输入
    #[inline]
    pub fn color(&self) -> &RenderTarget {
        &self.targets.color
    }
}
// update
impl OffscreenPass {
    /// `t` 为模型动画的周期进度
    pub fn update(&mut self, frame_label: FrameLabel, camera: &Camera, t: f32) {
        let frame = &mut self.frames[*frame_label];
        frame.skybox_ubo.write(&SceneUniform::skybox(camera));
        frame.model_ubo.write(&SceneUniform::model(camera, t));
    }
}
// draw
impl OffscreenPass {
    pub fn record(&self, cmd: &GfxCommandBuffer, frame_label: FrameLabel) {
        let targets = &self.targets;
        let frame = &self.frames[*frame_label];
        let extent = targets.color.extent();

        cmd.image_memory_barrier(
            vk::DependencyFlags::empty(),
            &[targets.color.barrier_to_attachment(), targets.depth.barrier_to_attachment()],
        );
        cmd.begin_label("postprocess-offscreen", LabelColor::COLOR_PASS);
        cmd.cmd_begin_rendering2(
            &GfxRenderingInfo::new_full(vec![targets.color.view()], Some(targets.depth.view()), extent)
                .clear_color([0.0, 0.0, 0.0, 1.0]),
        );
        cmd.cmd_set_viewport_scissor(extent);

        cmd.scope_label("postprocess-skybox", LabelColor::COLOR_CMD, |cmd| {
            cmd.cmd_bind_pipeline(vk::PipelineBindPoint::GRAPHICS, self.skybox_pipeline.handle());
            cmd.bind_descriptor_sets(
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline_layout.handle(),
                0,
                &[frame.skybox_set.handle()],
                None,
            );
            self.skybox.draw(cmd, 1, 0);
        });

        cmd.scope_label("postprocess-phong", LabelColor::COLOR_CMD, |cmd| {
            cmd.cmd_bind_pipeline(vk::PipelineBindPoint::GRAPHICS, self.phong_pipeline.handle());
            cmd.bind_descriptor_sets(
                vk::PipelineBindPoint::GRAPHICS,
                self.pipeline_layout.handle(),
                0,
                &[frame.model_set.handle()],
                None,
            );
            self.model.draw(cmd, 1, 0);
        });

        cmd.end_rendering();
        cmd.end_label();
        cmd.image_memory_barrier(vk::DependencyFlags::empty(), &[targets.color.barrier_to_sampled()]);
    }
}
// destroy
impl OffscreenPass {
    pub fn destroy(mut self) {
        self.targets.destroy();
        if let Some(environment) = self.environment.take() {
            environment.destroy();
        }
    }
}

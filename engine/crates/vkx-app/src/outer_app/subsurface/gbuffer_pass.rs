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
        special_buffers::structured_buffer::GfxStructuredBuffer, vertex_layout::pos_normal_uv::VertexLayoutPosNormalUv,
    },
};
use vkx_render_interface::{frame_counter::FrameCounter, pipeline_settings::FrameLabel};

use crate::{
    outer_app::subsurface::GBUFFER_DIM,
    platform::camera::Camera,
    renderer::render_target::RenderTarget,
    scene::{
        mesh::GpuMesh,
        shapes::{Head, Plane},
    },
};

/// 三个头部模型的位置
pub const HEAD_POSITIONS: [glam::Vec3; 3] =
    [glam::Vec3::new(0.0, 0.0, 0.0), glam::Vec3::new(-4.0, 0.0, -4.0), glam::Vec3::new(4.0, 0.0, -4.0)];

const POSITION_FORMAT: vk::Format = vk::Format::R16G16B16A16_SFLOAT;
const NORMAL_FORMAT: vk::Format = vk::Format::R16G16B16A16_SFLOAT;
/// alpha 通道为皮肤遮罩，只有皮肤参与次表面模糊
const ALBEDO_FORMAT: vk::Format = vk::Format::B8G8R8A8_UNORM;

const FLOOR_Y: f32 = -1.6;

#[derive(DescriptorLayout)]
struct GBufferDescriptorLayout {
    #[binding = 0]
    #[descriptor_type = "UNIFORM_BUFFER"]
    #[stage = "VERTEX"]
    _scene: (),
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct GBufferUniform {
    projection: glam::Mat4,
    view: glam::Mat4,
}

/// 每个物体的数据，通过 push constant 传入
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GBufferPushConstant {
    pub model: glam::Mat4,
    /// x: 皮肤遮罩
    pub material: glam::Vec4,
}

impl GBufferPushConstant {
    /// 所有需要绘制的物体：三个头部，以及一块不参与散射的地面
    pub fn scene_objects() -> Vec<(GBufferPushConstant, bool)> {
        HEAD_POSITIONS
            .iter()
            .map(|pos| {
                (
                    GBufferPushConstant {
                        model: glam::Mat4::from_translation(*pos),
                        material: glam::vec4(1.0, 0.0, 0.0, 0.0),
                    },
                    true,
                )
            })
            .chain(std::iter::once((
                GBufferPushConstant {
                    model: glam::Mat4::from_translation(glam::vec3(0.0, FLOOR_Y, -2.0)),
                    material: glam::Vec4::ZERO,
                },
                false,
            )))
            .collect_vec()
    }
}

/// 几何缓冲：世界空间位置、法线、albedo 以及深度
pub struct GBuffer {
    pub position: RenderTarget,
    pub normal: RenderTarget,
    pub albedo: RenderTarget,
    pub depth: RenderTarget,
}
impl GBuffer {
    pub fn extent() -> vk::Extent2D {
        vk::Extent2D {
            width: GBUFFER_DIM,
            height: GBUFFER_DIM,
        }
    }

    pub fn color_formats() -> Vec<vk::Format> {
        vec![POSITION_FORMAT, NORMAL_FORMAT, ALBEDO_FORMAT]
    }

    fn new(depth_format: vk::Format) -> Self {
        let extent = Self::extent();
        Self {
            position: RenderTarget::new_color(extent, POSITION_FORMAT, "gbuffer-position"),
            normal: RenderTarget::new_color(extent, NORMAL_FORMAT, "gbuffer-normal"),
            albedo: RenderTarget::new_color(extent, ALBEDO_FORMAT, "gbuffer-albedo"),
            depth: RenderTarget::new_depth(extent, depth_format, "gbuffer-depth"),
        }
    }

    fn targets(&self) -> [&RenderTarget; 4] {
        [&self.position, &self.normal, &self.albedo, &self.depth]
    }

    fn destroy(self) {
        self.position.destroy();
        self.normal.destroy();
        self.albedo.destroy();
        self.depth.destroy();
    }
}

struct GBufferFrame {
    ubo: GfxStructuredBuffer<GBufferUniform>,
    set: GfxDescriptorSet<GBufferDescriptorLayout>,
}

pub struct GBufferPass {
    gbuffer: GBuffer,

    pipeline: GfxGraphicsPipeline,
    pipeline_layout: Rc<GfxPipelineLayout>,
    frames: Vec<GBufferFrame>,
    _set_layout: GfxDescriptorSetLayout<GBufferDescriptorLayout>,
    _descriptor_pool: GfxDescriptorPool,

    head: GpuMesh,
    floor: GpuMesh,
}
// new & init
impl GBufferPass {
    pub fn new(depth_format: vk::Format) -> Self {
        let gbuffer = GBuffer::new(depth_format);

        let fif = FrameCounter::fif_count() as u32;
        let descriptor_pool = GfxDescriptorPool::new(
            &GfxDescriptorPoolCreateInfo::new(
                vk::DescriptorPoolCreateFlags::empty(),
                fif,
                GBufferDescriptorLayout::pool_sizes(fif),
            ),
            "sss-gbuffer",
        );
        let set_layout = GfxDescriptorSetLayout::<GBufferDescriptorLayout>::new(
            vk::DescriptorSetLayoutCreateFlags::empty(),
            "sss-gbuffer",
        );
        let pipeline_layout = Rc::new(GfxPipelineLayout::new(
            &[set_layout.handle()],
            &[vk::PushConstantRange::default()
                .stage_flags(vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT)
                .offset(0)
                .size(size_of::<GBufferPushConstant>() as u32)],
            "sss-gbuffer",
        ));

        let mut create_info = GfxGraphicsPipelineCreateInfo::default();
        create_info
            .vertex_shader_stage(VkxPath::shader_build_path_str("sss/gbuffer.vert"), c"main")
            .fragment_shader_stage(VkxPath::shader_build_path_str("sss/gbuffer.frag"), c"main")
            .vertex_layout::<VertexLayoutPosNormalUv>()
            .attach_info(GBuffer::color_formats(), Some(depth_format), None)
            .cull_mode(vk::CullModeFlags::BACK, vk::FrontFace::COUNTER_CLOCKWISE);
        let pipeline = GfxGraphicsPipeline::new(&create_info, pipeline_layout.clone(), "sss-gbuffer");

        let frames = FrameCounter::frame_labels()
            .iter()
            .map(|label| {
                let ubo = GfxStructuredBuffer::<GBufferUniform>::new_ubo(1, format!("sss-gbuffer-{}", label));
                let set = GfxDescriptorSet::new(&descriptor_pool, &set_layout, format!("sss-gbuffer-{}", label));
                Gfx::get().gfx_device().write_descriptor_sets(&[GBufferDescriptorLayout::scene().write_buffer(
                    set.handle(),
                    0,
                    vec![ubo.descriptor_info()],
                )]);
                GBufferFrame { ubo, set }
            })
            .collect_vec();

        let head = Head::mesh().with_color(glam::vec3(0.85, 0.62, 0.52)).upload("sss-head");
        let floor = Plane::mesh(16.0, 8.0).with_color(glam::Vec3::splat(0.4)).upload("sss-floor");

        Self {
            gbuffer,
            pipeline,
            pipeline_layout,
            frames,
            _set_layout: set_layout,
            _descriptor_pool: descriptor_pool,
            head,
            floor,
        }
    }
}
// getters
impl GBufferPass {
    #[inline]
    pub fn gbuffer(&self) -> &GBuffer {
        &self.gbuffer
    }
}
// draw
impl GBufferPass {
    pub fn update(&mut self, frame_label: FrameLabel, camera: &Camera) {
        self.frames[*frame_label].ubo.write(&GBufferUniform {
            projection: camera.get_projection_matrix(),
            view: camera.get_view_matrix(),
        });
    }

    /// 结束时所有 attachment 都已转换为采样 layout
    pub fn record(&self, cmd: &GfxCommandBuffer, frame_label: FrameLabel) {
        let frame = &self.frames[*frame_label];
        let extent = GBuffer::extent();

        let to_attachment = self.gbuffer.targets().iter().map(|t| t.barrier_to_attachment()).collect_vec();
        cmd.image_memory_barrier(vk::DependencyFlags::empty(), &to_attachment);

        cmd.begin_label("sss-gbuffer", LabelColor::COLOR_PASS);
        cmd.cmd_begin_rendering2(
            &GfxRenderingInfo::new_full(
                vec![self.gbuffer.position.view(), self.gbuffer.normal.view(), self.gbuffer.albedo.view()],
                Some(self.gbuffer.depth.view()),
                extent,
            )
            .clear_color([0.0, 0.0, 0.0, 0.0]),
        );
        cmd.cmd_set_viewport_scissor(extent);
        cmd.cmd_bind_pipeline(vk::PipelineBindPoint::GRAPHICS, self.pipeline.handle());
        cmd.bind_descriptor_sets(
            vk::PipelineBindPoint::GRAPHICS,
            self.pipeline_layout.handle(),
            0,
            &[frame.set.handle()],
            None,
        );

        for (push_constant, is_head) in GBufferPushConstant::scene_objects() {
            let mesh = if is_head { &self.head } else { &self.floor };
            cmd.cmd_push_constants(
                self.pipeline_layout.handle(),
                vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
                0,
                bytemuck::bytes_of(&push_constant),
            );
            mesh.bind(cmd);
            mesh.draw(cmd, 1, 0);
        }

        cmd.end_rendering();
        cmd.end_label();

        let to_sampled = self.gbuffer.targets().iter().map(|t| t.barrier_to_sampled()).collect_vec();
        cmd.image_memory_barrier(vk::DependencyFlags::empty(), &to_sampled);
    }
}
// destroy
impl GBufferPass {
    pub fn destroy(self) {
        self.gbuffer.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scene_has_three_skin_heads_and_floor() {
        let objects = GBufferPushConstant::scene_objects();
        assert_eq!(objects.len(), 4);
        for ((pc, is_head), pos) in objects.iter().zip(HEAD_POSITIONS) {
            assert!(*is_head);
            assert_eq!(pc.model.w_axis.truncate(), pos);
            assert_eq!(pc.material.x, 1.0);
        }
        let (floor, is_head) = objects[3];
        assert!(!is_head);
        assert_eq!(floor.material.x, 0.0);
    }

    #[test]
    fn push_constant_fits_minimum_limit() {
        // Vulkan 保证至少 128 字节
        assert!(size_of::<GBufferPushConstant>() <= 128);
    }

    #[test]
    fn gbuffer_formats() {
        assert_eq!(GBuffer::color_formats().len(), 3);
        assert_eq!(GBuffer::extent().width, 2048);
    }
}

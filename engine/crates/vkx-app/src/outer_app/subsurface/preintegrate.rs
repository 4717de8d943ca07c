//! 预积分次表面散射
//!
//! compute shader 烘焙两类查找表：
//! - 512x512 的 LUT：横轴为 N·L，纵轴为曲率
//! - 两条 512x1 的 SH 散射条带，对应一阶和二阶 SH 的卷积系数
//!
//! 显示时窗口左半边是 LUT，右半边是 SH 条带（上半部分一阶，下半部分二阶）

use std::rc::Rc;

use ash::vk;
use itertools::Itertools;
use vkx_crate_tools::resource::VkxPath;
use vkx_descriptor_layout_macro::DescriptorLayout;
use vkx_descriptor_layout_trait::DescriptorBindingLayout;
use vkx_gfx::{
    basic::color::LabelColor,
    commands::{
        barrier::GfxImageBarrier, command_buffer::GfxCommandBuffer, semaphore::GfxSemaphore,
        submit_info::GfxSubmitInfo,
    },
    descriptors::{
        descriptor::{GfxDescriptorSet, GfxDescriptorSetLayout},
        descriptor_cursor::{GfxDescriptorCursor, GfxWriteDescriptorSet},
        descriptor_pool::{GfxDescriptorPool, GfxDescriptorPoolCreateInfo},
        sampler::{GfxSampler, GfxSamplerCreateInfo},
    },
    gfx::Gfx,
    pipelines::{
        compute_pipeline::GfxComputePipeline,
        graphics_pipeline::{GfxGraphicsPipeline, GfxGraphicsPipelineCreateInfo, GfxPipelineLayout},
        rendering_info::GfxRenderingInfo,
        shader::GfxShaderStageInfo,
    },
    resources::{special_buffers::structured_buffer::GfxStructuredBuffer, vertex_layout::pos_normal_uv::VertexLayoutPosNormalUv},
};
use vkx_render_interface::{cmd_allocator::CmdAllocator, frame_counter::FrameCounter, pipeline_settings::FrameLabel};

use crate::{
    platform::camera::Camera,
    renderer::{
        render_target::RenderTarget,
        renderer::{RENDER_TARGET_FORMAT, RenderFrame},
    },
    scene::{mesh::GpuMesh, shapes::Plane},
    settings::SubsurfaceConfig,
};

/// LUT 的边长，以及 SH 条带的宽度
pub const SCATTER_IMG_SIZE: u32 = 512;
const STORAGE_FORMAT: vk::Format = vk::Format::R8G8B8A8_UNORM;
/// compute shader 的 local size
const GROUP_SIZE: u32 = 16;

/// 烘焙所需的参数：散射颜色和散射距离
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreintegrateParams {
    pub scatter_color: glam::Vec3,
    pub scatter_distance: glam::Vec3,
}

impl From<&SubsurfaceConfig> for PreintegrateParams {
    fn from(config: &SubsurfaceConfig) -> Self {
        Self {
            scatter_color: config.scatter_color.into(),
            scatter_distance: config.scatter_distance.into(),
        }
    }
}

/// compute shader 的 uniform buffer
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PreintegrateUniform {
    /// xyz：每个通道的扩散距离；w：积分步长
    pub d_steps: glam::Vec4,
    /// (1 / width, 1 / height, width, height)
    pub tex_size: glam::Vec4,
}

impl PreintegrateParams {
    /// 根据反照率把散射距离换算为 Burley 剖面的 d
    pub fn d_steps(&self) -> glam::Vec4 {
        let albedo = self.scatter_color.max(glam::Vec3::splat(0.001));
        let s = (3.5 + 100.0 * (albedo - 0.33).powf(4.0)).max(glam::Vec3::splat(0.001));
        let d = (self.scatter_distance / s).max(glam::Vec3::splat(0.001));
        d.extend(0.001)
    }

    pub fn lut_uniform(&self) -> PreintegrateUniform {
        let size = SCATTER_IMG_SIZE as f32;
        PreintegrateUniform {
            d_steps: self.d_steps(),
            tex_size: glam::vec4(1.0 / size, 1.0 / size, size, size),
        }
    }

    pub fn sh_uniform(&self) -> PreintegrateUniform {
        let size = SCATTER_IMG_SIZE as f32;
        PreintegrateUniform {
            d_steps: self.d_steps(),
            tex_size: glam::vec4(1.0 / size, 1.0, size, 1.0),
        }
    }
}

/// 覆盖 `size` 个像素需要的 work group 数量
#[inline]
pub fn group_count(size: u32) -> u32 {
    size.div_ceil(GROUP_SIZE)
}

/// bake 用的 descriptor 写入，`targets` 依次对应 target0、target1
fn compute_set_writes(
    set: vk::DescriptorSet,
    params: vk::DescriptorBufferInfo,
    targets: &[vk::ImageView],
) -> Vec<GfxWriteDescriptorSet> {
    debug_assert!(!targets.is_empty() && targets.len() <= 2);
    let target_slots = [PreintegrateComputeLayout::target0(), PreintegrateComputeLayout::target1()];
    std::iter::once(PreintegrateComputeLayout::params().write_buffer(set, 0, vec![params]))
        .chain(targets.iter().zip(target_slots).map(|(view, slot)| {
            let info = vk::DescriptorImageInfo::default().image_view(*view).image_layout(vk::ImageLayout::GENERAL);
            slot.write_image(set, 0, vec![info])
        }))
        .collect()
}

#[derive(DescriptorLayout)]
struct PreintegrateComputeLayout {
    #[binding = 0]
    #[descriptor_type = "UNIFORM_BUFFER"]
    #[stage = "COMPUTE"]
    _params: (),

    #[binding = 1]
    #[descriptor_type = "STORAGE_IMAGE"]
    #[stage = "COMPUTE"]
    _target0: (),

    #[binding = 2]
    #[descriptor_type = "STORAGE_IMAGE"]
    #[stage = "COMPUTE"]
    _target1: (),
}

#[derive(DescriptorLayout)]
struct PreintegrateDisplayLayout {
    #[binding = 0]
    #[descriptor_type = "UNIFORM_BUFFER"]
    #[stage = "VERTEX"]
    _ubo: (),

    #[binding = 1]
    #[descriptor_type = "COMBINED_IMAGE_SAMPLER"]
    #[stage = "FRAGMENT"]
    _tex0: (),

    #[binding = 2]
    #[descriptor_type = "COMBINED_IMAGE_SAMPLER"]
    #[stage = "FRAGMENT"]
    _tex1: (),
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct DisplayUniform {
    projection: glam::Mat4,
    model_view: glam::Mat4,
}

/// 每个 frame in flight 的显示资源
struct DisplayFrame {
    ubo: GfxStructuredBuffer<DisplayUniform>,
    lut_set: GfxDescriptorSet<PreintegrateDisplayLayout>,
    sh_set: GfxDescriptorSet<PreintegrateDisplayLayout>,
}

pub struct PreintegratePass {
    lut: RenderTarget,
    sh1: RenderTarget,
    sh2: RenderTarget,
    sampler: GfxSampler,

    lut_ubo: GfxStructuredBuffer<PreintegrateUniform>,
    sh_ubo: GfxStructuredBuffer<PreintegrateUniform>,
    lut_pipeline: GfxComputePipeline,
    sh_pipeline: GfxComputePipeline,
    lut_compute_set: GfxDescriptorSet<PreintegrateComputeLayout>,
    sh_compute_set: GfxDescriptorSet<PreintegrateComputeLayout>,
    _compute_set_layout: GfxDescriptorSetLayout<PreintegrateComputeLayout>,

    lut_display_pipeline: GfxGraphicsPipeline,
    sh_display_pipeline: GfxGraphicsPipeline,
    display_layout: Rc<GfxPipelineLayout>,
    display_frames: Vec<DisplayFrame>,
    _display_set_layout: GfxDescriptorSetLayout<PreintegrateDisplayLayout>,
    quad: GpuMesh,

    _descriptor_pool: GfxDescriptorPool,

    /// compute 完成后 signal，同一帧的 graphics 等待
    bake_semaphore: GfxSemaphore,

    /// 当前 LUT 对应的参数，None 表示还没有烘焙过
    baked: Option<PreintegrateParams>,
}
// new & init
impl PreintegratePass {
    pub fn new() -> Self {
        let extent_lut = vk::Extent2D {
            width: SCATTER_IMG_SIZE,
            height: SCATTER_IMG_SIZE,
        };
        let extent_sh = vk::Extent2D {
            width: SCATTER_IMG_SIZE,
            height: 1,
        };
        let lut = RenderTarget::new_storage(extent_lut, STORAGE_FORMAT, "preintegrate-lut");
        let sh1 = RenderTarget::new_storage(extent_sh, STORAGE_FORMAT, "preintegrate-sh1");
        let sh2 = RenderTarget::new_storage(extent_sh, STORAGE_FORMAT, "preintegrate-sh2");

        // storage image 始终处于 GENERAL，compute 写入和 fragment 采样都不需要再转换 layout
        Gfx::get().one_time_exec(
            |cmd| {
                let barriers = [&lut, &sh1, &sh2]
                    .iter()
                    .map(|target| {
                        GfxImageBarrier::new()
                            .image(target.handle())
                            .image_aspect_flag(vk::ImageAspectFlags::COLOR)
                            .layout_transfer(vk::ImageLayout::UNDEFINED, vk::ImageLayout::GENERAL)
                            .src_mask(vk::PipelineStageFlags2::TOP_OF_PIPE, vk::AccessFlags2::empty())
                            .dst_mask(vk::PipelineStageFlags2::ALL_COMMANDS, vk::AccessFlags2::empty())
                    })
                    .collect_vec();
                cmd.image_memory_barrier(vk::DependencyFlags::empty(), &barriers);
            },
            "preintegrate-init-layout",
        );

        let sampler = GfxSampler::new(&GfxSamplerCreateInfo::new().clamp_to_edge(), "preintegrate");

        let fif = FrameCounter::fif_count() as u32;
        let descriptor_pool = GfxDescriptorPool::new(
            &GfxDescriptorPoolCreateInfo::new(
                vk::DescriptorPoolCreateFlags::empty(),
                2 + fif * 2,
                [PreintegrateComputeLayout::pool_sizes(2), PreintegrateDisplayLayout::pool_sizes(fif * 2)].concat(),
            ),
            "preintegrate",
        );

        // compute
        let compute_set_layout = GfxDescriptorSetLayout::<PreintegrateComputeLayout>::new(
            vk::DescriptorSetLayoutCreateFlags::empty(),
            "preintegrate-compute",
        );
        let compute_layout =
            Rc::new(GfxPipelineLayout::new(&[compute_set_layout.handle()], &[], "preintegrate-compute"));
        let compute_stage = |path: &str| GfxShaderStageInfo {
            stage: vk::ShaderStageFlags::COMPUTE,
            entry_point: c"main",
            path: VkxPath::shader_build_path_str(path),
        };
        let lut_pipeline = GfxComputePipeline::new(
            &compute_stage("preintegrate/scatter_lut.comp"),
            compute_layout.clone(),
            "preintegrate-lut",
        );
        let sh_pipeline =
            GfxComputePipeline::new(&compute_stage("preintegrate/scatter_sh.comp"), compute_layout, "preintegrate-sh");

        let lut_ubo = GfxStructuredBuffer::<PreintegrateUniform>::new_ubo(1, "preintegrate-lut");
        let sh_ubo = GfxStructuredBuffer::<PreintegrateUniform>::new_ubo(1, "preintegrate-sh");

        let lut_compute_set = GfxDescriptorSet::new(&descriptor_pool, &compute_set_layout, "preintegrate-lut");
        let sh_compute_set = GfxDescriptorSet::new(&descriptor_pool, &compute_set_layout, "preintegrate-sh");
        // scatter_lut.comp 只写 target0，target1 没有被静态使用，可以不写入
        let writes = [
            compute_set_writes(lut_compute_set.handle(), lut_ubo.descriptor_info(), &[lut.view()]),
            compute_set_writes(sh_compute_set.handle(), sh_ubo.descriptor_info(), &[sh1.view(), sh2.view()]),
        ]
        .concat();
        Gfx::get().gfx_device().write_descriptor_sets(&writes);

        // display
        let display_set_layout = GfxDescriptorSetLayout::<PreintegrateDisplayLayout>::new(
            vk::DescriptorSetLayoutCreateFlags::empty(),
            "preintegrate-display",
        );
        let display_layout =
            Rc::new(GfxPipelineLayout::new(&[display_set_layout.handle()], &[], "preintegrate-display"));
        let display_pipeline = |fragment: &str, name: &str| {
            let mut create_info = GfxGraphicsPipelineCreateInfo::default();
            create_info
                .vertex_shader_stage(VkxPath::shader_build_path_str("preintegrate/display.vert"), c"main")
                .fragment_shader_stage(VkxPath::shader_build_path_str(fragment), c"main")
                .vertex_layout::<VertexLayoutPosNormalUv>()
                .attach_info(vec![RENDER_TARGET_FORMAT], None, None)
                .cull_mode(vk::CullModeFlags::NONE, vk::FrontFace::COUNTER_CLOCKWISE);
            GfxGraphicsPipeline::new(&create_info, display_layout.clone(), name)
        };
        let lut_display_pipeline = display_pipeline("preintegrate/display_lut.frag", "preintegrate-display-lut");
        let sh_display_pipeline = display_pipeline("preintegrate/display_sh.frag", "preintegrate-display-sh");

        let sampled_info = |target: &RenderTarget| target.descriptor_image_info(sampler.handle(), vk::ImageLayout::GENERAL);
        let display_frames = FrameCounter::frame_labels()
            .iter()
            .map(|label| {
                let ubo = GfxStructuredBuffer::<DisplayUniform>::new_ubo(1, format!("preintegrate-display-{}", label));
                let lut_set =
                    GfxDescriptorSet::new(&descriptor_pool, &display_set_layout, format!("preintegrate-lut-{}", label));
                let sh_set =
                    GfxDescriptorSet::new(&descriptor_pool, &display_set_layout, format!("preintegrate-sh-{}", label));
                Gfx::get().gfx_device().write_descriptor_sets(&[
                    PreintegrateDisplayLayout::ubo().write_buffer(lut_set.handle(), 0, vec![ubo.descriptor_info()]),
                    PreintegrateDisplayLayout::tex0().write_image(lut_set.handle(), 0, vec![sampled_info(&lut)]),
                    PreintegrateDisplayLayout::tex1().write_image(lut_set.handle(), 0, vec![sampled_info(&lut)]),
                    PreintegrateDisplayLayout::ubo().write_buffer(sh_set.handle(), 0, vec![ubo.descriptor_info()]),
                    PreintegrateDisplayLayout::tex0().write_image(sh_set.handle(), 0, vec![sampled_info(&sh1)]),
                    PreintegrateDisplayLayout::tex1().write_image(sh_set.handle(), 0, vec![sampled_info(&sh2)]),
                ]);
                DisplayFrame { ubo, lut_set, sh_set }
            })
            .collect_vec();

        // 面朝 +Z 的 2x2 四边形
        let quad = Plane::mesh(2.0, 1.0)
            .transformed(glam::Mat4::from_rotation_x(std::f32::consts::FRAC_PI_2))
            .upload("preintegrate-quad");

        log::info!(
            "preintegrate pass created, lut {}x{}, compute queue family: {}",
            SCATTER_IMG_SIZE,
            SCATTER_IMG_SIZE,
            Gfx::get().compute_queue_family().name
        );

        Self {
            lut,
            sh1,
            sh2,
            sampler,
            lut_ubo,
            sh_ubo,
            lut_pipeline,
            sh_pipeline,
            lut_compute_set,
            sh_compute_set,
            _compute_set_layout: compute_set_layout,
            lut_display_pipeline,
            sh_display_pipeline,
            display_layout,
            display_frames,
            _display_set_layout: display_set_layout,
            quad,
            _descriptor_pool: descriptor_pool,
            bake_semaphore: GfxSemaphore::new("preintegrate-bake"),
            baked: None,
        }
    }
}
// draw
impl PreintegratePass {
    /// 参数变化时在 compute queue 上重新烘焙
    ///
    /// return: 是否提交了 compute 命令，需要在本帧的 graphics submit 中等待 [`Self::bake_semaphore`]
    fn bake_if_needed(&mut self, cmd_allocator: &mut CmdAllocator, frame_label: FrameLabel, params: PreintegrateParams) -> bool {
        if self.baked == Some(params) {
            return false;
        }

        // 之前的帧可能还在采样 LUT，UBO 也没有多份
        Gfx::get().gfx_queue().wait_idle();

        self.lut_ubo.write(&params.lut_uniform());
        self.sh_ubo.write(&params.sh_uniform());

        let cmd = cmd_allocator.alloc_compute_command_buffer(frame_label, "preintegrate-bake");
        cmd.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT, "preintegrate-bake");
        cmd.scope_label("scatter-lut", LabelColor::COLOR_COMPUTE, |cmd| {
            cmd.cmd_bind_pipeline(vk::PipelineBindPoint::COMPUTE, self.lut_pipeline.handle());
            cmd.bind_descriptor_sets(
                vk::PipelineBindPoint::COMPUTE,
                self.lut_pipeline.layout(),
                0,
                &[self.lut_compute_set.handle()],
                None,
            );
            cmd.cmd_dispatch(glam::uvec3(group_count(SCATTER_IMG_SIZE), group_count(SCATTER_IMG_SIZE), 1));
        });
        cmd.scope_label("scatter-sh", LabelColor::COLOR_COMPUTE, |cmd| {
            cmd.cmd_bind_pipeline(vk::PipelineBindPoint::COMPUTE, self.sh_pipeline.handle());
            cmd.bind_descriptor_sets(
                vk::PipelineBindPoint::COMPUTE,
                self.sh_pipeline.layout(),
                0,
                &[self.sh_compute_set.handle()],
                None,
            );
            cmd.cmd_dispatch(glam::uvec3(group_count(SCATTER_IMG_SIZE), 1, 1));
        });
        cmd.end();

        Gfx::get().compute_queue().submit(
            vec![GfxSubmitInfo::new(std::slice::from_ref(&cmd)).signal(
                &self.bake_semaphore,
                vk::PipelineStageFlags2::COMPUTE_SHADER,
            )],
            None,
        );

        log::info!("preintegrate lut baked: d = {:?}", params.d_steps());
        self.baked = Some(params);
        true
    }

    /// 左右两个视口各自使用一半窗口宽度
    fn half_rects(extent: vk::Extent2D) -> [vk::Rect2D; 2] {
        let half = extent.width / 2;
        let rect = |x: u32, width: u32| vk::Rect2D {
            offset: vk::Offset2D { x: x as i32, y: 0 },
            extent: vk::Extent2D {
                width,
                height: extent.height,
            },
        };
        [rect(0, half), rect(half, extent.width - half)]
    }

    pub fn draw(
        &mut self,
        cmd_allocator: &mut CmdAllocator,
        frame: &RenderFrame,
        camera: &Camera,
        params: PreintegrateParams,
    ) {
        let baked_this_frame = self.bake_if_needed(cmd_allocator, frame.frame_label, params);

        let display = &mut self.display_frames[*frame.frame_label];
        let mut projection_camera = camera.clone();
        projection_camera.set_aspect_ratio(frame.extent.width as f32 * 0.5 / frame.extent.height.max(1) as f32);
        display.ubo.write(&DisplayUniform {
            projection: projection_camera.get_projection_matrix(),
            model_view: camera.get_view_matrix() * glam::Mat4::from_scale(glam::Vec3::splat(1.5)),
        });

        let cmd = cmd_allocator.alloc_command_buffer(frame.frame_label, "preintegrate-display");
        cmd.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT, "preintegrate-display");
        self.record_display(&cmd, frame);
        cmd.end();

        let mut submit_info = GfxSubmitInfo::new(std::slice::from_ref(&cmd));
        if baked_this_frame {
            submit_info = submit_info.wait(&self.bake_semaphore, vk::PipelineStageFlags2::FRAGMENT_SHADER);
        }
        Gfx::get().gfx_queue().submit(vec![submit_info], None);
    }

    fn record_display(&self, cmd: &GfxCommandBuffer, frame: &RenderFrame) {
        let display = &self.display_frames[*frame.frame_label];

        // compute 写入对 fragment 采样可见
        let storage_barriers = [&self.lut, &self.sh1, &self.sh2]
            .iter()
            .map(|target| {
                GfxImageBarrier::new()
                    .image(target.handle())
                    .image_aspect_flag(vk::ImageAspectFlags::COLOR)
                    .layout_transfer(vk::ImageLayout::GENERAL, vk::ImageLayout::GENERAL)
                    .src_mask(vk::PipelineStageFlags2::COMPUTE_SHADER, vk::AccessFlags2::SHADER_STORAGE_WRITE)
                    .dst_mask(vk::PipelineStageFlags2::FRAGMENT_SHADER, vk::AccessFlags2::SHADER_SAMPLED_READ)
            })
            .chain(std::iter::once(frame.target_barrier()))
            .collect_vec();
        cmd.image_memory_barrier(vk::DependencyFlags::empty(), &storage_barriers);

        cmd.begin_label("preintegrate-display", LabelColor::COLOR_PASS);
        cmd.cmd_begin_rendering2(&GfxRenderingInfo::new_full(vec![frame.target_view], None, frame.extent));
        self.quad.bind(cmd);

        let [left, right] = Self::half_rects(frame.extent);
        for (rect, pipeline, set) in [
            (left, &self.lut_display_pipeline, &display.lut_set),
            (right, &self.sh_display_pipeline, &display.sh_set),
        ] {
            cmd.cmd_set_viewport_rect(rect);
            cmd.cmd_bind_pipeline(vk::PipelineBindPoint::GRAPHICS, pipeline.handle());
            cmd.bind_descriptor_sets(
                vk::PipelineBindPoint::GRAPHICS,
                self.display_layout.handle(),
                0,
                &[set.handle()],
                None,
            );
            cmd.draw_indexed(self.quad.index_cnt(), 0, 1, 0, 0);
        }

        cmd.end_rendering();
        cmd.end_label();
    }
}
// destroy
impl PreintegratePass {
    pub fn destroy(self) {
        self.bake_semaphore.destroy();
        self.lut.destroy();
        self.sh1.destroy();
        self.sh2.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_params() -> PreintegrateParams {
        PreintegrateParams::from(&SubsurfaceConfig::default())
    }

    #[test]
    fn d_steps_of_default_params() {
        let d = default_params().d_steps();
        // albedo = (0.3, 0.2, 1.0)
        let s = glam::vec3(
            3.5 + 100.0 * 0.03f32.powi(4),
            3.5 + 100.0 * 0.13f32.powi(4),
            3.5 + 100.0 * 0.67f32.powi(4),
        );
        let expected = glam::vec3(5.0, 5.0, 10.0) / s;
        assert!((d.truncate() - expected).abs().max_element() < 1e-4);
        assert_eq!(d.w, 0.001);
    }

    #[test]
    fn degenerate_inputs_are_clamped() {
        let params = PreintegrateParams {
            scatter_color: glam::Vec3::splat(-1.0),
            scatter_distance: glam::Vec3::ZERO,
        };
        let d = params.d_steps();
        assert_eq!(d.truncate(), glam::Vec3::splat(0.001));
    }

    #[test]
    fn uniforms_and_dispatch() {
        let params = default_params();
        assert_eq!(params.lut_uniform().tex_size, glam::vec4(1.0 / 512.0, 1.0 / 512.0, 512.0, 512.0));
        assert_eq!(params.sh_uniform().tex_size, glam::vec4(1.0 / 512.0, 1.0, 512.0, 1.0));
        assert_eq!(group_count(SCATTER_IMG_SIZE), 32);
        assert_eq!(group_count(1), 1);
        assert_eq!(group_count(17), 2);
    }

    #[test]
    fn lut_bake_binds_only_its_own_target() {
        let lut =
            compute_set_writes(vk::DescriptorSet::null(), vk::DescriptorBufferInfo::default(), &[vk::ImageView::null()]);
        assert_eq!(lut.iter().map(|w| w.dst_binding).collect_vec(), vec![0, 1]);
        assert_eq!(lut[1].descriptor_type, vk::DescriptorType::STORAGE_IMAGE);
        assert_eq!(lut[1].image_infos[0].image_layout, vk::ImageLayout::GENERAL);

        let sh = compute_set_writes(
            vk::DescriptorSet::null(),
            vk::DescriptorBufferInfo::default(),
            &[vk::ImageView::null(), vk::ImageView::null()],
        );
        assert_eq!(sh.iter().map(|w| w.dst_binding).collect_vec(), vec![0, 1, 2]);
        assert_eq!(sh[0].descriptor_type, vk::DescriptorType::UNIFORM_BUFFER);
    }

    #[test]
    fn half_rects_cover_width() {
        let [left, right] = PreintegratePass::half_rects(vk::Extent2D {
            width: 1281,
            height: 720,
        });
        assert_eq!(left.extent.width + right.extent.width, 1281);
        assert_eq!(right.offset.x as u32, left.extent.width);
        assert_eq!(left.extent.height, 720);
    }
}

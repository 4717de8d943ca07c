//! 屏幕空间次表面模糊
//!
//! - SSSS：可分离卷积，先水平再竖直，共两个 pass
//! - Burley：按归一化扩散剖面做圆盘重要性采样，单个 pass
//!
//! 两种方式都只模糊 albedo alpha 为 1 的皮肤像素

use std::rc::Rc;

use ash::vk;
use itertools::Itertools;
use vkx_descriptor_layout_macro::DescriptorLayout;
use vkx_descriptor_layout_trait::DescriptorBindingLayout;
use vkx_gfx::{
    basic::color::LabelColor,
    commands::command_buffer::GfxCommandBuffer,
    descriptors::{
        descriptor::{GfxDescriptorSet, GfxDescriptorSetLayout},
        descriptor_cursor::GfxDescriptorCursor,
        descriptor_pool::{GfxDescriptorPool, GfxDescriptorPoolCreateInfo},
        sampler::{GfxSampler, GfxSamplerCreateInfo},
    },
    gfx::Gfx,
    pipelines::{graphics_pipeline::GfxPipelineLayout, rendering_info::GfxRenderingInfo},
    resources::special_buffers::structured_buffer::GfxStructuredBuffer,
};
use vkx_render_interface::{frame_counter::FrameCounter, pipeline_settings::FrameLabel};

use crate::{
    outer_app::subsurface::{
        SssMode,
        burley::BurleyParams,
        gbuffer_pass::GBuffer,
        ssss_kernel::{SsssDirection, SsssParams},
    },
    renderer::{fullscreen::FullscreenPipeline, render_target::RenderTarget},
};

const BLUR_FORMAT: vk::Format = vk::Format::B8G8R8A8_UNORM;

#[derive(DescriptorLayout)]
struct BlurDescriptorLayout {
    #[binding = 0]
    #[descriptor_type = "UNIFORM_BUFFER"]
    #[stage = "FRAGMENT"]
    _params: (),

    #[binding = 1]
    #[descriptor_type = "COMBINED_IMAGE_SAMPLER"]
    #[stage = "FRAGMENT"]
    _color: (),

    #[binding = 2]
    #[descriptor_type = "COMBINED_IMAGE_SAMPLER"]
    #[stage = "FRAGMENT"]
    _depth: (),

    #[binding = 3]
    #[descriptor_type = "COMBINED_IMAGE_SAMPLER"]
    #[stage = "FRAGMENT"]
    _mask: (),
}

struct BlurFrame {
    ssss_ubo: GfxStructuredBuffer<SsssParams>,
    burley_ubo: GfxStructuredBuffer<BurleyParams>,
    /// 读取 diffuse，写入 `blur_x`
    ssss_x_set: GfxDescriptorSet<BlurDescriptorLayout>,
    /// 读取 `blur_x`，写入 `blurred`
    ssss_y_set: GfxDescriptorSet<BlurDescriptorLayout>,
    /// 读取 diffuse，写入 `blurred`
    burley_set: GfxDescriptorSet<BlurDescriptorLayout>,
}

/// SSSS 先横向写入 blur_x，再纵向写入 blurred；Burley 一次写入 blurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlurStep {
    SsssX,
    SsssY,
    Burley,
}

pub struct BlurPass {
    blur_x: RenderTarget,
    blurred: RenderTarget,

    ssss_pipeline: FullscreenPipeline,
    burley_pipeline: FullscreenPipeline,
    pipeline_layout: Rc<GfxPipelineLayout>,
    frames: Vec<BlurFrame>,

    _linear_sampler: GfxSampler,
    _point_sampler: GfxSampler,
    _set_layout: GfxDescriptorSetLayout<BlurDescriptorLayout>,
    _descriptor_pool: GfxDescriptorPool,
}
// new & init
impl BlurPass {
    pub fn new(gbuffer: &GBuffer, diffuse: &RenderTarget) -> Self {
        let extent = GBuffer::extent();
        let blur_x = RenderTarget::new_color(extent, BLUR_FORMAT, "sss-blur-x");
        let blurred = RenderTarget::new_color(extent, BLUR_FORMAT, "sss-blurred");

        let fif = FrameCounter::fif_count() as u32;
        let descriptor_pool = GfxDescriptorPool::new(
            &GfxDescriptorPoolCreateInfo::new(
                vk::DescriptorPoolCreateFlags::empty(),
                fif * 3,
                BlurDescriptorLayout::pool_sizes(fif * 3),
            ),
            "sss-blur",
        );
        let set_layout =
            GfxDescriptorSetLayout::<BlurDescriptorLayout>::new(vk::DescriptorSetLayoutCreateFlags::empty(), "sss-blur");
        let pipeline_layout = Rc::new(GfxPipelineLayout::new(
            &[set_layout.handle()],
            &[vk::PushConstantRange::default()
                .stage_flags(vk::ShaderStageFlags::FRAGMENT)
                .offset(0)
                .size(size_of::<SsssDirection>() as u32)],
            "sss-blur",
        ));
        let ssss_pipeline =
            FullscreenPipeline::new("sss/ssss_blur.frag", pipeline_layout.clone(), vec![BLUR_FORMAT], "sss-ssss");
        let burley_pipeline =
            FullscreenPipeline::new("sss/burley_blur.frag", pipeline_layout.clone(), vec![BLUR_FORMAT], "sss-burley");

        let linear_sampler = GfxSampler::new(&GfxSamplerCreateInfo::new().clamp_to_edge(), "sss-blur-linear");
        let point_sampler = GfxSampler::new(&GfxSamplerCreateInfo::new().clamp_to_edge().nearest(), "sss-blur-point");

        let color_info = |t: &RenderTarget| t.descriptor_image_info(linear_sampler.handle(), t.sampled_layout());
        let point_info = |t: &RenderTarget| t.descriptor_image_info(point_sampler.handle(), t.sampled_layout());
        let write_set = |set: &GfxDescriptorSet<BlurDescriptorLayout>, ubo: vk::DescriptorBufferInfo, color: &RenderTarget| {
            Gfx::get().gfx_device().write_descriptor_sets(&[
                BlurDescriptorLayout::params().write_buffer(set.handle(), 0, vec![ubo]),
                BlurDescriptorLayout::color().write_image(set.handle(), 0, vec![color_info(color)]),
                BlurDescriptorLayout::depth().write_image(set.handle(), 0, vec![point_info(&gbuffer.depth)]),
                BlurDescriptorLayout::mask().write_image(set.handle(), 0, vec![point_info(&gbuffer.albedo)]),
            ]);
        };

        let frames = FrameCounter::frame_labels()
            .iter()
            .map(|label| {
                let ssss_ubo = GfxStructuredBuffer::<SsssParams>::new_ubo(1, format!("sss-ssss-{}", label));
                let burley_ubo = GfxStructuredBuffer::<BurleyParams>::new_ubo(1, format!("sss-burley-{}", label));
                let new_set = |name: &str| {
                    GfxDescriptorSet::new(&descriptor_pool, &set_layout, format!("sss-{}-{}", name, label))
                };
                let frame = BlurFrame {
                    ssss_x_set: new_set("ssss-x"),
                    ssss_y_set: new_set("ssss-y"),
                    burley_set: new_set("burley"),
                    ssss_ubo,
                    burley_ubo,
                };
                write_set(&frame.ssss_x_set, frame.ssss_ubo.descriptor_info(), diffuse);
                write_set(&frame.ssss_y_set, frame.ssss_ubo.descriptor_info(), &blur_x);
                write_set(&frame.burley_set, frame.burley_ubo.descriptor_info(), diffuse);
                frame
            })
            .collect_vec();

        Self {
            blur_x,
            blurred,
            ssss_pipeline,
            burley_pipeline,
            pipeline_layout,
            frames,
            _linear_sampler: linear_sampler,
            _point_sampler: point_sampler,
            _set_layout: set_layout,
            _descriptor_pool: descriptor_pool,
        }
    }
}
// getters
impl BlurPass {
    /// 模糊后的 diffuse，处于采样 layout
    #[inline]
    pub fn blurred(&self) -> &RenderTarget {
        &self.blurred
    }
}
// draw
impl BlurPass {
    pub fn update_ssss(&mut self, frame_label: FrameLabel, params: &SsssParams) {
        self.frames[*frame_label].ssss_ubo.write(params);
    }

    pub fn update_burley(&mut self, frame_label: FrameLabel, params: &BurleyParams) {
        self.frames[*frame_label].burley_ubo.write(params);
    }

    fn blur_into(
        &self,
        cmd: &GfxCommandBuffer,
        target: &RenderTarget,
        pipeline: &FullscreenPipeline,
        set: vk::DescriptorSet,
        direction: Option<SsssDirection>,
    ) {
        let extent = GBuffer::extent();
        cmd.image_memory_barrier(vk::DependencyFlags::empty(), &[target.barrier_to_attachment()]);
        cmd.cmd_begin_rendering2(&GfxRenderingInfo::new_full(vec![target.view()], None, extent));
        cmd.cmd_set_viewport_scissor(extent);
        if let Some(direction) = direction {
            cmd.cmd_push_constants(
                self.pipeline_layout.handle(),
                vk::ShaderStageFlags::FRAGMENT,
                0,
                bytemuck::bytes_of(&direction),
            );
        }
        pipeline.draw(cmd, &[set]);
        cmd.end_rendering();
        cmd.image_memory_barrier(vk::DependencyFlags::empty(), &[target.barrier_to_sampled()]);
    }

    /// 预积分模式不经过模糊，调用时直接返回
    pub fn record(&self, cmd: &GfxCommandBuffer, frame_label: FrameLabel, mode: SssMode) {
        let frame = &self.frames[*frame_label];
        for step in Self::steps(mode) {
            match step {
                BlurStep::SsssX => cmd.scope_label("ssss-blur-x", LabelColor::COLOR_PASS, |cmd| {
                    let set = frame.ssss_x_set.handle();
                    self.blur_into(cmd, &self.blur_x, &self.ssss_pipeline, set, Some(SsssDirection::X));
                }),
                BlurStep::SsssY => cmd.scope_label("ssss-blur-y", LabelColor::COLOR_PASS, |cmd| {
                    let set = frame.ssss_y_set.handle();
                    self.blur_into(cmd, &self.blurred, &self.ssss_pipeline, set, Some(SsssDirection::Y));
                }),
                BlurStep::Burley => cmd.scope_label("burley-blur", LabelColor::COLOR_PASS, |cmd| {
                    self.blur_into(cmd, &self.blurred, &self.burley_pipeline, frame.burley_set.handle(), None);
                }),
            }
        }
    }

    /// 各模式下依次执行的模糊
    pub fn steps(mode: SssMode) -> &'static [BlurStep] {
        match mode {
            SssMode::Ssss => &[BlurStep::SsssX, BlurStep::SsssY],
            SssMode::Burley => &[BlurStep::Burley],
            SssMode::Preintegrate => {
                log::error!("blur pass is not used in {:?} mode", mode);
                &[]
            }
        }
    }
}
// destroy
impl BlurPass {
    pub fn destroy(self) {
        self.blur_x.destroy();
        self.blurred.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_follow_mode() {
        assert_eq!(BlurPass::steps(SssMode::Ssss), &[BlurStep::SsssX, BlurStep::SsssY]);
        assert_eq!(BlurPass::steps(SssMode::Burley), &[BlurStep::Burley]);
    }

    #[test]
    fn preintegrate_records_no_blur() {
        assert!(BlurPass::steps(SssMode::Preintegrate).is_empty());
    }
}

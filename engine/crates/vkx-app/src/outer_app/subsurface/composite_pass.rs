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
};

use crate::{
    outer_app::subsurface::DebugTarget,
    renderer::{
        fullscreen::FullscreenPipeline,
        render_target::RenderTarget,
        renderer::{RENDER_TARGET_FORMAT, RenderFrame},
    },
};

#[derive(DescriptorLayout)]
struct CompositeDescriptorLayout {
    #[binding = 0]
    #[descriptor_type = "COMBINED_IMAGE_SAMPLER"]
    #[stage = "FRAGMENT"]
    _blurred: (),

    #[binding = 1]
    #[descriptor_type = "COMBINED_IMAGE_SAMPLER"]
    #[stage = "FRAGMENT"]
    _diffuse: (),

    #[binding = 2]
    #[descriptor_type = "COMBINED_IMAGE_SAMPLER"]
    #[stage = "FRAGMENT"]
    _specular: (),
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CompositePushConstant {
    pub debug_target: i32,
    _padding: [i32; 3],
}

impl CompositePushConstant {
    pub fn new(debug_target: DebugTarget) -> Self {
        Self {
            debug_target: debug_target as i32,
            _padding: [0; 3],
        }
    }
}

/// 模糊后的 diffuse 与 specular 相加，写入本帧的 render target
///
/// 调试视图时直接输出 lighting pass 写入 diffuse 的内容
pub struct CompositePass {
    pipeline: FullscreenPipeline,
    pipeline_layout: Rc<GfxPipelineLayout>,
    set: GfxDescriptorSet<CompositeDescriptorLayout>,
    _sampler: GfxSampler,
    _set_layout: GfxDescriptorSetLayout<CompositeDescriptorLayout>,
    _descriptor_pool: GfxDescriptorPool,
}
// new & init
impl CompositePass {
    pub fn new(blurred: &RenderTarget, diffuse: &RenderTarget, specular: &RenderTarget) -> Self {
        let descriptor_pool = GfxDescriptorPool::new(
            &GfxDescriptorPoolCreateInfo::new(
                vk::DescriptorPoolCreateFlags::empty(),
                1,
                CompositeDescriptorLayout::pool_sizes(1),
            ),
            "sss-composite",
        );
        let set_layout = GfxDescriptorSetLayout::<CompositeDescriptorLayout>::new(
            vk::DescriptorSetLayoutCreateFlags::empty(),
            "sss-composite",
        );
        let pipeline_layout = Rc::new(GfxPipelineLayout::new(
            &[set_layout.handle()],
            &[vk::PushConstantRange::default()
                .stage_flags(vk::ShaderStageFlags::FRAGMENT)
                .offset(0)
                .size(size_of::<CompositePushConstant>() as u32)],
            "sss-composite",
        ));
        let pipeline = FullscreenPipeline::new(
            "sss/composite.frag",
            pipeline_layout.clone(),
            vec![RENDER_TARGET_FORMAT],
            "sss-composite",
        );

        // 输入的所有 attachment 都不会随帧变化，一个 set 就够了
        let sampler = GfxSampler::new(&GfxSamplerCreateInfo::new().clamp_to_edge(), "sss-composite");
        let set = GfxDescriptorSet::new(&descriptor_pool, &set_layout, "sss-composite");
        let info = |t: &RenderTarget| t.descriptor_image_info(sampler.handle(), t.sampled_layout());
        Gfx::get().gfx_device().write_descriptor_sets(&[
            CompositeDescriptorLayout::blurred().write_image(set.handle(), 0, vec![info(blurred)]),
            CompositeDescriptorLayout::diffuse().write_image(set.handle(), 0, vec![info(diffuse)]),
            CompositeDescriptorLayout::specular().write_image(set.handle(), 0, vec![info(specular)]),
        ]);

        Self {
            pipeline,
            pipeline_layout,
            set,
            _sampler: sampler,
            _set_layout: set_layout,
            _descriptor_pool: descriptor_pool,
        }
    }
}
// draw
impl CompositePass {
    pub fn record(&self, cmd: &GfxCommandBuffer, frame: &RenderFrame, debug_target: DebugTarget) {
        cmd.image_memory_barrier(vk::DependencyFlags::empty(), &[frame.target_barrier()]);

        cmd.scope_label("sss-composite", LabelColor::COLOR_PASS, |cmd| {
            cmd.cmd_begin_rendering2(&GfxRenderingInfo::new_full(vec![frame.target_view], None, frame.extent));
            cmd.cmd_set_viewport_scissor(frame.extent);
            cmd.cmd_push_constants(
                self.pipeline_layout.handle(),
                vk::ShaderStageFlags::FRAGMENT,
                0,
                bytemuck::bytes_of(&CompositePushConstant::new(debug_target)),
            );
            self.pipeline.draw(cmd, &[self.set.handle()]);
            cmd.end_rendering();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_constant_is_one_vec4() {
        assert_eq!(size_of::<CompositePushConstant>(), 16);
        assert_eq!(CompositePushConstant::new(DebugTarget::Specular).debug_target, 4);
        assert_eq!(CompositePushConstant::new(DebugTarget::Final).debug_target, 0);
    }
}

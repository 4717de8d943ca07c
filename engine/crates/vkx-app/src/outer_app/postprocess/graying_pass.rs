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
    outer_app::postprocess::TintParams,
    renderer::{
        fullscreen::FullscreenPipeline,
        render_target::RenderTarget,
        renderer::{RENDER_TARGET_FORMAT, RenderFrame},
    },
};

#[derive(DescriptorLayout)]
struct GrayingDescriptorLayout {
    #[binding = 0]
    #[descriptor_type = "UNIFORM_BUFFER"]
    #[stage = "FRAGMENT"]
    _tint: (),

    #[binding = 1]
    #[descriptor_type = "COMBINED_IMAGE_SAMPLER"]
    #[stage = "FRAGMENT"]
    _scene: (),
}

struct GrayingFrame {
    tint: GfxStructuredBuffer<TintParams>,
    set: GfxDescriptorSet<GrayingDescriptorLayout>,
}

/// 采样离屏 color，转为灰度后乘上 tint，写入本帧的 render target
pub struct GrayingPass {
    pipeline: FullscreenPipeline,
    frames: Vec<GrayingFrame>,
    sampler: GfxSampler,

    _pipeline_layout: Rc<GfxPipelineLayout>,
    _set_layout: GfxDescriptorSetLayout<GrayingDescriptorLayout>,
    _descriptor_pool: GfxDescriptorPool,
}
// new & init
impl GrayingPass {
    pub fn new(scene: &RenderTarget) -> Self {
        let fif = FrameCounter::fif_count() as u32;
        let descriptor_pool = GfxDescriptorPool::new(
            &GfxDescriptorPoolCreateInfo::new(
                vk::DescriptorPoolCreateFlags::empty(),
                fif,
                GrayingDescriptorLayout::pool_sizes(fif),
            ),
            "postprocess-graying",
        );
        let set_layout = GfxDescriptorSetLayout::<GrayingDescriptorLayout>::new(
            vk::DescriptorSetLayoutCreateFlags::empty(),
            "postprocess-graying",
        );
        let pipeline_layout = Rc::new(GfxPipelineLayout::new(&[set_layout.handle()], &[], "postprocess-graying"));
        let pipeline = FullscreenPipeline::new(
            "postprocess/graying.frag",
            pipeline_layout.clone(),
            vec![RENDER_TARGET_FORMAT],
            "postprocess-graying",
        );
        let sampler = GfxSampler::new(&GfxSamplerCreateInfo::new().clamp_to_edge(), "postprocess-graying");

        let frames = FrameCounter::frame_labels()
            .iter()
            .map(|label| {
                let tint = GfxStructuredBuffer::<TintParams>::new_ubo(1, format!("postprocess-tint-{}", label));
                let set = GfxDescriptorSet::new(&descriptor_pool, &set_layout, format!("postprocess-graying-{}", label));
                Gfx::get().gfx_device().write_descriptor_sets(&[GrayingDescriptorLayout::tint().write_buffer(
                    set.handle(),
                    0,
                    vec![tint.descriptor_info()],
                )]);
                GrayingFrame { tint, set }
            })
            .collect_vec();

        let pass = Self {
            pipeline,
            frames,
            sampler,
            _pipeline_layout: pipeline_layout,
            _set_layout: set_layout,
            _descriptor_pool: descriptor_pool,
        };
        pass.bind_scene(scene);
        pass
    }

    /// 离屏 color 重建之后重新写入 descriptor，调用时不能有正在执行的命令引用旧的 set
    pub fn bind_scene(&self, scene: &RenderTarget) {
        let info = scene.descriptor_image_info(self.sampler.handle(), scene.sampled_layout());
        let writes = self
            .frames
            .iter()
            .map(|frame| GrayingDescriptorLayout::scene().write_image(frame.set.handle(), 0, vec![info]))
            .collect_vec();
        Gfx::get().gfx_device().write_descriptor_sets(&writes);
    }
}
// update
impl GrayingPass {
    pub fn update(&mut self, frame_label: FrameLabel, tint: [f32; 3]) {
        self.frames[*frame_label].tint.write(&TintParams::new(tint));
    }
}
// draw
impl GrayingPass {
    pub fn record(&self, cmd: &GfxCommandBuffer, frame: &RenderFrame) {
        cmd.image_memory_barrier(vk::DependencyFlags::empty(), &[frame.target_barrier()]);
        cmd.scope_label("postprocess-graying", LabelColor::COLOR_PASS, |cmd| {
            cmd.cmd_begin_rendering2(&GfxRenderingInfo::new_full(vec![frame.target_view], None, frame.extent));
            cmd.cmd_set_viewport_scissor(frame.extent);
            self.pipeline.draw(cmd, &[self.frames[*frame.frame_label].set.handle()]);
            cmd.end_rendering();
        });
    }
}

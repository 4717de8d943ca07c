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
        sampler::GfxSamplerCreateInfo,
    },
    gfx::Gfx,
    pipelines::{graphics_pipeline::GfxPipelineLayout, rendering_info::GfxRenderingInfo},
    resources::{special_buffers::structured_buffer::GfxStructuredBuffer, texture::GfxTexture2D},
};
use vkx_render_interface::{frame_counter::FrameCounter, pipeline_settings::FrameLabel};

use crate::{
    outer_app::stochastic_filter::{FilterMode, RandomParams},
    renderer::{
        fullscreen::FullscreenPipeline,
        renderer::{RENDER_TARGET_FORMAT, RenderFrame},
    },
    scene::textures::{random_rgba8, value_noise_rgba8},
};

const COLOR_TEXTURE_SIZE: u32 = 64;
const RANDOM_TEXTURE_SIZE: u32 = 256;

#[derive(DescriptorLayout)]
struct StochasticDescriptorLayout {
    #[binding = 0]
    #[descriptor_type = "UNIFORM_BUFFER"]
    #[stage = "FRAGMENT"]
    _params: (),

    #[binding = 1]
    #[descriptor_type = "COMBINED_IMAGE_SAMPLER"]
    #[stage = "FRAGMENT"]
    _random: (),

    #[binding = 2]
    #[descriptor_type = "COMBINED_IMAGE_SAMPLER"]
    #[stage = "FRAGMENT"]
    _color: (),
}

struct StochasticFrame {
    params: GfxStructuredBuffer<RandomParams>,
    set: GfxDescriptorSet<StochasticDescriptorLayout>,
}

/// 两条全屏管线共享同一个 layout 和 descriptor set，每帧只绑定其中一条
pub struct StochasticPass {
    fis: FullscreenPipeline,
    catmull_rom: FullscreenPipeline,
    frames: Vec<StochasticFrame>,

    color_texture: Option<GfxTexture2D>,
    random_texture: Option<GfxTexture2D>,

    _pipeline_layout: Rc<GfxPipelineLayout>,
    _set_layout: GfxDescriptorSetLayout<StochasticDescriptorLayout>,
    _descriptor_pool: GfxDescriptorPool,
}
// new & init
impl StochasticPass {
    pub fn new() -> Self {
        // shader 中通过 texelFetch 读取，sampler 只用来满足 descriptor 的要求
        let color_texture = GfxTexture2D::from_rgba8(
            COLOR_TEXTURE_SIZE,
            COLOR_TEXTURE_SIZE,
            1,
            &value_noise_rgba8(COLOR_TEXTURE_SIZE, 3, 21),
            &GfxSamplerCreateInfo::new().nearest(),
            "stochastic-color",
        );
        let random_texture = GfxTexture2D::from_rgba8(
            RANDOM_TEXTURE_SIZE,
            RANDOM_TEXTURE_SIZE,
            1,
            &random_rgba8(RANDOM_TEXTURE_SIZE, 7),
            &GfxSamplerCreateInfo::new().nearest(),
            "stochastic-random",
        );

        let fif = FrameCounter::fif_count() as u32;
        let descriptor_pool = GfxDescriptorPool::new(
            &GfxDescriptorPoolCreateInfo::new(
                vk::DescriptorPoolCreateFlags::empty(),
                fif,
                StochasticDescriptorLayout::pool_sizes(fif),
            ),
            "stochastic",
        );
        let set_layout =
            GfxDescriptorSetLayout::<StochasticDescriptorLayout>::new(vk::DescriptorSetLayoutCreateFlags::empty(), "stochastic");
        let pipeline_layout = Rc::new(GfxPipelineLayout::new(&[set_layout.handle()], &[], "stochastic"));

        let pipeline = |mode: FilterMode| {
            FullscreenPipeline::new(
                mode.fragment_shader(),
                pipeline_layout.clone(),
                vec![RENDER_TARGET_FORMAT],
                mode.label(),
            )
        };
        let fis = pipeline(FilterMode::Fis);
        let catmull_rom = pipeline(FilterMode::CatmullRom);

        let frames = FrameCounter::frame_labels()
            .iter()
            .map(|label| {
                let params = GfxStructuredBuffer::<RandomParams>::new_ubo(1, format!("stochastic-params-{}", label));
                let set = GfxDescriptorSet::new(&descriptor_pool, &set_layout, format!("stochastic-{}", label));
                Gfx::get().gfx_device().write_descriptor_sets(&[
                    StochasticDescriptorLayout::params().write_buffer(set.handle(), 0, vec![params.descriptor_info()]),
                    StochasticDescriptorLayout::random().write_image(
                        set.handle(),
                        0,
                        vec![random_texture.descriptor_image_info()],
                    ),
                    StochasticDescriptorLayout::color().write_image(
                        set.handle(),
                        0,
                        vec![color_texture.descriptor_image_info()],
                    ),
                ]);
                StochasticFrame { params, set }
            })
            .collect_vec();

        Self {
            fis,
            catmull_rom,
            frames,
            color_texture: Some(color_texture),
            random_texture: Some(random_texture),
            _pipeline_layout: pipeline_layout,
            _set_layout: set_layout,
            _descriptor_pool: descriptor_pool,
        }
    }
}
// update
impl StochasticPass {
    pub fn update(&mut self, frame_label: FrameLabel, params: &RandomParams) {
        self.frames[*frame_label].params.write(params);
    }
}
// draw
impl StochasticPass {
    pub fn record(&self, cmd: &GfxCommandBuffer, frame: &RenderFrame, mode: FilterMode) {
        let pipeline = match mode {
            FilterMode::Fis => &self.fis,
            FilterMode::CatmullRom => &self.catmull_rom,
        };

        cmd.image_memory_barrier(vk::DependencyFlags::empty(), &[frame.target_barrier()]);
        cmd.scope_label(mode.label(), LabelColor::COLOR_PASS, |cmd| {
            cmd.cmd_begin_rendering2(&GfxRenderingInfo::new_full(vec![frame.target_view], None, frame.extent));
            cmd.cmd_set_viewport_scissor(frame.extent);
            pipeline.draw(cmd, &[self.frames[*frame.frame_label].set.handle()]);
            cmd.end_rendering();
        });
    }
}
// destroy
impl StochasticPass {
    pub fn destroy(mut self) {
        if let Some(texture) = self.color_texture.take() {
            texture.destroy();
        }
        if let Some(texture) = self.random_texture.take() {
            texture.destroy();
        }
    }
}

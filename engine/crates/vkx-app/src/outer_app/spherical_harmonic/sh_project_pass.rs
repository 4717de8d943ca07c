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
    pipelines::{compute_pipeline::GfxComputePipeline, graphics_pipeline::GfxPipelineLayout, shader::GfxShaderStageInfo},
    resources::{special_buffers::structured_buffer::GfxStructuredBuffer, texture::GfxTextureCube},
};
use vkx_render_interface::{frame_counter::FrameCounter, pipeline_settings::FrameLabel};

use crate::{
    outer_app::spherical_harmonic::{ShControl, ShSampleTable},
    renderer::queue_transfer::{QueueFamilies, QueueTransfer},
};

#[derive(DescriptorLayout)]
struct ShProjectDescriptorLayout {
    #[binding = 0]
    #[descriptor_type = "STORAGE_BUFFER"]
    #[stage = "COMPUTE"]
    _coefficients: (),

    #[binding = 1]
    #[descriptor_type = "COMBINED_IMAGE_SAMPLER"]
    #[stage = "COMPUTE"]
    _environment: (),

    #[binding = 2]
    #[descriptor_type = "UNIFORM_BUFFER"]
    #[stage = "COMPUTE"]
    _samples: (),
}

/// SH 投影：每个 frame in flight 一份系数 buffer
pub struct ShProjectPass {
    pipeline: GfxComputePipeline,
    coefficients: Vec<GfxStructuredBuffer<glam::Vec4>>,
    transfers: Vec<QueueTransfer>,
    sets: Vec<GfxDescriptorSet<ShProjectDescriptorLayout>>,
    _sample_ubo: GfxStructuredBuffer<glam::Vec4>,
    control: ShControl,

    _set_layout: GfxDescriptorSetLayout<ShProjectDescriptorLayout>,
    _descriptor_pool: GfxDescriptorPool,
}
// new & init
impl ShProjectPass {
    pub fn new(environment: &GfxTextureCube, band: u32, sample_count: u32, seed: u64) -> Self {
        let table = ShSampleTable::generate(sample_count, seed);
        let sample_data = table.uniform_data(band);
        let control = ShControl(sample_data[0]);
        let mut sample_ubo = GfxStructuredBuffer::<glam::Vec4>::new_ubo(sample_data.len(), "sh-samples");
        sample_ubo.transfer_data_by_mmap(&sample_data);
        log::info!(
            "sh projection: band {}, {} coefficients, {} samples",
            band,
            control.coefficient_count(),
            table.sample_count
        );

        let fif = FrameCounter::fif_count() as u32;
        let descriptor_pool = GfxDescriptorPool::new(
            &GfxDescriptorPoolCreateInfo::new(
                vk::DescriptorPoolCreateFlags::empty(),
                fif,
                ShProjectDescriptorLayout::pool_sizes(fif),
            ),
            "sh-project",
        );
        let set_layout = GfxDescriptorSetLayout::<ShProjectDescriptorLayout>::new(
            vk::DescriptorSetLayoutCreateFlags::empty(),
            "sh-project",
        );
        let pipeline_layout = Rc::new(GfxPipelineLayout::new(&[set_layout.handle()], &[], "sh-project"));
        let pipeline = GfxComputePipeline::new(
            &GfxShaderStageInfo {
                stage: vk::ShaderStageFlags::COMPUTE,
                entry_point: c"main",
                path: VkxPath::shader_build_path_str("sh/sh_project.comp"),
            },
            pipeline_layout,
            "sh-project",
        );

        let coefficients = FrameCounter::frame_labels()
            .iter()
            .map(|label| {
                GfxStructuredBuffer::<glam::Vec4>::new_ssbo(
                    control.coefficient_count() as usize,
                    vk::BufferUsageFlags::empty(),
                    format!("sh-coefficients-{}", label),
                )
            })
            .collect_vec();
        let sets = FrameCounter::frame_labels()
            .iter()
            .zip(&coefficients)
            .map(|(label, coefficient_buffer)| {
                let set = GfxDescriptorSet::new(&descriptor_pool, &set_layout, format!("sh-project-{}", label));
                Gfx::get().gfx_device().write_descriptor_sets(&[
                    ShProjectDescriptorLayout::coefficients().write_buffer(
                        set.handle(),
                        0,
                        vec![coefficient_buffer.descriptor_info()],
                    ),
                    ShProjectDescriptorLayout::environment().write_image(
                        set.handle(),
                        0,
                        vec![environment.descriptor_image_info()],
                    ),
                    ShProjectDescriptorLayout::samples().write_buffer(set.handle(), 0, vec![sample_ubo.descriptor_info()]),
                ]);
                set
            })
            .collect_vec();

        Self {
            pipeline,
            transfers: vec![QueueTransfer::new(QueueFamilies::current()); coefficients.len()],
            coefficients,
            sets,
            _sample_ubo: sample_ubo,
            control,
            _set_layout: set_layout,
            _descriptor_pool: descriptor_pool,
        }
    }
}
// getters
impl ShProjectPass {
    #[inline]
    pub fn control(&self) -> ShControl {
        self.control
    }

    #[inline]
    pub fn coefficients(&self, frame_label: FrameLabel) -> &GfxStructuredBuffer<glam::Vec4> {
        &self.coefficients[*frame_label]
    }
}
// draw
impl ShProjectPass {
    /// 在 compute queue 上录制投影
    pub fn record_project(&mut self, cmd: &GfxCommandBuffer, frame_label: FrameLabel) {
        let buffer = self.coefficients[*frame_label].vk_buffer();
        let transfer = &mut self.transfers[*frame_label];
        transfer.acquire_for_compute(
            cmd,
            buffer,
            vk::PipelineStageFlags2::COMPUTE_SHADER,
            vk::AccessFlags2::SHADER_STORAGE_WRITE,
        );

        cmd.scope_label("sh-project", LabelColor::COLOR_COMPUTE, |cmd| {
            cmd.cmd_bind_pipeline(vk::PipelineBindPoint::COMPUTE, self.pipeline.handle());
            cmd.bind_descriptor_sets(
                vk::PipelineBindPoint::COMPUTE,
                self.pipeline.layout(),
                0,
                &[self.sets[*frame_label].handle()],
                None,
            );
            cmd.cmd_dispatch(glam::uvec3(self.control.dispatch_groups(), 1, 1));
        });

        transfer.release_to_graphics(
            cmd,
            buffer,
            vk::PipelineStageFlags2::COMPUTE_SHADER,
            vk::AccessFlags2::SHADER_STORAGE_WRITE,
        );
    }

    /// graphics queue 上使用系数之前
    pub fn record_acquire_for_graphics(&self, cmd: &GfxCommandBuffer, frame_label: FrameLabel) {
        self.transfers[*frame_label].acquire_for_graphics(
            cmd,
            self.coefficients[*frame_label].vk_buffer(),
            vk::PipelineStageFlags2::FRAGMENT_SHADER,
            vk::AccessFlags2::SHADER_STORAGE_READ,
        );
    }

    /// graphics queue 使用完系数之后，交还给 compute
    pub fn record_release_to_compute(&mut self, cmd: &GfxCommandBuffer, frame_label: FrameLabel) {
        let buffer = self.coefficients[*frame_label].vk_buffer();
        self.transfers[*frame_label].release_to_compute(cmd, buffer, vk::PipelineStageFlags2::FRAGMENT_SHADER);
    }
}

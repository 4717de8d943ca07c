use std::rc::Rc;

use ash::vk;
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
    resources::special_buffers::structured_buffer::GfxStructuredBuffer,
};

use crate::{
    outer_app::indirect_draw::{IndirectCommands, InstanceData, InstanceParam, random_floats},
    renderer::queue_transfer::{QueueFamilies, QueueTransfer},
};

#[derive(DescriptorLayout)]
struct InstanceDescriptorLayout {
    #[binding = 0]
    #[descriptor_type = "STORAGE_BUFFER"]
    #[stage = "COMPUTE"]
    _random: (),

    #[binding = 1]
    #[descriptor_type = "UNIFORM_BUFFER"]
    #[stage = "COMPUTE"]
    _params: (),

    #[binding = 2]
    #[descriptor_type = "STORAGE_BUFFER"]
    #[stage = "COMPUTE"]
    _instances: (),
}

/// 用 compute shader 生成所有实例的数据
///
/// 输出 buffer 只有一份，compute 与 graphics 通过 semaphore 交替使用
pub struct InstancePass {
    pipeline: GfxComputePipeline,
    set: GfxDescriptorSet<InstanceDescriptorLayout>,
    instances: GfxStructuredBuffer<InstanceData>,
    transfer: QueueTransfer,
    dispatch_groups: u32,

    _random: GfxStructuredBuffer<f32>,
    _params: GfxStructuredBuffer<InstanceParam>,
    _set_layout: GfxDescriptorSetLayout<InstanceDescriptorLayout>,
    _descriptor_pool: GfxDescriptorPool,
}
// new & init
impl InstancePass {
    pub fn new(commands: &IndirectCommands, plant_radius: f32, instances_per_mesh: u32, seed: u64) -> Self {
        let object_count = commands.object_count;

        let random_data = random_floats(object_count, seed);
        let mut random = GfxStructuredBuffer::<f32>::new(
            "indirect-random",
            random_data.len(),
            vk::BufferUsageFlags::STORAGE_BUFFER,
            true,
        );
        random.transfer_data_by_mmap(&random_data);

        let mut params = GfxStructuredBuffer::<InstanceParam>::new_ubo(1, "indirect-instance-param");
        params.write(&InstanceParam::new(plant_radius, instances_per_mesh));

        let instances = GfxStructuredBuffer::<InstanceData>::new_ssbo(
            object_count as usize,
            vk::BufferUsageFlags::VERTEX_BUFFER,
            "indirect-instances",
        );

        let descriptor_pool = GfxDescriptorPool::new(
            &GfxDescriptorPoolCreateInfo::new(
                vk::DescriptorPoolCreateFlags::empty(),
                1,
                InstanceDescriptorLayout::pool_sizes(1),
            ),
            "indirect-instance",
        );
        let set_layout = GfxDescriptorSetLayout::<InstanceDescriptorLayout>::new(
            vk::DescriptorSetLayoutCreateFlags::empty(),
            "indirect-instance",
        );
        let pipeline_layout = Rc::new(GfxPipelineLayout::new(&[set_layout.handle()], &[], "indirect-instance"));
        let pipeline = GfxComputePipeline::new(
            &GfxShaderStageInfo {
                stage: vk::ShaderStageFlags::COMPUTE,
                entry_point: c"main",
                path: VkxPath::shader_build_path_str("indirect/instance.comp"),
            },
            pipeline_layout,
            "indirect-instance",
        );

        let set = GfxDescriptorSet::new(&descriptor_pool, &set_layout, "indirect-instance");
        Gfx::get().gfx_device().write_descriptor_sets(&[
            InstanceDescriptorLayout::random().write_buffer(set.handle(), 0, vec![random.descriptor_info()]),
            InstanceDescriptorLayout::params().write_buffer(set.handle(), 0, vec![params.descriptor_info()]),
            InstanceDescriptorLayout::instances().write_buffer(set.handle(), 0, vec![instances.descriptor_info()]),
        ]);

        log::info!(
            "indirect instances: {} objects, {} groups of {}",
            object_count,
            commands.dispatch_groups(),
            super::INSTANCE_GROUP_SIZE
        );

        Self {
            pipeline,
            set,
            instances,
            transfer: QueueTransfer::new(QueueFamilies::current()),
            dispatch_groups: commands.dispatch_groups(),
            _random: random,
            _params: params,
            _set_layout: set_layout,
            _descriptor_pool: descriptor_pool,
        }
    }
}
// getters
impl InstancePass {
    /// 作为 binding 1 的 per-instance 顶点数据
    #[inline]
    pub fn instance_buffer(&self) -> vk::Buffer {
        self.instances.vk_buffer()
    }
}
// draw
impl InstancePass {
    pub fn record(&mut self, cmd: &GfxCommandBuffer) {
        let buffer = self.instances.vk_buffer();
        self.transfer.acquire_for_compute(
            cmd,
            buffer,
            vk::PipelineStageFlags2::COMPUTE_SHADER,
            vk::AccessFlags2::SHADER_STORAGE_WRITE,
        );

        cmd.scope_label("indirect-instance", LabelColor::COLOR_COMPUTE, |cmd| {
            cmd.cmd_bind_pipeline(vk::PipelineBindPoint::COMPUTE, self.pipeline.handle());
            cmd.bind_descriptor_sets(vk::PipelineBindPoint::COMPUTE, self.pipeline.layout(), 0, &[self.set.handle()], None);
            cmd.cmd_dispatch(glam::uvec3(self.dispatch_groups, 1, 1));
        });

        self.transfer.release_to_graphics(
            cmd,
            buffer,
            vk::PipelineStageFlags2::COMPUTE_SHADER,
            vk::AccessFlags2::SHADER_STORAGE_WRITE,
        );
    }

    /// graphics 读取 per-instance 顶点之前
    pub fn record_acquire_for_graphics(&self, cmd: &GfxCommandBuffer) {
        self.transfer.acquire_for_graphics(
            cmd,
            self.instances.vk_buffer(),
            vk::PipelineStageFlags2::VERTEX_ATTRIBUTE_INPUT,
            vk::AccessFlags2::VERTEX_ATTRIBUTE_READ,
        );
    }

    pub fn record_release_to_compute(&mut self, cmd: &GfxCommandBuffer) {
        let buffer = self.instances.vk_buffer();
        self.transfer.release_to_compute(cmd, buffer, vk::PipelineStageFlags2::VERTEX_ATTRIBUTE_INPUT);
    }
}

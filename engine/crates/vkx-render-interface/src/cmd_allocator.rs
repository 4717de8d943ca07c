use ash::vk;
use itertools::Itertools;

use vkx_gfx::{
    commands::{command_buffer::GfxCommandBuffer, command_pool::GfxCommandPool, command_queue::GfxQueueFamily},
    gfx::Gfx,
};

use crate::pipeline_settings::FrameLabel;

/// 命令缓冲分配器
///
/// 每帧独立的 TRANSIENT command pool，帧开始时统一释放上一轮分配的命令缓冲。
/// 命令缓冲自动添加帧标签：`[A]ssss-blur-x`
pub struct CmdAllocator {
    graphics_command_pools: Vec<GfxCommandPool>,

    /// 独立 compute queue 存在时，compute 命令需要从对应 family 的 pool 中分配
    compute_command_pools: Option<Vec<GfxCommandPool>>,

    allocated_command_buffers: Vec<Vec<GfxCommandBuffer>>,
    allocated_compute_buffers: Vec<Vec<GfxCommandBuffer>>,
}
// new & init
impl CmdAllocator {
    pub fn new(fif_count: usize) -> Self {
        let new_pools = |family: GfxQueueFamily, tag: &str| {
            (0..fif_count)
                .map(|i| {
                    GfxCommandPool::new(
                        family.clone(),
                        vk::CommandPoolCreateFlags::TRANSIENT,
                        &format!("frame-{}-command-pool-{}", tag, i),
                    )
                })
                .collect_vec()
        };

        let gfx = Gfx::get();
        let compute_command_pools =
            gfx.has_dedicated_compute_queue().then(|| new_pools(gfx.compute_queue_family(), "compute"));

        Self {
            graphics_command_pools: new_pools(gfx.gfx_queue_family(), "graphics"),
            compute_command_pools,
            allocated_command_buffers: vec![Vec::new(); fif_count],
            allocated_compute_buffers: vec![Vec::new(); fif_count],
        }
    }
}
// destroy
impl CmdAllocator {
    pub fn destroy(mut self) {
        log::info!("destroying CmdAllocator");
        for pool in &mut self.graphics_command_pools {
            pool.destroy();
        }
        for pool in self.compute_command_pools.iter_mut().flatten() {
            pool.destroy();
        }
    }
}
// tools
impl CmdAllocator {
    /// 分配 graphics command buffer，在当前 frame 使用
    pub fn alloc_command_buffer(&mut self, frame_label: FrameLabel, debug_name: &str) -> GfxCommandBuffer {
        let name = format!("[{}]{}", frame_label, debug_name);
        let cmd = GfxCommandBuffer::new(&self.graphics_command_pools[*frame_label], &name);

        self.allocated_command_buffers[*frame_label].push(cmd.clone());
        cmd
    }

    /// 分配提交到 `Gfx::compute_queue()` 的 command buffer
    pub fn alloc_compute_command_buffer(&mut self, frame_label: FrameLabel, debug_name: &str) -> GfxCommandBuffer {
        let Some(compute_pools) = &self.compute_command_pools else {
            return self.alloc_command_buffer(frame_label, debug_name);
        };
        let name = format!("[{}]{}", frame_label, debug_name);
        let cmd = GfxCommandBuffer::new(&compute_pools[*frame_label], &name);

        self.allocated_compute_buffers[*frame_label].push(cmd.clone());
        cmd
    }

    /// 释放当前 frame 的 command buffers，调用前需要确保这些命令已经执行完毕
    pub fn free_frame_commands(&mut self, frame_label: FrameLabel) {
        let _span = tracy_client::span!("free_frame_commands");

        let idx = *frame_label;
        let gc_cmds = std::mem::take(&mut self.allocated_command_buffers[idx]);
        if !gc_cmds.is_empty() {
            self.graphics_command_pools[idx].free_command_buffers(gc_cmds);
        }
        self.graphics_command_pools[idx].reset_all_buffers();

        if let Some(compute_pools) = &self.compute_command_pools {
            let gc_cmds = std::mem::take(&mut self.allocated_compute_buffers[idx]);
            if !gc_cmds.is_empty() {
                compute_pools[idx].free_command_buffers(gc_cmds);
            }
            compute_pools[idx].reset_all_buffers();
        }
    }
}

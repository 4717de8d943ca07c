use ash::vk;
use vkx_gfx::{
    basic::color::LabelColor,
    commands::{barrier::GfxBufferBarrier, command_buffer::GfxCommandBuffer},
    gfx::Gfx,
};

/// graphics 和 compute 所在的 queue family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilies {
    pub graphics: u32,
    pub compute: u32,
}
impl QueueFamilies {
    pub fn current() -> Self {
        Self {
            graphics: Gfx::get().gfx_queue_family().queue_family_index,
            compute: Gfx::get().compute_queue_family().queue_family_index,
        }
    }

    /// 两个 family 不同时，EXCLUSIVE 的 buffer 需要在两侧分别记录 release 和 acquire
    #[inline]
    pub fn need_ownership_transfer(&self) -> bool {
        self.graphics != self.compute
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueOwner {
    /// 还没有被任何 queue 使用过
    None,
    Compute,
    Graphics,
}

/// 一个在 compute 写入、graphics 读取之间来回交接的 buffer
///
/// 每一帧的顺序为：
/// 1. compute：[`Self::acquire_for_compute`]，写入，[`Self::release_to_graphics`]
/// 2. graphics：[`Self::acquire_for_graphics`]，读取，[`Self::release_to_compute`]
///
/// family 相同时不会记录任何 barrier，只依赖 semaphore 同步
#[derive(Debug, Clone)]
pub struct QueueTransfer {
    families: QueueFamilies,
    owner: QueueOwner,
}
// new & init
impl QueueTransfer {
    pub fn new(families: QueueFamilies) -> Self {
        Self {
            families,
            owner: QueueOwner::None,
        }
    }
}
// getters
impl QueueTransfer {
    #[inline]
    pub fn owner(&self) -> QueueOwner {
        self.owner
    }

    /// 只有 graphics 交还过所有权之后，compute 才需要 acquire
    #[inline]
    pub fn compute_needs_acquire(&self) -> bool {
        self.families.need_ownership_transfer() && self.owner == QueueOwner::Graphics
    }
}
// barriers
impl QueueTransfer {
    fn barrier(buffer: vk::Buffer, src_family: u32, dst_family: u32) -> GfxBufferBarrier {
        GfxBufferBarrier::new().buffer(buffer, 0, vk::WHOLE_SIZE).queue_family_transfer(src_family, dst_family)
    }

    /// 在 barrier 前插入一个 label，方便在 RenderDoc 中找到所有权交接的位置
    fn record(cmd: &GfxCommandBuffer, src_family: u32, dst_family: u32, barrier: GfxBufferBarrier) {
        cmd.insert_label(&transfer_label(src_family, dst_family), LabelColor::COLOR_SYNC);
        cmd.buffer_memory_barrier(vk::DependencyFlags::empty(), &[barrier]);
    }

    pub fn acquire_for_compute(
        &self,
        cmd: &GfxCommandBuffer,
        buffer: vk::Buffer,
        dst_stage: vk::PipelineStageFlags2,
        dst_access: vk::AccessFlags2,
    ) {
        if !self.compute_needs_acquire() {
            return;
        }
        Self::record(
            cmd,
            self.families.graphics,
            self.families.compute,
            Self::barrier(buffer, self.families.graphics, self.families.compute)
                .src_mask(vk::PipelineStageFlags2::NONE, vk::AccessFlags2::NONE)
                .dst_mask(dst_stage, dst_access),
        );
    }

    pub fn release_to_graphics(
        &mut self,
        cmd: &GfxCommandBuffer,
        buffer: vk::Buffer,
        src_stage: vk::PipelineStageFlags2,
        src_access: vk::AccessFlags2,
    ) {
        if self.families.need_ownership_transfer() {
            Self::record(
                cmd,
                self.families.compute,
                self.families.graphics,
                Self::barrier(buffer, self.families.compute, self.families.graphics)
                    .src_mask(src_stage, src_access)
                    .dst_mask(vk::PipelineStageFlags2::NONE, vk::AccessFlags2::NONE),
            );
        }
        self.owner = QueueOwner::Compute;
    }

    pub fn acquire_for_graphics(
        &self,
        cmd: &GfxCommandBuffer,
        buffer: vk::Buffer,
        dst_stage: vk::PipelineStageFlags2,
        dst_access: vk::AccessFlags2,
    ) {
        if !self.families.need_ownership_transfer() {
            return;
        }
        Self::record(
            cmd,
            self.families.compute,
            self.families.graphics,
            Self::barrier(buffer, self.families.compute, self.families.graphics)
                .src_mask(vk::PipelineStageFlags2::NONE, vk::AccessFlags2::NONE)
                .dst_mask(dst_stage, dst_access),
        );
    }

    pub fn release_to_compute(&mut self, cmd: &GfxCommandBuffer, buffer: vk::Buffer, src_stage: vk::PipelineStageFlags2) {
        if self.families.need_ownership_transfer() {
            Self::record(
                cmd,
                self.families.graphics,
                self.families.compute,
                Self::barrier(buffer, self.families.graphics, self.families.compute)
                    .src_mask(src_stage, vk::AccessFlags2::NONE)
                    .dst_mask(vk::PipelineStageFlags2::NONE, vk::AccessFlags2::NONE),
            );
        }
        self.owner = QueueOwner::Graphics;
    }
}

#[inline]
fn transfer_label(src_family: u32, dst_family: u32) -> String {
    format!("queue-transfer {} -> {}", src_family, dst_family)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ownership_transfer_only_between_distinct_families() {
        assert!(!QueueFamilies { graphics: 0, compute: 0 }.need_ownership_transfer());
        assert!(QueueFamilies { graphics: 0, compute: 2 }.need_ownership_transfer());
    }

    #[test]
    fn first_compute_use_skips_acquire() {
        let transfer = QueueTransfer::new(QueueFamilies { graphics: 0, compute: 1 });
        assert_eq!(transfer.owner(), QueueOwner::None);
        assert!(!transfer.compute_needs_acquire());

        let released = QueueTransfer {
            owner: QueueOwner::Graphics,
            ..transfer.clone()
        };
        assert!(released.compute_needs_acquire());

        let same_family = QueueTransfer {
            families: QueueFamilies { graphics: 0, compute: 0 },
            owner: QueueOwner::Graphics,
        };
        assert!(!same_family.compute_needs_acquire());
    }

    #[test]
    fn transfer_label_names_both_families() {
        assert_eq!(transfer_label(1, 0), "queue-transfer 1 -> 0");
        assert_eq!(transfer_label(0, 2), "queue-transfer 0 -> 2");
    }
}

use ash::vk;
use itertools::Itertools;

use crate::gui_vertex_layout::{ImGuiVertex, ImGuiVertexLayoutAoS};
use vkx_gfx::resources::buffer::GfxBuffer;
use vkx_gfx::resources::special_buffers::index_buffer::GfxIndexBuffer;
use vkx_gfx::resources::special_buffers::vertex_buffer::GfxVertexBuffer;
use vkx_gfx::{
    basic::color::LabelColor,
    commands::{barrier::GfxBufferBarrier, command_buffer::GfxCommandBuffer},
};
use vkx_render_interface::pipeline_settings::FrameLabel;

/// imgui 绘制所需的 vertex buffer 和 index buffer
///
/// 每个 frame in flight 一份；stage buffer 常驻，
/// 下一次使用同一个 frame label 时该帧的 fence 已经完成，可以直接覆盖
pub struct GuiMesh {
    pub vertex_buffer: GfxVertexBuffer<ImGuiVertexLayoutAoS>,
    vertex_stage: GfxBuffer,
    vertex_capacity: usize,

    pub index_buffer: GfxIndexBuffer<imgui::DrawIdx>,
    index_stage: GfxBuffer,
    index_capacity: usize,

    frame_label: FrameLabel,
}

impl GuiMesh {
    const INIT_VERTEX_CAPACITY: usize = 4096;
    const INIT_INDEX_CAPACITY: usize = 8192;

    pub fn new(frame_label: FrameLabel) -> Self {
        let (vertex_buffer, vertex_stage) = Self::create_vertex_buffer(frame_label, Self::INIT_VERTEX_CAPACITY);
        let (index_buffer, index_stage) = Self::create_index_buffer(frame_label, Self::INIT_INDEX_CAPACITY);

        Self {
            vertex_buffer,
            vertex_stage,
            vertex_capacity: Self::INIT_VERTEX_CAPACITY,
            index_buffer,
            index_stage,
            index_capacity: Self::INIT_INDEX_CAPACITY,
            frame_label,
        }
    }

    fn create_vertex_buffer(
        frame_label: FrameLabel,
        capacity: usize,
    ) -> (GfxVertexBuffer<ImGuiVertexLayoutAoS>, GfxBuffer) {
        let vertex_buffer = GfxVertexBuffer::new(capacity, format!("[{}]imgui-vertex", frame_label));
        let stage = GfxBuffer::new_stage_buffer(
            (capacity * size_of::<ImGuiVertex>()) as vk::DeviceSize,
            format!("[{}]imgui-vertex-stage", frame_label),
        );
        (vertex_buffer, stage)
    }

    fn create_index_buffer(frame_label: FrameLabel, capacity: usize) -> (GfxIndexBuffer<imgui::DrawIdx>, GfxBuffer) {
        let index_buffer = GfxIndexBuffer::new(capacity, format!("[{}]imgui-index", frame_label));
        let stage = GfxBuffer::new_stage_buffer(
            (capacity * size_of::<imgui::DrawIdx>()) as vk::DeviceSize,
            format!("[{}]imgui-index-stage", frame_label),
        );
        (index_buffer, stage)
    }
}
// update
impl GuiMesh {
    /// 新容量：不小于需求的 2 的幂
    fn grown_capacity(current: usize, required: usize) -> usize {
        if required <= current { current } else { required.next_power_of_two() }
    }

    /// 容量不足时重建 buffer
    pub fn grow_if_needed(&mut self, draw_data: &imgui::DrawData) {
        let vertex_cnt = draw_data.total_vtx_count as usize;
        let index_cnt = draw_data.total_idx_count as usize;

        let new_vertex_capacity = Self::grown_capacity(self.vertex_capacity, vertex_cnt);
        if new_vertex_capacity != self.vertex_capacity {
            log::info!("[{}]imgui vertex buffer grow: {} -> {}", self.frame_label, self.vertex_capacity, new_vertex_capacity);
            (self.vertex_buffer, self.vertex_stage) = Self::create_vertex_buffer(self.frame_label, new_vertex_capacity);
            self.vertex_capacity = new_vertex_capacity;
        }

        let new_index_capacity = Self::grown_capacity(self.index_capacity, index_cnt);
        if new_index_capacity != self.index_capacity {
            log::info!("[{}]imgui index buffer grow: {} -> {}", self.frame_label, self.index_capacity, new_index_capacity);
            (self.index_buffer, self.index_stage) = Self::create_index_buffer(self.frame_label, new_index_capacity);
            self.index_capacity = new_index_capacity;
        }
    }

    /// 将 draw data 写入 stage buffer，并记录 copy 命令和 transfer barrier
    pub fn upload(&self, cmd: &GfxCommandBuffer, draw_data: &imgui::DrawData) {
        let vertices = draw_data
            .draw_lists()
            .flat_map(|draw_list| draw_list.vtx_buffer().iter().map(ImGuiVertex::from))
            .collect_vec();
        let indices = draw_data.draw_lists().flat_map(|draw_list| draw_list.idx_buffer().iter().copied()).collect_vec();
        if vertices.is_empty() || indices.is_empty() {
            return;
        }

        self.vertex_stage.transfer_data_by_mmap(&vertices);
        self.index_stage.transfer_data_by_mmap(&indices);

        cmd.begin_label("uipass-mesh-transfer", LabelColor::COLOR_CMD);
        {
            cmd.cmd_copy_buffer(
                &self.vertex_stage,
                &self.vertex_buffer,
                &[vk::BufferCopy {
                    size: size_of_val(vertices.as_slice()) as vk::DeviceSize,
                    ..Default::default()
                }],
            );
            cmd.cmd_copy_buffer(
                &self.index_stage,
                &self.index_buffer,
                &[vk::BufferCopy {
                    size: size_of_val(indices.as_slice()) as vk::DeviceSize,
                    ..Default::default()
                }],
            );

            cmd.buffer_memory_barrier(
                vk::DependencyFlags::empty(),
                &[
                    GfxBufferBarrier::default()
                        .src_mask(vk::PipelineStageFlags2::TRANSFER, vk::AccessFlags2::TRANSFER_WRITE)
                        .dst_mask(vk::PipelineStageFlags2::INDEX_INPUT, vk::AccessFlags2::INDEX_READ)
                        .buffer(self.index_buffer.vk_buffer(), 0, vk::WHOLE_SIZE),
                    GfxBufferBarrier::default()
                        .src_mask(vk::PipelineStageFlags2::TRANSFER, vk::AccessFlags2::TRANSFER_WRITE)
                        .dst_mask(vk::PipelineStageFlags2::VERTEX_INPUT, vk::AccessFlags2::VERTEX_ATTRIBUTE_READ)
                        .buffer(self.vertex_buffer.vk_buffer(), 0, vk::WHOLE_SIZE),
                ],
            );
        }
        cmd.end_label();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_grows_to_power_of_two() {
        assert_eq!(GuiMesh::grown_capacity(4096, 100), 4096);
        assert_eq!(GuiMesh::grown_capacity(4096, 4096), 4096);
        assert_eq!(GuiMesh::grown_capacity(4096, 5000), 8192);
        assert_eq!(GuiMesh::grown_capacity(4096, 20000), 32768);
    }
}

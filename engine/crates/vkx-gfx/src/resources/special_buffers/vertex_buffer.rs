use std::marker::PhantomData;

use ash::vk;

use crate::{gfx::Gfx, impl_derive_buffer, resources::buffer::GfxBuffer, resources::layout::GfxVertexLayout};

pub struct GfxVertexBuffer<L: GfxVertexLayout> {
    inner: GfxBuffer,
    /// 顶点数量
    vertex_cnt: usize,
    _phantom: PhantomData<L>,
}
impl_derive_buffer!(GfxVertexBuffer<L: GfxVertexLayout>, GfxBuffer, inner);
impl<L: GfxVertexLayout> GfxVertexBuffer<L> {
    pub fn new(vertex_cnt: usize, debug_name: impl AsRef<str>) -> Self {
        let buffer = GfxBuffer::new(
            L::buffer_size(vertex_cnt) as vk::DeviceSize,
            vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
            None,
            false,
            debug_name.as_ref(),
        );

        let buffer = Self {
            inner: buffer,
            vertex_cnt,
            _phantom: PhantomData,
        };
        Gfx::get().gfx_device().set_debug_name(&buffer, debug_name);
        buffer
    }

    /// 创建 device local 的 vertex buffer 并同步上传数据
    pub fn new_with_data(data: &[L::Vertex], debug_name: impl AsRef<str>) -> Self {
        let buffer = Self::new(data.len(), debug_name);
        buffer.transfer_data_sync(data);
        buffer
    }

    #[inline]
    pub fn vertex_cnt(&self) -> usize {
        self.vertex_cnt
    }
}

use ash::vk;

use crate::{gfx::Gfx, impl_derive_buffer, resources::buffer::GfxBuffer, resources::layout::GfxIndexType};

pub struct GfxIndexBuffer<T: GfxIndexType> {
    inner: GfxBuffer,

    /// 索引数量
    index_cnt: usize,

    _phantom: std::marker::PhantomData<T>,
}
impl_derive_buffer!(GfxIndexBuffer<T: GfxIndexType>, GfxBuffer, inner);
// init & destroy
impl<T: GfxIndexType> GfxIndexBuffer<T> {
    pub fn new(index_cnt: usize, debug_name: impl AsRef<str>) -> Self {
        let size = index_cnt * T::byte_size();
        let buffer = GfxBuffer::new(
            size as vk::DeviceSize,
            vk::BufferUsageFlags::INDEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
            None,
            false,
            debug_name.as_ref(),
        );

        let buffer = Self {
            inner: buffer,
            index_cnt,
            _phantom: std::marker::PhantomData,
        };
        Gfx::get().gfx_device().set_debug_name(&buffer, debug_name);
        buffer
    }

    /// 创建 index buffer，并向其内写入数据
    #[inline]
    pub fn new_with_data(data: &[T], debug_name: impl AsRef<str>) -> Self {
        let index_buffer = Self::new(data.len(), debug_name);
        index_buffer.transfer_data_sync(data);
        index_buffer
    }
}
// getter
impl<T: GfxIndexType> GfxIndexBuffer<T> {
    #[inline]
    pub fn index_cnt(&self) -> usize {
        self.index_cnt
    }
}

pub type GfxIndex32Buffer = GfxIndexBuffer<u32>;
pub type GfxIndex16Buffer = GfxIndexBuffer<u16>;

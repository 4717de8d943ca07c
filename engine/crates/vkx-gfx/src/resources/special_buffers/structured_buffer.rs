use std::marker::PhantomData;

use ash::vk;

use crate::{gfx::Gfx, impl_derive_buffer, resources::buffer::GfxBuffer};

/// buffer 内存放的是结构体或者结构体的数组
///
/// 可用作 UBO、SSBO、indirect 参数或者 stage buffer
pub struct GfxStructuredBuffer<T: bytemuck::Pod> {
    inner: GfxBuffer,
    /// 结构体的数量
    ele_num: usize,
    _phantom: PhantomData<T>,
}
impl_derive_buffer!(GfxStructuredBuffer<T: bytemuck::Pod>, GfxBuffer, inner);
impl<T: bytemuck::Pod> GfxStructuredBuffer<T> {
    /// 常驻映射的 uniform buffer，每帧通过 mmap 写入
    #[inline]
    pub fn new_ubo(len: usize, debug_name: impl AsRef<str>) -> Self {
        Self::new(
            debug_name,
            len,
            vk::BufferUsageFlags::UNIFORM_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
            true,
        )
    }

    #[inline]
    pub fn new_ssbo(len: usize, extra_usage: vk::BufferUsageFlags, debug_name: impl AsRef<str>) -> Self {
        Self::new(
            debug_name,
            len,
            vk::BufferUsageFlags::STORAGE_BUFFER | vk::BufferUsageFlags::TRANSFER_DST | extra_usage,
            false,
        )
    }

    #[inline]
    pub fn new_stage_buffer(len: usize, debug_name: impl AsRef<str>) -> Self {
        Self::new(debug_name, len, vk::BufferUsageFlags::TRANSFER_SRC, true)
    }

    #[inline]
    pub fn new(
        debug_name: impl AsRef<str>,
        len: usize,
        buffer_usage_flags: vk::BufferUsageFlags,
        mapped: bool,
    ) -> Self {
        let buffer = GfxBuffer::new(
            (len * size_of::<T>()) as vk::DeviceSize,
            buffer_usage_flags,
            None,
            mapped,
            debug_name.as_ref(),
        );
        let buffer = Self {
            inner: buffer,
            ele_num: len,
            _phantom: PhantomData,
        };
        Gfx::get().gfx_device().set_debug_name(&buffer, debug_name);
        buffer
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ele_num
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ele_num == 0
    }

    pub fn mapped_slice(&mut self) -> &mut [T] {
        unsafe { std::slice::from_raw_parts_mut(self.inner.mapped_ptr() as *mut T, self.ele_num) }
    }

    /// 写入第 0 个元素，常用于 UBO
    pub fn write(&mut self, value: &T) {
        self.transfer_data_by_mmap(std::slice::from_ref(value));
    }

    pub fn transfer_data_by_mmap(&mut self, data: &[T]) {
        assert!(data.len() <= self.ele_num);
        self.mapped_slice()[..data.len()].copy_from_slice(data);
        self.inner.flush(0, size_of_val(data) as vk::DeviceSize);
    }
}

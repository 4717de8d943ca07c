use std::ptr;

use ash::vk;
use vk_mem::Alloc;

use crate::{foundation::debug_messenger::DebugType, gfx::Gfx};

pub struct GfxBuffer {
    handle: vk::Buffer,
    allocation: vk_mem::Allocation,

    size: vk::DeviceSize,

    /// 在初始化阶段写死
    map_ptr: Option<*mut u8>,

    debug_name: String,

    usage: vk::BufferUsageFlags,
}
impl DebugType for GfxBuffer {
    fn debug_type_name() -> &'static str {
        "GfxBuffer"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
impl Drop for GfxBuffer {
    fn drop(&mut self) {
        let allocator = Gfx::get().allocator();
        unsafe {
            if self.map_ptr.is_some() {
                allocator.unmap_memory(&mut self.allocation);
            }

            allocator.destroy_buffer(self.handle, &mut self.allocation);
        }
    }
}
// init & destroy
impl GfxBuffer {
    /// - align: 当 buffer 处于一个大的 memory block 中时，align 用来指定 buffer 的起始 offset,
    ///   默认对齐到 8 字节
    /// - 优先使用 device memory
    /// - mem_map 为 true 时，整个生命周期内保持映射
    pub fn new(
        buffer_size: vk::DeviceSize,
        buffer_usage: vk::BufferUsageFlags,
        align: Option<vk::DeviceSize>,
        mem_map: bool,
        name: impl AsRef<str>,
    ) -> Self {
        debug_assert!(buffer_size > 0, "GfxBuffer::new: empty buffer {}", name.as_ref());

        let buffer_ci = vk::BufferCreateInfo::default().size(buffer_size).usage(buffer_usage);
        let alloc_ci = vk_mem::AllocationCreateInfo {
            usage: vk_mem::MemoryUsage::AutoPreferDevice,
            flags: if mem_map {
                vk_mem::AllocationCreateFlags::HOST_ACCESS_RANDOM
            } else {
                vk_mem::AllocationCreateFlags::empty()
            },
            ..Default::default()
        };

        let align = align.unwrap_or(8);
        let (buffer, mut alloc) =
            unsafe { Gfx::get().vm_allocator.create_buffer_with_alignment(&buffer_ci, &alloc_ci, align).unwrap() };

        let mapped_ptr = mem_map.then(|| unsafe { Gfx::get().allocator().map_memory(&mut alloc).unwrap() });

        let buffer = Self {
            handle: buffer,
            allocation: alloc,
            size: buffer_size,
            map_ptr: mapped_ptr,

            debug_name: name.as_ref().to_string(),

            usage: buffer_usage,
        };
        Gfx::get().gfx_device().set_debug_name(&buffer, name);
        buffer
    }

    #[inline]
    pub fn new_stage_buffer(size: vk::DeviceSize, debug_name: impl AsRef<str>) -> Self {
        Self::new(size, vk::BufferUsageFlags::TRANSFER_SRC, None, true, debug_name)
    }

    #[inline]
    pub fn destroy(self) {
        drop(self)
    }
}
// getter
impl GfxBuffer {
    #[inline]
    pub fn vk_buffer(&self) -> vk::Buffer {
        self.handle
    }

    #[inline]
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    #[inline]
    pub fn usage(&self) -> vk::BufferUsageFlags {
        self.usage
    }

    #[inline]
    pub fn debug_name(&self) -> &str {
        &self.debug_name
    }

    /// 覆盖整个 buffer 的 descriptor
    #[inline]
    pub fn descriptor_info(&self) -> vk::DescriptorBufferInfo {
        vk::DescriptorBufferInfo::default().buffer(self.handle).offset(0).range(vk::WHOLE_SIZE)
    }
}
// tools
impl GfxBuffer {
    #[inline]
    pub fn mapped_ptr(&self) -> *mut u8 {
        self.map_ptr.unwrap_or_else(|| panic!("Buffer {} is not mapped", self.debug_name))
    }

    #[inline]
    pub fn flush(&self, offset: vk::DeviceSize, size: vk::DeviceSize) {
        let allocator = Gfx::get().allocator();
        allocator.flush_allocation(&self.allocation, offset, size).unwrap();
    }

    /// 通过 mem map 的方式将 data 传入到 buffer 中
    pub fn transfer_data_by_mmap<T>(&self, data: &[T])
    where
        T: Sized + Copy,
    {
        let size = size_of_val(data) as vk::DeviceSize;
        assert!(size <= self.size, "Buffer {} overflow: {} > {}", self.debug_name, size, self.size);
        unsafe {
            ptr::copy_nonoverlapping(data.as_ptr() as *const u8, self.mapped_ptr(), size as usize);
        }
        self.flush(0, size);
    }

    /// 创建一个临时的 stage buffer，先将数据放入 stage buffer，再 transfer 到 self
    ///
    /// 同步等待执行完成，只适合初始化阶段的大块数据
    pub fn transfer_data_sync(&self, data: &[impl Sized + Copy]) {
        let size = size_of_val(data) as vk::DeviceSize;
        let stage_buffer = Self::new_stage_buffer(size, format!("{}-stage-buffer", self.debug_name));
        stage_buffer.transfer_data_by_mmap(data);

        let cmd_name = format!("{}-transfer-data", &self.debug_name);
        Gfx::get().one_time_exec(
            |cmd| {
                cmd.cmd_copy_buffer(
                    &stage_buffer,
                    self,
                    &[vk::BufferCopy {
                        size,
                        ..Default::default()
                    }],
                );
            },
            &cmd_name,
        );
    }
}

use ash::vk;
use ash::vk::Handle;
use vk_mem::Alloc;

use crate::{
    commands::{barrier::GfxImageBarrier, command_buffer::GfxCommandBuffer},
    foundation::debug_messenger::DebugType,
    gfx::Gfx,
    resources::buffer::GfxBuffer,
};

/// Vulkan 格式相关的工具类
pub struct VulkanFormatUtils;
impl VulkanFormatUtils {
    /// 计算指定 Vulkan 格式下每个像素需要的字节数
    ///
    /// # Panic
    /// 当遇到不支持的格式时会 panic
    pub fn pixel_size_in_bytes(format: vk::Format) -> usize {
        // 根据 vulkan specification 得到的 format 顺序，区间左闭右开
        const BYTE_1_FORMAT: [(vk::Format, vk::Format); 1] = [(vk::Format::R8_UNORM, vk::Format::R8G8_UNORM)];
        const BYTE_4_FORMAT: [(vk::Format, vk::Format); 2] = [
            (vk::Format::R8G8B8A8_UNORM, vk::Format::A8B8G8R8_UNORM_PACK32),
            (vk::Format::R32_UINT, vk::Format::R32G32_UINT),
        ];
        const BYTE_8_FORMAT: [(vk::Format, vk::Format); 1] =
            [(vk::Format::R16G16B16A16_UNORM, vk::Format::R32_UINT)];
        const BYTE_16_FORMAT: [(vk::Format, vk::Format); 1] =
            [(vk::Format::R32G32B32A32_UINT, vk::Format::R64_UINT)];

        let is_in_format_region = |format: vk::Format, regions: &[(vk::Format, vk::Format)]| {
            let n = format.as_raw();
            regions.iter().any(|(begin, end)| begin.as_raw() <= n && n < end.as_raw())
        };

        match format {
            f if is_in_format_region(f, &BYTE_1_FORMAT) => 1,
            f if is_in_format_region(f, &BYTE_4_FORMAT) => 4,
            f if is_in_format_region(f, &BYTE_8_FORMAT) => 8,
            f if is_in_format_region(f, &BYTE_16_FORMAT) => 16,
            _ => panic!("unsupported format: {:?}", format),
        }
    }

    pub fn is_depth_format(format: vk::Format) -> bool {
        matches!(
            format,
            vk::Format::D16_UNORM
                | vk::Format::X8_D24_UNORM_PACK32
                | vk::Format::D32_SFLOAT
                | vk::Format::D16_UNORM_S8_UINT
                | vk::Format::D24_UNORM_S8_UINT
                | vk::Format::D32_SFLOAT_S8_UINT
        )
    }
}

pub struct GfxImage {
    handle: vk::Image,
    allocation: Option<vk_mem::Allocation>,

    extent: vk::Extent3D,
    format: vk::Format,
    layer_count: u32,

    name: String,
}
// getter
impl GfxImage {
    #[inline]
    pub fn width(&self) -> u32 {
        self.extent.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.extent.height
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        vk::Extent2D {
            width: self.extent.width,
            height: self.extent.height,
        }
    }

    #[inline]
    pub fn handle(&self) -> vk::Image {
        self.handle
    }

    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }

    #[inline]
    pub fn layer_count(&self) -> u32 {
        self.layer_count
    }
}
// new & init
impl GfxImage {
    pub fn new(image_info: &GfxImageCreateInfo, alloc_info: &vk_mem::AllocationCreateInfo, debug_name: &str) -> Self {
        let allocator = Gfx::get().allocator();
        let (image, alloc) = unsafe { allocator.create_image(&image_info.as_info(), alloc_info).unwrap() };
        let image = Self {
            handle: image,
            allocation: Some(alloc),
            extent: image_info.inner.extent,
            format: image_info.inner.format,
            layer_count: image_info.inner.array_layers,

            name: debug_name.to_string(),
        };
        Gfx::get().gfx_device().set_debug_name(&image, debug_name);
        image
    }

    /// device local 的 image，用作 render target 或者 storage image
    pub fn new_device_local(image_info: &GfxImageCreateInfo, debug_name: &str) -> Self {
        Self::new(
            image_info,
            &vk_mem::AllocationCreateInfo {
                usage: vk_mem::MemoryUsage::AutoPreferDevice,
                ..Default::default()
            },
            debug_name,
        )
    }

    /// 根据 RGBA8_UNORM 的 data 创建 image，data 按 layer 依次排列
    pub fn from_rgba8(width: u32, height: u32, layers: u32, cube: bool, data: &[u8], name: impl AsRef<str>) -> Self {
        let extent = vk::Extent2D { width, height };
        let usage = vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED;
        let image_create_info = if cube {
            debug_assert_eq!(layers, 6);
            GfxImageCreateInfo::new_image_cube_info(extent, vk::Format::R8G8B8A8_UNORM, usage)
        } else {
            GfxImageCreateInfo::new_image_2d_info(extent, vk::Format::R8G8B8A8_UNORM, usage).array_layers(layers)
        };
        let image = Self::new_device_local(&image_create_info, name.as_ref());

        let _stage_buffer = Gfx::get().one_time_exec(|cmd| image.transfer_data(cmd, data), name.as_ref());

        image
    }
}
impl DebugType for GfxImage {
    fn debug_type_name() -> &'static str {
        "GfxImage"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
// destroy
impl GfxImage {
    pub fn destroy(mut self) {
        self.destroy_mut();
    }

    pub fn destroy_mut(&mut self) {
        log::debug!("Destroying GfxImage: {}", self.name);

        if let Some(allocation) = &mut self.allocation {
            unsafe { Gfx::get().allocator().destroy_image(self.handle, allocation) }
        }
        self.allocation = None;
        self.handle = vk::Image::null();
    }
}
impl Drop for GfxImage {
    fn drop(&mut self) {
        debug_assert!(self.handle.is_null(), "GfxImage {} is not destroyed", self.name);
    }
}
// tools
impl GfxImage {
    /// 将所有 layer 的数据上传到 image，完成后 image 处于 SHADER_READ_ONLY_OPTIMAL
    ///
    /// 返回的 stage buffer 需要在命令执行完毕之后才能释放
    pub fn transfer_data(&self, command_buffer: &GfxCommandBuffer, data: &[u8]) -> GfxBuffer {
        let pixels_cnt = (self.width() * self.height() * self.layer_count) as usize;
        assert_eq!(data.len(), VulkanFormatUtils::pixel_size_in_bytes(self.format()) * pixels_cnt);

        let stage_buffer =
            GfxBuffer::new_stage_buffer(size_of_val(data) as vk::DeviceSize, format!("{}-stage", self.name));
        stage_buffer.transfer_data_by_mmap(data);

        let image_barrier = GfxImageBarrier::new()
            .image(self.handle)
            .src_mask(vk::PipelineStageFlags2::TOP_OF_PIPE, vk::AccessFlags2::empty())
            .dst_mask(vk::PipelineStageFlags2::TRANSFER, vk::AccessFlags2::TRANSFER_WRITE)
            .layout_transfer(vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .image_aspect_flag(vk::ImageAspectFlags::COLOR)
            .layer_range(0, self.layer_count);
        command_buffer.image_memory_barrier(vk::DependencyFlags::empty(), std::slice::from_ref(&image_barrier));

        // layer 在 buffer 中紧密排列，一个 region 即可覆盖
        let buffer_image_copy = vk::BufferImageCopy2::default()
            .buffer_offset(0)
            .buffer_row_length(0)
            .buffer_image_height(0)
            .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
            .image_extent(self.extent)
            .image_subresource(vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: self.layer_count,
            });
        command_buffer.cmd_copy_buffer_to_image(
            &vk::CopyBufferToImageInfo2::default()
                .src_buffer(stage_buffer.vk_buffer())
                .dst_image(self.handle)
                .dst_image_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .regions(std::slice::from_ref(&buffer_image_copy)),
        );

        let image_barrier = GfxImageBarrier::new()
            .image(self.handle)
            .src_mask(vk::PipelineStageFlags2::TRANSFER, vk::AccessFlags2::TRANSFER_WRITE)
            .dst_mask(
                vk::PipelineStageFlags2::FRAGMENT_SHADER | vk::PipelineStageFlags2::COMPUTE_SHADER,
                vk::AccessFlags2::SHADER_READ,
            )
            .layout_transfer(vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
            .image_aspect_flag(vk::ImageAspectFlags::COLOR)
            .layer_range(0, self.layer_count);
        command_buffer.image_memory_barrier(vk::DependencyFlags::empty(), std::slice::from_ref(&image_barrier));

        stage_buffer
    }
}

pub struct GfxImageCreateInfo {
    inner: vk::ImageCreateInfo<'static>,

    queue_family_indices: Vec<u32>,
}
impl GfxImageCreateInfo {
    #[inline]
    pub fn new_image_2d_info(extent: vk::Extent2D, format: vk::Format, usage: vk::ImageUsageFlags) -> Self {
        Self {
            inner: vk::ImageCreateInfo {
                image_type: vk::ImageType::TYPE_2D,
                format,
                extent: extent.into(),
                mip_levels: 1,
                array_layers: 1,
                samples: vk::SampleCountFlags::TYPE_1,
                tiling: vk::ImageTiling::OPTIMAL,
                usage,
                sharing_mode: vk::SharingMode::EXCLUSIVE,
                // 只能是 UNDEFINED 或者 PREINITIALIZED
                initial_layout: vk::ImageLayout::UNDEFINED,
                ..Default::default()
            },
            queue_family_indices: Vec::new(),
        }
    }

    /// 6 个 layer，可以创建 cube view
    #[inline]
    pub fn new_image_cube_info(extent: vk::Extent2D, format: vk::Format, usage: vk::ImageUsageFlags) -> Self {
        let mut info = Self::new_image_2d_info(extent, format, usage).array_layers(6);
        info.inner.flags |= vk::ImageCreateFlags::CUBE_COMPATIBLE;
        info
    }

    /// compute shader 写入、之后被采样的 image
    #[inline]
    pub fn new_storage_image_2d_info(extent: vk::Extent2D, format: vk::Format) -> Self {
        Self::new_image_2d_info(
            extent,
            format,
            vk::ImageUsageFlags::STORAGE | vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_SRC,
        )
    }

    #[inline]
    pub fn as_info(&self) -> vk::ImageCreateInfo<'_> {
        self.inner.queue_family_indices(&self.queue_family_indices)
    }

    // builder
    #[inline]
    pub fn array_layers(mut self, layers: u32) -> Self {
        self.inner.array_layers = layers;
        self
    }

    #[inline]
    pub fn queue_family_indices(mut self, queue_family_indices: &[u32]) -> Self {
        self.inner.sharing_mode = vk::SharingMode::CONCURRENT;
        self.queue_family_indices = queue_family_indices.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_sizes() {
        assert_eq!(VulkanFormatUtils::pixel_size_in_bytes(vk::Format::R8_UNORM), 1);
        assert_eq!(VulkanFormatUtils::pixel_size_in_bytes(vk::Format::R8G8B8A8_UNORM), 4);
        assert_eq!(VulkanFormatUtils::pixel_size_in_bytes(vk::Format::B8G8R8A8_SRGB), 4);
        assert_eq!(VulkanFormatUtils::pixel_size_in_bytes(vk::Format::R32_SFLOAT), 4);
        assert_eq!(VulkanFormatUtils::pixel_size_in_bytes(vk::Format::R16G16B16A16_SFLOAT), 8);
        assert_eq!(VulkanFormatUtils::pixel_size_in_bytes(vk::Format::R32G32B32A32_SFLOAT), 16);
    }

    #[test]
    #[should_panic]
    fn unsupported_pixel_size() {
        VulkanFormatUtils::pixel_size_in_bytes(vk::Format::BC1_RGB_UNORM_BLOCK);
    }

    #[test]
    fn cube_info_has_six_layers() {
        let info = GfxImageCreateInfo::new_image_cube_info(
            vk::Extent2D { width: 4, height: 4 },
            vk::Format::R8G8B8A8_UNORM,
            vk::ImageUsageFlags::SAMPLED,
        );
        let ci = info.as_info();
        assert_eq!(ci.array_layers, 6);
        assert!(ci.flags.contains(vk::ImageCreateFlags::CUBE_COMPATIBLE));
    }

    #[test]
    fn depth_format() {
        assert!(VulkanFormatUtils::is_depth_format(vk::Format::D32_SFLOAT));
        assert!(!VulkanFormatUtils::is_depth_format(vk::Format::R8G8B8A8_UNORM));
    }
}

use ash::vk;
use ash::vk::Handle;

use crate::{foundation::debug_messenger::DebugType, gfx::Gfx};

pub struct GfxImageView {
    handle: vk::ImageView,

    desc: GfxImageViewDesc,

    name: String,
}
impl DebugType for GfxImageView {
    fn debug_type_name() -> &'static str {
        "GfxImageView"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
// new & init
impl GfxImageView {
    pub fn new(image: vk::Image, view_desc: GfxImageViewDesc, name: impl AsRef<str>) -> Self {
        let gfx_device = Gfx::get().gfx_device();

        let info = vk::ImageViewCreateInfo {
            image,
            view_type: view_desc.view_type,
            format: view_desc.format,
            subresource_range: view_desc.subresource_range(),
            ..Default::default()
        };

        let handle = unsafe { gfx_device.create_image_view(&info, None).unwrap() };
        let image_view = Self {
            handle,
            desc: view_desc,
            name: name.as_ref().to_string(),
        };
        gfx_device.set_debug_name(&image_view, &name);
        image_view
    }
}
// destory
impl GfxImageView {
    pub fn destroy(mut self) {
        self.destroy_mut();
    }

    pub fn destroy_mut(&mut self) {
        unsafe {
            Gfx::get().gfx_device().destroy_image_view(self.handle, None);
        }
        self.handle = vk::ImageView::null();
    }
}
impl Drop for GfxImageView {
    fn drop(&mut self) {
        debug_assert!(self.handle.is_null(), "GfxImageView {} is not destroyed", self.name);
    }
}
// getters
impl GfxImageView {
    #[inline]
    pub fn handle(&self) -> vk::ImageView {
        self.handle
    }

    #[inline]
    pub fn desc(&self) -> &GfxImageViewDesc {
        &self.desc
    }
}
impl std::fmt::Display for GfxImageView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GfxImageView({}, {:?})", self.name, self.handle)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GfxImageViewDesc {
    /// format 可以基于 vk::Image 重解释
    pub(crate) format: vk::Format,
    pub(crate) view_type: vk::ImageViewType,
    pub(crate) aspect_mask: vk::ImageAspectFlags,
    /// base mip level 和 mip level count
    pub(crate) mip: (u8, u8),
    /// base layer 和 layer count
    pub(crate) layer: (u8, u8),
}
impl GfxImageViewDesc {
    pub fn new_2d(format: vk::Format, aspect: vk::ImageAspectFlags) -> Self {
        Self::new(format, vk::ImageViewType::TYPE_2D, aspect, (0, 1), (0, 1))
    }

    pub fn new_2d_array(format: vk::Format, layer_count: u8) -> Self {
        Self::new(
            format,
            vk::ImageViewType::TYPE_2D_ARRAY,
            vk::ImageAspectFlags::COLOR,
            (0, 1),
            (0, layer_count),
        )
    }

    pub fn new_cube(format: vk::Format) -> Self {
        Self::new(format, vk::ImageViewType::CUBE, vk::ImageAspectFlags::COLOR, (0, 1), (0, 6))
    }

    /// # 参数
    /// - `mip_range`: (base_mip_level, level_count)
    /// - `layer_range`: (base_array_layer, layer_count)
    pub fn new(
        format: vk::Format,
        view_type: vk::ImageViewType,
        aspect_mask: vk::ImageAspectFlags,
        mip_range: (u8, u8),
        layer_range: (u8, u8),
    ) -> Self {
        Self {
            format,
            view_type,
            aspect_mask,
            mip: mip_range,
            layer: layer_range,
        }
    }

    #[inline]
    pub fn subresource_range(&self) -> vk::ImageSubresourceRange {
        vk::ImageSubresourceRange {
            aspect_mask: self.aspect_mask,
            base_mip_level: self.mip.0 as u32,
            level_count: self.mip.1 as u32,
            base_array_layer: self.layer.0 as u32,
            layer_count: self.layer.1 as u32,
        }
    }

    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }

    #[inline]
    pub fn view_type(&self) -> vk::ImageViewType {
        self.view_type
    }

    #[inline]
    pub fn aspect_mask(&self) -> vk::ImageAspectFlags {
        self.aspect_mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cube_view_covers_six_layers() {
        let range = GfxImageViewDesc::new_cube(vk::Format::R8G8B8A8_UNORM).subresource_range();
        assert_eq!(range.base_array_layer, 0);
        assert_eq!(range.layer_count, 6);
        assert_eq!(range.level_count, 1);
    }

    #[test]
    fn array_view_layer_count() {
        let desc = GfxImageViewDesc::new_2d_array(vk::Format::R8G8B8A8_UNORM, 3);
        assert_eq!(desc.view_type(), vk::ImageViewType::TYPE_2D_ARRAY);
        assert_eq!(desc.subresource_range().layer_count, 3);
    }
}

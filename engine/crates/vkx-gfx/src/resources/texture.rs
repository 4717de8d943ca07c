use ash::vk;

use crate::{
    descriptors::sampler::{GfxSampler, GfxSamplerCreateInfo},
    resources::{
        image::GfxImage,
        image_view::{GfxImageView, GfxImageViewDesc},
    },
};

/// image + view + sampler
///
/// layer 大于 1 时使用 2D_ARRAY view
pub struct GfxTexture2D {
    image: GfxImage,
    image_view: GfxImageView,
    sampler: GfxSampler,
}

impl GfxTexture2D {
    pub fn new(image: GfxImage, sampler_ci: &GfxSamplerCreateInfo, name: &str) -> Self {
        let view_desc = if image.layer_count() > 1 {
            GfxImageViewDesc::new_2d_array(image.format(), image.layer_count() as u8)
        } else {
            GfxImageViewDesc::new_2d(image.format(), vk::ImageAspectFlags::COLOR)
        };
        let image_view = GfxImageView::new(image.handle(), view_desc, name);
        let sampler = GfxSampler::new(sampler_ci, name);

        Self {
            image,
            image_view,
            sampler,
        }
    }

    /// `data` 按 layer 依次排列的 RGBA8 像素
    pub fn from_rgba8(
        width: u32,
        height: u32,
        layers: u32,
        data: &[u8],
        sampler_ci: &GfxSamplerCreateInfo,
        name: &str,
    ) -> Self {
        let image = GfxImage::from_rgba8(width, height, layers, false, data, name);
        Self::new(image, sampler_ci, name)
    }

    #[inline]
    pub fn image(&self) -> &GfxImage {
        &self.image
    }

    #[inline]
    pub fn image_view(&self) -> &GfxImageView {
        &self.image_view
    }

    #[inline]
    pub fn sampler(&self) -> &GfxSampler {
        &self.sampler
    }

    #[inline]
    pub fn descriptor_image_info(&self) -> vk::DescriptorImageInfo {
        vk::DescriptorImageInfo::default()
            .sampler(self.sampler.handle())
            .image_view(self.image_view.handle())
            .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
    }

    pub fn destroy(self) {
        self.image_view.destroy();
        self.image.destroy();
    }
}

/// 6 个面的 cube map，面的顺序为 +X, -X, +Y, -Y, +Z, -Z
pub struct GfxTextureCube {
    image: GfxImage,
    image_view: GfxImageView,
    sampler: GfxSampler,
}

impl GfxTextureCube {
    pub fn from_rgba8(face_size: u32, data: &[u8], name: &str) -> Self {
        let image = GfxImage::from_rgba8(face_size, face_size, 6, true, data, name);
        let image_view = GfxImageView::new(image.handle(), GfxImageViewDesc::new_cube(image.format()), name);
        let sampler = GfxSampler::new(&GfxSamplerCreateInfo::new().clamp_to_edge(), name);

        Self {
            image,
            image_view,
            sampler,
        }
    }

    #[inline]
    pub fn image(&self) -> &GfxImage {
        &self.image
    }

    #[inline]
    pub fn descriptor_image_info(&self) -> vk::DescriptorImageInfo {
        vk::DescriptorImageInfo::default()
            .sampler(self.sampler.handle())
            .image_view(self.image_view.handle())
            .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
    }

    pub fn destroy(self) {
        self.image_view.destroy();
        self.image.destroy();
    }
}

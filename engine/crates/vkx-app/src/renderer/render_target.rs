use ash::vk;
use vkx_gfx::commands::barrier::{GfxBarrierMask, GfxImageBarrier};
use vkx_gfx::gfx::Gfx;
use vkx_gfx::resources::{
    image::{GfxImage, GfxImageCreateInfo, VulkanFormatUtils},
    image_view::{GfxImageView, GfxImageViewDesc},
};

/// 一张 2D attachment 以及它的 view
///
/// G-buffer、离屏 color/depth、每帧的输出 render target 都使用这个结构
pub struct RenderTarget {
    image: GfxImage,
    view: GfxImageView,
}
// new & init
impl RenderTarget {
    pub fn new(extent: vk::Extent2D, format: vk::Format, usage: vk::ImageUsageFlags, name: &str) -> Self {
        let image = GfxImage::new_device_local(&GfxImageCreateInfo::new_image_2d_info(extent, format, usage), name);
        // 采样用的 view 只能包含一个 aspect
        let view_aspect = if VulkanFormatUtils::is_depth_format(format) {
            vk::ImageAspectFlags::DEPTH
        } else {
            vk::ImageAspectFlags::COLOR
        };
        let view = GfxImageView::new(image.handle(), GfxImageViewDesc::new_2d(format, view_aspect), name);
        Self { image, view }
    }

    /// 可以作为 color attachment 写入，之后被采样
    #[inline]
    pub fn new_color(extent: vk::Extent2D, format: vk::Format, name: &str) -> Self {
        Self::new(
            extent,
            format,
            vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::SAMPLED,
            name,
        )
    }

    #[inline]
    pub fn new_depth(extent: vk::Extent2D, format: vk::Format, name: &str) -> Self {
        Self::new(
            extent,
            format,
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT | vk::ImageUsageFlags::SAMPLED,
            name,
        )
    }

    /// compute shader 写入的 storage image
    ///
    /// 存在独立的 compute queue 时使用 CONCURRENT 共享，graphics 与 compute 之间只需要 semaphore 同步
    pub fn new_storage(extent: vk::Extent2D, format: vk::Format, name: &str) -> Self {
        let gfx = Gfx::get();
        let mut image_ci = GfxImageCreateInfo::new_storage_image_2d_info(extent, format);
        if gfx.has_dedicated_compute_queue() {
            image_ci = image_ci.queue_family_indices(&[
                gfx.gfx_queue_family().queue_family_index,
                gfx.compute_queue_family().queue_family_index,
            ]);
        }
        let image = GfxImage::new_device_local(&image_ci, name);
        let view =
            GfxImageView::new(image.handle(), GfxImageViewDesc::new_2d(format, vk::ImageAspectFlags::COLOR), name);
        Self { image, view }
    }
}
// getters
impl RenderTarget {
    #[inline]
    pub fn image(&self) -> &GfxImage {
        &self.image
    }

    #[inline]
    pub fn handle(&self) -> vk::Image {
        self.image.handle()
    }

    #[inline]
    pub fn view(&self) -> vk::ImageView {
        self.view.handle()
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.image.extent()
    }

    #[inline]
    pub fn format(&self) -> vk::Format {
        self.image.format()
    }

    #[inline]
    pub fn aspect(&self) -> vk::ImageAspectFlags {
        aspect_of(self.image.format())
    }

    /// 以 `layout` 被 shader 采样时的 descriptor
    #[inline]
    pub fn descriptor_image_info(&self, sampler: vk::Sampler, layout: vk::ImageLayout) -> vk::DescriptorImageInfo {
        vk::DescriptorImageInfo::default().sampler(sampler).image_view(self.view()).image_layout(layout)
    }
}
// barriers
impl RenderTarget {
    /// 丢弃旧内容，转换为 attachment layout
    ///
    /// 上一次的使用者是 fragment shader 的采样，或者上一帧的 attachment 写入
    pub fn barrier_to_attachment(&self) -> GfxImageBarrier {
        let barrier = GfxImageBarrier::new().image(self.handle()).image_aspect_flag(self.aspect());
        if VulkanFormatUtils::is_depth_format(self.format()) {
            barrier
                .src_mask(
                    vk::PipelineStageFlags2::FRAGMENT_SHADER | vk::PipelineStageFlags2::LATE_FRAGMENT_TESTS,
                    vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE,
                )
                .layout_transfer(vk::ImageLayout::UNDEFINED, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL)
                .dst_mask(
                    vk::PipelineStageFlags2::EARLY_FRAGMENT_TESTS | vk::PipelineStageFlags2::LATE_FRAGMENT_TESTS,
                    vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_READ | vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE,
                )
        } else {
            barrier
                .src_mask(
                    vk::PipelineStageFlags2::FRAGMENT_SHADER | vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
                    vk::AccessFlags2::COLOR_ATTACHMENT_WRITE,
                )
                .layout_transfer(vk::ImageLayout::UNDEFINED, vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                .dst_mask(vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT, vk::AccessFlags2::COLOR_ATTACHMENT_WRITE)
        }
    }

    /// attachment 写入完成，之后在 fragment shader 中采样
    pub fn barrier_to_sampled(&self) -> GfxImageBarrier {
        let barrier = GfxImageBarrier::new().image(self.handle()).image_aspect_flag(self.aspect());
        if VulkanFormatUtils::is_depth_format(self.format()) {
            barrier
                .layout_transfer(
                    vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
                    vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL,
                )
                .mask(GfxBarrierMask::DEPTH_WRITE_TO_SAMPLE)
        } else {
            barrier
                .layout_transfer(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                .mask(GfxBarrierMask::COLOR_WRITE_TO_SAMPLE)
        }
    }

    /// 采样时使用的 layout，与 [`Self::barrier_to_sampled`] 对应
    #[inline]
    pub fn sampled_layout(&self) -> vk::ImageLayout {
        if VulkanFormatUtils::is_depth_format(self.format()) {
            vk::ImageLayout::DEPTH_STENCIL_READ_ONLY_OPTIMAL
        } else {
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
        }
    }
}
// destroy
impl RenderTarget {
    pub fn destroy(self) {
        self.view.destroy();
        self.image.destroy();
    }
}

/// 带 stencil 的深度格式在做 layout 转换时需要同时包含 stencil aspect
pub fn aspect_of(format: vk::Format) -> vk::ImageAspectFlags {
    match format {
        vk::Format::D16_UNORM_S8_UINT | vk::Format::D24_UNORM_S8_UINT | vk::Format::D32_SFLOAT_S8_UINT => {
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        }
        f if VulkanFormatUtils::is_depth_format(f) => vk::ImageAspectFlags::DEPTH,
        _ => vk::ImageAspectFlags::COLOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_follows_format() {
        assert_eq!(aspect_of(vk::Format::R8G8B8A8_UNORM), vk::ImageAspectFlags::COLOR);
        assert_eq!(aspect_of(vk::Format::D32_SFLOAT), vk::ImageAspectFlags::DEPTH);
        assert_eq!(
            aspect_of(vk::Format::D24_UNORM_S8_UINT),
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        );
    }
}

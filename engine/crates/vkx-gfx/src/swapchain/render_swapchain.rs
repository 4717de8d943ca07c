use ash::vk;
use ash::vk::Handle;
use itertools::Itertools;

use crate::{
    commands::{command_queue::GfxCommandQueue, fence::GfxFence, semaphore::GfxSemaphore},
    gfx::Gfx,
    resources::image_view::{GfxImageView, GfxImageViewDesc},
    swapchain::surface::GfxSurface,
};

pub struct GfxRenderSwapchain {
    surface: GfxSurface,
    swapchain_handle: vk::SwapchainKHR,

    swapchain_images: Vec<vk::Image>,
    swapchain_image_views: Vec<GfxImageView>,
    swapchain_image_index: usize,

    color_format: vk::Format,
    swapchain_extent: vk::Extent2D,
}
// new & init
impl GfxRenderSwapchain {
    pub fn new(
        raw_display_handle: raw_window_handle::RawDisplayHandle,
        raw_window_handle: raw_window_handle::RawWindowHandle,
        present_mode: vk::PresentModeKHR,
        surface_format: vk::SurfaceFormatKHR,
        window_physical_extent: vk::Extent2D,
    ) -> Self {
        let surface = GfxSurface::new(raw_display_handle, raw_window_handle);
        assert!(surface.supports_present(), "gfx queue family can not present to the window surface");

        let present_mode = if surface.supported_present_modes().contains(&present_mode) {
            present_mode
        } else {
            log::warn!("present mode {:?} is not supported, fallback to FIFO", present_mode);
            vk::PresentModeKHR::FIFO
        };

        let surface_capabilities = surface.get_capabilities();
        let extent = Self::calculate_swapchain_extent(&surface_capabilities, window_physical_extent);
        log::info!(
            "create swapchain: surface current extent: {}x{}, window extent: {}x{}, final extent: {}x{}, present mode: {:?}",
            surface_capabilities.current_extent.width,
            surface_capabilities.current_extent.height,
            window_physical_extent.width,
            window_physical_extent.height,
            extent.width,
            extent.height,
            present_mode,
        );

        let swapchain_handle = Self::create_swapchain(&surface, surface_format, extent, present_mode);
        let images = unsafe { Gfx::get().gfx_device().swapchain.get_swapchain_images(swapchain_handle).unwrap() };
        let image_views = images
            .iter()
            .enumerate()
            .map(|(idx, image)| {
                GfxImageView::new(
                    *image,
                    GfxImageViewDesc::new_2d(surface_format.format, vk::ImageAspectFlags::COLOR),
                    format!("swapchain-{}", idx),
                )
            })
            .collect_vec();

        Self {
            surface,
            swapchain_handle,
            swapchain_images: images,
            swapchain_image_views: image_views,
            swapchain_image_index: 0,
            swapchain_extent: extent,
            color_format: surface_format.format,
        }
    }

    fn create_swapchain(
        surface: &GfxSurface,
        surface_format: vk::SurfaceFormatKHR,
        extent: vk::Extent2D,
        present_mode: vk::PresentModeKHR,
    ) -> vk::SwapchainKHR {
        let surface_capabilities = surface.get_capabilities();

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface.handle)
            .min_image_count(Self::calculate_image_count(&surface_capabilities))
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST)
            .pre_transform(surface_capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .clipped(true);

        let gfx_device = Gfx::get().gfx_device();
        let swapchain_handle = unsafe { gfx_device.swapchain.create_swapchain(&create_info, None).unwrap() };
        gfx_device.set_object_debug_name(swapchain_handle, "GfxSwapchain::main");
        swapchain_handle
    }
}
// getters
impl GfxRenderSwapchain {
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain_extent
    }

    #[inline]
    pub fn format(&self) -> vk::Format {
        self.color_format
    }

    #[inline]
    pub fn image_cnt(&self) -> usize {
        self.swapchain_images.len()
    }

    #[inline]
    pub fn current_image_index(&self) -> usize {
        self.swapchain_image_index
    }

    #[inline]
    pub fn current_image(&self) -> vk::Image {
        self.swapchain_images[self.swapchain_image_index]
    }

    #[inline]
    pub fn current_image_view(&self) -> &GfxImageView {
        &self.swapchain_image_views[self.swapchain_image_index]
    }

    #[inline]
    pub fn surface_capabilities(&self) -> vk::SurfaceCapabilitiesKHR {
        self.surface.get_capabilities()
    }
}
// tools
impl GfxRenderSwapchain {
    /// 如果 current_extent 为特殊值 0xFFFFFFFF，则表示可以自己设置交换链的 extent
    pub fn calculate_swapchain_extent(
        surface_capabilities: &vk::SurfaceCapabilitiesKHR,
        window_physical_extent: vk::Extent2D,
    ) -> vk::Extent2D {
        let surface_extent = surface_capabilities.current_extent;
        if surface_extent.width == u32::MAX || surface_extent.height == u32::MAX {
            let width = window_physical_extent
                .width
                .clamp(surface_capabilities.min_image_extent.width, surface_capabilities.max_image_extent.width);
            let height = window_physical_extent
                .height
                .clamp(surface_capabilities.min_image_extent.height, surface_capabilities.max_image_extent.height);
            vk::Extent2D { width, height }
        } else {
            surface_extent
        }
    }

    /// max_image_count == 0，表示不限制 image 数量
    pub fn calculate_image_count(surface_capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
        if surface_capabilities.max_image_count == 0 {
            surface_capabilities.min_image_count + 1
        } else {
            u32::min(surface_capabilities.max_image_count, surface_capabilities.min_image_count + 1)
        }
    }
}
// update
impl GfxRenderSwapchain {
    /// timeout: nano seconds
    ///
    /// return:
    /// - `None`: swapchain 已经过期，没有获取到 image，semaphore 不会被 signal
    /// - `Some(suboptimal)`: 获取到了 image，`suboptimal` 表示是否应该在本帧之后重建
    pub fn acquire_next_image(
        &mut self,
        semaphore: Option<&GfxSemaphore>,
        fence: Option<&GfxFence>,
        timeout: u64,
    ) -> Option<bool> {
        let result = unsafe {
            Gfx::get().gfx_device().swapchain.acquire_next_image(
                self.swapchain_handle,
                timeout,
                semaphore.map_or(vk::Semaphore::null(), |s| s.handle()),
                fence.map_or(vk::Fence::null(), |f| f.handle()),
            )
        };

        match result {
            Ok((image_index, is_suboptimal)) => {
                if is_suboptimal {
                    log::warn!("swapchain acquire image index {} is not optimal", image_index);
                }
                self.swapchain_image_index = image_index as usize;
                Some(is_suboptimal)
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                log::warn!("swapchain is out of date when acquire next image");
                None
            }
            Err(e) => panic!("failed to acquire next swapchain image: {:?}", e),
        }
    }

    /// return: 是否需要重建
    pub fn present_image(&self, queue: &GfxCommandQueue, wait_semaphores: &[&GfxSemaphore]) -> bool {
        let wait_semaphores = wait_semaphores.iter().map(|s| s.handle()).collect_vec();
        let image_indices = [self.swapchain_image_index as u32];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .image_indices(&image_indices)
            .swapchains(std::slice::from_ref(&self.swapchain_handle));

        let result = unsafe { Gfx::get().gfx_device().swapchain.queue_present(queue.handle(), &present_info) };
        match result {
            Ok(is_suboptimal) => {
                if is_suboptimal {
                    log::warn!("swapchain present image index {} is not optimal", self.swapchain_image_index);
                }
                is_suboptimal
            }
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                log::warn!("swapchain is out of date when present image");
                true
            }
            Err(e) => panic!("failed to present swapchain image: {:?}", e),
        }
    }
}
// destroy
impl GfxRenderSwapchain {
    pub fn destroy(mut self) {
        std::mem::take(&mut self.swapchain_image_views).into_iter().for_each(GfxImageView::destroy);
        unsafe {
            Gfx::get().gfx_device().swapchain.destroy_swapchain(self.swapchain_handle, None);
        }
        self.swapchain_handle = vk::SwapchainKHR::null();
    }
}
impl Drop for GfxRenderSwapchain {
    fn drop(&mut self) {
        assert!(self.swapchain_handle.is_null());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(current: (u32, u32), min_count: u32, max_count: u32) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: current.0,
                height: current.1,
            },
            min_image_extent: vk::Extent2D { width: 1, height: 1 },
            max_image_extent: vk::Extent2D {
                width: 4096,
                height: 4096,
            },
            min_image_count: min_count,
            max_image_count: max_count,
            ..Default::default()
        }
    }

    #[test]
    fn extent_follows_surface_when_fixed() {
        let extent = GfxRenderSwapchain::calculate_swapchain_extent(
            &caps((800, 600), 2, 3),
            vk::Extent2D {
                width: 1920,
                height: 1080,
            },
        );
        assert_eq!((extent.width, extent.height), (800, 600));
    }

    #[test]
    fn extent_clamped_to_window_when_free() {
        let extent = GfxRenderSwapchain::calculate_swapchain_extent(
            &caps((u32::MAX, u32::MAX), 2, 3),
            vk::Extent2D {
                width: 8000,
                height: 720,
            },
        );
        assert_eq!((extent.width, extent.height), (4096, 720));
    }

    #[test]
    fn image_count() {
        assert_eq!(GfxRenderSwapchain::calculate_image_count(&caps((1, 1), 2, 0)), 3);
        assert_eq!(GfxRenderSwapchain::calculate_image_count(&caps((1, 1), 2, 2)), 2);
    }
}

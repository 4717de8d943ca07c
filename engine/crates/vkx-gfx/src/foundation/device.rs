use ash::vk;
use itertools::Itertools;
#[cfg(debug_assertions)]
use std::cell::Cell;
use std::{
    ffi::{CStr, CString},
    ops::Deref,
};

use crate::{descriptors::descriptor_cursor::GfxWriteDescriptorSet, foundation::debug_messenger::DebugType};

/// 可选的 device features，创建 device 时根据物理设备的支持情况决定是否开启
#[derive(Debug, Clone, Copy, Default)]
pub struct GfxDeviceFeatures {
    /// 一次 vkCmdDrawIndexedIndirect 中 drawCount > 1
    pub multi_draw_indirect: bool,
    /// indirect command 中 firstInstance 可以不为 0
    pub draw_indirect_first_instance: bool,
    pub sampler_anisotropy: bool,
}

impl GfxDeviceFeatures {
    pub fn from_supported(supported: &vk::PhysicalDeviceFeatures) -> Self {
        Self {
            multi_draw_indirect: supported.multi_draw_indirect == vk::TRUE,
            draw_indirect_first_instance: supported.draw_indirect_first_instance == vk::TRUE,
            sampler_anisotropy: supported.sampler_anisotropy == vk::TRUE,
        }
    }

    fn to_vk(self) -> vk::PhysicalDeviceFeatures {
        vk::PhysicalDeviceFeatures::default()
            .multi_draw_indirect(self.multi_draw_indirect)
            .draw_indirect_first_instance(self.draw_indirect_first_instance)
            .sampler_anisotropy(self.sampler_anisotropy)
    }
}

/// Vulkan 逻辑设备封装
///
/// 包含核心设备 API 以及扩展的函数指针。
///
/// # 扩展支持
/// - Dynamic Rendering (KHR)
/// - Debug Utils (EXT)
/// - Swapchain (KHR)
pub struct GfxDevice {
    /// 核心 Vulkan 设备 API
    pub(crate) device: ash::Device,
    /// 动态渲染扩展 API
    pub(crate) dynamic_rendering: ash::khr::dynamic_rendering::Device,
    /// 调试工具扩展 API
    pub(crate) debug_utils: ash::ext::debug_utils::Device,
    /// 交换链扩展 API
    pub(crate) swapchain: ash::khr::swapchain::Device,

    pub(crate) enabled_features: GfxDeviceFeatures,

    #[cfg(debug_assertions)]
    destroyed: Cell<bool>,
}

// 构造与销毁
impl GfxDevice {
    pub fn new(
        instance: &ash::Instance,
        pdevice: vk::PhysicalDevice,
        queue_create_info: &[vk::DeviceQueueCreateInfo],
        features: GfxDeviceFeatures,
    ) -> Self {
        let _span = tracy_client::span!("GfxDevice::new");

        let device_exts = Self::basic_device_exts().iter().map(|e| e.as_ptr()).collect_vec();
        let exts_str = device_exts.iter().map(|ext| format!("\n\t{:?}", unsafe { CStr::from_ptr(*ext) })).join("");
        log::info!("device exts: {}", exts_str);
        log::info!("device optional features: {:?}", features);

        let mut all_features = vk::PhysicalDeviceFeatures2::default().features(features.to_vk());
        let mut physical_device_ext_features = Self::physical_device_extra_features();
        unsafe {
            physical_device_ext_features.iter_mut().for_each(|f| {
                let ptr = <*mut dyn vk::ExtendsPhysicalDeviceFeatures2>::cast::<vk::BaseOutStructure>(f.as_mut());
                (*ptr).p_next = all_features.p_next as _;
                all_features.p_next = ptr as _;
            });
        }

        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(queue_create_info)
            .enabled_extension_names(&device_exts)
            .push_next(&mut all_features);

        let device = unsafe { instance.create_device(pdevice, &device_create_info, None).unwrap() };

        let vk_dynamic_render_pf = ash::khr::dynamic_rendering::Device::new(instance, &device);
        let vk_debug_utils_device = ash::ext::debug_utils::Device::new(instance, &device);
        let vk_swapchain = ash::khr::swapchain::Device::new(instance, &device);

        Self {
            device,
            dynamic_rendering: vk_dynamic_render_pf,
            debug_utils: vk_debug_utils_device,
            swapchain: vk_swapchain,
            enabled_features: features,

            #[cfg(debug_assertions)]
            destroyed: Cell::new(false),
        }
    }

    pub fn destroy(&self) {
        log::info!("destroying device");

        #[cfg(debug_assertions)]
        self.destroyed.set(true);

        unsafe {
            self.device.destroy_device(None);
        }
    }
}

// 创建过程的辅助函数
impl GfxDevice {
    /// 必要的 physical device extension features
    fn physical_device_extra_features() -> Vec<Box<dyn vk::ExtendsPhysicalDeviceFeatures2>> {
        vec![
            Box::new(vk::PhysicalDeviceDynamicRenderingFeatures::default().dynamic_rendering(true)),
            Box::new(vk::PhysicalDeviceSynchronization2Features::default().synchronization2(true)),
            Box::new(vk::PhysicalDeviceShaderDrawParametersFeatures::default().shader_draw_parameters(true)),
        ]
    }

    /// 必要的 device extensions
    fn basic_device_exts() -> Vec<&'static CStr> {
        vec![
            ash::khr::swapchain::NAME,
            // 已经提升到 core-1.3，仍然通过扩展的函数指针调用
            ash::khr::dynamic_rendering::NAME,
        ]
    }
}

// getters
impl GfxDevice {
    #[inline]
    pub fn vk_handle(&self) -> vk::Device {
        self.device.handle()
    }
    #[inline]
    pub fn dynamic_rendering(&self) -> &ash::khr::dynamic_rendering::Device {
        &self.dynamic_rendering
    }
    #[inline]
    pub fn debug_utils(&self) -> &ash::ext::debug_utils::Device {
        &self.debug_utils
    }
    #[inline]
    pub fn swapchain(&self) -> &ash::khr::swapchain::Device {
        &self.swapchain
    }
    #[inline]
    pub fn enabled_features(&self) -> GfxDeviceFeatures {
        self.enabled_features
    }
}

// tools
impl GfxDevice {
    #[inline]
    pub fn write_descriptor_sets(&self, writes: &[GfxWriteDescriptorSet]) {
        GfxWriteDescriptorSet::with_writes(writes, |writes| unsafe {
            self.device.update_descriptor_sets(writes, &[]);
        })
    }

    #[inline]
    pub fn set_object_debug_name<T: vk::Handle>(&self, handle: T, name: impl AsRef<str>) {
        let name = CString::new(name.as_ref()).unwrap();
        unsafe {
            self.debug_utils
                .set_debug_utils_object_name(
                    &vk::DebugUtilsObjectNameInfoEXT::default().object_name(name.as_c_str()).object_handle(handle),
                )
                .unwrap();
        }
    }

    /// debug name 的格式为 `{Type}::{name}`
    pub fn set_debug_name<T: DebugType>(&self, handle: &T, name: impl AsRef<str>) {
        let debug_name = format!("{}::{}", T::debug_type_name(), name.as_ref());
        self.set_object_debug_name(handle.vk_handle(), debug_name);
    }

    #[inline]
    pub fn wait_idle(&self) {
        unsafe {
            self.device.device_wait_idle().unwrap();
        }
    }
}

impl Deref for GfxDevice {
    type Target = ash::Device;
    fn deref(&self) -> &Self::Target {
        &self.device
    }
}
impl Drop for GfxDevice {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        debug_assert!(self.destroyed.get(), "GfxDevice must be destroyed before being dropped.");
    }
}
impl DebugType for GfxDevice {
    fn debug_type_name() -> &'static str {
        "GfxDevice"
    }
    fn vk_handle(&self) -> impl vk::Handle {
        self.device.handle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn features_follow_support() {
        let supported = vk::PhysicalDeviceFeatures::default().multi_draw_indirect(true).sampler_anisotropy(false);
        let features = GfxDeviceFeatures::from_supported(&supported);
        assert!(features.multi_draw_indirect);
        assert!(!features.sampler_anisotropy);
        assert!(!features.draw_indirect_first_instance);
        assert_eq!(features.to_vk().multi_draw_indirect, vk::TRUE);
    }
}

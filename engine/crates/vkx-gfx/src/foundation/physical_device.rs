use std::ffi::CStr;

use ash::vk;
use itertools::Itertools;

use crate::{commands::command_queue::GfxQueueFamily, foundation::debug_messenger::DebugType};

/// 表示一张物理显卡
pub struct GfxPhysicalDevice {
    pub(crate) vk_handle: vk::PhysicalDevice,

    /// 当前 gpu 支持的 features
    pub(crate) features: vk::PhysicalDeviceFeatures,

    /// 当前 gpu 的基础属性
    pub(crate) basic_props: vk::PhysicalDeviceProperties,

    pub(crate) gfx_queue_family: GfxQueueFamily,
    /// 不支持 graphics 的 compute 队列族，不一定存在
    pub(crate) compute_queue_family: Option<GfxQueueFamily>,
}

impl GfxPhysicalDevice {
    /// 优先选择独立显卡，如果没有则选择第一个可用的显卡
    pub fn new_descrete_physical_device(instance: &ash::Instance) -> Self {
        unsafe {
            instance
                .enumerate_physical_devices()
                .unwrap()
                .iter()
                .map(|pdevice| GfxPhysicalDevice::new(*pdevice, instance))
                .find_or_first(GfxPhysicalDevice::is_descrete_gpu)
                .expect("no vulkan physical device found")
        }
    }

    fn new(pdevice: vk::PhysicalDevice, instance: &ash::Instance) -> Self {
        unsafe {
            let basic_props = instance.get_physical_device_properties(pdevice);
            let physical_device_name = CStr::from_ptr(basic_props.device_name.as_ptr());
            log::info!("found gpu: {:?}, type: {:?}", physical_device_name, basic_props.device_type);
            log::debug!("physical device limits:\n{:#?}", basic_props.limits);

            let device_extensions = instance.enumerate_device_extension_properties(pdevice).unwrap();
            let device_extension_strs = device_extensions
                .iter()
                .map(|ext| CStr::from_ptr(ext.extension_name.as_ptr()).to_string_lossy().to_string())
                .join("\n");
            log::debug!("physical device supports extensions: {}", device_extension_strs);

            let queue_familiy_props = instance.get_physical_device_queue_family_properties(pdevice);
            log::info!("physical device: queue family props:\n{:#?}", queue_familiy_props);

            let gfx_queue_family = find_queue_family(
                &queue_familiy_props,
                "gfx",
                vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
                vk::QueueFlags::empty(),
            )
            .expect("no queue family supports graphics + compute + transfer");

            let compute_queue_family = find_queue_family(
                &queue_familiy_props,
                "compute-only",
                vk::QueueFlags::COMPUTE,
                vk::QueueFlags::GRAPHICS,
            );

            Self {
                features: instance.get_physical_device_features(pdevice),
                vk_handle: pdevice,
                basic_props,
                gfx_queue_family,
                compute_queue_family,
            }
        }
    }

    pub fn destroy(self) {
        // 无需销毁
    }

    /// 当前 gpu 是否是独立显卡
    #[inline]
    pub fn is_descrete_gpu(&self) -> bool {
        self.basic_props.device_type == vk::PhysicalDeviceType::DISCRETE_GPU
    }

    #[inline]
    pub fn limits(&self) -> &vk::PhysicalDeviceLimits {
        &self.basic_props.limits
    }
}

/// 找到第一个包含 `include_flags` 全部能力，且不包含 `exclude_flags` 任何能力的 queue family
fn find_queue_family(
    props: &[vk::QueueFamilyProperties],
    name: &str,
    include_flags: vk::QueueFlags,
    exclude_flags: vk::QueueFlags,
) -> Option<GfxQueueFamily> {
    props
        .iter()
        .enumerate()
        .find(|(_, props)| props.queue_flags.contains(include_flags) && (props.queue_flags & exclude_flags).is_empty())
        .map(|(family_idx, props)| GfxQueueFamily {
            name: name.to_string(),
            queue_family_index: family_idx as u32,
            queue_flags: props.queue_flags,
            queue_count: props.queue_count,
        })
}

impl DebugType for GfxPhysicalDevice {
    fn debug_type_name() -> &'static str {
        "GfxPhysicalDevice"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.vk_handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    #[test]
    fn finds_dedicated_compute_family() {
        let props = [
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
        ];
        let gfx = find_queue_family(
            &props,
            "gfx",
            vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE,
            vk::QueueFlags::empty(),
        )
        .unwrap();
        assert_eq!(gfx.queue_family_index, 0);

        let compute =
            find_queue_family(&props, "compute-only", vk::QueueFlags::COMPUTE, vk::QueueFlags::GRAPHICS).unwrap();
        assert_eq!(compute.queue_family_index, 2);
        assert_eq!(compute.name, "compute-only");
    }

    #[test]
    fn missing_family_is_none() {
        let props = [family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE)];
        assert!(find_queue_family(&props, "compute-only", vk::QueueFlags::COMPUTE, vk::QueueFlags::GRAPHICS).is_none());
    }
}

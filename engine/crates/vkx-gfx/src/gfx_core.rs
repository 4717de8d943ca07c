use std::{ffi::CStr, rc::Rc};

use ash::vk;

use crate::{
    commands::command_queue::GfxCommandQueue,
    foundation::{
        debug_messenger::GfxDebugMsger,
        device::{GfxDevice, GfxDeviceFeatures},
        instance::GfxInstance,
        physical_device::GfxPhysicalDevice,
    },
};

pub struct GfxCore {
    /// vk 基础函数的接口
    ///
    /// 在 drop 之后，会卸载 dll，因此需要确保该字段最后 drop
    pub(crate) vk_entry: ash::Entry,

    pub(crate) instance: GfxInstance,
    pub(crate) physical_device: GfxPhysicalDevice,

    /// queue 以及 command pool 需要在 Gfx 单例就绪之前访问 device
    pub(crate) gfx_device: Rc<GfxDevice>,

    pub(crate) debug_utils: GfxDebugMsger,

    pub(crate) gfx_queue: GfxCommandQueue,

    /// 只有物理设备存在 compute-only 的 queue family 时才会创建
    pub(crate) compute_queue: Option<GfxCommandQueue>,
}

// 创建与销毁
impl GfxCore {
    pub fn new(app_name: String, engine_name: String, instance_extra_exts: Vec<&'static CStr>) -> Self {
        let _span = tracy_client::span!("GfxCore::new");

        let vk_pf = unsafe { ash::Entry::load() }.expect("Failed to load vulkan entry");
        let instance = GfxInstance::new(&vk_pf, app_name, engine_name, instance_extra_exts);
        let physical_device = GfxPhysicalDevice::new_descrete_physical_device(instance.ash_instance());

        let priorities = [1.0_f32];
        let mut queue_create_infos = vec![
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(physical_device.gfx_queue_family.queue_family_index)
                .queue_priorities(&priorities),
        ];
        if let Some(compute_family) = &physical_device.compute_queue_family {
            queue_create_infos.push(
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(compute_family.queue_family_index)
                    .queue_priorities(&priorities),
            );
        }

        let features = GfxDeviceFeatures::from_supported(&physical_device.features);
        let device = Rc::new(GfxDevice::new(
            &instance.ash_instance,
            physical_device.vk_handle,
            &queue_create_infos,
            features,
        ));

        let gfx_queue = GfxCommandQueue {
            vk_queue: unsafe { device.get_device_queue(physical_device.gfx_queue_family.queue_family_index, 0) },
            queue_family: physical_device.gfx_queue_family.clone(),
            gfx_device: device.clone(),
        };
        let compute_queue = physical_device.compute_queue_family.as_ref().map(|family| GfxCommandQueue {
            vk_queue: unsafe { device.get_device_queue(family.queue_family_index, 0) },
            queue_family: family.clone(),
            gfx_device: device.clone(),
        });

        let debug_utils = GfxDebugMsger::new(&vk_pf, &instance.ash_instance);

        log::info!("gfx queue's queue family:\n{:#?}", gfx_queue.queue_family);
        match &compute_queue {
            Some(queue) => log::info!("dedicated compute queue family:\n{:#?}", queue.queue_family),
            None => log::info!("no dedicated compute queue family, compute work goes to gfx queue"),
        }

        // 在 device 以及 debug_utils 之前创建的 vk::Handle
        {
            device.set_object_debug_name(instance.vk_instance(), "GfxInstance");
            device.set_object_debug_name(physical_device.vk_handle, "GfxPhysicalDevice");

            device.set_object_debug_name(device.vk_handle(), "GfxDevice");
            device.set_object_debug_name(gfx_queue.vk_queue, "GfxCommandQueue-gfx");
            if let Some(queue) = &compute_queue {
                device.set_object_debug_name(queue.vk_queue, "GfxCommandQueue-compute");
            }
        }

        Self {
            vk_entry: vk_pf,
            instance,
            physical_device,
            gfx_device: device,
            debug_utils,
            gfx_queue,
            compute_queue,
        }
    }

    pub fn destroy(self) {
        self.debug_utils.destroy();
        self.gfx_device.destroy();
        self.physical_device.destroy();
        self.instance.destroy();
    }
}

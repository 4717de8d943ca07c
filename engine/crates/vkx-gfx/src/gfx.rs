use std::ffi::CStr;

use ash::vk;

use crate::{
    commands::{
        command_buffer::GfxCommandBuffer,
        command_pool::GfxCommandPool,
        command_queue::{GfxCommandQueue, GfxQueueFamily},
        submit_info::GfxSubmitInfo,
    },
    foundation::{
        device::{GfxDevice, GfxDeviceFeatures},
        instance::GfxInstance,
        mem_allocator::GfxMemAllocator,
        physical_device::GfxPhysicalDevice,
    },
    gfx_core::GfxCore,
};

/// Vulkan 图形上下文单例
///
/// 管理所有 Vulkan 核心资源，包括实例、设备、队列、内存分配器等。
/// 仅适用于单线程环境。
///
/// # 初始化流程
/// ```ignore
/// Gfx::init("ssss".to_string(), extra_extensions);
/// let device = Gfx::get().gfx_device();
/// // 使用...
/// Gfx::destroy();
/// ```
pub struct Gfx {
    pub(crate) gfx_core: GfxCore,
    pub(crate) vm_allocator: GfxMemAllocator,

    /// 临时的 graphics command pool，用于 one-time 的命令
    pub(crate) temp_graphics_command_pool: GfxCommandPool,
}

// 创建与销毁
impl Gfx {
    const ENGINE_NAME: &'static str = "vkx";

    fn new(app_name: String, instance_extra_exts: Vec<&'static CStr>) -> Self {
        let gfx_core = GfxCore::new(app_name, Self::ENGINE_NAME.to_string(), instance_extra_exts);

        // 单例尚未就绪，使用显式传参的版本
        let gfx_command_pool = GfxCommandPool::new_internal(
            &gfx_core.gfx_device,
            gfx_core.physical_device.gfx_queue_family.clone(),
            vk::CommandPoolCreateFlags::empty(),
            "gfx-temp-graphics",
        );

        let allocator = GfxMemAllocator::new(
            &gfx_core.instance.ash_instance,
            gfx_core.physical_device.vk_handle,
            &gfx_core.gfx_device,
        );

        Self {
            gfx_core,
            vm_allocator: allocator,
            temp_graphics_command_pool: gfx_command_pool,
        }
    }
}

static mut G_GFX: Option<Gfx> = None;

// 单例
impl Gfx {
    /// # Panics
    /// 如果 Gfx 还未初始化，此方法会 panic
    #[inline]
    pub fn get() -> &'static Gfx {
        unsafe {
            // 使用 addr_of! 避免直接对 static mut 创建引用
            let ptr = std::ptr::addr_of!(G_GFX);
            (*ptr).as_ref().expect("Gfx not initialized. Call Gfx::init() first.")
        }
    }

    /// # Panics
    /// 重复初始化会 panic
    pub fn init(app_name: String, instance_extra_exts: Vec<&'static CStr>) {
        unsafe {
            let ptr = std::ptr::addr_of_mut!(G_GFX);
            assert!((*ptr).is_none(), "Gfx already initialized");
            *ptr = Some(Self::new(app_name, instance_extra_exts));
        }
    }

    /// 调用之后不应再使用 [`Gfx::get`]
    pub fn destroy() {
        unsafe {
            let ptr = std::ptr::addr_of_mut!(G_GFX);
            let mut gfx = (*ptr).take().expect("Gfx not initialized");

            gfx.vm_allocator.destroy();
            gfx.temp_graphics_command_pool.destroy_internal(&gfx.gfx_core.gfx_device);
            gfx.gfx_core.destroy();
        }
    }
}

// getter
impl Gfx {
    #[inline]
    pub fn gfx_core(&self) -> &GfxCore {
        &self.gfx_core
    }

    #[inline]
    pub fn instance(&self) -> &GfxInstance {
        &self.gfx_core.instance
    }

    #[inline]
    pub fn gfx_device(&self) -> &GfxDevice {
        &self.gfx_core.gfx_device
    }

    #[inline]
    pub fn allocator(&self) -> &GfxMemAllocator {
        &self.vm_allocator
    }

    #[inline]
    pub fn physical_device(&self) -> &GfxPhysicalDevice {
        &self.gfx_core.physical_device
    }

    #[inline]
    pub fn device_features(&self) -> GfxDeviceFeatures {
        self.gfx_core.gfx_device.enabled_features()
    }

    #[inline]
    pub fn gfx_queue_family(&self) -> GfxQueueFamily {
        self.gfx_core.physical_device.gfx_queue_family.clone()
    }

    /// 没有独立的 compute queue family 时返回 gfx queue family
    #[inline]
    pub fn compute_queue_family(&self) -> GfxQueueFamily {
        self.compute_queue().queue_family().clone()
    }

    #[inline]
    pub fn gfx_queue(&self) -> &GfxCommandQueue {
        &self.gfx_core.gfx_queue
    }

    /// compute 工作提交到的队列：优先使用独立的 compute queue
    #[inline]
    pub fn compute_queue(&self) -> &GfxCommandQueue {
        self.gfx_core.compute_queue.as_ref().unwrap_or(&self.gfx_core.gfx_queue)
    }

    /// compute queue 与 gfx queue 属于不同的 queue family，资源需要做 ownership transfer
    #[inline]
    pub fn has_dedicated_compute_queue(&self) -> bool {
        self.gfx_core.compute_queue.is_some()
    }
}

// tools
impl Gfx {
    /// 根据给定的格式，返回支持的格式
    pub fn find_supported_format(
        &self,
        candidates: &[vk::Format],
        tiling: vk::ImageTiling,
        features: vk::FormatFeatureFlags,
    ) -> Vec<vk::Format> {
        candidates
            .iter()
            .filter(|f| {
                let props = unsafe {
                    self.instance()
                        .ash_instance
                        .get_physical_device_format_properties(self.physical_device().vk_handle, **f)
                };
                match tiling {
                    vk::ImageTiling::LINEAR => props.linear_tiling_features.contains(features),
                    vk::ImageTiling::OPTIMAL => props.optimal_tiling_features.contains(features),
                    _ => panic!("not supported tiling."),
                }
            })
            .copied()
            .collect()
    }

    /// 立即执行某个 command，并同步等待执行结果
    pub fn one_time_exec<F, R>(&self, func: F, name: impl AsRef<str>) -> R
    where
        F: FnOnce(&GfxCommandBuffer) -> R,
    {
        let command_buffer =
            GfxCommandBuffer::new(&self.temp_graphics_command_pool, &format!("one-time-{}", name.as_ref()));

        command_buffer.begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT, name.as_ref());
        let result = func(&command_buffer);
        command_buffer.end();

        self.gfx_queue().submit(vec![GfxSubmitInfo::new(std::slice::from_ref(&command_buffer))], None);
        self.gfx_queue().wait_idle();
        command_buffer.free();

        result
    }

    pub fn wait_idel(&self) {
        unsafe {
            self.gfx_device().device_wait_idle().unwrap();
        }
    }
}

use ash::vk;

use crate::{foundation::debug_messenger::DebugType, gfx::Gfx};

pub struct GfxDescriptorPoolCreateInfo {
    flags: vk::DescriptorPoolCreateFlags,
    max_sets: u32,
    pool_sizes: Vec<vk::DescriptorPoolSize>,
}

impl GfxDescriptorPoolCreateInfo {
    /// - max_sets: 最多可分配的 descriptor set 数量
    /// - pool_sizes: 每种类型 descriptor 的最大数量
    #[inline]
    pub fn new(flags: vk::DescriptorPoolCreateFlags, max_sets: u32, pool_sizes: Vec<vk::DescriptorPoolSize>) -> Self {
        Self {
            flags,
            max_sets,
            pool_sizes,
        }
    }

    #[inline]
    pub fn pool_sizes(&self) -> &[vk::DescriptorPoolSize] {
        &self.pool_sizes
    }
}

/// 描述符池，descriptor set 跟随 pool 一起释放
pub struct GfxDescriptorPool {
    handle: vk::DescriptorPool,
    name: String,
}
impl DebugType for GfxDescriptorPool {
    fn debug_type_name() -> &'static str {
        "GfxDescriptorPool"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
impl Drop for GfxDescriptorPool {
    fn drop(&mut self) {
        log::info!("Destroying GfxDescriptorPool: {}", self.name);
        unsafe { Gfx::get().gfx_device().destroy_descriptor_pool(self.handle, None) };
    }
}
impl GfxDescriptorPool {
    #[inline]
    pub fn new(ci: &GfxDescriptorPoolCreateInfo, name: &str) -> Self {
        let vk_ci = vk::DescriptorPoolCreateInfo::default()
            .flags(ci.flags)
            .max_sets(ci.max_sets)
            .pool_sizes(&ci.pool_sizes);
        let gfx_device = Gfx::get().gfx_device();
        let pool = unsafe { gfx_device.create_descriptor_pool(&vk_ci, None).unwrap() };
        let pool = Self {
            handle: pool,
            name: name.to_string(),
        };
        gfx_device.set_debug_name(&pool, name);
        pool
    }

    #[inline]
    pub fn handle(&self) -> vk::DescriptorPool {
        self.handle
    }
}

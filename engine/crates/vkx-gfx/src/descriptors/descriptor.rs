use std::marker::PhantomData;

use ash::vk;
use vkx_descriptor_layout_trait::DescriptorBindingLayout;

use crate::{descriptors::descriptor_pool::GfxDescriptorPool, foundation::debug_messenger::DebugType, gfx::Gfx};

/// 描述符集布局
///
/// 通过泛型参数 T 关联具体的绑定布局，布局信息由 `#[derive(DescriptorLayout)]` 生成
pub struct GfxDescriptorSetLayout<T: DescriptorBindingLayout> {
    layout: vk::DescriptorSetLayout,
    _phantom: PhantomData<T>,
}
impl<T: DescriptorBindingLayout> GfxDescriptorSetLayout<T> {
    pub fn new(flags: vk::DescriptorSetLayoutCreateFlags, debug_name: impl AsRef<str>) -> Self {
        let (bindings, binding_flags) = T::get_vk_bindings();
        let mut bind_flags_ci = vk::DescriptorSetLayoutBindingFlagsCreateInfo::default().binding_flags(&binding_flags);

        let create_info =
            vk::DescriptorSetLayoutCreateInfo::default().flags(flags).bindings(&bindings).push_next(&mut bind_flags_ci);

        let gfx_device = Gfx::get().gfx_device();
        let layout = unsafe { gfx_device.create_descriptor_set_layout(&create_info, None).unwrap() };
        let layout = Self {
            layout,
            _phantom: PhantomData,
        };
        gfx_device.set_debug_name(&layout, debug_name);
        layout
    }

    #[inline]
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }
}
impl<T: DescriptorBindingLayout> Drop for GfxDescriptorSetLayout<T> {
    fn drop(&mut self) {
        unsafe {
            Gfx::get().gfx_device().destroy_descriptor_set_layout(self.layout, None);
        }
    }
}
impl<T: DescriptorBindingLayout> DebugType for GfxDescriptorSetLayout<T> {
    fn debug_type_name() -> &'static str {
        "GfxDescriptorSetLayout"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.layout
    }
}

/// 描述符集
///
/// # Destroy
/// 跟随 descriptor pool 一起销毁
pub struct GfxDescriptorSet<T: DescriptorBindingLayout> {
    handle: vk::DescriptorSet,
    _phantom: PhantomData<T>,
}
impl<T: DescriptorBindingLayout> GfxDescriptorSet<T> {
    pub fn new(
        descriptor_pool: &GfxDescriptorPool,
        layout: &GfxDescriptorSetLayout<T>,
        debug_name: impl AsRef<str>,
    ) -> Self {
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(descriptor_pool.handle())
            .set_layouts(std::slice::from_ref(&layout.layout));
        let gfx_device = Gfx::get().gfx_device();
        let descriptor_set = unsafe { gfx_device.allocate_descriptor_sets(&alloc_info).unwrap()[0] };
        let set = Self {
            handle: descriptor_set,
            _phantom: PhantomData,
        };
        gfx_device.set_debug_name(&set, debug_name);
        set
    }

    #[inline]
    pub fn handle(&self) -> vk::DescriptorSet {
        self.handle
    }
}
impl<T: DescriptorBindingLayout> DebugType for GfxDescriptorSet<T> {
    fn debug_type_name() -> &'static str {
        "GfxDescriptorSet"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}

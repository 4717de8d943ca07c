//! descriptor set 布局 trait
//!
//! 配合 `vkx-descriptor-layout-macro` 使用：在结构体上 `#[derive(DescriptorLayout)]`，
//! 每个字段对应一个 binding，自动实现 [`DescriptorBindingLayout`]。
//!
//! # 使用示例
//! ```ignore
//! #[derive(DescriptorLayout)]
//! struct GBufferLayout {
//!     #[binding = 0]
//!     #[descriptor_type = "UNIFORM_BUFFER"]
//!     #[stage = "VERTEX"]
//!     _ubo: (),
//!
//!     #[binding = 1]
//!     #[descriptor_type = "COMBINED_IMAGE_SAMPLER"]
//!     #[stage = "FRAGMENT"]
//!     _albedo: (),
//! }
//! ```

use ash::vk;

/// 单个 binding 的详细信息
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorBindingItem {
    pub name: &'static str,
    pub binding: u32,
    pub descriptor_type: vk::DescriptorType,
    pub stage_flags: vk::ShaderStageFlags,
    pub count: u32,
    pub flags: vk::DescriptorBindingFlags,
}

/// 一个 descriptor set 需要的所有 binding
pub trait DescriptorBindingLayout {
    /// 由宏实现，按字段声明顺序返回
    fn get_shader_bindings() -> Vec<DescriptorBindingItem>;

    /// 生成 Vulkan 所需的 binding 信息，不应被覆盖
    fn get_vk_bindings() -> (Vec<vk::DescriptorSetLayoutBinding<'static>>, Vec<vk::DescriptorBindingFlags>) {
        let bindings = Self::get_shader_bindings();
        let layout_bindings = bindings
            .iter()
            .map(|item| vk::DescriptorSetLayoutBinding {
                binding: item.binding,
                descriptor_type: item.descriptor_type,
                descriptor_count: item.count,
                stage_flags: item.stage_flags,
                ..Default::default()
            })
            .collect();

        let binding_flags = bindings.iter().map(|item| item.flags).collect();

        (layout_bindings, binding_flags)
    }

    /// 按 descriptor 类型汇总数量，用于估算 descriptor pool 的大小
    fn pool_sizes(set_count: u32) -> Vec<vk::DescriptorPoolSize> {
        let mut sizes: Vec<vk::DescriptorPoolSize> = Vec::new();
        for item in Self::get_shader_bindings() {
            match sizes.iter_mut().find(|s| s.ty == item.descriptor_type) {
                Some(size) => size.descriptor_count += item.count * set_count,
                None => sizes.push(vk::DescriptorPoolSize {
                    ty: item.descriptor_type,
                    descriptor_count: item.count * set_count,
                }),
            }
        }
        sizes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BlurLayout;
    impl DescriptorBindingLayout for BlurLayout {
        fn get_shader_bindings() -> Vec<DescriptorBindingItem> {
            vec![
                DescriptorBindingItem {
                    name: "params",
                    binding: 0,
                    descriptor_type: vk::DescriptorType::UNIFORM_BUFFER,
                    stage_flags: vk::ShaderStageFlags::FRAGMENT,
                    count: 1,
                    flags: vk::DescriptorBindingFlags::empty(),
                },
                DescriptorBindingItem {
                    name: "color",
                    binding: 1,
                    descriptor_type: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                    stage_flags: vk::ShaderStageFlags::FRAGMENT,
                    count: 1,
                    flags: vk::DescriptorBindingFlags::empty(),
                },
                DescriptorBindingItem {
                    name: "depth",
                    binding: 2,
                    descriptor_type: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                    stage_flags: vk::ShaderStageFlags::FRAGMENT,
                    count: 1,
                    flags: vk::DescriptorBindingFlags::empty(),
                },
            ]
        }
    }

    #[test]
    fn vk_bindings_follow_items() {
        let (bindings, flags) = BlurLayout::get_vk_bindings();
        assert_eq!(bindings.len(), 3);
        assert_eq!(flags.len(), 3);
        assert_eq!(bindings[1].binding, 1);
        assert_eq!(bindings[1].descriptor_type, vk::DescriptorType::COMBINED_IMAGE_SAMPLER);
        assert_eq!(bindings[2].descriptor_count, 1);
    }

    #[test]
    fn pool_sizes_merge_same_type() {
        let sizes = BlurLayout::pool_sizes(2);
        assert_eq!(sizes.len(), 2);
        let samplers = sizes.iter().find(|s| s.ty == vk::DescriptorType::COMBINED_IMAGE_SAMPLER).unwrap();
        assert_eq!(samplers.descriptor_count, 4);
        let ubos = sizes.iter().find(|s| s.ty == vk::DescriptorType::UNIFORM_BUFFER).unwrap();
        assert_eq!(ubos.descriptor_count, 2);
    }
}

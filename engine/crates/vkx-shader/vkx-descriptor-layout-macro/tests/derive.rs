use ash::vk;
use vkx_descriptor_layout_macro::DescriptorLayout;
use vkx_descriptor_layout_trait::DescriptorBindingLayout;

#[derive(DescriptorLayout)]
#[allow(dead_code)]
struct CompositeLayout {
    #[binding = 0]
    #[descriptor_type = "UNIFORM_BUFFER"]
    #[stage = "FRAGMENT"]
    _params: (),

    #[binding = 1]
    #[descriptor_type = "COMBINED_IMAGE_SAMPLER"]
    #[stage = "FRAGMENT | COMPUTE"]
    #[count = 4]
    _textures: (),
}

#[test]
fn derived_layout_lists_bindings_in_order() {
    let items = CompositeLayout::get_shader_bindings();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "params");
    assert_eq!(items[1].binding, 1);
    assert_eq!(items[1].count, 4);
    assert_eq!(items[1].stage_flags, vk::ShaderStageFlags::FRAGMENT | vk::ShaderStageFlags::COMPUTE);
}

#[test]
fn accessor_matches_listed_item() {
    assert_eq!(*CompositeLayout::textures(), CompositeLayout::get_shader_bindings()[1]);
    assert_eq!(CompositeLayout::params().descriptor_type, vk::DescriptorType::UNIFORM_BUFFER);
    assert!(CompositeLayout::params().flags.is_empty());
}

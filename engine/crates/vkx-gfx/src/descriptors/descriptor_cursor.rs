use ash::vk;
use itertools::Itertools;
use vkx_descriptor_layout_trait::DescriptorBindingItem;

pub struct GfxWriteDescriptorSet {
    pub dst_set: vk::DescriptorSet,
    pub dst_binding: u32,
    pub dst_array_element: u32,
    pub descriptor_type: vk::DescriptorType,

    pub buffer_infos: Vec<vk::DescriptorBufferInfo>,
    pub image_infos: Vec<vk::DescriptorImageInfo>,
}
impl GfxWriteDescriptorSet {
    pub fn to_vk_type(&self) -> vk::WriteDescriptorSet<'_> {
        assert!(
            self.buffer_infos.is_empty() != self.image_infos.is_empty(),
            "exactly one of buffer_infos and image_infos should be set in GfxWriteDescriptorSet"
        );

        let write = vk::WriteDescriptorSet::default()
            .dst_set(self.dst_set)
            .dst_binding(self.dst_binding)
            .dst_array_element(self.dst_array_element)
            .descriptor_type(self.descriptor_type);
        if self.buffer_infos.is_empty() {
            write.image_info(&self.image_infos)
        } else {
            write.buffer_info(&self.buffer_infos)
        }
    }

    pub fn with_writes(writes: &[Self], cbk: impl Fn(&[vk::WriteDescriptorSet])) {
        let writes = writes.iter().map(|w| w.to_vk_type()).collect_vec();
        cbk(&writes);
    }
}

/// 用于通过 DescriptorBindingItem 来操作对应 descriptor set 的对应 binding
pub trait GfxDescriptorCursor {
    fn get_binding(&self) -> &DescriptorBindingItem;

    /// 当前 binding 需要是 buffer 类型
    fn write_buffer(
        &self,
        dst_set: vk::DescriptorSet,
        start_array: u32,
        buffers: Vec<vk::DescriptorBufferInfo>,
    ) -> GfxWriteDescriptorSet {
        let item = self.get_binding();
        debug_assert!(
            matches!(
                item.descriptor_type,
                vk::DescriptorType::UNIFORM_BUFFER
                    | vk::DescriptorType::STORAGE_BUFFER
                    | vk::DescriptorType::UNIFORM_BUFFER_DYNAMIC
                    | vk::DescriptorType::STORAGE_BUFFER_DYNAMIC
            ),
            "binding {} is not a buffer",
            item.name
        );
        GfxWriteDescriptorSet {
            dst_set,
            dst_binding: item.binding,
            dst_array_element: start_array,
            descriptor_type: item.descriptor_type,
            buffer_infos: buffers,
            image_infos: vec![],
        }
    }

    /// 当前 binding 需要是 image 类型
    fn write_image(
        &self,
        dst_set: vk::DescriptorSet,
        start_array: u32,
        images: Vec<vk::DescriptorImageInfo>,
    ) -> GfxWriteDescriptorSet {
        let item = self.get_binding();
        GfxWriteDescriptorSet {
            dst_set,
            dst_binding: item.binding,
            dst_array_element: start_array,
            descriptor_type: item.descriptor_type,
            buffer_infos: vec![],
            image_infos: images,
        }
    }
}

impl GfxDescriptorCursor for DescriptorBindingItem {
    fn get_binding(&self) -> &DescriptorBindingItem {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    const UBO: DescriptorBindingItem = DescriptorBindingItem {
        name: "ubo",
        binding: 0,
        descriptor_type: vk::DescriptorType::UNIFORM_BUFFER,
        stage_flags: vk::ShaderStageFlags::VERTEX,
        count: 1,
        flags: vk::DescriptorBindingFlags::empty(),
    };

    const TEX: DescriptorBindingItem = DescriptorBindingItem {
        name: "tex",
        binding: 3,
        descriptor_type: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
        stage_flags: vk::ShaderStageFlags::FRAGMENT,
        count: 2,
        flags: vk::DescriptorBindingFlags::empty(),
    };

    #[test]
    fn buffer_write_uses_binding() {
        let write = UBO.write_buffer(vk::DescriptorSet::null(), 0, vec![vk::DescriptorBufferInfo::default()]);
        let vk_write = write.to_vk_type();
        assert_eq!(vk_write.dst_binding, 0);
        assert_eq!(vk_write.descriptor_count, 1);
        assert_eq!(vk_write.descriptor_type, vk::DescriptorType::UNIFORM_BUFFER);
    }

    #[test]
    fn image_write_counts_images() {
        let write = TEX.write_image(
            vk::DescriptorSet::null(),
            0,
            vec![vk::DescriptorImageInfo::default(), vk::DescriptorImageInfo::default()],
        );
        let vk_write = write.to_vk_type();
        assert_eq!(vk_write.dst_binding, 3);
        assert_eq!(vk_write.descriptor_count, 2);
    }

    #[test]
    #[should_panic]
    fn empty_write_panics() {
        let write = TEX.write_image(vk::DescriptorSet::null(), 0, vec![]);
        let _ = write.to_vk_type();
    }
}

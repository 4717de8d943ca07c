use ash::vk;

/// barrier 使用的 src 和 dst 访问 mask
#[derive(Copy, Clone, Debug)]
pub struct GfxBarrierMask {
    pub src_stage: vk::PipelineStageFlags2,
    pub dst_stage: vk::PipelineStageFlags2,
    pub src_access: vk::AccessFlags2,
    pub dst_access: vk::AccessFlags2,
}

impl GfxBarrierMask {
    /// color attachment 写入之后，在 fragment shader 中采样
    pub const COLOR_WRITE_TO_SAMPLE: Self = Self {
        src_stage: vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
        dst_stage: vk::PipelineStageFlags2::FRAGMENT_SHADER,
        src_access: vk::AccessFlags2::COLOR_ATTACHMENT_WRITE,
        dst_access: vk::AccessFlags2::SHADER_SAMPLED_READ,
    };

    /// depth attachment 写入之后，在 fragment shader 中采样
    pub const DEPTH_WRITE_TO_SAMPLE: Self = Self {
        src_stage: vk::PipelineStageFlags2::from_raw(
            vk::PipelineStageFlags2::EARLY_FRAGMENT_TESTS.as_raw()
                | vk::PipelineStageFlags2::LATE_FRAGMENT_TESTS.as_raw(),
        ),
        dst_stage: vk::PipelineStageFlags2::FRAGMENT_SHADER,
        src_access: vk::AccessFlags2::DEPTH_STENCIL_ATTACHMENT_WRITE,
        dst_access: vk::AccessFlags2::SHADER_SAMPLED_READ,
    };

    /// compute shader 写 storage buffer 之后作为顶点/indirect 数据读取
    pub const COMPUTE_WRITE_TO_DRAW: Self = Self {
        src_stage: vk::PipelineStageFlags2::COMPUTE_SHADER,
        dst_stage: vk::PipelineStageFlags2::from_raw(
            vk::PipelineStageFlags2::VERTEX_INPUT.as_raw() | vk::PipelineStageFlags2::DRAW_INDIRECT.as_raw(),
        ),
        src_access: vk::AccessFlags2::SHADER_STORAGE_WRITE,
        dst_access: vk::AccessFlags2::from_raw(
            vk::AccessFlags2::VERTEX_ATTRIBUTE_READ.as_raw() | vk::AccessFlags2::INDIRECT_COMMAND_READ.as_raw(),
        ),
    };
}

/// 便捷创建 image memory barrier 的结构体
pub struct GfxImageBarrier {
    inner: vk::ImageMemoryBarrier2<'static>,
}

impl Default for GfxImageBarrier {
    fn default() -> Self {
        Self {
            inner: vk::ImageMemoryBarrier2 {
                old_layout: vk::ImageLayout::UNDEFINED,
                new_layout: vk::ImageLayout::UNDEFINED,
                src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                subresource_range: vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::empty(),
                    base_array_layer: 0,
                    layer_count: 1,
                    base_mip_level: 0,
                    level_count: 1,
                },
                ..Default::default()
            },
        }
    }
}

impl GfxImageBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn inner(&self) -> &vk::ImageMemoryBarrier2<'_> {
        &self.inner
    }

    #[inline]
    pub fn queue_family_transfer(mut self, src_queue_family_index: u32, dst_queue_family_index: u32) -> Self {
        self.inner.src_queue_family_index = src_queue_family_index;
        self.inner.dst_queue_family_index = dst_queue_family_index;
        self
    }

    #[inline]
    pub fn layout_transfer(mut self, old_layout: vk::ImageLayout, new_layout: vk::ImageLayout) -> Self {
        self.inner.old_layout = old_layout;
        self.inner.new_layout = new_layout;
        self
    }

    #[inline]
    pub fn src_mask(mut self, src_stage_mask: vk::PipelineStageFlags2, src_access_mask: vk::AccessFlags2) -> Self {
        self.inner.src_stage_mask = src_stage_mask;
        self.inner.src_access_mask = src_access_mask;
        self
    }

    #[inline]
    pub fn dst_mask(mut self, dst_stage_mask: vk::PipelineStageFlags2, dst_access_mask: vk::AccessFlags2) -> Self {
        self.inner.dst_stage_mask = dst_stage_mask;
        self.inner.dst_access_mask = dst_access_mask;
        self
    }

    #[inline]
    pub fn mask(self, mask: GfxBarrierMask) -> Self {
        self.src_mask(mask.src_stage, mask.src_access).dst_mask(mask.dst_stage, mask.dst_access)
    }

    /// layer 和 miplevel 使用默认值，除非调用了 `layer_range`
    #[inline]
    pub fn image_aspect_flag(mut self, aspect_mask: vk::ImageAspectFlags) -> Self {
        self.inner.subresource_range.aspect_mask = aspect_mask;
        self
    }

    /// cubemap 需要覆盖 6 个 layer
    #[inline]
    pub fn layer_range(mut self, base_layer: u32, layer_count: u32) -> Self {
        self.inner.subresource_range.base_array_layer = base_layer;
        self.inner.subresource_range.layer_count = layer_count;
        self
    }

    #[inline]
    pub fn image(mut self, image: vk::Image) -> Self {
        self.inner.image = image;
        self
    }
}

pub struct GfxBufferBarrier {
    inner: vk::BufferMemoryBarrier2<'static>,
}

impl Default for GfxBufferBarrier {
    fn default() -> Self {
        Self {
            inner: vk::BufferMemoryBarrier2 {
                src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                size: vk::WHOLE_SIZE,
                ..Default::default()
            },
        }
    }
}

impl GfxBufferBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn inner(&self) -> &vk::BufferMemoryBarrier2<'_> {
        &self.inner
    }

    #[inline]
    pub fn src_mask(mut self, src_stage_mask: vk::PipelineStageFlags2, src_access_mask: vk::AccessFlags2) -> Self {
        self.inner.src_stage_mask = src_stage_mask;
        self.inner.src_access_mask = src_access_mask;
        self
    }

    #[inline]
    pub fn dst_mask(mut self, dst_stage_mask: vk::PipelineStageFlags2, dst_access_mask: vk::AccessFlags2) -> Self {
        self.inner.dst_stage_mask = dst_stage_mask;
        self.inner.dst_access_mask = dst_access_mask;
        self
    }

    #[inline]
    pub fn mask(mut self, mask: GfxBarrierMask) -> Self {
        self.inner.src_stage_mask = mask.src_stage;
        self.inner.dst_stage_mask = mask.dst_stage;
        self.inner.src_access_mask = mask.src_access;
        self.inner.dst_access_mask = mask.dst_access;
        self
    }

    /// 队列所有权转移：release 和 acquire 两侧需要使用相同的 src/dst family
    #[inline]
    pub fn queue_family_transfer(mut self, src_queue_family_index: u32, dst_queue_family_index: u32) -> Self {
        self.inner.src_queue_family_index = src_queue_family_index;
        self.inner.dst_queue_family_index = dst_queue_family_index;
        self
    }

    #[inline]
    pub fn buffer(mut self, buffer: vk::Buffer, offset: vk::DeviceSize, size: vk::DeviceSize) -> Self {
        self.inner.buffer = buffer;
        self.inner.offset = offset;
        self.inner.size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_barrier_builder_sets_fields() {
        let barrier = GfxImageBarrier::new()
            .layout_transfer(vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL)
            .image_aspect_flag(vk::ImageAspectFlags::COLOR)
            .layer_range(0, 6)
            .mask(GfxBarrierMask::COLOR_WRITE_TO_SAMPLE);
        let inner = barrier.inner();
        assert_eq!(inner.new_layout, vk::ImageLayout::TRANSFER_DST_OPTIMAL);
        assert_eq!(inner.subresource_range.layer_count, 6);
        assert_eq!(inner.src_stage_mask, vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT);
        assert_eq!(inner.src_queue_family_index, vk::QUEUE_FAMILY_IGNORED);
    }

    #[test]
    fn buffer_barrier_defaults_to_whole_size() {
        let barrier = GfxBufferBarrier::new().queue_family_transfer(1, 0);
        assert_eq!(barrier.inner().size, vk::WHOLE_SIZE);
        assert_eq!(barrier.inner().src_queue_family_index, 1);
        assert_eq!(barrier.inner().dst_queue_family_index, 0);
    }

    #[test]
    fn compute_to_draw_covers_indirect() {
        let mask = GfxBarrierMask::COMPUTE_WRITE_TO_DRAW;
        assert!(mask.dst_stage.contains(vk::PipelineStageFlags2::DRAW_INDIRECT));
        assert!(mask.dst_access.contains(vk::AccessFlags2::INDIRECT_COMMAND_READ));
    }
}

use ash::vk;

/// 索引类型 Trait (u16 或 u32)
pub trait GfxIndexType: Sized + Copy + bytemuck::Pod {
    const VK_INDEX_TYPE: vk::IndexType;
    fn byte_size() -> usize {
        size_of::<Self>()
    }
}

impl GfxIndexType for u16 {
    const VK_INDEX_TYPE: vk::IndexType = vk::IndexType::UINT16;
}

impl GfxIndexType for u32 {
    const VK_INDEX_TYPE: vk::IndexType = vk::IndexType::UINT32;
}

/// Vertex Buffer 中顶点布局的 trait 定义
///
/// 只考虑 AoS 布局：binding 0 中每个顶点一个结构体
pub trait GfxVertexLayout {
    type Vertex: bytemuck::Pod;

    fn vertex_input_bindings() -> Vec<vk::VertexInputBindingDescription> {
        vec![vk::VertexInputBindingDescription {
            binding: 0,
            stride: size_of::<Self::Vertex>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }]
    }

    fn vertex_input_attributes() -> Vec<vk::VertexInputAttributeDescription>;

    /// 整个 Buffer 的大小
    fn buffer_size(vertex_cnt: usize) -> usize {
        vertex_cnt * size_of::<Self::Vertex>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_byte_size() {
        assert_eq!(u16::byte_size(), 2);
        assert_eq!(u32::byte_size(), 4);
        assert_eq!(<u32 as GfxIndexType>::VK_INDEX_TYPE, vk::IndexType::UINT32);
    }
}

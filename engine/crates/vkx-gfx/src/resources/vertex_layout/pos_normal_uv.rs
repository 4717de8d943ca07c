use std::mem::offset_of;

use ash::vk;

use crate::resources::layout::GfxVertexLayout;

#[repr(C)]
#[derive(Clone, Debug, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct VertexPosNormalUv {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub color: [f32; 3],
}

impl VertexPosNormalUv {
    #[inline]
    pub fn new(position: glam::Vec3, normal: glam::Vec3, uv: glam::Vec2) -> Self {
        Self {
            position: position.into(),
            normal: normal.into(),
            uv: uv.into(),
            color: [1.0; 3],
        }
    }

    #[inline]
    pub fn with_color(mut self, color: glam::Vec3) -> Self {
        self.color = color.into();
        self
    }
}

/// location 0..=3：position, normal, uv, color
pub struct VertexLayoutPosNormalUv;

impl GfxVertexLayout for VertexLayoutPosNormalUv {
    type Vertex = VertexPosNormalUv;

    fn vertex_input_attributes() -> Vec<vk::VertexInputAttributeDescription> {
        vec![
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: offset_of!(VertexPosNormalUv, position) as u32,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: offset_of!(VertexPosNormalUv, normal) as u32,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 2,
                format: vk::Format::R32G32_SFLOAT,
                offset: offset_of!(VertexPosNormalUv, uv) as u32,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 3,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: offset_of!(VertexPosNormalUv, color) as u32,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_struct() {
        let bindings = VertexLayoutPosNormalUv::vertex_input_bindings();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].stride, 44);

        let attrs = VertexLayoutPosNormalUv::vertex_input_attributes();
        let offsets: Vec<u32> = attrs.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24, 32]);
        assert_eq!(VertexLayoutPosNormalUv::buffer_size(10), 440);
    }
}

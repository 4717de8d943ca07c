use ash::vk;
use std::mem::offset_of;
use vkx_gfx::resources::layout::GfxVertexLayout;

/// AoS: Array of Structs
///
/// 与 `imgui::DrawVert` 的内存布局一致
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ImGuiVertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
    /// R8G8B8A8
    pub color: [u8; 4],
}

impl From<&imgui::DrawVert> for ImGuiVertex {
    fn from(v: &imgui::DrawVert) -> Self {
        Self {
            pos: v.pos,
            uv: v.uv,
            color: v.col,
        }
    }
}

pub struct ImGuiVertexLayoutAoS;
impl GfxVertexLayout for ImGuiVertexLayoutAoS {
    type Vertex = ImGuiVertex;

    fn vertex_input_attributes() -> Vec<vk::VertexInputAttributeDescription> {
        vec![
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 0,
                format: vk::Format::R32G32_SFLOAT,
                offset: offset_of!(ImGuiVertex, pos) as u32,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 1,
                format: vk::Format::R32G32_SFLOAT,
                offset: offset_of!(ImGuiVertex, uv) as u32,
            },
            vk::VertexInputAttributeDescription {
                binding: 0,
                location: 2,
                format: vk::Format::R8G8B8A8_UNORM,
                offset: offset_of!(ImGuiVertex, color) as u32,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_imgui_draw_vert() {
        assert_eq!(size_of::<ImGuiVertex>(), size_of::<imgui::DrawVert>());
        assert_eq!(ImGuiVertexLayoutAoS::buffer_size(10), 200);
        let attrs = ImGuiVertexLayoutAoS::vertex_input_attributes();
        assert_eq!(attrs[2].offset, 16);
    }
}

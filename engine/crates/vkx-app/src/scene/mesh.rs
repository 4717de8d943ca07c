use ash::vk;
use itertools::Itertools;
use vkx_gfx::{
    commands::command_buffer::GfxCommandBuffer,
    resources::{
        special_buffers::{index_buffer::GfxIndexBuffer, vertex_buffer::GfxVertexBuffer},
        vertex_layout::pos_normal_uv::{VertexLayoutPosNormalUv, VertexPosNormalUv},
    },
};

/// CPU 侧的三角形网格，CCW 为正面
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<VertexPosNormalUv>,
    pub indices: Vec<u32>,
}

/// 合并后的 buffer 中某个 mesh 的位置
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MeshRange {
    pub first_index: u32,
    pub index_count: u32,
    pub vertex_offset: i32,
}

impl MeshData {
    #[inline]
    pub fn index_cnt(&self) -> u32 {
        self.indices.len() as u32
    }

    #[inline]
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// 所有顶点使用同一个颜色
    pub fn with_color(mut self, color: glam::Vec3) -> Self {
        for v in &mut self.vertices {
            v.color = color.into();
        }
        self
    }

    /// 对 position 做仿射变换，normal 使用逆转置矩阵
    pub fn transformed(mut self, transform: glam::Mat4) -> Self {
        let normal_mat = glam::Mat3::from_mat4(transform).inverse().transpose();
        for v in &mut self.vertices {
            v.position = transform.transform_point3(glam::Vec3::from(v.position)).into();
            v.normal = (normal_mat * glam::Vec3::from(v.normal)).normalize_or_zero().into();
        }
        self
    }

    /// 用面法线的面积加权平均重新计算顶点法线
    pub fn recompute_normals(&mut self) {
        let mut normals = vec![glam::Vec3::ZERO; self.vertices.len()];
        for [a, b, c] in self.triangles() {
            let pa = glam::Vec3::from(self.vertices[a as usize].position);
            let pb = glam::Vec3::from(self.vertices[b as usize].position);
            let pc = glam::Vec3::from(self.vertices[c as usize].position);
            let face_normal = (pb - pa).cross(pc - pa);
            normals[a as usize] += face_normal;
            normals[b as usize] += face_normal;
            normals[c as usize] += face_normal;
        }
        for (v, n) in self.vertices.iter_mut().zip(normals) {
            v.normal = n.normalize_or_zero().into();
        }
    }

    /// 把多个 mesh 放进同一组 vertex/index buffer，index 保持局部，通过 vertex_offset 定位
    pub fn merge(meshes: &[MeshData]) -> (MeshData, Vec<MeshRange>) {
        let mut merged = MeshData::default();
        let ranges = meshes
            .iter()
            .map(|mesh| {
                let range = MeshRange {
                    first_index: merged.indices.len() as u32,
                    index_count: mesh.index_cnt(),
                    vertex_offset: merged.vertices.len() as i32,
                };
                merged.vertices.extend_from_slice(&mesh.vertices);
                merged.indices.extend_from_slice(&mesh.indices);
                range
            })
            .collect_vec();
        (merged, ranges)
    }

    pub fn upload(&self, name: &str) -> GpuMesh {
        GpuMesh::new(self, name)
    }
}

/// device local 的 vertex/index buffer
pub struct GpuMesh {
    vertex_buffer: GfxVertexBuffer<VertexLayoutPosNormalUv>,
    index_buffer: GfxIndexBuffer<u32>,
}
impl GpuMesh {
    pub fn new(mesh: &MeshData, name: &str) -> Self {
        assert!(!mesh.indices.is_empty(), "mesh {} is empty", name);
        let vertex_buffer = GfxVertexBuffer::new_with_data(&mesh.vertices, format!("{}-vertex", name));
        let index_buffer = GfxIndexBuffer::new_with_data(&mesh.indices, format!("{}-index", name));
        log::info!("mesh {} uploaded: {} vertices, {} indices", name, mesh.vertices.len(), mesh.indices.len());

        Self {
            vertex_buffer,
            index_buffer,
        }
    }

    #[inline]
    pub fn index_cnt(&self) -> u32 {
        self.index_buffer.index_cnt() as u32
    }

    #[inline]
    pub fn vertex_buffer(&self) -> vk::Buffer {
        self.vertex_buffer.vk_buffer()
    }

    /// 绑定到 binding 0
    pub fn bind(&self, cmd: &GfxCommandBuffer) {
        cmd.cmd_bind_vertex_buffers(0, &[self.vertex_buffer.vk_buffer()], &[0]);
        cmd.cmd_bind_index_buffer(&self.index_buffer, 0);
    }

    /// 绘制整个 mesh
    pub fn draw(&self, cmd: &GfxCommandBuffer, instance_cnt: u32, first_instance: u32) {
        self.bind(cmd);
        cmd.draw_indexed(self.index_cnt(), 0, instance_cnt, first_instance, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri(offset: f32) -> MeshData {
        MeshData {
            vertices: vec![
                VertexPosNormalUv::new(glam::vec3(offset, 0.0, 0.0), glam::Vec3::Y, glam::Vec2::ZERO),
                VertexPosNormalUv::new(glam::vec3(offset + 1.0, 0.0, 0.0), glam::Vec3::Y, glam::Vec2::ZERO),
                VertexPosNormalUv::new(glam::vec3(offset, 1.0, 0.0), glam::Vec3::Y, glam::Vec2::ZERO),
            ],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn merge_keeps_local_indices() {
        let (merged, ranges) = MeshData::merge(&[tri(0.0), tri(2.0)]);
        assert_eq!(merged.vertices.len(), 6);
        assert_eq!(merged.indices, vec![0, 1, 2, 0, 1, 2]);
        assert_eq!(
            ranges,
            vec![
                MeshRange {
                    first_index: 0,
                    index_count: 3,
                    vertex_offset: 0
                },
                MeshRange {
                    first_index: 3,
                    index_count: 3,
                    vertex_offset: 3
                },
            ]
        );
    }

    #[test]
    fn recompute_normals_of_ccw_triangle() {
        let mut mesh = tri(0.0);
        for v in &mut mesh.vertices {
            v.normal = [0.0; 3];
        }
        mesh.recompute_normals();
        for v in &mesh.vertices {
            assert!((glam::Vec3::from(v.normal) - glam::Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn transform_moves_points_and_normals() {
        let mesh = tri(0.0).transformed(glam::Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2));
        // Y 轴旋转到 -Z
        assert!((glam::Vec3::from(mesh.vertices[0].normal) - glam::Vec3::NEG_Z).length() < 1e-5);
        assert!((glam::Vec3::from(mesh.vertices[2].position) - glam::vec3(0.0, 0.0, -1.0)).length() < 1e-5);
    }
}

//! 程序化生成的网格
//!
//! 右手坐标系，Y 轴向上，从外侧看三角形为逆时针

use std::f32::consts::PI;

use vkx_gfx::resources::vertex_layout::pos_normal_uv::VertexPosNormalUv;

use crate::scene::mesh::MeshData;

/// 以 `center` 为中心的四边形，`u × v` 为正面朝向，半边长分别是 `|u|` 和 `|v|`
fn push_quad(mesh: &mut MeshData, center: glam::Vec3, u: glam::Vec3, v: glam::Vec3, uv_scale: f32) {
    let normal = u.cross(v).normalize();
    let base = mesh.vertices.len() as u32;
    let corners = [
        (center - u - v, glam::vec2(0.0, 1.0)),
        (center + u - v, glam::vec2(1.0, 1.0)),
        (center + u + v, glam::vec2(1.0, 0.0)),
        (center - u + v, glam::vec2(0.0, 0.0)),
    ];
    for (pos, uv) in corners {
        mesh.vertices.push(VertexPosNormalUv::new(pos, normal, uv * uv_scale));
    }
    mesh.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
}

/// 边长为 1 的立方体，每个面独立的 4 个顶点
pub struct Cube;
impl Cube {
    pub fn mesh() -> MeshData {
        // (normal, u, v)，满足 u × v = normal
        const FACES: [(glam::Vec3, glam::Vec3, glam::Vec3); 6] = [
            (glam::Vec3::X, glam::Vec3::NEG_Z, glam::Vec3::Y),
            (glam::Vec3::NEG_X, glam::Vec3::Z, glam::Vec3::Y),
            (glam::Vec3::Y, glam::Vec3::X, glam::Vec3::NEG_Z),
            (glam::Vec3::NEG_Y, glam::Vec3::X, glam::Vec3::Z),
            (glam::Vec3::Z, glam::Vec3::X, glam::Vec3::Y),
            (glam::Vec3::NEG_Z, glam::Vec3::NEG_X, glam::Vec3::Y),
        ];

        let mut mesh = MeshData::default();
        for (n, u, v) in FACES {
            push_quad(&mut mesh, n * 0.5, u * 0.5, v * 0.5, 1.0);
        }
        mesh
    }
}

/// 单位球，`segments` 为经线方向的分段，`rings` 为纬线方向的分段
pub struct UvSphere;
impl UvSphere {
    pub fn mesh(segments: u32, rings: u32) -> MeshData {
        Self::displaced(segments, rings, |_| 1.0)
    }

    /// 半径由方向决定，用于 rock 和 head
    fn displaced(segments: u32, rings: u32, radius: impl Fn(glam::Vec3) -> f32) -> MeshData {
        assert!(segments >= 3 && rings >= 2);

        let mut mesh = MeshData::default();
        for r in 0..=rings {
            let theta = PI * r as f32 / rings as f32;
            for s in 0..=segments {
                let phi = 2.0 * PI * s as f32 / segments as f32;
                // phi = 0 时位于 +Z，随 phi 增大转向 +X
                let dir = glam::vec3(theta.sin() * phi.sin(), theta.cos(), theta.sin() * phi.cos());
                let uv = glam::vec2(s as f32 / segments as f32, r as f32 / rings as f32);
                mesh.vertices.push(VertexPosNormalUv::new(dir * radius(dir), dir, uv));
            }
        }

        let stride = segments + 1;
        for r in 0..rings {
            for s in 0..segments {
                let a = r * stride + s;
                let b = (r + 1) * stride + s;
                let c = (r + 1) * stride + s + 1;
                let d = r * stride + s + 1;
                // 两极处的退化三角形直接跳过
                if r != 0 {
                    mesh.indices.extend_from_slice(&[a, c, d]);
                }
                if r != rings - 1 {
                    mesh.indices.extend_from_slice(&[a, b, c]);
                }
            }
        }
        mesh
    }
}

/// XZ 平面上的正方形，法线朝 +Y
pub struct Plane;
impl Plane {
    pub fn mesh(size: f32, uv_repeat: f32) -> MeshData {
        let h = size * 0.5;
        let mut mesh = MeshData::default();
        push_quad(&mut mesh, glam::Vec3::ZERO, glam::Vec3::X * h, glam::Vec3::NEG_Z * h, uv_repeat);
        mesh
    }
}

/// 三片绕 Y 轴交叉的竖直面片组成的草丛，底部位于原点，高度为 1
///
/// 绘制时不做背面剔除
pub struct Plant;
impl Plant {
    pub fn mesh() -> MeshData {
        let mut mesh = MeshData::default();
        for i in 0..3 {
            let angle = PI * i as f32 / 3.0;
            let u = glam::vec3(angle.cos(), 0.0, -angle.sin()) * 0.5;
            push_quad(&mut mesh, glam::vec3(0.0, 0.5, 0.0), u, glam::Vec3::Y * 0.5, 1.0);
        }
        // 让草丛整体接受来自上方的光照
        for v in &mut mesh.vertices {
            v.normal = glam::Vec3::Y.into();
        }
        mesh.with_color(glam::vec3(0.45, 0.75, 0.3))
    }
}

/// 表面起伏的扁球，底部略微埋入地面
pub struct Rock;
impl Rock {
    pub fn mesh() -> MeshData {
        let mut mesh = UvSphere::displaced(24, 16, |d| {
            1.0 + 0.12 * (3.0 * d.x + 1.3).sin() * (4.0 * d.y).sin() * (5.0 * d.z + 0.7).sin()
        })
        .transformed(glam::Mat4::from_scale_rotation_translation(
            glam::vec3(0.6, 0.35, 0.5),
            glam::Quat::IDENTITY,
            glam::vec3(0.0, 0.1, 0.0),
        ));
        mesh.recompute_normals();
        mesh.with_color(glam::vec3(0.55, 0.52, 0.5))
    }
}

/// 头部的替代模型：略微拉长的球，带有耳朵和鼻子的凸起，面向 +Z
pub struct Head;
impl Head {
    const SKIN_COLOR: glam::Vec3 = glam::Vec3::new(0.9, 0.68, 0.58);

    pub fn mesh() -> MeshData {
        let bump = |dir: glam::Vec3, axis: glam::Vec3, width: f32, height: f32| {
            let d = 1.0 - dir.dot(axis.normalize());
            height * (-(d * d) / (width * width)).exp()
        };
        let mut mesh = UvSphere::displaced(64, 48, |d| {
            1.0 + bump(d, glam::Vec3::X, 0.08, 0.12)
                + bump(d, glam::Vec3::NEG_X, 0.08, 0.12)
                + bump(d, glam::vec3(0.0, -0.1, 1.0), 0.04, 0.22)
                // 下巴
                + bump(d, glam::vec3(0.0, -0.8, 0.6), 0.1, 0.08)
        })
        .transformed(glam::Mat4::from_scale(glam::vec3(0.8, 1.0, 0.9)));
        mesh.recompute_normals();
        mesh.with_color(Self::SKIN_COLOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 对于凸形状，每个三角形的几何法线都应该朝外
    fn assert_outward(mesh: &MeshData, center: glam::Vec3) {
        for [a, b, c] in mesh.triangles() {
            let pa = glam::Vec3::from(mesh.vertices[a as usize].position);
            let pb = glam::Vec3::from(mesh.vertices[b as usize].position);
            let pc = glam::Vec3::from(mesh.vertices[c as usize].position);
            let n = (pb - pa).cross(pc - pa);
            assert!(n.length() > 1e-8, "degenerate triangle");
            let centroid = (pa + pb + pc) / 3.0;
            assert!(n.dot(centroid - center) > 0.0, "triangle {:?} faces inward", [a, b, c]);
        }
    }

    fn assert_indices_valid(mesh: &MeshData) {
        assert_eq!(mesh.indices.len() % 3, 0);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn cube_is_ccw_outward() {
        let mesh = Cube::mesh();
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert_indices_valid(&mesh);
        assert_outward(&mesh, glam::Vec3::ZERO);
        for v in &mesh.vertices {
            let p = glam::Vec3::from(v.position);
            assert!((p.abs().max_element() - 0.5).abs() < 1e-6);
            // 顶点法线与面法线一致
            assert!(glam::Vec3::from(v.normal).dot(p) > 0.0);
        }
    }

    #[test]
    fn sphere_is_ccw_outward() {
        let mesh = UvSphere::mesh(16, 8);
        assert_eq!(mesh.vertices.len(), 17 * 9);
        // 两极各少一行三角形
        assert_eq!(mesh.indices.len() as u32, 3 * (2 * 16 * 8 - 2 * 16));
        assert_indices_valid(&mesh);
        assert_outward(&mesh, glam::Vec3::ZERO);
        for v in &mesh.vertices {
            assert!((glam::Vec3::from(v.position).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn plane_faces_up() {
        let mesh = Plane::mesh(10.0, 4.0);
        assert_indices_valid(&mesh);
        for [a, b, c] in mesh.triangles() {
            let pa = glam::Vec3::from(mesh.vertices[a as usize].position);
            let pb = glam::Vec3::from(mesh.vertices[b as usize].position);
            let pc = glam::Vec3::from(mesh.vertices[c as usize].position);
            assert!((pb - pa).cross(pc - pa).y > 0.0);
        }
        let max_x = mesh.vertices.iter().map(|v| v.position[0]).fold(f32::MIN, f32::max);
        assert_eq!(max_x, 5.0);
        let max_u = mesh.vertices.iter().map(|v| v.uv[0]).fold(f32::MIN, f32::max);
        assert_eq!(max_u, 4.0);
    }

    #[test]
    fn plant_stands_on_ground() {
        let mesh = Plant::mesh();
        assert_eq!(mesh.indices.len(), 18);
        assert_indices_valid(&mesh);
        let min_y = mesh.vertices.iter().map(|v| v.position[1]).fold(f32::MAX, f32::min);
        let max_y = mesh.vertices.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
        assert!(min_y.abs() < 1e-6);
        assert!((max_y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn rock_and_head_are_closed_and_lit() {
        for mesh in [Rock::mesh(), Head::mesh()] {
            assert_indices_valid(&mesh);
            for v in &mesh.vertices {
                assert!((glam::Vec3::from(v.normal).length() - 1.0).abs() < 1e-3);
            }
        }
    }

    #[test]
    fn head_nose_points_forward() {
        let mesh = Head::mesh();
        let front = mesh.vertices.iter().map(|v| v.position[2]).fold(f32::MIN, f32::max);
        let back = mesh.vertices.iter().map(|v| v.position[2]).fold(f32::MAX, f32::min);
        // 鼻子的凸起让正面比背面更远
        assert!(front > -back + 0.1);
        assert_eq!(glam::Vec3::from(mesh.vertices[0].color), Head::SKIN_COLOR);
    }
}

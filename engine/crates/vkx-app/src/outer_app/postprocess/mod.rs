//! 离屏渲染一个转动的盆栽和天空盒，再用一个全屏 pass 做灰度化和染色后输出

use std::f32::consts::TAU;

use crate::{
    platform::camera::Camera,
    scene::{
        mesh::MeshData,
        shapes::{Cube, Plant},
    },
};

pub mod graying_pass;
pub mod offscreen_pass;
pub mod postprocess_app;

/// 盆栽转动一周的秒数
pub const MODEL_CYCLE_SECONDS: f32 = 4.0;

/// 相机到原点的距离
pub const ORBIT_DISTANCE: f32 = 10.25;

/// 天空盒与模型共用的 uniform
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniform {
    pub projection: glam::Mat4,
    pub view: glam::Mat4,
    pub model: glam::Mat4,
}

impl SceneUniform {
    pub fn model(camera: &Camera, t: f32) -> Self {
        Self {
            projection: camera.get_projection_matrix(),
            view: camera.get_view_matrix(),
            model: model_transform(t),
        }
    }

    /// view 只保留旋转，天空盒始终包围相机
    pub fn skybox(camera: &Camera) -> Self {
        Self {
            projection: camera.get_projection_matrix(),
            view: glam::Mat4::from_mat3(glam::Mat3::from_mat4(camera.get_view_matrix())),
            model: glam::Mat4::IDENTITY,
        }
    }
}

/// graying pass 的参数，rgb 与灰度相乘
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct TintParams(pub glam::Vec4);

impl TintParams {
    pub fn new(tint: [f32; 3]) -> Self {
        Self(glam::Vec3::from_array(tint).extend(1.0))
    }
}

/// 与 shader 中相同的灰度权重
pub fn luminance(color: glam::Vec3) -> f32 {
    color.dot(glam::vec3(0.299, 0.587, 0.114))
}

/// `t` 为 [0, 1) 的周期进度
///
/// 在 XZ 平面上画一个半径 0.25 的圆，同时绕 X 轴轻微摆动，绕 Y 轴转一整圈
pub fn model_transform(t: f32) -> glam::Mat4 {
    let a = TAU * t;
    glam::Mat4::from_translation(glam::vec3(a.sin() * 0.25, -1.0, a.cos() * 0.25))
        * glam::Mat4::from_rotation_x(-a.sin() * 0.15)
        * glam::Mat4::from_rotation_y(a)
}

#[inline]
pub fn model_cycle(total_time_s: f32) -> f32 {
    (total_time_s / MODEL_CYCLE_SECONDS).fract()
}

/// 花盆加上一丛草
pub fn potted_plant_mesh() -> MeshData {
    let pot = Cube::mesh()
        .transformed(glam::Mat4::from_scale_rotation_translation(
            glam::vec3(1.2, 0.8, 1.2),
            glam::Quat::IDENTITY,
            glam::vec3(0.0, 0.4, 0.0),
        ))
        .with_color(glam::vec3(0.6, 0.35, 0.2));
    let plant = Plant::mesh().transformed(glam::Mat4::from_scale_rotation_translation(
        glam::vec3(1.6, 2.4, 1.6),
        glam::Quat::IDENTITY,
        glam::vec3(0.0, 0.8, 0.0),
    ));
    MeshData::merge(&[pot, plant]).0
}

/// 相机在以原点为中心、半径 [`ORBIT_DISTANCE`] 的球面上，看向原点
pub fn init_orbit_camera(camera: &mut Camera) {
    camera.euler_yaw_deg = 17.0;
    camera.euler_pitch_deg = -7.5;
    camera.euler_roll_deg = 0.0;
    camera.position = -camera.camera_forward() * ORBIT_DISTANCE;
    camera.set_perspective(45.0, 0.1, 256.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_transform_at_cycle_start() {
        let m = model_transform(0.0);
        let origin = m.transform_point3(glam::Vec3::ZERO);
        assert!((origin - glam::vec3(0.0, -1.0, 0.25)).length() < 1e-5);
        // 转了一周回到同一个位置
        let full = model_transform(1.0 - 1e-6);
        assert!((full.transform_point3(glam::Vec3::X) - m.transform_point3(glam::Vec3::X)).length() < 1e-3);
    }

    #[test]
    fn model_transform_quarter_cycle() {
        let m = model_transform(0.25);
        let origin = m.transform_point3(glam::Vec3::ZERO);
        assert!((origin - glam::vec3(0.25, -1.0, 0.0)).length() < 1e-5);
        assert!((model_cycle(5.0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn skybox_ignores_camera_position() {
        let mut camera = Camera::default();
        init_orbit_camera(&mut camera);
        let ubo = SceneUniform::skybox(&camera);
        assert!(ubo.view.transform_point3(glam::Vec3::ZERO).length() < 1e-5);
        assert_eq!(ubo.model, glam::Mat4::IDENTITY);
    }

    #[test]
    fn orbit_camera_looks_at_origin() {
        let mut camera = Camera::default();
        init_orbit_camera(&mut camera);
        assert!((camera.position.length() - ORBIT_DISTANCE).abs() < 1e-4);
        let origin_in_view = camera.get_view_matrix().transform_point3(glam::Vec3::ZERO);
        assert!(origin_in_view.x.abs() < 1e-4 && origin_in_view.y.abs() < 1e-4);
        assert!((origin_in_view.z + ORBIT_DISTANCE).abs() < 1e-4);
    }

    #[test]
    fn default_tint_keeps_gray() {
        let tint = TintParams::new([1.0, 1.0, 1.0]);
        assert_eq!(tint.0, glam::Vec4::ONE);
        assert!((luminance(glam::Vec3::ONE) - 1.0).abs() < 1e-6);
        assert_eq!(size_of::<SceneUniform>(), 192);
    }
}

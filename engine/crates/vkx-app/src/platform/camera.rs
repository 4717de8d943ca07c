/// 透视相机
///
/// - 右手坐标系，Y 轴向上，没有旋转时看向 -Z
/// - 投影矩阵输出 Vulkan 裁剪空间：depth 范围 [0, 1]，Y 轴向下
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: glam::Vec3,

    pub euler_yaw_deg: f32,
    pub euler_pitch_deg: f32,
    pub euler_roll_deg: f32,

    pub fov_deg_vertical: f32,
    pub asp: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// 相机的上参考向量
    const CAMERA_UP: glam::Vec3 = glam::Vec3::new(0.0, 1.0, 0.0);

    /// YXZ 表示 Y(yaw)-X(Pitch)-Z(Roll) 的旋转顺序
    const CAMERA_EULER: glam::EulerRot = glam::EulerRot::YXZ;

    /// 没有旋转的情况下，相机看向的是 -Z
    const CAMERA_FORWARD: glam::Vec3 = glam::Vec3::new(0.0, 0.0, -1.0);

    const CAMERA_RIGHT: glam::Vec3 = glam::Vec3::new(1.0, 0.0, 0.0);

    const K_PITCH: f32 = 89.5;

    #[inline]
    fn rotation(&self) -> glam::Mat4 {
        glam::Mat4::from_euler(
            Self::CAMERA_EULER,
            self.euler_yaw_deg.to_radians(),
            self.euler_pitch_deg.to_radians(),
            self.euler_roll_deg.to_radians(),
        )
    }

    pub fn get_view_matrix(&self) -> glam::Mat4 {
        glam::Mat4::look_to_rh(self.position, self.camera_forward(), self.camera_up())
    }

    /// Vulkan 裁剪空间的投影矩阵
    pub fn get_projection_matrix(&self) -> glam::Mat4 {
        let mut proj = glam::Mat4::perspective_rh(self.fov_deg_vertical.to_radians(), self.asp, self.near, self.far);
        // Vulkan 的 NDC 中 Y 轴向下
        proj.y_axis.y *= -1.0;
        proj
    }

    pub fn camera_forward(&self) -> glam::Vec3 {
        self.rotation().transform_vector3(Self::CAMERA_FORWARD)
    }

    pub fn camera_right(&self) -> glam::Vec3 {
        self.rotation().transform_vector3(Self::CAMERA_RIGHT)
    }

    pub fn camera_up(&self) -> glam::Vec3 {
        self.rotation().transform_vector3(Self::CAMERA_UP)
    }

    /// 朝相机看向的方向进行移动
    pub fn move_forward(&mut self, length: f32) {
        self.position += self.camera_forward() * length;
    }

    pub fn move_right(&mut self, length: f32) {
        self.position += self.camera_right() * length;
    }

    /// 朝世界的 Up 进行移动
    pub fn move_up(&mut self, length: f32) {
        self.position += Self::CAMERA_UP * length;
    }

    pub fn rotate_yaw(&mut self, angle: f32) {
        self.euler_yaw_deg = (self.euler_yaw_deg + angle).rem_euclid(360.0);
    }

    pub fn rotate_pitch(&mut self, angle: f32) {
        self.euler_pitch_deg = (self.euler_pitch_deg + angle).clamp(-Self::K_PITCH, Self::K_PITCH);
    }

    #[inline]
    pub fn set_aspect_ratio(&mut self, asp: f32) {
        self.asp = asp;
    }

    pub fn set_perspective(&mut self, fov_deg_vertical: f32, near: f32, far: f32) {
        self.fov_deg_vertical = fov_deg_vertical;
        self.near = near;
        self.far = far;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: glam::Vec3::new(0.0, 0.0, 0.0),
            euler_yaw_deg: 0.0,
            euler_pitch_deg: 0.0,
            euler_roll_deg: 0.0,
            fov_deg_vertical: 60.0,
            asp: 1.0,
            near: 0.1,
            far: 256.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: glam::Vec3, b: glam::Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn default_looks_down_negative_z() {
        let camera = Camera::default();
        assert!(approx(camera.camera_forward(), glam::Vec3::NEG_Z));
        assert!(approx(camera.camera_right(), glam::Vec3::X));
    }

    #[test]
    fn yaw_turns_left() {
        let mut camera = Camera::default();
        camera.rotate_yaw(90.0);
        assert!(approx(camera.camera_forward(), glam::Vec3::NEG_X));
        camera.rotate_yaw(-180.0);
        assert_eq!(camera.euler_yaw_deg, 270.0);
    }

    #[test]
    fn pitch_is_clamped() {
        let mut camera = Camera::default();
        camera.rotate_pitch(120.0);
        assert_eq!(camera.euler_pitch_deg, 89.5);
    }

    #[test]
    fn projection_is_vulkan_clip() {
        let camera = Camera {
            near: 1.0,
            far: 10.0,
            ..Default::default()
        };
        let proj = camera.get_projection_matrix();

        let near_point = proj.project_point3(glam::vec3(0.0, 0.0, -1.0));
        let far_point = proj.project_point3(glam::vec3(0.0, 0.0, -10.0));
        assert!(near_point.z.abs() < 1e-5);
        assert!((far_point.z - 1.0).abs() < 1e-5);

        // 上方的点在 NDC 中 y < 0
        let up_point = proj.project_point3(glam::vec3(0.0, 1.0, -5.0));
        assert!(up_point.y < 0.0);
    }

    #[test]
    fn move_along_axes() {
        let mut camera = Camera::default();
        camera.move_forward(2.0);
        camera.move_right(1.0);
        camera.move_up(3.0);
        assert!(approx(camera.position, glam::vec3(1.0, 3.0, -2.0)));
    }
}

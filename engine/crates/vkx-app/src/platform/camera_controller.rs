use crate::platform::camera::Camera;
use crate::platform::input_event::KeyCode;
use crate::platform::input_state::InputState;

/// 第一人称相机控制
///
/// - WASD 平移，Q/E 沿世界 Y 轴升降
/// - 按住鼠标右键拖动旋转
pub struct CameraController {
    camera: Camera,
    /// 单位：每秒移动的世界距离
    pub move_speed: f32,
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraController {
    const MOUSE_SENSITIVITY: f64 = 1.0 / 7.0;

    pub fn new() -> Self {
        Self {
            camera: Camera::default(),
            move_speed: 5.0,
        }
    }

    #[inline]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    #[inline]
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// 根据输入更新相机状态
    pub fn update(&mut self, input_state: &InputState, viewport_size: glam::Vec2, delta_time: std::time::Duration) {
        let delta_time_s = delta_time.as_secs_f32();

        if viewport_size.x > 0.0 && viewport_size.y > 0.0 {
            self.camera.set_aspect_ratio(viewport_size.x / viewport_size.y);
        }

        if input_state.is_right_button_pressed() {
            let mouse_delta = input_state.get_mouse_delta();

            self.camera.rotate_yaw(-(mouse_delta[0] * Self::MOUSE_SENSITIVITY) as f32);
            self.camera.rotate_pitch(-(mouse_delta[1] * Self::MOUSE_SENSITIVITY) as f32);
        }

        let step = delta_time_s * self.move_speed;
        if input_state.is_key_pressed(KeyCode::KeyW) {
            self.camera.move_forward(step);
        }
        if input_state.is_key_pressed(KeyCode::KeyS) {
            self.camera.move_forward(-step);
        }
        if input_state.is_key_pressed(KeyCode::KeyA) {
            self.camera.move_right(-step);
        }
        if input_state.is_key_pressed(KeyCode::KeyD) {
            self.camera.move_right(step);
        }
        if input_state.is_key_pressed(KeyCode::KeyE) {
            self.camera.move_up(-step);
        }
        if input_state.is_key_pressed(KeyCode::KeyQ) {
            self.camera.move_up(step);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn w_moves_forward() {
        let mut controller = CameraController::new();
        let mut state = InputState::default();
        state.key_pressed.insert(KeyCode::KeyW, true);

        controller.update(&state, glam::vec2(800.0, 400.0), Duration::from_secs(1));
        assert!((controller.camera().position.z + 5.0).abs() < 1e-5);
        assert_eq!(controller.camera().asp, 2.0);
    }

    #[test]
    fn drag_only_with_right_button() {
        let mut controller = CameraController::new();
        let mut state = InputState {
            crt_mouse_pos: [70.0, 0.0],
            ..Default::default()
        };
        controller.update(&state, glam::vec2(1.0, 1.0), Duration::ZERO);
        assert_eq!(controller.camera().euler_yaw_deg, 0.0);

        state.right_button_pressed = true;
        controller.update(&state, glam::vec2(1.0, 1.0), Duration::ZERO);
        assert!((controller.camera().euler_yaw_deg - 350.0).abs() < 1e-4);
    }

    #[test]
    fn zero_viewport_keeps_aspect() {
        let mut controller = CameraController::new();
        controller.update(&InputState::default(), glam::vec2(0.0, 0.0), Duration::ZERO);
        assert_eq!(controller.camera().asp, 1.0);
    }
}

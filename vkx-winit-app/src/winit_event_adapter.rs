use vkx_app::platform::input_event::{ElementState, InputEvent, KeyCode, MouseButton};
use winit::event::{KeyEvent, MouseScrollDelta, WindowEvent};
use winit::keyboard::PhysicalKey;

/// 像素滚动换算为行滚动时，一行对应的像素数
const PIXELS_PER_LINE: f64 = 100.0;

/// winit 事件到 [`InputEvent`] 的转换，不关心的事件都转换为 [`InputEvent::Other`]
pub struct WinitEventAdapter;
impl WinitEventAdapter {
    pub fn from_winit_event(event: &WindowEvent) -> InputEvent {
        match event {
            WindowEvent::CursorMoved { position, .. } => InputEvent::MouseMoved {
                physical_position: [position.x, position.y],
            },
            WindowEvent::MouseWheel { delta, .. } => InputEvent::MouseWheel {
                delta: Self::wheel_delta(*delta),
            },
            WindowEvent::MouseInput { state, button, .. } => InputEvent::MouseButtonInput {
                button: Self::button(*button),
                state: Self::state(*state),
            },
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state,
                        ..
                    },
                ..
            } => InputEvent::KeyboardInput {
                key_code: Self::key(*key_code),
                state: Self::state(*state),
            },
            WindowEvent::Resized(size) => InputEvent::Resized {
                physical_width: size.width,
                physical_height: size.height,
            },
            _ => InputEvent::Other,
        }
    }

    /// 只保留竖直方向
    fn wheel_delta(delta: MouseScrollDelta) -> f64 {
        match delta {
            MouseScrollDelta::LineDelta(_, y) => y as f64,
            MouseScrollDelta::PixelDelta(pos) => pos.y / PIXELS_PER_LINE,
        }
    }

    fn button(button: winit::event::MouseButton) -> MouseButton {
        match button {
            winit::event::MouseButton::Left => MouseButton::Left,
            winit::event::MouseButton::Right => MouseButton::Right,
            winit::event::MouseButton::Middle => MouseButton::Middle,
            winit::event::MouseButton::Back => MouseButton::Back,
            winit::event::MouseButton::Forward => MouseButton::Forward,
            winit::event::MouseButton::Other(code) => MouseButton::Other(code),
        }
    }

    /// 相机控制只用到 WASD 和 QE
    fn key(key: winit::keyboard::KeyCode) -> KeyCode {
        use winit::keyboard::KeyCode as K;
        match key {
            K::KeyW => KeyCode::KeyW,
            K::KeyA => KeyCode::KeyA,
            K::KeyS => KeyCode::KeyS,
            K::KeyD => KeyCode::KeyD,
            K::KeyE => KeyCode::KeyE,
            K::KeyQ => KeyCode::KeyQ,
            _ => KeyCode::Other,
        }
    }

    fn state(state: winit::event::ElementState) -> ElementState {
        match state {
            winit::event::ElementState::Pressed => ElementState::Pressed,
            winit::event::ElementState::Released => ElementState::Released,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resized_keeps_physical_size() {
        let event = WindowEvent::Resized(winit::dpi::PhysicalSize::new(1920, 1080));
        assert_eq!(
            WinitEventAdapter::from_winit_event(&event),
            InputEvent::Resized {
                physical_width: 1920,
                physical_height: 1080
            }
        );
    }

    #[test]
    fn pixel_scroll_becomes_lines() {
        let delta = MouseScrollDelta::PixelDelta(winit::dpi::PhysicalPosition::new(0.0, 250.0));
        assert_eq!(WinitEventAdapter::wheel_delta(delta), 2.5);
        assert_eq!(WinitEventAdapter::wheel_delta(MouseScrollDelta::LineDelta(3.0, -1.0)), -1.0);
    }

    #[test]
    fn unmapped_keys_are_other() {
        assert_eq!(WinitEventAdapter::key(winit::keyboard::KeyCode::KeyQ), KeyCode::KeyQ);
        assert_eq!(WinitEventAdapter::key(winit::keyboard::KeyCode::Space), KeyCode::Other);
        assert_eq!(WinitEventAdapter::button(winit::event::MouseButton::Other(7)), MouseButton::Other(7));
    }
}

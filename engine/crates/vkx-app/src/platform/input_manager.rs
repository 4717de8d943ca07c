use crate::platform::input_event::{ElementState, InputEvent, MouseButton};
use crate::platform::input_state::InputState;
use std::collections::VecDeque;

/// 输入管理器
///
/// 事件先进入队列，每帧调用一次 [`InputManager::process_events`] 更新状态
#[derive(Default)]
pub struct InputManager {
    /// 输入状态
    state: InputState,
    /// 事件队列
    events: VecDeque<InputEvent>,
}
// getter
impl InputManager {
    #[inline]
    pub fn state(&self) -> &InputState {
        &self.state
    }
}
impl InputManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_event(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    /// 处理所有队列中的事件，更新输入状态
    pub fn process_events(&mut self) {
        // 保存上一帧的鼠标位置
        self.state.last_mouse_pos = self.state.crt_mouse_pos;
        self.state.wheel_delta = 0.0;

        while let Some(event) = self.events.pop_front() {
            match event {
                InputEvent::KeyboardInput { key_code, state } => {
                    self.state.key_pressed.insert(key_code, state == ElementState::Pressed);
                }
                InputEvent::MouseButtonInput { button, state } => {
                    if button == MouseButton::Right {
                        self.state.right_button_pressed = state == ElementState::Pressed;
                    }
                }
                InputEvent::MouseMoved { physical_position } => {
                    self.state.crt_mouse_pos = physical_position;
                }
                InputEvent::MouseWheel { delta } => {
                    self.state.wheel_delta += delta;
                }
                InputEvent::Resized { .. } | InputEvent::Other => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::input_event::KeyCode;

    #[test]
    fn key_state_follows_events() {
        let mut mgr = InputManager::new();
        mgr.push_event(InputEvent::KeyboardInput {
            key_code: KeyCode::KeyW,
            state: ElementState::Pressed,
        });
        mgr.process_events();
        assert!(mgr.state().is_key_pressed(KeyCode::KeyW));
        assert!(!mgr.state().is_key_pressed(KeyCode::KeyS));

        mgr.push_event(InputEvent::KeyboardInput {
            key_code: KeyCode::KeyW,
            state: ElementState::Released,
        });
        mgr.process_events();
        assert!(!mgr.state().is_key_pressed(KeyCode::KeyW));
    }

    #[test]
    fn mouse_delta_is_per_frame() {
        let mut mgr = InputManager::new();
        mgr.push_event(InputEvent::MouseMoved {
            physical_position: [10.0, 20.0],
        });
        mgr.process_events();
        mgr.push_event(InputEvent::MouseMoved {
            physical_position: [15.0, 18.0],
        });
        mgr.process_events();
        assert_eq!(mgr.state().get_mouse_delta(), [5.0, -2.0]);

        // 没有新事件时 delta 归零
        mgr.process_events();
        assert_eq!(mgr.state().get_mouse_delta(), [0.0, 0.0]);
    }

    #[test]
    fn right_button_and_wheel() {
        let mut mgr = InputManager::new();
        mgr.push_event(InputEvent::MouseButtonInput {
            button: MouseButton::Right,
            state: ElementState::Pressed,
        });
        mgr.push_event(InputEvent::MouseWheel { delta: 1.0 });
        mgr.push_event(InputEvent::MouseWheel { delta: 0.5 });
        mgr.process_events();
        assert!(mgr.state().is_right_button_pressed());
        assert_eq!(mgr.state().wheel_delta, 1.5);

        mgr.process_events();
        assert_eq!(mgr.state().wheel_delta, 0.0);
    }
}

// Folds winit events into one FrameInput per frame

use winit::event::{ElementState, MouseButton};
use winit::keyboard::KeyCode;

use crate::game::FrameInput;

/// Held keys persist across frames; motion, clicks and quit are per frame.
#[derive(Debug, Default)]
pub struct InputState {
    held: FrameInput,
    mouse_delta: (f32, f32),
    fire: bool,
    quit: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_key(&mut self, key: KeyCode, state: ElementState) {
        let pressed = state == ElementState::Pressed;
        match key {
            KeyCode::KeyW => self.held.forward = pressed,
            KeyCode::KeyS => self.held.backward = pressed,
            KeyCode::KeyA => self.held.left = pressed,
            KeyCode::KeyD => self.held.right = pressed,
            KeyCode::Space => self.held.up = pressed,
            KeyCode::ShiftLeft => self.held.down = pressed,
            KeyCode::KeyQ | KeyCode::Escape if pressed => self.quit = true,
            _ => {}
        }
    }

    pub fn on_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        if button == MouseButton::Left && state == ElementState::Pressed {
            self.fire = true;
        }
    }

    /// Relative motion; several events per frame add up.
    pub fn on_mouse_motion(&mut self, dx: f64, dy: f64) {
        self.mouse_delta.0 += dx as f32;
        self.mouse_delta.1 += dy as f32;
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    /// Snapshot for this frame and clear the per-frame parts.
    pub fn take_frame(&mut self) -> FrameInput {
        let frame = FrameInput {
            mouse_delta: self.mouse_delta,
            fire: self.fire,
            quit: self.quit,
            ..self.held
        };
        self.mouse_delta = (0.0, 0.0);
        self.fire = false;
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_keys_survive_frames() {
        let mut input = InputState::new();
        input.on_key(KeyCode::KeyW, ElementState::Pressed);
        assert!(input.take_frame().forward);
        assert!(input.take_frame().forward);
        input.on_key(KeyCode::KeyW, ElementState::Released);
        assert!(!input.take_frame().forward);
    }

    #[test]
    fn motion_accumulates_then_resets() {
        let mut input = InputState::new();
        input.on_mouse_motion(3.0, -1.0);
        input.on_mouse_motion(2.0, -4.0);
        assert_eq!(input.take_frame().mouse_delta, (5.0, -5.0));
        assert_eq!(input.take_frame().mouse_delta, (0.0, 0.0));
    }

    #[test]
    fn click_is_one_frame() {
        let mut input = InputState::new();
        input.on_mouse_button(MouseButton::Right, ElementState::Pressed);
        assert!(!input.take_frame().fire);
        input.on_mouse_button(MouseButton::Left, ElementState::Pressed);
        assert!(input.take_frame().fire);
        assert!(!input.take_frame().fire);
    }

    #[test]
    fn quit_key_sticks() {
        let mut input = InputState::new();
        input.on_key(KeyCode::KeyQ, ElementState::Released);
        assert!(!input.take_frame().quit);
        input.on_key(KeyCode::Escape, ElementState::Pressed);
        assert!(input.take_frame().quit);
        assert!(input.take_frame().quit);
    }
}

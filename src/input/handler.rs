use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::camera::CameraController;

/// Viewer commands bound to keys, separate from camera movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    TogglePreview,
    ToggleShader,
    ResetAccumulation,
}

/// Map a key to a viewer command. Only fires on press.
pub fn command_for(event: &WindowEvent) -> Option<Command> {
    let WindowEvent::KeyboardInput {
        event:
            KeyEvent {
                physical_key: PhysicalKey::Code(key),
                state: ElementState::Pressed,
                repeat: false,
                ..
            },
        ..
    } = event
    else {
        return None;
    };
    match key {
        KeyCode::KeyP => Some(Command::TogglePreview),
        KeyCode::KeyT => Some(Command::ToggleShader),
        KeyCode::KeyR => Some(Command::ResetAccumulation),
        _ => None,
    }
}

/// Returns true if the event was consumed.
pub fn handle_window_event(event: &WindowEvent, controller: &mut CameraController) -> bool {
    match event {
        WindowEvent::KeyboardInput {
            event:
                KeyEvent {
                    physical_key: PhysicalKey::Code(key),
                    state,
                    ..
                },
            ..
        } => {
            let pressed = *state == ElementState::Pressed;
            match key {
                KeyCode::KeyW => controller.forward = pressed,
                KeyCode::KeyS => controller.backward = pressed,
                KeyCode::KeyA => controller.left = pressed,
                KeyCode::KeyD => controller.right = pressed,
                KeyCode::KeyE | KeyCode::Space => controller.up = pressed,
                KeyCode::KeyQ | KeyCode::ControlLeft | KeyCode::ControlRight => {
                    controller.down = pressed
                }
                KeyCode::ShiftLeft | KeyCode::ShiftRight => controller.sprint = pressed,
                _ => return false,
            }
            true
        }
        WindowEvent::MouseInput {
            button: MouseButton::Right,
            state,
            ..
        } => {
            controller.mouse_captured = *state == ElementState::Pressed;
            true
        }
        _ => false,
    }
}

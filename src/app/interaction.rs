use winit::event::{ElementState, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};

use super::state::AppState;
use crate::input::handler::{self, Command};

pub fn handle_window_event(state: &mut AppState, event_loop: &ActiveEventLoop, event: WindowEvent) {
    // Keyboard goes to the camera controller before egui so movement keys work
    // regardless of UI focus.
    let is_keyboard = matches!(&event, WindowEvent::KeyboardInput { .. });
    if is_keyboard {
        if let WindowEvent::KeyboardInput {
            event: key_event, ..
        } = &event
            && key_event.physical_key == PhysicalKey::Code(KeyCode::Escape)
            && key_event.state == ElementState::Pressed
        {
            if state.controller.mouse_captured {
                state.controller.mouse_captured = false;
                state.set_cursor_grabbed(false);
                state.controller.clear_mouse_delta();
            } else {
                event_loop.exit();
            }
            return;
        }
        if let Some(command) = handler::command_for(&event) {
            run_command(state, command);
        }
        handler::handle_window_event(&event, &mut state.controller);
    }

    if !state.controller.mouse_captured {
        let egui_response = state.egui_state.on_window_event(&state.window, &event);
        if egui_response.consumed {
            return;
        }
    }

    match &event {
        WindowEvent::CloseRequested => {
            event_loop.exit();
        }
        WindowEvent::Resized(size) => {
            state.handle_resize(*size);
        }
        WindowEvent::RedrawRequested => {
            state.update_and_render();
            state.window.request_redraw();
            return;
        }
        // Focus loss: release the cursor and clear input so the camera
        // doesn't keep moving after alt-tab.
        WindowEvent::Focused(false) => {
            state.controller.mouse_captured = false;
            state.controller.clear_movement();
            state.controller.clear_mouse_delta();
            state.set_cursor_grabbed(false);
        }
        _ => {}
    }

    if !is_keyboard {
        let was_captured = state.controller.mouse_captured;
        handler::handle_window_event(&event, &mut state.controller);
        if state.controller.mouse_captured != was_captured {
            state.set_cursor_grabbed(state.controller.mouse_captured);
            state.controller.clear_mouse_delta();
        }
    }
}

fn run_command(state: &mut AppState, command: Command) {
    match command {
        Command::TogglePreview => state.set_mode(state.mode.toggled()),
        Command::ToggleShader => {
            let mut settings = *state.tracer.settings();
            settings.enable_shader = !settings.enable_shader;
            state.tracer.set_settings(settings);
            state.ui_state.sync_settings(&settings);
        }
        Command::ResetAccumulation => state.tracer.restart(),
    }
}

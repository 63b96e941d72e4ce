mod interaction;
mod rendering;
mod scene_ops;
mod state;

use anyhow::Result;
use winit::application::ApplicationHandler;
use winit::event::{DeviceEvent, DeviceId, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::WindowId;

use crate::render::settings::RunMode;
use state::AppState;

pub fn run(scene_path: Option<String>, mode: RunMode) -> Result<()> {
    let event_loop = EventLoop::new()?;
    let mut app = App::new(scene_path, mode);
    event_loop.run_app(&mut app)?;
    Ok(())
}

struct App {
    scene_path: Option<String>,
    mode: RunMode,
    state: Option<AppState>,
}

impl App {
    fn new(scene_path: Option<String>, mode: RunMode) -> Self {
        Self {
            scene_path,
            mode,
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        match AppState::new(event_loop, &self.scene_path, self.mode) {
            Ok(state) => self.state = Some(state),
            Err(e) => {
                log::error!("Failed to initialize: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let Some(state) = &mut self.state {
            interaction::handle_window_event(state, event_loop, event);
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        if let Some(state) = &mut self.state
            && let DeviceEvent::MouseMotion { delta: (dx, dy) } = event
        {
            state.controller.accumulate_raw_delta(dx, dy);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &mut self.state {
            state.tracer.on_disable();
        }
    }
}

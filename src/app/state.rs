// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};
use std::time::Instant;

use anyhow::Result;
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::Window;

use crate::camera::{Camera, CameraController};
use crate::constants::{DEFAULT_SCENE_PATH, DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH};
use crate::gpu::context::GpuContext;
use crate::gpu::device::WgpuDevice;
use crate::io::environment::EnvironmentImage;
use crate::render::settings::RunMode;
use crate::render::tracer::ProgressiveTracer;
use crate::scene::scene::Scene;
use crate::shaders::composer::ShaderComposer;
use crate::ui;

pub enum FileDialogResult {
    OpenScene(PathBuf),
}

pub struct AppState {
    pub window: Arc<Window>,
    pub file_dialog_rx: mpsc::Receiver<FileDialogResult>,
    pub file_dialog_tx: mpsc::Sender<FileDialogResult>,
    pub gpu: GpuContext,
    pub scene: Scene,
    pub scene_path: Option<PathBuf>,
    pub camera: Camera,
    pub controller: CameraController,
    pub tracer: ProgressiveTracer<WgpuDevice>,
    pub mode: RunMode,
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub ui_state: ui::UiState,
    pub last_frame: Instant,
}

impl AppState {
    pub fn new(
        event_loop: &ActiveEventLoop,
        scene_path: &Option<String>,
        mode: RunMode,
    ) -> Result<Self> {
        let window = Arc::new(
            event_loop.create_window(
                Window::default_attributes()
                    .with_title("Sphere Tracer")
                    .with_inner_size(PhysicalSize::new(
                        DEFAULT_WINDOW_WIDTH,
                        DEFAULT_WINDOW_HEIGHT,
                    )),
            )?,
        );

        let gpu = GpuContext::new(window.clone())?;

        let (scene, scene_path) = match scene_path {
            Some(path) => {
                let path = PathBuf::from(path);
                (crate::scene::loader::load_scene(&path)?, Some(path))
            }
            None => {
                let path = crate::constants::resolve_data_path(DEFAULT_SCENE_PATH);
                match crate::scene::loader::load_scene(&path) {
                    Ok(scene) => (scene, Some(path)),
                    Err(e) => {
                        log::warn!("No default scene ({e:#}), starting empty");
                        (Scene::empty(), None)
                    }
                }
            }
        };

        let composer = ShaderComposer::load()?;
        let device = WgpuDevice::new(
            gpu.device.clone(),
            gpu.queue.clone(),
            gpu.surface_format(),
            &composer,
        )?;
        let mut tracer = ProgressiveTracer::new(device, scene.settings);
        let environment = EnvironmentImage::load_or_default(scene.environment.as_deref());
        tracer.on_enable(&environment);

        let camera = Camera::from_config(&scene.camera);

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer =
            egui_wgpu::Renderer::new(&gpu.device, gpu.surface_format(), None, 1, false);

        let mut ui_state = ui::UiState::from_settings(tracer.settings(), mode);
        ui_state.scene_name = scene_label(scene_path.as_deref());

        let (file_dialog_tx, file_dialog_rx) = mpsc::channel();

        Ok(Self {
            window,
            file_dialog_rx,
            file_dialog_tx,
            gpu,
            scene,
            scene_path,
            camera,
            controller: CameraController::new(),
            tracer,
            mode,
            egui_ctx,
            egui_state,
            egui_renderer,
            ui_state,
            last_frame: Instant::now(),
        })
    }

    pub fn set_cursor_grabbed(&self, grabbed: bool) {
        use winit::window::CursorGrabMode;
        self.window.set_cursor_visible(!grabbed);
        if grabbed {
            // Locked is not supported on X11; Confined is the fallback there.
            if self.window.set_cursor_grab(CursorGrabMode::Locked).is_err() {
                let _ = self.window.set_cursor_grab(CursorGrabMode::Confined);
            }
        } else {
            let _ = self.window.set_cursor_grab(CursorGrabMode::None);
        }
    }

    /// Reconfigure the surface. The tracer notices the new extent on its next
    /// render tick and reallocates its targets there.
    pub fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        self.gpu.resize(size.width, size.height);
    }

    pub fn set_mode(&mut self, mode: RunMode) {
        if self.mode != mode {
            log::info!("Run mode: {}", mode.label());
        }
        self.mode = mode;
        self.ui_state.mode = mode;
    }
}

pub fn scene_label(path: Option<&Path>) -> String {
    path.and_then(|p| p.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_label_uses_file_name() {
        assert_eq!(
            scene_label(Some(Path::new("resources/scenes/demo.yaml"))),
            "demo.yaml"
        );
        assert_eq!(scene_label(None), "");
    }
}

// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::time::Instant;

use super::state::{AppState, FileDialogResult};
use crate::ui;

impl AppState {
    pub fn update_and_render(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.ui_state.fps = if dt > 0.0 { 1.0 / dt } else { 0.0 };
        self.ui_state.sample_count = self.tracer.sample_index();
        self.ui_state.render_elapsed_secs = self.tracer.render_elapsed_secs();

        // Movement only edits the camera; the tracer's update tick notices the new transform.
        self.controller.update(&mut self.camera, dt);
        self.controller.apply_mouse_look(&mut self.camera);

        let raw_input = self.egui_state.take_egui_input(&self.window);
        let mut ui_actions = ui::UiActions::default();
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            ui_actions = ui::draw_ui(ctx, &mut self.ui_state);
        });
        self.apply_ui_actions(ui_actions);

        // Poll for completed file dialog results (non-blocking).
        while let Ok(result) = self.file_dialog_rx.try_recv() {
            match result {
                FileDialogResult::OpenScene(path) => self.open_scene(&path),
            }
        }

        self.egui_state
            .handle_platform_output(&self.window, full_output.platform_output);
        if self.controller.mouse_captured {
            self.window.set_cursor_visible(false);
        }

        let output = match self.gpu.surface.get_current_texture() {
            Ok(tex) => tex,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let extent = self.gpu.extent();
                self.gpu.resize(extent.width, extent.height);
                return;
            }
            Err(e) => {
                log::error!("Surface error: {e}");
                return;
            }
        };
        let surface_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let report = self
            .tracer
            .on_each_tick(&self.camera, &self.scene, self.gpu.extent(), self.mode);
        self.ui_state.sphere_count = report.sphere_count;

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let extent = self.gpu.extent();
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [extent.width, extent.height],
            pixels_per_point: self.window.scale_factor() as f32,
        };
        for (id, delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.gpu.device, &self.gpu.queue, *id, delta);
        }

        let device = self.tracer.device_mut();
        device.present(&surface_view);

        let encoder = device.encoder();
        self.egui_renderer.update_buffers(
            &self.gpu.device,
            &self.gpu.queue,
            encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            let mut render_pass = render_pass.forget_lifetime();
            self.egui_renderer
                .render(&mut render_pass, &paint_jobs, &screen_descriptor);
        }

        if let Some(commands) = self.tracer.device_mut().take_commands() {
            self.gpu.queue.submit(std::iter::once(commands));
        }
        output.present();

        // Non-blocking poll: reclaim completed staging buffers without stalling.
        self.gpu.device.poll(wgpu::Maintain::Poll);

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }

    fn apply_ui_actions(&mut self, actions: ui::UiActions) {
        if let Some(settings) = actions.settings_changed {
            self.tracer.set_settings(settings);
        }
        if let Some(mode) = actions.mode_changed {
            self.set_mode(mode);
        }
        if actions.reset_requested {
            self.tracer.restart();
        }
        if actions.open_scene_dialog {
            self.spawn_open_dialog();
        }
    }
}

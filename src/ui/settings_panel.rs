// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use egui::Context;

use super::{UiActions, UiState};
use crate::constants::{MAX_BOUNCES, MAX_RAYS_PER_PIXEL, MIN_BOUNCES, MIN_RAYS_PER_PIXEL};
use crate::render::settings::RunMode;

/// Render a labelled slider and set `*changed = true` when the value is modified.
fn labeled_slider<T: egui::emath::Numeric>(
    ui: &mut egui::Ui,
    label: &str,
    value: &mut T,
    range: std::ops::RangeInclusive<T>,
    changed: &mut bool,
) {
    ui.horizontal(|ui| {
        ui.label(label);
        if ui.add(egui::Slider::new(value, range)).changed() {
            *changed = true;
        }
    });
}

pub fn draw_settings_panel(ctx: &Context, state: &mut UiState, actions: &mut UiActions) {
    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        egui::menu::bar(ui, |ui| {
            if ui.button("Open scene…").clicked() {
                actions.open_scene_dialog = true;
            }
            ui.separator();

            let next = state.mode.toggled();
            let label = match state.mode {
                RunMode::Active => "⏸ Preview",
                RunMode::Preview => "▶ Play",
            };
            if ui.button(label).clicked() {
                state.mode = next;
                actions.mode_changed = Some(next);
            }
            if ui.button("⟲ Restart").clicked() {
                actions.reset_requested = true;
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("{:.0} fps", state.fps));
                ui.separator();
                ui.label(format!(
                    "{} samples · {:.1}s",
                    state.sample_count, state.render_elapsed_secs
                ));
                ui.separator();
                ui.label(state.mode.label());
            });
        });
    });

    egui::SidePanel::right("tracer_settings")
        .resizable(false)
        .show(ctx, |ui| {
            ui.heading("Ray tracing");
            let mut changed = false;

            if ui
                .checkbox(&mut state.enable_shader, "Trace in preview")
                .changed()
            {
                changed = true;
            }
            labeled_slider(
                ui,
                "Max bounces",
                &mut state.max_bounces,
                MIN_BOUNCES..=MAX_BOUNCES,
                &mut changed,
            );
            labeled_slider(
                ui,
                "Rays per pixel",
                &mut state.rays_per_pixel,
                MIN_RAYS_PER_PIXEL..=MAX_RAYS_PER_PIXEL,
                &mut changed,
            );

            if changed {
                actions.settings_changed = Some(state.settings());
            }

            ui.separator();
            if state.scene_name.is_empty() {
                ui.label("No scene loaded");
            } else {
                ui.label(format!("Scene: {}", state.scene_name));
            }
            ui.label(format!("Spheres: {}", state.sphere_count));
            ui.separator();
            ui.small("RMB + WASD to fly, P preview, T shader, R restart");
        });
}

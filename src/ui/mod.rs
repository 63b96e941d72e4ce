pub mod settings_panel;

use egui::Context;

use crate::render::settings::{RunMode, TracerSettings};

#[derive(Default)]
pub struct UiActions {
    pub settings_changed: Option<TracerSettings>,
    pub mode_changed: Option<RunMode>,
    pub open_scene_dialog: bool,
    pub reset_requested: bool,
}

pub struct UiState {
    pub enable_shader: bool,
    pub max_bounces: u32,
    pub rays_per_pixel: u32,
    pub mode: RunMode,
    pub scene_name: String,
    pub sphere_count: usize,
    pub fps: f32,
    pub sample_count: u32,
    pub render_elapsed_secs: f32,
}

impl Default for UiState {
    fn default() -> Self {
        Self::from_settings(&TracerSettings::default(), RunMode::default())
    }
}

impl UiState {
    pub fn from_settings(settings: &TracerSettings, mode: RunMode) -> Self {
        Self {
            enable_shader: settings.enable_shader,
            max_bounces: settings.max_bounces(),
            rays_per_pixel: settings.rays_per_pixel(),
            mode,
            scene_name: String::new(),
            sphere_count: 0,
            fps: 0.0,
            sample_count: 0,
            render_elapsed_secs: 0.0,
        }
    }

    /// Mirror externally changed settings (scene reload, hotkeys) into the widgets.
    pub fn sync_settings(&mut self, settings: &TracerSettings) {
        self.enable_shader = settings.enable_shader;
        self.max_bounces = settings.max_bounces();
        self.rays_per_pixel = settings.rays_per_pixel();
    }

    /// Settings as currently edited in the panel.
    pub fn settings(&self) -> TracerSettings {
        TracerSettings::new(self.enable_shader, self.max_bounces, self.rays_per_pixel)
    }
}

pub fn draw_ui(ctx: &Context, state: &mut UiState) -> UiActions {
    let mut actions = UiActions::default();
    settings_panel::draw_settings_panel(ctx, state, &mut actions);
    actions
}

// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_BOUNCES, DEFAULT_RAYS_PER_PIXEL, MAX_BOUNCES, MAX_RAYS_PER_PIXEL, MIN_BOUNCES,
    MIN_RAYS_PER_PIXEL,
};

/// Whether the sample index advances after each traced frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Progressive accumulation: every frame adds one sample.
    #[default]
    Active,
    /// Live preview: the sample index is frozen and accumulation is never committed.
    Preview,
}

impl RunMode {
    pub fn is_active(self) -> bool {
        self == Self::Active
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Active => Self::Preview,
            Self::Preview => Self::Active,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Preview => "Preview",
        }
    }
}

/// User-facing tracer configuration. Limits are kept inside their declared
/// ranges by every setter and by [`TracerSettings::sanitize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracerSettings {
    /// Trace even while previewing; when false a preview frame is a pass-through copy.
    #[serde(default)]
    pub enable_shader: bool,

    #[serde(default = "default_max_bounces")]
    max_bounces: u32,

    #[serde(default = "default_rays_per_pixel")]
    rays_per_pixel: u32,
}

fn default_max_bounces() -> u32 {
    DEFAULT_MAX_BOUNCES
}

fn default_rays_per_pixel() -> u32 {
    DEFAULT_RAYS_PER_PIXEL
}

impl Default for TracerSettings {
    fn default() -> Self {
        Self {
            enable_shader: false,
            max_bounces: DEFAULT_MAX_BOUNCES,
            rays_per_pixel: DEFAULT_RAYS_PER_PIXEL,
        }
    }
}

fn clamp_logged(name: &str, value: u32, min: u32, max: u32) -> u32 {
    let clamped = value.clamp(min, max);
    if clamped != value {
        log::warn!("{name}={value} outside [{min}, {max}], using {clamped}");
    }
    clamped
}

impl TracerSettings {
    pub fn new(enable_shader: bool, max_bounces: u32, rays_per_pixel: u32) -> Self {
        let mut settings = Self {
            enable_shader,
            max_bounces,
            rays_per_pixel,
        };
        settings.sanitize();
        settings
    }

    pub fn max_bounces(&self) -> u32 {
        self.max_bounces
    }

    pub fn rays_per_pixel(&self) -> u32 {
        self.rays_per_pixel
    }

    pub fn set_max_bounces(&mut self, value: u32) {
        self.max_bounces = clamp_logged("max_bounces", value, MIN_BOUNCES, MAX_BOUNCES);
    }

    pub fn set_rays_per_pixel(&mut self, value: u32) {
        self.rays_per_pixel =
            clamp_logged("rays_per_pixel", value, MIN_RAYS_PER_PIXEL, MAX_RAYS_PER_PIXEL);
    }

    /// Clamp values that bypassed the setters (deserialized scene files).
    pub fn sanitize(&mut self) {
        self.set_max_bounces(self.max_bounces);
        self.set_rays_per_pixel(self.rays_per_pixel);
    }

    /// Tracing runs while active, or while previewing with the shader enabled.
    pub fn traces(&self, mode: RunMode) -> bool {
        self.enable_shader || mode.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_mode_toggle() {
        assert_eq!(RunMode::default(), RunMode::Active);
        assert_eq!(RunMode::Active.toggled(), RunMode::Preview);
        assert_eq!(RunMode::Preview.toggled(), RunMode::Active);
    }

    #[test]
    fn test_setters_clamp() {
        let mut settings = TracerSettings::default();
        settings.set_max_bounces(0);
        assert_eq!(settings.max_bounces(), 1);
        settings.set_max_bounces(33);
        assert_eq!(settings.max_bounces(), 32);
        settings.set_rays_per_pixel(500);
        assert_eq!(settings.rays_per_pixel(), 200);
        settings.set_rays_per_pixel(17);
        assert_eq!(settings.rays_per_pixel(), 17);
    }

    #[test]
    fn test_new_clamps() {
        let settings = TracerSettings::new(true, 100, 0);
        assert_eq!(settings.max_bounces(), 32);
        assert_eq!(settings.rays_per_pixel(), 1);
        assert!(settings.enable_shader);
    }

    #[test]
    fn test_traces() {
        let disabled = TracerSettings::default();
        assert!(disabled.traces(RunMode::Active));
        assert!(!disabled.traces(RunMode::Preview));

        let enabled = TracerSettings::new(true, 4, 2);
        assert!(enabled.traces(RunMode::Preview));
    }
}

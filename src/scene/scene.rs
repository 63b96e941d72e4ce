// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use serde::{Deserialize, Serialize};

use super::sphere::{SceneQuery, SphereInstance, SphereObject};
use crate::constants::{DEFAULT_CAMERA_POSITION, DEFAULT_FOV};
use crate::render::settings::TracerSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_camera_position")]
    pub position: [f32; 3],

    /// Euler angles in degrees: pitch, yaw, roll.
    #[serde(default, skip_serializing_if = "is_zero_vec3")]
    pub rotation: [f32; 3],

    #[serde(default = "default_fov", skip_serializing_if = "is_default_fov")]
    pub fov: f32,
}

fn default_camera_position() -> [f32; 3] {
    DEFAULT_CAMERA_POSITION
}

fn default_fov() -> f32 {
    DEFAULT_FOV
}

fn is_zero_vec3(v: &[f32; 3]) -> bool {
    v[0] == 0.0 && v[1] == 0.0 && v[2] == 0.0
}

fn is_default_fov(v: &f32) -> bool {
    *v == default_fov()
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: DEFAULT_CAMERA_POSITION,
            rotation: [0.0, 0.0, 0.0],
            fov: default_fov(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub camera: CameraConfig,

    #[serde(default)]
    pub settings: TracerSettings,

    /// Equirectangular background image, relative to the scene file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    #[serde(default)]
    pub spheres: Vec<SphereObject>,
}

impl Scene {
    pub fn empty() -> Self {
        Self::default()
    }
}

impl SceneQuery for Scene {
    fn sphere_instances(&self) -> Vec<SphereInstance> {
        self.spheres
            .iter()
            .filter(|s| s.is_ray_traced())
            .map(SphereInstance::from)
            .collect()
    }
}

// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use glam::{Mat4, Quat, Vec3};

use crate::constants::{CAMERA_FAR, CAMERA_NEAR, DEFAULT_CAMERA_POSITION, DEFAULT_FOV};
use crate::scene::scene::CameraConfig;

/// Left-handed camera looking down +Z in its local space.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,   // degrees
    pub pitch: f32, // degrees
    pub roll: f32,  // degrees
    pub fov: f32,   // degrees, vertical
}

impl Camera {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            position: Vec3::from(config.position),
            pitch: config.rotation[0],
            yaw: config.rotation[1],
            roll: config.rotation[2],
            fov: config.fov,
        }
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_euler(
            glam::EulerRot::YXZ,
            self.yaw.to_radians(),
            self.pitch.to_radians(),
            self.roll.to_radians(),
        )
    }

    pub fn basis_vectors(&self) -> (Vec3, Vec3, Vec3) {
        let rot = self.orientation();
        let forward = rot * Vec3::Z;
        let right = rot * Vec3::X;
        let up = rot * Vec3::Y;
        (right, up, forward)
    }

    /// World transform of the camera object; what the invalidation tracker watches.
    pub fn transform(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation(), self.position)
    }

    pub fn camera_to_world(&self) -> Mat4 {
        self.transform()
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_lh(self.fov.to_radians(), aspect, CAMERA_NEAR, CAMERA_FAR)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::from(DEFAULT_CAMERA_POSITION),
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            fov: DEFAULT_FOV,
        }
    }
}

use glam::Vec3;

use super::camera::Camera;
use crate::constants::{
    CAMERA_DEFAULT_MOVE_SPEED, CAMERA_DEFAULT_SENSITIVITY, CAMERA_PITCH_CLAMP,
    CAMERA_SPRINT_MULTIPLIER,
};

/// FPS-style camera controller (WASD + mouse look).
///
/// The controller only moves the camera. Accumulation resets happen downstream,
/// when the invalidation tracker sees the new transform.
pub struct CameraController {
    pub move_speed: f32,
    pub look_sensitivity: f32,
    pub sprint_multiplier: f32,
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub sprint: bool,
    pub mouse_captured: bool,
    mouse_delta: (f32, f32),
}

impl CameraController {
    pub fn new() -> Self {
        Self {
            move_speed: CAMERA_DEFAULT_MOVE_SPEED,
            look_sensitivity: Self::resolve_sensitivity(),
            sprint_multiplier: CAMERA_SPRINT_MULTIPLIER,
            forward: false,
            backward: false,
            left: false,
            right: false,
            up: false,
            down: false,
            sprint: false,
            mouse_captured: false,
            mouse_delta: (0.0, 0.0),
        }
    }

    fn resolve_sensitivity() -> f32 {
        let Ok(val) = std::env::var("SPHERE_TRACER_MOUSE_SENS") else {
            return CAMERA_DEFAULT_SENSITIVITY;
        };
        match val.parse::<f32>() {
            Ok(sens) if sens > 0.0 && sens.is_finite() => {
                log::info!("SPHERE_TRACER_MOUSE_SENS={sens}");
                sens
            }
            _ => {
                log::warn!("SPHERE_TRACER_MOUSE_SENS={val:?} invalid, using default");
                CAMERA_DEFAULT_SENSITIVITY
            }
        }
    }

    /// Returns true if the camera moved.
    pub fn update(&mut self, camera: &mut Camera, dt: f32) -> bool {
        let sprint_factor = if self.sprint {
            self.sprint_multiplier
        } else {
            1.0
        };
        let speed = self.move_speed * sprint_factor * dt;
        let (cam_right, _cam_up, cam_forward) = camera.basis_vectors();

        let mut delta = Vec3::ZERO;
        if self.forward {
            delta += cam_forward;
        }
        if self.backward {
            delta -= cam_forward;
        }
        if self.right {
            delta += cam_right;
        }
        if self.left {
            delta -= cam_right;
        }
        if self.up {
            delta += Vec3::Y;
        }
        if self.down {
            delta -= Vec3::Y;
        }

        if delta != Vec3::ZERO {
            camera.position += delta.normalize() * speed;
            true
        } else {
            false
        }
    }

    /// Accumulate mouse movement from `DeviceEvent::MouseMotion`.
    pub fn accumulate_raw_delta(&mut self, x: f64, y: f64) {
        if self.mouse_captured {
            self.mouse_delta.0 += x as f32;
            self.mouse_delta.1 += y as f32;
        }
    }

    /// Apply accumulated mouse delta to camera rotation (called once per frame).
    /// Returns true if the camera rotated.
    pub fn apply_mouse_look(&mut self, camera: &mut Camera) -> bool {
        let (dx, dy) = self.mouse_delta;
        self.mouse_delta = (0.0, 0.0);
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        camera.yaw += dx * self.look_sensitivity;
        camera.pitch = (camera.pitch + dy * self.look_sensitivity)
            .clamp(-CAMERA_PITCH_CLAMP, CAMERA_PITCH_CLAMP);
        true
    }

    /// Discard buffered mouse delta (call when toggling capture to avoid a jump).
    pub fn clear_mouse_delta(&mut self) {
        self.mouse_delta = (0.0, 0.0);
    }

    /// Reset all movement flags (call on focus loss to prevent runaway movement).
    pub fn clear_movement(&mut self) {
        self.forward = false;
        self.backward = false;
        self.left = false;
        self.right = false;
        self.up = false;
        self.down = false;
        self.sprint = false;
    }
}

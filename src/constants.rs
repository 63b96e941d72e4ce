// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::PathBuf;

// GPU / compute
// Tile edge in threads. Must match `@workgroup_size` in path_trace.wgsl.
pub const TILE_SIZE: u32 = 16;
// Composite and blit passes cover the whole image, so they round up instead.
pub const COMPOSITE_WORKGROUP_SIZE: u32 = 8;

// Tracer limits
pub const MIN_BOUNCES: u32 = 1;
pub const MAX_BOUNCES: u32 = 32;
pub const MIN_RAYS_PER_PIXEL: u32 = 1;
pub const MAX_RAYS_PER_PIXEL: u32 = 200;
pub const DEFAULT_MAX_BOUNCES: u32 = 4;
pub const DEFAULT_RAYS_PER_PIXEL: u32 = 2;

// Scene query tag for spheres picked up by the collector.
pub const RAY_TRACED_SPHERE_TAG: &str = "RTSphere";

// Camera defaults
pub const DEFAULT_FOV: f32 = 60.0;
pub const DEFAULT_CAMERA_POSITION: [f32; 3] = [0.0, 1.0, -6.0];
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;

// Camera controller
pub const CAMERA_DEFAULT_MOVE_SPEED: f32 = 5.0;
pub const CAMERA_SPRINT_MULTIPLIER: f32 = 3.0;
pub const CAMERA_DEFAULT_SENSITIVITY: f32 = 0.15;
pub const CAMERA_PITCH_CLAMP: f32 = 89.0;

// Environment fallback when no image is configured
pub const DEFAULT_ENVIRONMENT_COLOR: [f32; 4] = [0.5, 0.7, 1.0, 1.0];

// Accumulation buffer: vec4<f32> = 16 bytes per pixel
pub const ACCUM_BYTES_PER_PIXEL: u64 = 16;

// Window defaults
pub const DEFAULT_WINDOW_WIDTH: u32 = 1280;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 720;
pub const DEFAULT_SCENE_PATH: &str = "resources/scenes/demo.yaml";

// Headless defaults
pub const DEFAULT_HEADLESS_FRAMES: u32 = 64;

/// Resolve a data-file path: check next to the executable first, then macOS bundle, then CWD.
pub fn resolve_data_path(relative: &str) -> PathBuf {
    if let Ok(exe) = std::env::current_exe()
        && let Some(dir) = exe.parent()
    {
        let candidates = [dir.join(relative), dir.join("../Resources").join(relative)];
        for path in &candidates {
            if path.exists() {
                return path.clone();
            }
        }
    }
    PathBuf::from(relative)
}

/// Resolve a relative resource path referenced from a scene file:
/// 1. Return as-is if the path already exists
/// 2. Try relative to the scene file's directory
/// 3. Try via `resolve_data_path()`
/// 4. Fall back to the original path unchanged
pub fn resolve_resource_path(scene_dir: &std::path::Path, relative: &str) -> String {
    if std::path::Path::new(relative).exists() {
        return relative.to_string();
    }
    let scene_relative = scene_dir.join(relative);
    if scene_relative.exists() {
        return scene_relative.to_string_lossy().into_owned();
    }
    let data = resolve_data_path(relative);
    if data.exists() {
        return data.to_string_lossy().into_owned();
    }
    relative.to_string()
}

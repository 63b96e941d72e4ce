// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use bytemuck::{Pod, Zeroable};

use super::device::{Extent, RenderDevice};
use super::settings::TracerSettings;
use crate::camera::Camera;
use crate::constants::TILE_SIZE;

/// Per-frame kernel uniforms. Must match the WGSL `Frame` struct layout exactly.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub camera_to_world: [[f32; 4]; 4],
    pub inverse_projection: [[f32; 4]; 4],
    pub width: u32,
    pub height: u32,
    pub max_bounces: u32,
    pub rays_per_pixel: u32,
    pub sample_index: u32,
    pub sphere_count: u32,
    pub _pad: [u32; 2],
}

/// Number of 16x16 tiles dispatched in each direction.
///
/// Division truncates: a partial tile at the right or bottom edge is never
/// dispatched, and those pixels keep whatever the output target held before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchGrid {
    pub tiles_x: u32,
    pub tiles_y: u32,
}

impl DispatchGrid {
    pub fn for_extent(extent: Extent) -> Self {
        Self {
            tiles_x: extent.width / TILE_SIZE,
            tiles_y: extent.height / TILE_SIZE,
        }
    }

    pub fn tile_count(&self) -> u32 {
        self.tiles_x * self.tiles_y
    }

    /// Pixel region written by the kernel, anchored at the origin.
    pub fn covered(&self) -> Extent {
        Extent::new(self.tiles_x * TILE_SIZE, self.tiles_y * TILE_SIZE)
    }

    pub fn is_empty(&self) -> bool {
        self.tile_count() == 0
    }
}

/// Assembles the frame uniforms and issues the tracing dispatch.
pub struct DispatchCoordinator;

impl DispatchCoordinator {
    pub fn frame_uniforms(
        camera: &Camera,
        extent: Extent,
        settings: &TracerSettings,
        sample_index: u32,
        sphere_count: u32,
    ) -> FrameUniforms {
        FrameUniforms {
            camera_to_world: camera.camera_to_world().to_cols_array_2d(),
            inverse_projection: camera.projection(extent.aspect()).inverse().to_cols_array_2d(),
            width: extent.width,
            height: extent.height,
            max_bounces: settings.max_bounces(),
            rays_per_pixel: settings.rays_per_pixel(),
            sample_index,
            sphere_count,
            _pad: [0; 2],
        }
    }

    /// Dispatch the kernel over the truncated tile grid and return that grid.
    pub fn dispatch<D: RenderDevice>(device: &mut D, uniforms: &FrameUniforms) -> DispatchGrid {
        let grid = DispatchGrid::for_extent(Extent::new(uniforms.width, uniforms.height));
        if grid.is_empty() {
            log::debug!(
                "output {}x{} smaller than one tile, skipping dispatch",
                uniforms.width,
                uniforms.height
            );
        } else {
            device.dispatch_trace(uniforms, grid);
        }
        grid
    }
}

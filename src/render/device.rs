// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use super::compositor::CompositeParams;
use super::dispatch::{DispatchGrid, FrameUniforms};
use crate::io::environment::EnvironmentImage;
use crate::scene::sphere::GpuSphere;

/// Output resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent {
    pub width: u32,
    pub height: u32,
}

impl Extent {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Device-side resources the tracer drives each frame.
///
/// Implementations own three images: the per-frame output target written by the
/// kernel, the persistent accumulation image, and the presented image. Calls
/// arrive in frame order (upload, dispatch, composite) and must execute in that
/// order on the device.
pub trait RenderDevice {
    /// Release any existing images and allocate zeroed ones at `extent`.
    fn allocate_targets(&mut self, extent: Extent);

    fn release_targets(&mut self);

    /// Replace the device scene buffer; the element count becomes `spheres.len()`.
    fn upload_scene(&mut self, spheres: &[GpuSphere]);

    fn release_scene(&mut self);

    fn bind_environment(&mut self, environment: &EnvironmentImage);

    /// Run the tracing kernel over `grid`, writing the output target only.
    fn dispatch_trace(&mut self, uniforms: &FrameUniforms, grid: DispatchGrid);

    /// Blend the output target into the accumulation image and present the result.
    fn composite(&mut self, params: &CompositeParams);

    /// Present the unmodified input frame.
    fn pass_through(&mut self);
}

// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use super::compositor::{CompositeParams, blend};
use super::device::{Extent, RenderDevice};
use super::dispatch::{DispatchGrid, FrameUniforms};
use super::kernel::{Kernel, KernelInput};
use crate::constants::TILE_SIZE;
use crate::io::environment::EnvironmentImage;
use crate::scene::sphere::GpuSphere;

/// Counters of device work, for headless logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStats {
    pub allocations: u32,
    pub target_releases: u32,
    pub scene_uploads: u32,
    pub scene_releases: u32,
    pub dispatches: u32,
    pub invocations: u64,
    pub composites: u32,
    pub pass_throughs: u32,
}

/// CPU implementation of [`RenderDevice`]; runs `kernel` tile by tile.
pub struct SoftwareDevice<K> {
    kernel: K,
    extent: Option<Extent>,
    input: Vec<[f32; 4]>,
    output: Vec<[f32; 4]>,
    accumulation: Vec<[f32; 4]>,
    presented: Vec<[f32; 4]>,
    scene: Option<Vec<GpuSphere>>,
    environment: EnvironmentImage,
    stats: DeviceStats,
}

impl<K: Kernel> SoftwareDevice<K> {
    pub fn new(kernel: K) -> Self {
        Self {
            kernel,
            extent: None,
            input: Vec::new(),
            output: Vec::new(),
            accumulation: Vec::new(),
            presented: Vec::new(),
            scene: None,
            environment: EnvironmentImage::default(),
            stats: DeviceStats::default(),
        }
    }

    pub fn extent(&self) -> Option<Extent> {
        self.extent
    }

    pub fn stats(&self) -> DeviceStats {
        self.stats
    }

    pub fn output(&self) -> &[[f32; 4]] {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut [[f32; 4]] {
        &mut self.output
    }

    pub fn accumulation(&self) -> &[[f32; 4]] {
        &self.accumulation
    }

    pub fn presented(&self) -> &[[f32; 4]] {
        &self.presented
    }

    /// The frame shown unmodified by [`RenderDevice::pass_through`].
    pub fn input_mut(&mut self) -> &mut [[f32; 4]] {
        &mut self.input
    }

    pub fn scene(&self) -> Option<&[GpuSphere]> {
        self.scene.as_deref()
    }
}

impl<K: Kernel> RenderDevice for SoftwareDevice<K> {
    fn allocate_targets(&mut self, extent: Extent) {
        let len = extent.pixel_count();
        self.input = self.environment.stretched(extent.width, extent.height);
        self.output = vec![[0.0; 4]; len];
        self.accumulation = vec![[0.0; 4]; len];
        self.presented = vec![[0.0; 4]; len];
        self.extent = Some(extent);
        self.stats.allocations += 1;
    }

    fn release_targets(&mut self) {
        self.input = Vec::new();
        self.output = Vec::new();
        self.accumulation = Vec::new();
        self.presented = Vec::new();
        self.extent = None;
        self.stats.target_releases += 1;
    }

    fn upload_scene(&mut self, spheres: &[GpuSphere]) {
        self.scene = Some(spheres.to_vec());
        self.stats.scene_uploads += 1;
    }

    fn release_scene(&mut self) {
        self.scene = None;
        self.stats.scene_releases += 1;
    }

    fn bind_environment(&mut self, environment: &EnvironmentImage) {
        self.environment = environment.clone();
        if let Some(extent) = self.extent {
            self.input = self.environment.stretched(extent.width, extent.height);
        }
    }

    fn dispatch_trace(&mut self, uniforms: &FrameUniforms, grid: DispatchGrid) {
        let Some(extent) = self.extent else {
            log::warn!("dispatch without allocated targets");
            return;
        };
        let input = KernelInput {
            uniforms,
            spheres: self.scene.as_deref().unwrap_or(&[]),
            environment: &self.environment,
        };

        for ty in 0..grid.tiles_y {
            for tx in 0..grid.tiles_x {
                for ly in 0..TILE_SIZE {
                    for lx in 0..TILE_SIZE {
                        let x = tx * TILE_SIZE + lx;
                        let y = ty * TILE_SIZE + ly;
                        // Matches the kernel's own bounds check.
                        if x >= extent.width || y >= extent.height {
                            continue;
                        }
                        let idx = (y * extent.width + x) as usize;
                        self.output[idx] = self.kernel.shade(&input, x, y);
                        self.stats.invocations += 1;
                    }
                }
            }
        }
        self.stats.dispatches += 1;
    }

    fn composite(&mut self, params: &CompositeParams) {
        for i in 0..self.presented.len() {
            let blended = blend(self.accumulation[i], self.output[i], params.weight);
            self.presented[i] = blended;
            if params.commits() {
                self.accumulation[i] = blended;
            }
        }
        self.stats.composites += 1;
    }

    fn pass_through(&mut self) {
        self.presented.copy_from_slice(&self.input);
        self.stats.pass_throughs += 1;
    }
}

#[cfg(test)]
mod tests {
    use bytemuck::Zeroable;

    use super::*;

    type CoordKernel = fn(&KernelInput<'_>, u32, u32) -> [f32; 4];

    fn coords(_: &KernelInput<'_>, x: u32, y: u32) -> [f32; 4] {
        [x as f32, y as f32, 0.0, 1.0]
    }

    #[test]
    fn test_dispatch_writes_only_covered_tiles() {
        let mut device = SoftwareDevice::new(coords as CoordKernel);
        let extent = Extent::new(40, 20);
        device.allocate_targets(extent);
        device.output_mut().fill([-1.0; 4]);

        let uniforms = FrameUniforms::zeroed();
        device.dispatch_trace(&uniforms, DispatchGrid::for_extent(extent));

        // 2x1 tiles cover x < 32, y < 16.
        assert_eq!(device.stats().invocations, 32 * 16);
        assert_eq!(device.output()[(15 * 40 + 31) as usize], [31.0, 15.0, 0.0, 1.0]);
        assert_eq!(device.output()[(15 * 40 + 32) as usize], [-1.0; 4]);
        assert_eq!(device.output()[(16 * 40) as usize], [-1.0; 4]);
    }

    #[test]
    fn test_composite_commit_flag() {
        let mut device = SoftwareDevice::new(coords as CoordKernel);
        let extent = Extent::new(2, 2);
        device.allocate_targets(extent);
        device.output_mut().fill([1.0, 1.0, 1.0, 1.0]);

        let preview = CompositeParams {
            weight: 0.5,
            commit: 0,
            width: 2,
            height: 2,
        };
        device.composite(&preview);
        assert!(device.presented().iter().all(|p| *p == [0.5, 0.5, 0.5, 0.5]));
        assert!(device.accumulation().iter().all(|p| *p == [0.0; 4]));

        let active = CompositeParams { commit: 1, ..preview };
        device.composite(&active);
        assert!(device.accumulation().iter().all(|p| *p == [0.5, 0.5, 0.5, 0.5]));
    }

    #[test]
    fn test_pass_through_shows_environment() {
        let mut device = SoftwareDevice::new(coords as CoordKernel);
        device.bind_environment(&EnvironmentImage::solid([0.2, 0.4, 0.6, 1.0]));
        device.allocate_targets(Extent::new(3, 3));
        device.pass_through();
        assert!(device.presented().iter().all(|p| *p == [0.2, 0.4, 0.6, 1.0]));
        assert_eq!(device.stats().pass_throughs, 1);
    }

    #[test]
    fn test_release_clears_targets() {
        let mut device = SoftwareDevice::new(coords as CoordKernel);
        device.allocate_targets(Extent::new(4, 4));
        device.upload_scene(&[GpuSphere::zeroed()]);
        device.release_scene();
        device.release_targets();
        assert!(device.extent().is_none());
        assert!(device.scene().is_none());
        assert!(device.presented().is_empty());
        let stats = device.stats();
        assert_eq!((stats.allocations, stats.target_releases), (1, 1));
        assert_eq!((stats.scene_uploads, stats.scene_releases), (1, 1));
    }
}

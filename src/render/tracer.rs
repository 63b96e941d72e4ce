// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use super::accumulator::Accumulator;
use super::collector::PrimitiveCollector;
use super::compositor::AccumulationCompositor;
use super::device::{Extent, RenderDevice};
use super::dispatch::{DispatchCoordinator, DispatchGrid};
use super::invalidation::FrameInvalidationTracker;
use super::lifecycle::ResourceLifecycleManager;
use super::settings::{RunMode, TracerSettings};
use crate::camera::Camera;
use crate::io::environment::EnvironmentImage;
use crate::scene::sphere::SceneQuery;

/// What happened during one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameReport {
    /// Something was presented this frame.
    pub presented: bool,
    /// The kernel ran; false for pass-through frames.
    pub traced: bool,
    /// Output images were (re)allocated before this frame.
    pub reallocated: bool,
    /// Sample index the frame was traced and blended with.
    pub sample_index: u32,
    pub sphere_count: usize,
    pub grid: Option<DispatchGrid>,
    pub weight: Option<f32>,
}

/// Progressive accumulation controller.
///
/// Driven by an external scheduler through `on_enable`, `on_update`,
/// `on_render` (or `on_each_tick` for both) and `on_disable`. Owns the device so
/// every resource it allocated is released on disable or drop.
pub struct ProgressiveTracer<D: RenderDevice> {
    device: D,
    settings: TracerSettings,
    accumulator: Accumulator,
    tracker: FrameInvalidationTracker,
    collector: PrimitiveCollector,
    lifecycle: ResourceLifecycleManager,
    enabled: bool,
}

impl<D: RenderDevice> ProgressiveTracer<D> {
    pub fn new(device: D, settings: TracerSettings) -> Self {
        Self {
            device,
            settings,
            accumulator: Accumulator::default(),
            tracker: FrameInvalidationTracker::default(),
            collector: PrimitiveCollector::default(),
            lifecycle: ResourceLifecycleManager::default(),
            enabled: false,
        }
    }

    pub fn on_enable(&mut self, environment: &EnvironmentImage) {
        self.device.bind_environment(environment);
        self.tracker.clear();
        self.collector.clear();
        self.accumulator.reset();
        self.enabled = true;
    }

    /// Swap the background. Progressive state restarts since every sample saw the old one.
    pub fn set_environment(&mut self, environment: &EnvironmentImage) {
        self.device.bind_environment(environment);
        self.accumulator.reset();
    }

    /// Update tick: reset accumulation if the camera moved since the last tick.
    pub fn on_update(&mut self, camera: &Camera) -> bool {
        let changed = self.tracker.observe(camera.transform(), &mut self.accumulator);
        if changed {
            log::debug!("camera moved, restarting accumulation");
        }
        changed
    }

    /// Render tick: trace, blend and present one frame at `extent`.
    pub fn on_render(
        &mut self,
        camera: &Camera,
        scene: &dyn SceneQuery,
        extent: Extent,
        mode: RunMode,
    ) -> FrameReport {
        let mut report = FrameReport::default();
        if !self.enabled {
            log::debug!("render tick while disabled, ignoring");
            return report;
        }
        if extent.is_empty() {
            return report;
        }

        if self.lifecycle.ensure_targets(&mut self.device, extent) {
            // The new images start zeroed, so the next blend must take full weight.
            self.accumulator.reset();
            report.reallocated = true;
        }
        report.presented = true;

        if !self.settings.traces(mode) {
            self.device.pass_through();
            report.sample_index = self.accumulator.sample_index();
            return report;
        }

        if self.collector.collect(scene) {
            log::debug!(
                "scene changed ({} spheres), restarting accumulation",
                self.collector.buffer().len()
            );
            self.accumulator.reset();
        }
        self.lifecycle
            .upload_scene(&mut self.device, self.collector.buffer());

        let sample_index = self.accumulator.sample_index();
        let sphere_count = self.collector.buffer().len();
        let uniforms = DispatchCoordinator::frame_uniforms(
            camera,
            extent,
            &self.settings,
            sample_index,
            sphere_count as u32,
        );
        let grid = DispatchCoordinator::dispatch(&mut self.device, &uniforms);
        let params =
            AccumulationCompositor::composite(&mut self.device, sample_index, mode, extent);
        self.accumulator.advance(mode);

        report.traced = true;
        report.sample_index = sample_index;
        report.sphere_count = sphere_count;
        report.grid = Some(grid);
        report.weight = Some(params.weight);
        report
    }

    pub fn on_each_tick(
        &mut self,
        camera: &Camera,
        scene: &dyn SceneQuery,
        extent: Extent,
        mode: RunMode,
    ) -> FrameReport {
        self.on_update(camera);
        self.on_render(camera, scene, extent, mode)
    }

    /// Release all device resources. Safe to call repeatedly; also runs on drop.
    pub fn on_disable(&mut self) {
        if self.lifecycle.is_resident() {
            log::info!("Releasing tracer resources");
        }
        self.lifecycle.release_all(&mut self.device);
        self.enabled = false;
    }

    pub fn settings(&self) -> &TracerSettings {
        &self.settings
    }

    /// Apply new settings; changed limits restart accumulation.
    pub fn set_settings(&mut self, settings: TracerSettings) {
        if settings.max_bounces() != self.settings.max_bounces()
            || settings.rays_per_pixel() != self.settings.rays_per_pixel()
        {
            self.accumulator.reset();
        }
        self.settings = settings;
    }

    /// Drop accumulated history; the next committed frame starts from scratch.
    pub fn restart(&mut self) {
        self.accumulator.reset();
    }

    pub fn sample_index(&self) -> u32 {
        self.accumulator.sample_index()
    }

    pub fn render_elapsed_secs(&self) -> f32 {
        self.accumulator.render_start.elapsed().as_secs_f32()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

impl<D: RenderDevice> Drop for ProgressiveTracer<D> {
    fn drop(&mut self) {
        self.on_disable();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec3;

    use super::*;
    use crate::render::compositor::CompositeParams;
    use crate::render::dispatch::FrameUniforms;
    use crate::render::kernel::{KernelInput, ReferenceKernel};
    use crate::render::software::SoftwareDevice;
    use crate::scene::material::Material;
    use crate::scene::sphere::{GpuSphere, SphereInstance};

    type ConstKernel = fn(&KernelInput<'_>, u32, u32) -> [f32; 4];

    fn constant(_: &KernelInput<'_>, _: u32, _: u32) -> [f32; 4] {
        [0.25, 0.5, 0.75, 1.0]
    }

    /// Returns the sample index so every frame differs.
    fn by_sample(input: &KernelInput<'_>, _: u32, _: u32) -> [f32; 4] {
        [input.uniforms.sample_index as f32; 4]
    }

    fn tracer<K: crate::render::kernel::Kernel>(
        kernel: K,
        settings: TracerSettings,
    ) -> ProgressiveTracer<SoftwareDevice<K>> {
        let mut tracer = ProgressiveTracer::new(SoftwareDevice::new(kernel), settings);
        tracer.on_enable(&EnvironmentImage::default());
        tracer
    }

    fn scene(count: usize) -> Vec<SphereInstance> {
        (0..count)
            .map(|i| SphereInstance {
                position: Vec3::new(i as f32 * 3.0, 0.0, 0.0),
                scale: Vec3::ONE,
                material: Material::default(),
            })
            .collect()
    }

    const SMALL: Extent = Extent::new(32, 32);

    #[test]
    fn test_invalidation_resets_next_frame() {
        let mut t = tracer(constant as ConstKernel, TracerSettings::default());
        let mut camera = Camera::default();
        let spheres = scene(2);

        for expected in 0..5 {
            let report = t.on_each_tick(&camera, &spheres, SMALL, RunMode::Active);
            assert_eq!(report.sample_index, expected);
        }

        camera.position.x += 1.0;
        let report = t.on_each_tick(&camera, &spheres, SMALL, RunMode::Active);
        assert_eq!(report.sample_index, 0);
        assert_eq!(report.weight, Some(1.0));

        let report = t.on_each_tick(&camera, &spheres, SMALL, RunMode::Active);
        assert_eq!(report.sample_index, 1);
    }

    #[test]
    fn test_constant_frames_converge_exactly() {
        let mut t = tracer(constant as ConstKernel, TracerSettings::default());
        let camera = Camera::default();
        for _ in 0..20 {
            t.on_each_tick(&camera, &scene(1), SMALL, RunMode::Active);
            assert!(t.device().presented().iter().all(|p| *p == [0.25, 0.5, 0.75, 1.0]));
            assert!(t.device().accumulation().iter().all(|p| *p == [0.25, 0.5, 0.75, 1.0]));
        }
        assert_eq!(t.sample_index(), 20);
    }

    #[test]
    fn test_accumulation_is_running_mean() {
        let mut t = tracer(by_sample as ConstKernel, TracerSettings::default());
        let camera = Camera::default();
        for _ in 0..4 {
            t.on_each_tick(&camera, &scene(1), SMALL, RunMode::Active);
        }
        // mean(0, 1, 2, 3)
        assert!(t.device().accumulation().iter().all(|p| (p[0] - 1.5).abs() < 1e-6));
    }

    #[test]
    fn test_scene_buffer_sizing() {
        let mut t = tracer(constant as ConstKernel, TracerSettings::default());
        let camera = Camera::default();
        for count in [3usize, 0, 5, 5, 1] {
            let report = t.on_each_tick(&camera, &scene(count), SMALL, RunMode::Active);
            assert_eq!(report.sphere_count, count);
            assert_eq!(t.device().scene().map(<[GpuSphere]>::len), Some(count));
        }
        assert_eq!(t.device().stats().scene_uploads, 5);
    }

    #[test]
    fn test_scene_change_restarts_accumulation() {
        let mut t = tracer(constant as ConstKernel, TracerSettings::default());
        let camera = Camera::default();
        t.on_each_tick(&camera, &scene(2), SMALL, RunMode::Active);
        t.on_each_tick(&camera, &scene(2), SMALL, RunMode::Active);
        let report = t.on_each_tick(&camera, &scene(3), SMALL, RunMode::Active);
        assert_eq!(report.sample_index, 0);
    }

    #[test]
    fn test_resize_reallocates_once() {
        let mut t = tracer(by_sample as ConstKernel, TracerSettings::default());
        let camera = Camera::default();
        let spheres = scene(1);

        let first = t.on_each_tick(&camera, &spheres, SMALL, RunMode::Active);
        assert!(first.reallocated);
        t.on_each_tick(&camera, &spheres, SMALL, RunMode::Active);
        t.on_each_tick(&camera, &spheres, SMALL, RunMode::Active);
        assert_eq!(t.device().stats().allocations, 1);

        let bigger = Extent::new(48, 40);
        let resized = t.on_each_tick(&camera, &spheres, bigger, RunMode::Active);
        assert!(resized.reallocated);
        assert_eq!(resized.sample_index, 0);
        assert_eq!(t.device().stats().allocations, 2);
        assert_eq!(t.device().stats().target_releases, 1);
        assert_eq!(t.device().extent(), Some(bigger));
        assert_eq!(t.device().accumulation().len(), 48 * 40);

        let again = t.on_each_tick(&camera, &spheres, bigger, RunMode::Active);
        assert!(!again.reallocated);
        assert_eq!(t.device().stats().allocations, 2);
    }

    #[test]
    fn test_preview_freezes_and_repeats() {
        let settings = TracerSettings::new(true, 4, 1);
        let mut t = tracer(ReferenceKernel, settings);
        let camera = Camera::default();
        let spheres = scene(3);

        for _ in 0..3 {
            t.on_each_tick(&camera, &spheres, SMALL, RunMode::Active);
        }
        let accumulated = t.device().accumulation().to_vec();

        let a = t.on_each_tick(&camera, &spheres, SMALL, RunMode::Preview);
        let first: Vec<[u32; 4]> = t
            .device()
            .presented()
            .iter()
            .map(|p| p.map(f32::to_bits))
            .collect();
        let b = t.on_each_tick(&camera, &spheres, SMALL, RunMode::Preview);
        let second: Vec<[u32; 4]> = t
            .device()
            .presented()
            .iter()
            .map(|p| p.map(f32::to_bits))
            .collect();

        assert_eq!(a.sample_index, 3);
        assert_eq!(b.sample_index, 3);
        assert_eq!(t.sample_index(), 3);
        assert_eq!(first, second);
        assert_eq!(t.device().accumulation(), accumulated.as_slice());
    }

    #[test]
    fn test_tile_remainder_untouched() {
        let extent = Extent::new(1000, 700);
        let mut t = tracer(constant as ConstKernel, TracerSettings::default());
        let camera = Camera::default();
        let spheres = scene(0);

        t.on_each_tick(&camera, &spheres, extent, RunMode::Active);
        let sentinel = [7.0, 7.0, 7.0, 7.0];
        for y in 0..extent.height {
            for x in 992..extent.width {
                t.device_mut().output_mut()[(y * extent.width + x) as usize] = sentinel;
            }
        }
        for x in 0..extent.width {
            for y in 688..extent.height {
                t.device_mut().output_mut()[(y * extent.width + x) as usize] = sentinel;
            }
        }

        let report = t.on_each_tick(&camera, &spheres, extent, RunMode::Active);
        let grid = report.grid.unwrap();
        assert_eq!(grid.tile_count(), (1000 / 16) * (700 / 16));
        assert_eq!(t.device().stats().invocations, 2 * 992 * 688);

        let output = t.device().output();
        for y in 0..extent.height {
            for x in 0..extent.width {
                let px = output[(y * extent.width + x) as usize];
                if x < 992 && y < 688 {
                    assert_eq!(px, [0.25, 0.5, 0.75, 1.0]);
                } else {
                    assert_eq!(px, sentinel);
                }
            }
        }
    }

    #[test]
    fn test_pass_through_when_disabled_in_preview() {
        let mut t = tracer(constant as ConstKernel, TracerSettings::default());
        let camera = Camera::default();
        t.on_each_tick(&camera, &scene(1), SMALL, RunMode::Preview);
        t.device_mut().input_mut().fill([0.1, 0.2, 0.3, 1.0]);

        let report = t.on_each_tick(&camera, &scene(1), SMALL, RunMode::Preview);
        assert!(report.presented);
        assert!(!report.traced);
        assert!(t.device().presented().iter().all(|p| *p == [0.1, 0.2, 0.3, 1.0]));
        assert_eq!(t.device().stats().dispatches, 0);
    }

    #[test]
    fn test_settings_change_restarts() {
        let mut t = tracer(constant as ConstKernel, TracerSettings::default());
        let camera = Camera::default();
        t.on_each_tick(&camera, &scene(1), SMALL, RunMode::Active);
        t.on_each_tick(&camera, &scene(1), SMALL, RunMode::Active);
        assert_eq!(t.sample_index(), 2);

        let mut settings = *t.settings();
        settings.enable_shader = true;
        t.set_settings(settings);
        assert_eq!(t.sample_index(), 2);

        settings.set_max_bounces(12);
        t.set_settings(settings);
        assert_eq!(t.sample_index(), 0);
    }

    #[test]
    fn test_tiny_output_skips_dispatch() {
        let mut t = tracer(constant as ConstKernel, TracerSettings::default());
        let report = t.on_each_tick(&Camera::default(), &scene(1), Extent::new(8, 8), RunMode::Active);
        assert!(report.grid.unwrap().is_empty());
        assert_eq!(t.device().stats().dispatches, 0);
        assert_eq!(t.device().stats().composites, 1);
    }

    #[test]
    fn test_disabled_and_empty_extent_present_nothing() {
        let mut t = ProgressiveTracer::new(
            SoftwareDevice::new(constant as ConstKernel),
            TracerSettings::default(),
        );
        let camera = Camera::default();
        assert!(!t.on_each_tick(&camera, &scene(1), SMALL, RunMode::Active).presented);

        t.on_enable(&EnvironmentImage::default());
        assert!(!t.on_each_tick(&camera, &scene(1), Extent::new(0, 10), RunMode::Active).presented);
        assert_eq!(t.device().stats().allocations, 0);
    }

    /// Records the order of device calls into a shared log that outlives the tracer.
    struct RecordingDevice {
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl RenderDevice for RecordingDevice {
        fn allocate_targets(&mut self, _: Extent) {
            self.log.borrow_mut().push("allocate");
        }
        fn release_targets(&mut self) {
            self.log.borrow_mut().push("release_targets");
        }
        fn upload_scene(&mut self, _: &[GpuSphere]) {
            self.log.borrow_mut().push("upload");
        }
        fn release_scene(&mut self) {
            self.log.borrow_mut().push("release_scene");
        }
        fn bind_environment(&mut self, _: &EnvironmentImage) {
            self.log.borrow_mut().push("environment");
        }
        fn dispatch_trace(&mut self, _: &FrameUniforms, _: DispatchGrid) {
            self.log.borrow_mut().push("dispatch");
        }
        fn composite(&mut self, _: &CompositeParams) {
            self.log.borrow_mut().push("composite");
        }
        fn pass_through(&mut self) {
            self.log.borrow_mut().push("pass_through");
        }
    }

    #[test]
    fn test_frame_order_and_release_on_drop() {
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let device = RecordingDevice { log: log.clone() };
            let mut t = ProgressiveTracer::new(device, TracerSettings::default());
            t.on_enable(&EnvironmentImage::default());
            t.on_each_tick(&Camera::default(), &scene(1), SMALL, RunMode::Active);
        }
        assert_eq!(
            *log.borrow(),
            [
                "environment",
                "allocate",
                "upload",
                "dispatch",
                "composite",
                "release_scene",
                "release_targets",
            ]
        );
    }

    #[test]
    fn test_disable_releases_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let device = RecordingDevice { log: log.clone() };
        let mut t = ProgressiveTracer::new(device, TracerSettings::default());
        t.on_enable(&EnvironmentImage::default());
        t.on_each_tick(&Camera::default(), &scene(0), SMALL, RunMode::Active);
        t.on_disable();
        t.on_disable();
        drop(t);

        let releases = log
            .borrow()
            .iter()
            .filter(|e| e.starts_with("release"))
            .count();
        assert_eq!(releases, 2);
    }
}

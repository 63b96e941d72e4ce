// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::Path;
use std::time::Instant;

use anyhow::Result;

use crate::camera::Camera;
use crate::cli::Options;
use crate::io::environment::EnvironmentImage;
use crate::io::screenshot::{encode_srgb8, save_screenshot};
use crate::render::kernel::ReferenceKernel;
use crate::render::software::SoftwareDevice;
use crate::render::tracer::ProgressiveTracer;
use crate::scene::loader::load_scene;
use crate::scene::scene::Scene;

/// Render `options.frames` frames on the CPU and save the presented image.
pub fn run(options: &Options, out: &Path) -> Result<()> {
    let scene = match &options.scene {
        Some(path) => load_scene(Path::new(path))?,
        None => {
            log::warn!("No scene given, rendering an empty scene");
            Scene::empty()
        }
    };
    let pixels = render(&scene, options)?;
    let bytes = encode_srgb8(&pixels);
    save_screenshot(&bytes, options.size.width, options.size.height, out)
}

pub fn render(scene: &Scene, options: &Options) -> Result<Vec<[f32; 4]>> {
    let camera = Camera::from_config(&scene.camera);
    let environment = EnvironmentImage::load_or_default(scene.environment.as_deref());

    let mut tracer = ProgressiveTracer::new(SoftwareDevice::new(ReferenceKernel), scene.settings);
    tracer.on_enable(&environment);

    let start = Instant::now();
    for frame in 0..options.frames {
        let report = tracer.on_each_tick(&camera, scene, options.size, options.mode);
        log::debug!(
            "frame {frame}: sample {} traced={} spheres={}",
            report.sample_index,
            report.traced,
            report.sphere_count
        );
    }
    let stats = tracer.device().stats();
    log::info!(
        "Rendered {} frames at {}x{} in {:.2}s ({} kernel invocations)",
        options.frames,
        options.size.width,
        options.size.height,
        start.elapsed().as_secs_f32(),
        stats.invocations
    );

    let presented = tracer.device().presented().to_vec();
    tracer.on_disable();
    if presented.is_empty() {
        anyhow::bail!("headless render presented no frame");
    }
    Ok(presented)
}

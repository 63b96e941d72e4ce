// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::f32::consts::PI;
use std::path::Path;

use glam::Vec3;

use crate::constants::DEFAULT_ENVIRONMENT_COLOR;
use crate::error::TracerError;

/// Linear RGBA32F equirectangular background, bound read-only to the kernel.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[f32; 4]>,
}

impl EnvironmentImage {
    pub fn load(path: &Path) -> Result<Self, TracerError> {
        let img = image::open(path).map_err(|source| TracerError::EnvironmentDecode {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = img.to_rgba32f();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(TracerError::EmptyEnvironment {
                path: path.to_path_buf(),
            });
        }
        let pixels = rgba
            .pixels()
            .map(|p| [p.0[0], p.0[1], p.0[2], p.0[3]])
            .collect();
        log::info!("Loaded environment {} ({width}x{height})", path.display());
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Load `path` if given, otherwise (or on failure) use a flat sky color.
    pub fn load_or_default(path: Option<&str>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::load(Path::new(path)) {
            Ok(env) => env,
            Err(e) => {
                log::warn!("{e}, using flat environment");
                Self::default()
            }
        }
    }

    pub fn solid(color: [f32; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![color],
        }
    }

    /// Nearest-texel equirectangular lookup; must agree with `sample_environment` in WGSL.
    pub fn sample(&self, dir: Vec3) -> [f32; 4] {
        let dir = dir.normalize_or_zero();
        let u = 0.5 + dir.x.atan2(dir.z) / (2.0 * PI);
        let v = 0.5 - dir.y.clamp(-1.0, 1.0).asin() / PI;
        let x = ((u * self.width as f32) as u32).min(self.width - 1);
        let y = ((v * self.height as f32) as u32).min(self.height - 1);
        self.pixels[(y * self.width + x) as usize]
    }

    /// The whole image resized to `width`x`height` with nearest sampling.
    pub fn stretched(&self, width: u32, height: u32) -> Vec<[f32; 4]> {
        let mut out = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            let sy = (y as u64 * self.height as u64 / height as u64) as u32;
            for x in 0..width {
                let sx = (x as u64 * self.width as u64 / width as u64) as u32;
                out.push(self.pixels[(sy * self.width + sx) as usize]);
            }
        }
        out
    }
}

impl Default for EnvironmentImage {
    fn default() -> Self {
        Self::solid(DEFAULT_ENVIRONMENT_COLOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_sample() {
        let env = EnvironmentImage::solid([0.25, 0.5, 1.0, 1.0]);
        assert_eq!(env.sample(Vec3::Y), [0.25, 0.5, 1.0, 1.0]);
        assert_eq!(env.sample(-Vec3::Z), [0.25, 0.5, 1.0, 1.0]);
    }

    #[test]
    fn test_up_and_down_rows() {
        let env = EnvironmentImage {
            width: 1,
            height: 2,
            pixels: vec![[1.0, 0.0, 0.0, 1.0], [0.0, 0.0, 1.0, 1.0]],
        };
        assert_eq!(env.sample(Vec3::new(0.0, 1.0, 0.1)), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(env.sample(Vec3::new(0.0, -1.0, 0.1)), [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_stretched_nearest() {
        let env = EnvironmentImage {
            width: 2,
            height: 1,
            pixels: vec![[1.0, 0.0, 0.0, 1.0], [0.0, 1.0, 0.0, 1.0]],
        };
        let out = env.stretched(4, 2);
        assert_eq!(out.len(), 8);
        assert_eq!(out[0], [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(out[1], [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(out[2], [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(out[7], [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_missing_file_falls_back() {
        let env = EnvironmentImage::load_or_default(Some("no/such/sky.hdr"));
        assert_eq!(env, EnvironmentImage::default());
    }
}

// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Bumped whenever the field order or size of [`GpuMaterial`] changes.
/// The WGSL `Material` struct in `common/scene.wgsl` carries the same number.
pub const MATERIAL_LAYOUT_VERSION: u32 = 1;

/// Surface appearance of a traced sphere, as authored in the scene file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Material {
    #[serde(
        default = "default_base_color",
        skip_serializing_if = "is_default_base_color"
    )]
    pub base_color: [f32; 4],

    #[serde(default, skip_serializing_if = "is_zero_vec4")]
    pub emission_color: [f32; 4],

    #[serde(default, skip_serializing_if = "is_zero_f32")]
    pub emission_strength: f32,

    #[serde(default = "default_albedo", skip_serializing_if = "is_default_albedo")]
    pub albedo: f32,
}

fn default_base_color() -> [f32; 4] {
    [0.8, 0.8, 0.8, 1.0]
}

fn default_albedo() -> f32 {
    1.0
}

fn is_zero_f32(v: &f32) -> bool {
    *v == 0.0
}

fn is_zero_vec4(v: &[f32; 4]) -> bool {
    v.iter().all(|c| *c == 0.0)
}

fn is_default_base_color(v: &[f32; 4]) -> bool {
    *v == default_base_color()
}

fn is_default_albedo(v: &f32) -> bool {
    *v == default_albedo()
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: default_base_color(),
            emission_color: [0.0; 4],
            emission_strength: 0.0,
            albedo: default_albedo(),
        }
    }
}

impl Material {
    pub fn is_emissive(&self) -> bool {
        self.emission_strength > 0.0 && self.emission_color[..3].iter().any(|c| *c > 0.0)
    }
}

/// GPU-compatible material. Must match the WGSL `Material` struct layout:
///
/// | offset | field               |
/// |--------|---------------------|
/// | 0      | `base_color`        |
/// | 16     | `emission_color`    |
/// | 32     | `emission_strength` |
/// | 36     | `albedo`            |
/// | 40     | padding (8 bytes)   |
///
/// WGSL rounds struct sizes up to their 16-byte alignment, so the padding is explicit.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuMaterial {
    pub base_color: [f32; 4],
    pub emission_color: [f32; 4],
    pub emission_strength: f32,
    pub albedo: f32,
    pub _pad: [f32; 2],
}

impl GpuMaterial {
    pub const SIZE: usize = 48;
}

impl From<&Material> for GpuMaterial {
    fn from(mat: &Material) -> Self {
        Self {
            base_color: mat.base_color,
            emission_color: mat.emission_color,
            emission_strength: mat.emission_strength,
            albedo: mat.albedo.clamp(0.0, 1.0),
            _pad: [0.0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use std::mem::{align_of, offset_of, size_of};

    use super::*;

    #[test]
    fn test_gpu_layout() {
        assert_eq!(MATERIAL_LAYOUT_VERSION, 1);
        assert_eq!(size_of::<GpuMaterial>(), GpuMaterial::SIZE);
        assert_eq!(align_of::<GpuMaterial>(), 4);
        assert_eq!(offset_of!(GpuMaterial, base_color), 0);
        assert_eq!(offset_of!(GpuMaterial, emission_color), 16);
        assert_eq!(offset_of!(GpuMaterial, emission_strength), 32);
        assert_eq!(offset_of!(GpuMaterial, albedo), 36);
    }

    #[test]
    fn test_bytes_follow_field_order() {
        let mat = Material {
            base_color: [0.1, 0.2, 0.3, 0.4],
            emission_color: [1.0, 0.5, 0.25, 1.0],
            emission_strength: 3.0,
            albedo: 0.75,
        };
        let gpu = GpuMaterial::from(&mat);
        let floats: &[f32] = bytemuck::cast_slice(bytemuck::bytes_of(&gpu));
        assert_eq!(
            floats,
            &[0.1, 0.2, 0.3, 0.4, 1.0, 0.5, 0.25, 1.0, 3.0, 0.75, 0.0, 0.0]
        );
    }

    #[test]
    fn test_albedo_clamped() {
        let mat = Material {
            albedo: 1.7,
            ..Default::default()
        };
        assert_eq!(GpuMaterial::from(&mat).albedo, 1.0);

        let mat = Material {
            albedo: -0.2,
            ..Default::default()
        };
        assert_eq!(GpuMaterial::from(&mat).albedo, 0.0);
    }

    #[test]
    fn test_serde_defaults() {
        let mat: Material = serde_json::from_str(r#"{ "emission_strength": 2.0 }"#).unwrap();
        assert_eq!(mat.base_color, [0.8, 0.8, 0.8, 1.0]);
        assert_eq!(mat.albedo, 1.0);
        assert_eq!(mat.emission_strength, 2.0);
        assert!(!mat.is_emissive());
    }
}

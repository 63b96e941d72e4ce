// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::material::{GpuMaterial, Material};
use crate::constants::RAY_TRACED_SPHERE_TAG;

/// A sphere object as it appears in the scene file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SphereObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default = "default_tag")]
    pub tag: String,

    #[serde(default)]
    pub position: [f32; 3],

    /// Object scale. The sphere diameter is taken from the x component.
    #[serde(default = "default_scale", deserialize_with = "deserialize_scale")]
    pub scale: [f32; 3],

    #[serde(default)]
    pub material: Material,
}

fn default_tag() -> String {
    RAY_TRACED_SPHERE_TAG.to_string()
}

fn default_scale() -> [f32; 3] {
    [1.0; 3]
}

/// Accepts either a uniform scalar (`scale: 2.0`) or a per-axis triple.
fn deserialize_scale<'de, D>(deserializer: D) -> Result<[f32; 3], D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scale {
        Uniform(f32),
        PerAxis([f32; 3]),
    }

    Ok(match Scale::deserialize(deserializer)? {
        Scale::Uniform(s) => [s; 3],
        Scale::PerAxis(v) => v,
    })
}

impl Default for SphereObject {
    fn default() -> Self {
        Self {
            name: None,
            tag: default_tag(),
            position: [0.0; 3],
            scale: default_scale(),
            material: Material::default(),
        }
    }
}

impl SphereObject {
    pub fn is_ray_traced(&self) -> bool {
        self.tag == RAY_TRACED_SPHERE_TAG
    }
}

/// Snapshot of one ray-traceable sphere handed to the collector by a [`SceneQuery`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereInstance {
    pub position: Vec3,
    pub scale: Vec3,
    pub material: Material,
}

impl From<&SphereObject> for SphereInstance {
    fn from(obj: &SphereObject) -> Self {
        Self {
            position: Vec3::from(obj.position),
            scale: Vec3::from(obj.scale),
            material: obj.material,
        }
    }
}

/// Source of the spheres traced each frame.
pub trait SceneQuery {
    /// All spheres currently tagged as ray-traceable, in a stable order.
    fn sphere_instances(&self) -> Vec<SphereInstance>;
}

impl SceneQuery for Vec<SphereInstance> {
    fn sphere_instances(&self) -> Vec<SphereInstance> {
        self.clone()
    }
}

/// Must match the WGSL `Sphere` struct layout exactly (64 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuSphere {
    pub position: [f32; 3],
    pub radius: f32,
    pub material: GpuMaterial,
}

impl GpuSphere {
    pub const SIZE: usize = 64;
}

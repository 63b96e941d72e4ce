// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::scene::material::GpuMaterial;
use crate::scene::sphere::{GpuSphere, SceneQuery, SphereInstance};

/// Packed spheres for one frame. Rebuilt from scratch every frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneBuffer {
    spheres: Vec<GpuSphere>,
}

impl SceneBuffer {
    pub fn as_slice(&self) -> &[GpuSphere] {
        &self.spheres
    }

    pub fn len(&self) -> usize {
        self.spheres.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.spheres.as_slice())
    }
}

/// Radius is half the x scale; non-uniform scale is not supported.
pub fn pack_sphere(instance: &SphereInstance) -> GpuSphere {
    GpuSphere {
        position: instance.position.into(),
        radius: instance.scale.x * 0.5,
        material: GpuMaterial::from(&instance.material),
    }
}

/// Gathers ray-traced spheres into a [`SceneBuffer`] each frame.
#[derive(Debug, Default)]
pub struct PrimitiveCollector {
    buffer: SceneBuffer,
    collected: bool,
}

impl PrimitiveCollector {
    /// Snapshot `scene` into a fresh buffer. Returns true when the packed bytes
    /// differ from the previous frame's (always true for the first collection).
    pub fn collect(&mut self, scene: &dyn SceneQuery) -> bool {
        let spheres: Vec<GpuSphere> = scene.sphere_instances().iter().map(pack_sphere).collect();
        let next = SceneBuffer { spheres };
        let changed = !self.collected || next.as_bytes() != self.buffer.as_bytes();
        self.buffer = next;
        self.collected = true;
        changed
    }

    pub fn buffer(&self) -> &SceneBuffer {
        &self.buffer
    }

    /// Drop the snapshot so the next collection counts as a change.
    pub fn clear(&mut self) {
        self.buffer = SceneBuffer::default();
        self.collected = false;
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::scene::material::Material;

    fn sphere(x: f32, scale: f32) -> SphereInstance {
        SphereInstance {
            position: Vec3::new(x, 0.0, 0.0),
            scale: Vec3::splat(scale),
            material: Material::default(),
        }
    }

    #[test]
    fn test_buffer_matches_count() {
        let mut collector = PrimitiveCollector::default();
        for count in [0usize, 1, 7, 3, 0] {
            let scene: Vec<SphereInstance> = (0..count).map(|i| sphere(i as f32, 1.0)).collect();
            collector.collect(&scene);
            assert_eq!(collector.buffer().len(), count);
            assert_eq!(collector.buffer().as_bytes().len(), count * GpuSphere::SIZE);
        }
    }

    #[test]
    fn test_empty_scene() {
        let mut collector = PrimitiveCollector::default();
        assert!(collector.collect(&Vec::<SphereInstance>::new()));
        assert!(collector.buffer().is_empty());
        assert!(!collector.collect(&Vec::<SphereInstance>::new()));
    }

    #[test]
    fn test_pack_radius_and_material() {
        let mut instance = sphere(2.0, 3.0);
        instance.scale = Vec3::new(3.0, 10.0, 1.0);
        instance.material.emission_strength = 4.0;

        let packed = pack_sphere(&instance);
        assert_eq!(packed.position, [2.0, 0.0, 0.0]);
        assert_eq!(packed.radius, 1.5);
        assert_eq!(packed.material.emission_strength, 4.0);
    }

    #[test]
    fn test_change_detection() {
        let mut collector = PrimitiveCollector::default();
        let mut scene = vec![sphere(0.0, 1.0)];
        assert!(collector.collect(&scene));
        assert!(!collector.collect(&scene));

        scene[0].position.y = 0.5;
        assert!(collector.collect(&scene));

        scene.push(sphere(5.0, 1.0));
        assert!(collector.collect(&scene));
        assert_eq!(collector.buffer().len(), 2);

        collector.clear();
        assert!(collector.collect(&scene));
    }
}

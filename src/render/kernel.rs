// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

//! CPU side of the tracing kernel contract.
//!
//! The GPU kernel lives in `shaders/wgsl/path_trace.wgsl`. [`ReferenceKernel`]
//! traces the same sphere scene on the CPU for headless renders and tests.

use std::f32::consts::PI;

use glam::{Mat4, Vec2, Vec3, Vec4};

use super::dispatch::FrameUniforms;
use crate::io::environment::EnvironmentImage;
use crate::scene::sphere::GpuSphere;

const HIT_EPSILON: f32 = 1e-4;

/// Everything a kernel invocation may read.
pub struct KernelInput<'a> {
    pub uniforms: &'a FrameUniforms,
    pub spheres: &'a [GpuSphere],
    pub environment: &'a EnvironmentImage,
}

/// One invocation per dispatched pixel, writing only that pixel's output.
pub trait Kernel {
    fn shade(&self, input: &KernelInput<'_>, x: u32, y: u32) -> [f32; 4];
}

impl<F> Kernel for F
where
    F: Fn(&KernelInput<'_>, u32, u32) -> [f32; 4],
{
    fn shade(&self, input: &KernelInput<'_>, x: u32, y: u32) -> [f32; 4] {
        self(input, x, y)
    }
}

/// PCG hash based generator; `pcg_hash` in `common/random.wgsl` is the same.
pub struct Rng {
    state: u32,
}

impl Rng {
    pub fn for_pixel(x: u32, y: u32, width: u32, sample_index: u32) -> Self {
        let pixel = y.wrapping_mul(width).wrapping_add(x);
        Self {
            state: pixel.wrapping_add(sample_index.wrapping_mul(719_393)),
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self
            .state
            .wrapping_mul(747_796_405)
            .wrapping_add(2_891_336_453);
        let word = ((self.state >> ((self.state >> 28) + 4)) ^ self.state).wrapping_mul(277_803_737);
        (word >> 22) ^ word
    }

    /// Uniform in [0, 1].
    pub fn next_f32(&mut self) -> f32 {
        self.next_u32() as f32 / u32::MAX as f32
    }

    fn next_normal(&mut self) -> f32 {
        let theta = 2.0 * PI * self.next_f32();
        let rho = (-2.0 * self.next_f32().max(f32::MIN_POSITIVE).ln()).sqrt();
        rho * theta.cos()
    }

    pub fn unit_vector(&mut self) -> Vec3 {
        Vec3::new(self.next_normal(), self.next_normal(), self.next_normal()).normalize_or(Vec3::Y)
    }
}

pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

pub struct Hit {
    pub distance: f32,
    pub point: Vec3,
    pub normal: Vec3,
    pub sphere: usize,
}

/// Primary ray through pixel `(x, y)` offset by `jitter` in pixel units.
pub fn camera_ray(uniforms: &FrameUniforms, x: u32, y: u32, jitter: Vec2) -> Ray {
    let camera_to_world = Mat4::from_cols_array_2d(&uniforms.camera_to_world);
    let inverse_projection = Mat4::from_cols_array_2d(&uniforms.inverse_projection);

    let size = Vec2::new(uniforms.width as f32, uniforms.height as f32);
    let pixel = Vec2::new(x as f32, y as f32) + Vec2::splat(0.5) + jitter;
    let ndc = Vec2::new(pixel.x / size.x * 2.0 - 1.0, 1.0 - pixel.y / size.y * 2.0);

    let view = inverse_projection * Vec4::new(ndc.x, ndc.y, 0.0, 1.0);
    let dir_view = (view.truncate() / view.w).normalize();

    Ray {
        origin: camera_to_world.transform_point3(Vec3::ZERO),
        dir: camera_to_world.transform_vector3(dir_view).normalize(),
    }
}

pub fn intersect_sphere(ray: &Ray, sphere: &GpuSphere) -> Option<f32> {
    let offset = ray.origin - Vec3::from(sphere.position);
    let b = offset.dot(ray.dir);
    let c = offset.length_squared() - sphere.radius * sphere.radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let root = disc.sqrt();
    [-b - root, -b + root].into_iter().find(|t| *t > HIT_EPSILON)
}

pub fn nearest_hit(ray: &Ray, spheres: &[GpuSphere]) -> Option<Hit> {
    let mut best: Option<(usize, f32)> = None;
    for (i, sphere) in spheres.iter().enumerate() {
        if let Some(t) = intersect_sphere(ray, sphere)
            && best.is_none_or(|(_, bt)| t < bt)
        {
            best = Some((i, t));
        }
    }
    best.map(|(sphere, distance)| {
        let point = ray.origin + ray.dir * distance;
        let normal = (point - Vec3::from(spheres[sphere].position)).normalize_or(Vec3::Y);
        Hit {
            distance,
            point,
            normal,
            sphere,
        }
    })
}

/// Diffuse path tracer over the packed spheres with environment lighting.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceKernel;

impl ReferenceKernel {
    fn trace(&self, input: &KernelInput<'_>, mut ray: Ray, rng: &mut Rng) -> Vec3 {
        let mut radiance = Vec3::ZERO;
        let mut throughput = Vec3::ONE;

        for _ in 0..=input.uniforms.max_bounces {
            let Some(hit) = nearest_hit(&ray, input.spheres) else {
                let env = input.environment.sample(ray.dir);
                radiance += throughput * Vec3::new(env[0], env[1], env[2]);
                break;
            };

            let mat = &input.spheres[hit.sphere].material;
            let emission = Vec4::from(mat.emission_color).truncate() * mat.emission_strength;
            radiance += throughput * emission;
            throughput *= Vec4::from(mat.base_color).truncate() * mat.albedo;
            if throughput == Vec3::ZERO {
                break;
            }

            // Cosine-weighted bounce around the surface normal.
            let dir = (hit.normal + rng.unit_vector()).normalize_or(hit.normal);
            ray = Ray {
                origin: hit.point + hit.normal * HIT_EPSILON,
                dir,
            };
        }

        radiance
    }
}

impl Kernel for ReferenceKernel {
    fn shade(&self, input: &KernelInput<'_>, x: u32, y: u32) -> [f32; 4] {
        let u = input.uniforms;
        let mut rng = Rng::for_pixel(x, y, u.width, u.sample_index);
        let rays = u.rays_per_pixel.max(1);

        let mut total = Vec3::ZERO;
        for _ in 0..rays {
            let jitter = Vec2::new(rng.next_f32() - 0.5, rng.next_f32() - 0.5);
            total += self.trace(input, camera_ray(u, x, y, jitter), &mut rng);
        }
        let color = total / rays as f32;
        [color.x, color.y, color.z, 1.0]
    }
}

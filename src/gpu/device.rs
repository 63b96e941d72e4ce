// Copyright (C) Pavlo Hrytsenko <pashagricenko@gmail.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::sync::Arc;

use anyhow::Result;
use bytemuck::Zeroable;

use super::buffers;
use super::pipeline::{
    buffer_entry, create_blit_pipeline, create_compute_pipeline, storage_texture_entry,
    texture_entry,
};
use crate::constants::{ACCUM_BYTES_PER_PIXEL, COMPOSITE_WORKGROUP_SIZE};
use crate::io::environment::EnvironmentImage;
use crate::io::screenshot::encode_srgb8;
use crate::render::compositor::CompositeParams;
use crate::render::device::{Extent, RenderDevice};
use crate::render::dispatch::{DispatchGrid, FrameUniforms};
use crate::scene::sphere::GpuSphere;
use crate::shaders::composer::ShaderComposer;

const OUTPUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
const PRESENT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Size-dependent images, recreated together on resize.
struct Targets {
    extent: Extent,
    output_texture: wgpu::Texture,
    accumulation_buffer: wgpu::Buffer,
    presented_texture: wgpu::Texture,
    source_texture: wgpu::Texture,
    trace_bind_group: wgpu::BindGroup,
    composite_bind_group: wgpu::BindGroup,
    blit_bind_group: wgpu::BindGroup,
}

impl Targets {
    fn destroy(self) {
        self.output_texture.destroy();
        self.accumulation_buffer.destroy();
        self.presented_texture.destroy();
        self.source_texture.destroy();
    }
}

struct SceneResources {
    sphere_buffer: wgpu::Buffer,
    capacity: usize,
    bind_group: wgpu::BindGroup,
}

/// wgpu implementation of [`RenderDevice`].
///
/// Every call records into one frame encoder; the host submits it with
/// [`WgpuDevice::take_commands`] after drawing the presented image.
pub struct WgpuDevice {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    trace_pipeline: wgpu::ComputePipeline,
    composite_pipeline: wgpu::ComputePipeline,
    blit_pipeline: wgpu::RenderPipeline,
    trace_bg_layout_0: wgpu::BindGroupLayout,
    trace_bg_layout_1: wgpu::BindGroupLayout,
    composite_bg_layout: wgpu::BindGroupLayout,
    blit_bg_layout: wgpu::BindGroupLayout,
    blit_sampler: wgpu::Sampler,
    frame_buffer: wgpu::Buffer,
    composite_params_buffer: wgpu::Buffer,
    environment: EnvironmentImage,
    environment_texture: wgpu::Texture,
    environment_view: wgpu::TextureView,
    scene: Option<SceneResources>,
    targets: Option<Targets>,
    encoder: Option<wgpu::CommandEncoder>,
}

impl WgpuDevice {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        surface_format: wgpu::TextureFormat,
        composer: &ShaderComposer,
    ) -> Result<Self> {
        let trace_source = composer.compose("path_trace")?;
        let composite_source = composer.compose("composite")?;
        let blit_source = composer.compose("blit")?;

        let trace_bg_layout_0 = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("trace bg0 layout"),
            entries: &[
                buffer_entry(0, wgpu::BufferBindingType::Uniform),
                storage_texture_entry(1, OUTPUT_FORMAT),
            ],
        });
        let trace_bg_layout_1 = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("trace bg1 layout"),
            entries: &[
                buffer_entry(0, wgpu::BufferBindingType::Storage { read_only: true }),
                texture_entry(1, wgpu::ShaderStages::COMPUTE),
            ],
        });
        let composite_bg_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("composite layout"),
                entries: &[
                    buffer_entry(0, wgpu::BufferBindingType::Uniform),
                    texture_entry(1, wgpu::ShaderStages::COMPUTE),
                    buffer_entry(2, wgpu::BufferBindingType::Storage { read_only: false }),
                    storage_texture_entry(3, PRESENT_FORMAT),
                ],
            });
        let blit_bg_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("blit layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let trace_pipeline = create_compute_pipeline(
            &device,
            &trace_source,
            &[&trace_bg_layout_0, &trace_bg_layout_1],
            "path trace",
        );
        let composite_pipeline =
            create_compute_pipeline(&device, &composite_source, &[&composite_bg_layout], "composite");
        let blit_pipeline =
            create_blit_pipeline(&device, &blit_source, surface_format, &blit_bg_layout);

        let blit_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let frame_buffer =
            buffers::create_uniform_buffer(&device, &FrameUniforms::zeroed(), "frame uniforms");
        let composite_params_buffer = buffers::create_uniform_buffer(
            &device,
            &CompositeParams::zeroed(),
            "composite params",
        );

        let environment = EnvironmentImage::default();
        let (environment_texture, environment_view) =
            Self::create_environment_texture(&device, &queue, &environment);

        Ok(Self {
            device,
            queue,
            trace_pipeline,
            composite_pipeline,
            blit_pipeline,
            trace_bg_layout_0,
            trace_bg_layout_1,
            composite_bg_layout,
            blit_bg_layout,
            blit_sampler,
            frame_buffer,
            composite_params_buffer,
            environment,
            environment_texture,
            environment_view,
            scene: None,
            targets: None,
            encoder: None,
        })
    }

    fn create_environment_texture(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        env: &EnvironmentImage,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let extent = Extent::new(env.width, env.height);
        let (texture, view) = buffers::create_texture(
            device,
            extent,
            wgpu::TextureFormat::Rgba32Float,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            "environment",
        );
        buffers::write_texture(
            queue,
            &texture,
            extent,
            16,
            bytemuck::cast_slice(env.pixels.as_slice()),
        );
        (texture, view)
    }

    /// Stretch the environment over the output; this is the frame shown when not tracing.
    fn source_pixels(&self, extent: Extent) -> Vec<u8> {
        encode_srgb8(&self.environment.stretched(extent.width, extent.height))
    }

    fn create_scene_bind_group(&self, sphere_buffer: &wgpu::Buffer) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("trace bg1"),
            layout: &self.trace_bg_layout_1,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: sphere_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&self.environment_view),
                },
            ],
        })
    }

    /// Encoder for this frame, created on first use.
    pub fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        frame_encoder(&self.device, &mut self.encoder)
    }

    /// Finish the frame's recorded work, if any.
    pub fn take_commands(&mut self) -> Option<wgpu::CommandBuffer> {
        self.encoder.take().map(wgpu::CommandEncoder::finish)
    }

    /// Draw the presented image onto `surface_view`, or clear it when nothing is allocated.
    pub fn present(&mut self, surface_view: &wgpu::TextureView) {
        let Self {
            device,
            encoder,
            targets,
            blit_pipeline,
            ..
        } = self;
        let encoder = frame_encoder(device, encoder);

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("blit pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: surface_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        if let Some(targets) = targets {
            pass.set_pipeline(blit_pipeline);
            pass.set_bind_group(0, Some(&targets.blit_bind_group), &[]);
            pass.draw(0..3, 0..1);
        }
    }

    pub fn device(&self) -> &Arc<wgpu::Device> {
        &self.device
    }

    pub fn queue(&self) -> &Arc<wgpu::Queue> {
        &self.queue
    }
}

impl RenderDevice for WgpuDevice {
    fn allocate_targets(&mut self, extent: Extent) {
        if let Some(old) = self.targets.take() {
            old.destroy();
        }

        let (output_texture, output_view) = buffers::create_texture(
            &self.device,
            extent,
            OUTPUT_FORMAT,
            wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            "trace output",
        );
        let accumulation_buffer = buffers::create_empty_storage_buffer(
            &self.device,
            extent.pixel_count() as u64 * ACCUM_BYTES_PER_PIXEL,
            "accumulation",
        );
        let (presented_texture, presented_view) = buffers::create_texture(
            &self.device,
            extent,
            PRESENT_FORMAT,
            wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST,
            "presented",
        );
        let (source_texture, _source_view) = buffers::create_texture(
            &self.device,
            extent,
            PRESENT_FORMAT,
            wgpu::TextureUsages::COPY_SRC | wgpu::TextureUsages::COPY_DST,
            "input frame",
        );
        buffers::write_texture(
            &self.queue,
            &source_texture,
            extent,
            4,
            &self.source_pixels(extent),
        );

        let trace_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("trace bg0"),
            layout: &self.trace_bg_layout_0,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.frame_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&output_view),
                },
            ],
        });
        let composite_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("composite bg"),
            layout: &self.composite_bg_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.composite_params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&output_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: accumulation_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&presented_view),
                },
            ],
        });
        let blit_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("blit bg"),
            layout: &self.blit_bg_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&presented_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.blit_sampler),
                },
            ],
        });

        self.targets = Some(Targets {
            extent,
            output_texture,
            accumulation_buffer,
            presented_texture,
            source_texture,
            trace_bind_group,
            composite_bind_group,
            blit_bind_group,
        });
    }

    fn release_targets(&mut self) {
        if let Some(targets) = self.targets.take() {
            targets.destroy();
        }
    }

    fn upload_scene(&mut self, spheres: &[GpuSphere]) {
        // Same count: overwrite in place. Otherwise the buffer is rebuilt so its
        // element count always equals this frame's sphere count.
        if let Some(scene) = &self.scene
            && scene.capacity == spheres.len()
        {
            if !spheres.is_empty() {
                buffers::update_storage_buffer(&self.queue, &scene.sphere_buffer, spheres);
            }
            return;
        }

        // wgpu rejects zero-sized bindings; an empty scene binds one zeroed
        // sphere that the kernel never reads since `sphere_count` is 0.
        let sentinel = [GpuSphere::zeroed()];
        let contents = if spheres.is_empty() { &sentinel[..] } else { spheres };
        let sphere_buffer = buffers::create_storage_buffer(&self.device, contents, "spheres");
        let bind_group = self.create_scene_bind_group(&sphere_buffer);

        if let Some(old) = self.scene.take() {
            old.sphere_buffer.destroy();
        }
        self.scene = Some(SceneResources {
            sphere_buffer,
            capacity: spheres.len(),
            bind_group,
        });
    }

    fn release_scene(&mut self) {
        if let Some(scene) = self.scene.take() {
            scene.sphere_buffer.destroy();
        }
    }

    fn bind_environment(&mut self, environment: &EnvironmentImage) {
        let (texture, view) =
            Self::create_environment_texture(&self.device, &self.queue, environment);
        let old = std::mem::replace(&mut self.environment_texture, texture);
        self.environment_view = view;
        self.environment = environment.clone();
        old.destroy();

        if let Some(scene) = self.scene.take() {
            let bind_group = self.create_scene_bind_group(&scene.sphere_buffer);
            self.scene = Some(SceneResources {
                bind_group,
                ..scene
            });
        }
        if let Some(targets) = &self.targets {
            let pixels = self.source_pixels(targets.extent);
            buffers::write_texture(&self.queue, &targets.source_texture, targets.extent, 4, &pixels);
        }
    }

    fn dispatch_trace(&mut self, uniforms: &FrameUniforms, grid: DispatchGrid) {
        if self.scene.is_none() {
            self.upload_scene(&[]);
        }
        buffers::update_uniform_buffer(&self.queue, &self.frame_buffer, uniforms);

        let Self {
            device,
            encoder,
            targets,
            scene,
            trace_pipeline,
            ..
        } = self;
        let (Some(targets), Some(scene)) = (targets.as_ref(), scene.as_ref()) else {
            log::warn!("dispatch without allocated targets");
            return;
        };
        let encoder = frame_encoder(device, encoder);

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("path trace pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(trace_pipeline);
        pass.set_bind_group(0, Some(&targets.trace_bind_group), &[]);
        pass.set_bind_group(1, Some(&scene.bind_group), &[]);
        // Whole tiles only; the grid was truncated on the host.
        pass.dispatch_workgroups(grid.tiles_x, grid.tiles_y, 1);
    }

    fn composite(&mut self, params: &CompositeParams) {
        buffers::update_uniform_buffer(&self.queue, &self.composite_params_buffer, params);

        let Self {
            device,
            encoder,
            targets,
            composite_pipeline,
            ..
        } = self;
        let Some(targets) = targets.as_ref() else {
            return;
        };
        let encoder = frame_encoder(device, encoder);

        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("composite pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(composite_pipeline);
        pass.set_bind_group(0, Some(&targets.composite_bind_group), &[]);
        pass.dispatch_workgroups(
            buffers::dispatch_size(targets.extent.width, COMPOSITE_WORKGROUP_SIZE),
            buffers::dispatch_size(targets.extent.height, COMPOSITE_WORKGROUP_SIZE),
            1,
        );
    }

    fn pass_through(&mut self) {
        let Self {
            device,
            encoder,
            targets,
            ..
        } = self;
        let Some(targets) = targets.as_ref() else {
            return;
        };
        let encoder = frame_encoder(device, encoder);
        encoder.copy_texture_to_texture(
            targets.source_texture.as_image_copy(),
            targets.presented_texture.as_image_copy(),
            wgpu::Extent3d {
                width: targets.extent.width,
                height: targets.extent.height,
                depth_or_array_layers: 1,
            },
        );
    }
}

fn frame_encoder<'a>(
    device: &wgpu::Device,
    slot: &'a mut Option<wgpu::CommandEncoder>,
) -> &'a mut wgpu::CommandEncoder {
    slot.get_or_insert_with(|| {
        device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame encoder"),
        })
    })
}

impl Drop for WgpuDevice {
    fn drop(&mut self) {
        self.release_scene();
        self.release_targets();
        self.environment_texture.destroy();
    }
}

//! Spectrum evolution compute pipeline.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::fft::{storage_entry, uniform_entry};
use super::GpuContext;

/// Threads per workgroup side for the evolution kernel.
const EVOLVE_WORKGROUP: u32 = 16;

/// Must match the WGSL `SpectrumParams` layout.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct SpectrumUniforms {
    dimension: u32,
    _pad: u32,
    time: f32,
    patch_size: f32,
}

/// The per-frame evolution kernel: named inputs {H0, Omega, dimension,
/// current_time} -> named outputs {HK, Dx, Dy}.
pub struct GpuSpectrum {
    dim: usize,
    pipeline: wgpu::ComputePipeline,
    layout: wgpu::BindGroupLayout,
    uniforms: wgpu::Buffer,
    patch_size: f32,
}

impl GpuSpectrum {
    pub fn new(ctx: &GpuContext, dim: usize, patch_size: f32) -> Self {
        let device = &ctx.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Spectrum Evolution Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("spectrum.wgsl").into()),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Spectrum Bind Group Layout"),
            entries: &[
                uniform_entry(0),
                storage_entry(1, true),
                storage_entry(2, true),
                storage_entry(3, false),
                storage_entry(4, false),
                storage_entry(5, false),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Spectrum Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Spectrum Evolution Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("evolve"),
            compilation_options: Default::default(),
            cache: None,
        });

        let uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Spectrum Uniforms"),
            contents: bytemuck::cast_slice(&[SpectrumUniforms {
                dimension: dim as u32,
                _pad: 0,
                time: 0.0,
                patch_size,
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        Self {
            dim,
            pipeline,
            layout,
            uniforms,
            patch_size,
        }
    }

    /// Bind the five named buffers once; they are stable for the
    /// simulation's lifetime.
    pub fn bind(
        &self,
        ctx: &GpuContext,
        h0: &wgpu::Buffer,
        omega: &wgpu::Buffer,
        hk: &wgpu::Buffer,
        dx: &wgpu::Buffer,
        dy: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Spectrum Bind Group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: h0.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: omega.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: hk.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: dx.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: dy.as_entire_binding(),
                },
            ],
        })
    }

    /// Update the evolution time for the next dispatch.
    pub fn write_time(&self, ctx: &GpuContext, time: f32) {
        let uniforms = SpectrumUniforms {
            dimension: self.dim as u32,
            _pad: 0,
            time,
            patch_size: self.patch_size,
        };
        ctx.queue
            .write_buffer(&self.uniforms, 0, bytemuck::cast_slice(&[uniforms]));
    }

    /// Encode one evolution dispatch over the full grid.
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder, bind_group: &wgpu::BindGroup) {
        let groups = (self.dim as u32).div_ceil(EVOLVE_WORKGROUP);
        let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("Spectrum Evolution"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, bind_group, &[]);
        pass.dispatch_workgroups(groups, groups, 1);
    }
}

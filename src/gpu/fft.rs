//! Parallel FFT engine: the same butterfly/bit-reverse/transpose/copy stage
//! structure as the CPU reference, expressed as compute dispatches.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::GpuContext;
use crate::error::{OceanError, Result};
use crate::fft::bit_reverse;
use crate::grid::{Complex, ComplexGrid};

/// Butterfly threads per workgroup.
const BUTTERFLY_WORKGROUP: u32 = 128;

/// Stage parameters; must match the WGSL `FftParams` layout.
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct FftStageParams {
    thread_count: u32,
    istride: u32,
    bit_count: u32,
    dimension: u32,
}

/// GPU FFT engine for one fixed dimension.
///
/// Owns the bit-reversal table buffer, one scratch storage buffer for
/// ping-pong, and per-stage uniform buffers (one per butterfly stage plus
/// one for the permute/transpose/copy passes), all created once. A new
/// engine must be built if the dimension changes.
pub struct GpuFft {
    dim: usize,
    stages: u32,
    layout: wgpu::BindGroupLayout,
    butterfly: wgpu::ComputePipeline,
    permute: wgpu::ComputePipeline,
    transpose: wgpu::ComputePipeline,
    copy: wgpu::ComputePipeline,
    bit_reverse_buf: wgpu::Buffer,
    scratch: wgpu::Buffer,
    stage_params: Vec<wgpu::Buffer>,
    pass_params: wgpu::Buffer,
}

impl GpuFft {
    pub fn new(ctx: &GpuContext, dim: usize) -> Result<Self> {
        if dim == 0 || !dim.is_power_of_two() {
            return Err(OceanError::Configuration(format!(
                "FFT dimension must be a power of two, got {}",
                dim
            )));
        }
        let device = &ctx.device;
        let stages = dim.trailing_zeros();
        let thread_count = (dim * dim / 2) as u32;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Radix2 FFT Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("fft.wgsl").into()),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("FFT Bind Group Layout"),
            entries: &[
                uniform_entry(0),
                storage_entry(1, true),
                storage_entry(2, true),
                storage_entry(3, false),
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("FFT Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let make_pipeline = |entry: &str| {
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(entry),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: Some(entry),
                compilation_options: Default::default(),
                cache: None,
            })
        };

        let table: Vec<u32> = (0..dim).map(|i| bit_reverse(i, dim) as u32).collect();
        let bit_reverse_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("FFT Bit Reverse Table"),
            contents: bytemuck::cast_slice(&table),
            usage: wgpu::BufferUsages::STORAGE,
        });

        let scratch = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("FFT Scratch"),
            size: grid_bytes(dim),
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });

        let stage_params = (0..stages)
            .map(|i| {
                let params = FftStageParams {
                    thread_count,
                    istride: thread_count >> i,
                    bit_count: i,
                    dimension: dim as u32,
                };
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("FFT Stage Params"),
                    contents: bytemuck::cast_slice(&[params]),
                    usage: wgpu::BufferUsages::UNIFORM,
                })
            })
            .collect();

        let pass_params = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("FFT Pass Params"),
            contents: bytemuck::cast_slice(&[FftStageParams {
                thread_count,
                istride: thread_count,
                bit_count: 0,
                dimension: dim as u32,
            }]),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        Ok(Self {
            dim,
            stages,
            layout,
            butterfly: make_pipeline("butterfly"),
            permute: make_pipeline("permute_rows"),
            transpose: make_pipeline("transpose_grid"),
            copy: make_pipeline("copy_buffer"),
            bit_reverse_buf,
            scratch,
            stage_params,
            pass_params,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Encode the full 2D transform of `src` into `dst`. Both must be
    /// storage buffers of N*N complex cells; `dst` is fully overwritten.
    pub fn encode(
        &self,
        ctx: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        src: &wgpu::Buffer,
        dst: &wgpu::Buffer,
    ) {
        let butterfly_groups = ((self.dim * self.dim / 2) as u32).div_ceil(BUTTERFLY_WORKGROUP);
        let cell_groups = ((self.dim * self.dim) as u32).div_ceil(BUTTERFLY_WORKGROUP);

        // bufs[cur] holds the latest stage output; every dispatch writes the
        // other buffer and flips cur, mirroring the CPU reference exactly.
        let bufs = [dst, &self.scratch];
        let mut cur = 0usize;
        let mut first = true;

        for _half in 0..2 {
            for stage in 0..self.stages as usize {
                let read = if first { src } else { bufs[cur] };
                let bind = self.bind_group(ctx, &self.stage_params[stage], read, bufs[cur ^ 1]);
                run_pass(encoder, &self.butterfly, &bind, butterfly_groups);
                first = false;
                cur ^= 1;
            }

            {
                let read = if first { src } else { bufs[cur] };
                let bind = self.bind_group(ctx, &self.pass_params, read, bufs[cur ^ 1]);
                run_pass(encoder, &self.permute, &bind, cell_groups);
                first = false;
                cur ^= 1;
            }

            {
                let bind = self.bind_group(ctx, &self.pass_params, bufs[cur], bufs[cur ^ 1]);
                run_pass(encoder, &self.transpose, &bind, cell_groups);
                cur ^= 1;
            }
        }

        // The even pass count always lands the result in dst; the copy stage
        // reconciles if that bookkeeping ever changes.
        if cur != 0 {
            let bind = self.bind_group(ctx, &self.pass_params, bufs[1], bufs[0]);
            run_pass(encoder, &self.copy, &bind, cell_groups);
        }
    }

    /// Convenience one-shot transform with upload and readback. The
    /// orchestrator uses `encode` on live buffers instead.
    pub fn transform(&self, ctx: &GpuContext, src: &ComplexGrid) -> Result<ComplexGrid> {
        if src.dim() != self.dim {
            return Err(OceanError::NotReady("grid does not match FFT engine size"));
        }
        let size = grid_bytes(self.dim);

        let src_buf = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("FFT Src"),
                contents: src.as_bytes(),
                usage: wgpu::BufferUsages::STORAGE,
            });
        let dst_buf = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("FFT Dst"),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("FFT Staging"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("FFT Encoder"),
            });
        self.encode(ctx, &mut encoder, &src_buf, &dst_buf);
        encoder.copy_buffer_to_buffer(&dst_buf, 0, &staging, 0, size);
        ctx.queue.submit(Some(encoder.finish()));

        let cells: Vec<Complex> = ctx.read_back_complex(&staging, size)?;
        Ok(ComplexGrid::from_data(self.dim, cells))
    }

    fn bind_group(
        &self,
        ctx: &GpuContext,
        params: &wgpu::Buffer,
        src: &wgpu::Buffer,
        dst: &wgpu::Buffer,
    ) -> wgpu::BindGroup {
        ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("FFT Stage Bind Group"),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.bit_reverse_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: src.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: dst.as_entire_binding(),
                },
            ],
        })
    }
}

pub(crate) fn grid_bytes(dim: usize) -> u64 {
    (dim * dim * std::mem::size_of::<Complex>()) as u64
}

pub(crate) fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub(crate) fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// One dispatch per compute pass: a later stage may not begin before every
/// cell of the previous stage is complete and visible.
fn run_pass(
    encoder: &mut wgpu::CommandEncoder,
    pipeline: &wgpu::ComputePipeline,
    bind_group: &wgpu::BindGroup,
    groups: u32,
) {
    let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
        label: Some("FFT Stage"),
        timestamp_writes: None,
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.dispatch_workgroups(groups, 1, 1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft::CpuFft;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn gpu() -> Option<GpuContext> {
        match GpuContext::new_blocking() {
            Ok(ctx) => Some(ctx),
            Err(e) => {
                eprintln!("skipping GPU test: {}", e);
                None
            }
        }
    }

    fn random_grid(n: usize, seed: u64) -> ComplexGrid {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut grid = ComplexGrid::new(n);
        for cell in grid.as_mut_slice() {
            *cell = Complex::new(rng.gen::<f32>() * 2.0 - 1.0, rng.gen::<f32>() * 2.0 - 1.0);
        }
        grid
    }

    #[test]
    fn test_gpu_rejects_non_power_of_two() {
        let Some(ctx) = gpu() else { return };
        assert!(GpuFft::new(&ctx, 12).is_err());
    }

    #[test]
    fn test_gpu_matches_cpu_reference() {
        let Some(ctx) = gpu() else { return };

        for n in [8usize, 16, 64] {
            let src = random_grid(n, 0xf00d + n as u64);

            let mut expected = ComplexGrid::new(n);
            CpuFft::new(n)
                .unwrap()
                .transform(&src, &mut expected)
                .unwrap();

            let engine = GpuFft::new(&ctx, n).unwrap();
            let got = engine.transform(&ctx, &src).unwrap();

            let scale = expected
                .as_slice()
                .iter()
                .map(|c| c.norm())
                .fold(1.0f32, f32::max);
            for (a, b) in got.as_slice().iter().zip(expected.as_slice()) {
                assert!(
                    (*a - *b).norm() < 1e-3 * scale,
                    "N={}: gpu {:?} != cpu {:?}",
                    n,
                    a,
                    b
                );
            }
        }
    }
}

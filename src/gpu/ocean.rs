//! GPU-backed simulation orchestrator: the whole per-frame pipeline runs as
//! compute dispatches, with one readback of the three spatial grids.

use wgpu::util::DeviceExt;

use super::fft::grid_bytes;
use super::{GpuContext, GpuFft, GpuSpectrum};
use crate::error::{OceanError, Result};
use crate::grid::ComplexGrid;
use crate::params::OceanParams;
use crate::spectrum::{self, BaseSpectrum};

/// GPU ocean simulation.
///
/// H0 and Omega are computed on the host once and uploaded at start; each
/// `step` dispatches the evolution kernel and three FFTs, then reads the
/// spatial grids back for the accessors. All device buffers are owned here
/// for the simulation's lifetime.
pub struct GpuOceanSimulation {
    ctx: GpuContext,
    params: OceanParams,
    base: BaseSpectrum,

    spectrum: GpuSpectrum,
    fft: GpuFft,
    spectrum_bind: wgpu::BindGroup,

    hk_buf: wgpu::Buffer,
    dx_buf: wgpu::Buffer,
    dy_buf: wgpu::Buffer,
    ht_buf: wgpu::Buffer,
    dxt_buf: wgpu::Buffer,
    dyt_buf: wgpu::Buffer,
    staging: wgpu::Buffer,

    // Host mirrors of the last step's outputs
    ht: ComplexGrid,
    dxt: ComplexGrid,
    dyt: ComplexGrid,

    ready: bool,
}

impl GpuOceanSimulation {
    pub fn new(ctx: GpuContext, params: OceanParams) -> Result<Self> {
        params.validate()?;
        let n = params.dimension;
        let size = grid_bytes(n);

        let base = spectrum::initialize(&params)?;

        let h0_buf = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Ocean H0"),
                contents: base.h0.as_bytes(),
                usage: wgpu::BufferUsages::STORAGE,
            });
        let omega_buf = ctx
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Ocean Omega"),
                contents: base.omega.as_bytes(),
                usage: wgpu::BufferUsages::STORAGE,
            });

        let storage = |label: &str| {
            ctx.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            })
        };
        let hk_buf = storage("Ocean HK");
        let dx_buf = storage("Ocean Dx");
        let dy_buf = storage("Ocean Dy");
        let ht_buf = storage("Ocean Ht");
        let dxt_buf = storage("Ocean Dxt");
        let dyt_buf = storage("Ocean Dyt");

        let staging = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Ocean Readback Staging"),
            size: size * 3,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let spectrum = GpuSpectrum::new(&ctx, n, params.patch_size);
        let spectrum_bind = spectrum.bind(&ctx, &h0_buf, &omega_buf, &hk_buf, &dx_buf, &dy_buf);
        let fft = GpuFft::new(&ctx, n)?;

        log::info!(
            "ocean simulation ready: {}x{} patch {} (gpu)",
            n,
            n,
            params.patch_size
        );

        Ok(Self {
            ctx,
            params,
            base,
            spectrum,
            fft,
            spectrum_bind,
            hk_buf,
            dx_buf,
            dy_buf,
            ht_buf,
            dxt_buf,
            dyt_buf,
            staging,
            ht: ComplexGrid::new(n),
            dxt: ComplexGrid::new(n),
            dyt: ComplexGrid::new(n),
            ready: true,
        })
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Advance the surface to `time_s` seconds: evolve -> FFT x3 -> readback.
    pub fn step(&mut self, time_s: f32) -> Result<()> {
        if !self.ready {
            return Err(OceanError::NotReady("gpu buffers not allocated"));
        }

        let n = self.params.dimension;
        let size = grid_bytes(n);
        let t = time_s * self.params.time_scale;
        self.spectrum.write_time(&self.ctx, t);

        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Ocean Step Encoder"),
            });

        self.spectrum.encode(&mut encoder, &self.spectrum_bind);
        self.fft.encode(&self.ctx, &mut encoder, &self.hk_buf, &self.ht_buf);
        self.fft.encode(&self.ctx, &mut encoder, &self.dx_buf, &self.dxt_buf);
        self.fft.encode(&self.ctx, &mut encoder, &self.dy_buf, &self.dyt_buf);

        encoder.copy_buffer_to_buffer(&self.ht_buf, 0, &self.staging, 0, size);
        encoder.copy_buffer_to_buffer(&self.dxt_buf, 0, &self.staging, size, size);
        encoder.copy_buffer_to_buffer(&self.dyt_buf, 0, &self.staging, size * 2, size);

        self.ctx.queue.submit(Some(encoder.finish()));

        let cells = self.ctx.read_back_complex(&self.staging, size * 3)?;
        let per_grid = n * n;
        self.ht = ComplexGrid::from_data(n, cells[..per_grid].to_vec());
        self.dxt = ComplexGrid::from_data(n, cells[per_grid..2 * per_grid].to_vec());
        self.dyt = ComplexGrid::from_data(n, cells[2 * per_grid..].to_vec());

        log::trace!("gpu stepped ocean to t={}", t);
        Ok(())
    }

    pub fn params(&self) -> &OceanParams {
        &self.params
    }

    pub fn resolution_and_length(&self) -> (usize, f32) {
        (self.params.dimension, self.params.patch_size)
    }

    pub fn base_spectrum(&self) -> &BaseSpectrum {
        &self.base
    }

    pub fn height_field(&self) -> &ComplexGrid {
        &self.ht
    }

    pub fn displacement_x(&self) -> &ComplexGrid {
        &self.dxt
    }

    pub fn displacement_y(&self) -> &ComplexGrid {
        &self.dyt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocean::OceanSimulation;
    use glam::Vec2;

    fn test_params(dimension: usize) -> OceanParams {
        OceanParams {
            dimension,
            patch_size: 2000.0,
            wind_speed: 600.0,
            wind_dir: Vec2::new(0.8, 0.6),
            wave_amplitude: 0.35,
            ..Default::default()
        }
    }

    #[test]
    fn test_gpu_step_matches_cpu_step() {
        let ctx = match GpuContext::new_blocking() {
            Ok(ctx) => ctx,
            Err(e) => {
                eprintln!("skipping GPU test: {}", e);
                return;
            }
        };

        let params = test_params(16);
        let mut cpu = OceanSimulation::new(params.clone()).unwrap();
        let mut gpu = GpuOceanSimulation::new(ctx, params).unwrap();

        for &t in &[0.0f32, 0.5, 2.0] {
            cpu.step(t).unwrap();
            gpu.step(t).unwrap();

            let scale = cpu
                .height_field()
                .as_slice()
                .iter()
                .map(|c| c.norm())
                .fold(1e-6f32, f32::max);
            for (a, b) in gpu
                .height_field()
                .as_slice()
                .iter()
                .zip(cpu.height_field().as_slice())
            {
                assert!(
                    (*a - *b).norm() < 1e-3 * scale,
                    "t={}: gpu {:?} != cpu {:?}",
                    t,
                    a,
                    b
                );
            }
        }
    }
}

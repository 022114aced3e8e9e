//! Simulation orchestrator: evolve spectrum -> FFT x3 -> expose grids.

use crate::error::{OceanError, Result};
use crate::fft::CpuFft;
use crate::grid::{ComplexGrid, RealGrid};
use crate::params::OceanParams;
use crate::spectrum::{self, BaseSpectrum};

/// Per-cell gradient/normal output: surface normal (x, y, z) plus the fold
/// (Jacobian) term used downstream for foam/whitecap shading.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct NormalCell {
    pub nx: f32,
    pub ny: f32,
    pub nz: f32,
    pub fold: f32,
}

/// CPU-backed ocean simulation.
///
/// Owns every grid for the lifetime of the simulation; the spectrum evolver
/// and FFT engine borrow them per call and keep no cross-call state beyond
/// the FFT's preallocated scratch. Each `step` replaces the evolved and
/// spatial grids wholesale - no step observes a partially-written grid.
pub struct OceanSimulation {
    params: OceanParams,
    base: BaseSpectrum,
    fft: CpuFft,

    // Frequency-domain, overwritten every step
    hk: ComplexGrid,
    dx: ComplexGrid,
    dy: ComplexGrid,

    // Spatial-domain outputs, overwritten every step
    ht: ComplexGrid,
    dxt: ComplexGrid,
    dyt: ComplexGrid,

    ready: bool,
}

impl OceanSimulation {
    /// Build the base spectrum and FFT engine for `params`.
    pub fn new(params: OceanParams) -> Result<Self> {
        params.validate()?;

        let base = spectrum::initialize(&params)?;
        let fft = CpuFft::new(params.dimension)?;
        let n = params.dimension;

        log::info!(
            "ocean simulation ready: {}x{} patch {} (cpu)",
            n,
            n,
            params.patch_size
        );

        Ok(Self {
            params,
            base,
            fft,
            hk: ComplexGrid::new(n),
            dx: ComplexGrid::new(n),
            dy: ComplexGrid::new(n),
            ht: ComplexGrid::new(n),
            dxt: ComplexGrid::new(n),
            dyt: ComplexGrid::new(n),
            ready: true,
        })
    }

    /// Whether one-time setup has completed and grids are allocated.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Advance the surface to `time_s` seconds of elapsed time. Any external
    /// scheduler may call this at its own cadence; the simulation has no
    /// opinion on the timing source.
    pub fn step(&mut self, time_s: f32) -> Result<()> {
        if !self.ready {
            return Err(OceanError::NotReady("simulation grids not allocated"));
        }

        let t = time_s * self.params.time_scale;
        spectrum::evolve(
            &self.base.h0,
            &self.base.omega,
            &self.params,
            t,
            &mut self.hk,
            &mut self.dx,
            &mut self.dy,
        )?;

        self.fft.transform(&self.hk, &mut self.ht)?;
        self.fft.transform(&self.dx, &mut self.dxt)?;
        self.fft.transform(&self.dy, &mut self.dyt)?;

        log::trace!("stepped ocean to t={}", t);
        Ok(())
    }

    pub fn params(&self) -> &OceanParams {
        &self.params
    }

    /// (dimension, patch size) pair describing the world-space extent.
    pub fn resolution_and_length(&self) -> (usize, f32) {
        (self.params.dimension, self.params.patch_size)
    }

    /// Base spectrum (H0, Omega and the diagnostic grids).
    pub fn base_spectrum(&self) -> &BaseSpectrum {
        &self.base
    }

    /// Spatial-domain height field of the last step (real part is the
    /// height; the imaginary part is near zero and kept for inspection).
    pub fn height_field(&self) -> &ComplexGrid {
        &self.ht
    }

    /// Horizontal displacement along x of the last step. Choppiness scale is
    /// applied downstream by the renderer.
    pub fn displacement_x(&self) -> &ComplexGrid {
        &self.dxt
    }

    /// Horizontal displacement along y of the last step.
    pub fn displacement_y(&self) -> &ComplexGrid {
        &self.dyt
    }

    /// Heights as a plain scalar grid.
    pub fn height_grid(&self) -> RealGrid {
        let n = self.params.dimension;
        let mut out = RealGrid::new(n);
        for (dst, src) in out.data.iter_mut().zip(self.ht.as_slice()) {
            *dst = src.re;
        }
        out
    }

    /// Finite-difference normal/gradient grid with the fold (Jacobian)
    /// term, computed from the last step's height and displacement fields.
    /// Neighbors wrap toroidally - the patch tiles.
    pub fn normal_grid(&self) -> Vec<NormalCell> {
        let n = self.params.dimension;
        let grid_len = n as f32 / self.params.patch_size;
        let choppy = self.params.choppy_scale;
        let mut out = vec![NormalCell::default(); n * n];

        for i in 0..n {
            let up = (i + n - 1) % n;
            let down = (i + 1) % n;
            for j in 0..n {
                let left = (j + n - 1) % n;
                let right = (j + 1) % n;

                // Central differences, cell spacing 1/grid_len
                let dh_dx =
                    (self.ht.get(i, right).re - self.ht.get(i, left).re) * 0.5 * grid_len;
                let dh_dy =
                    (self.ht.get(down, j).re - self.ht.get(up, j).re) * 0.5 * grid_len;

                let len = (dh_dx * dh_dx + dh_dy * dh_dy + 1.0).sqrt();

                // Jacobian of the choppy horizontal displacement
                let ddx_dx = (self.dxt.get(i, right).re - self.dxt.get(i, left).re)
                    * 0.5
                    * grid_len
                    * choppy;
                let ddy_dy = (self.dyt.get(down, j).re - self.dyt.get(up, j).re)
                    * 0.5
                    * grid_len
                    * choppy;
                let ddx_dy = (self.dxt.get(down, j).re - self.dxt.get(up, j).re)
                    * 0.5
                    * grid_len
                    * choppy;
                let ddy_dx = (self.dyt.get(i, right).re - self.dyt.get(i, left).re)
                    * 0.5
                    * grid_len
                    * choppy;
                let fold = (1.0 + ddx_dx) * (1.0 + ddy_dy) - ddx_dy * ddy_dx;

                out[i * n + j] = NormalCell {
                    nx: -dh_dx / len,
                    ny: 1.0 / len,
                    nz: -dh_dy / len,
                    fold,
                };
            }
        }

        out
    }
}

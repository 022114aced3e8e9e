//! Simulation parameters with physical units and documented semantics.

use glam::Vec2;
use std::f32::consts::PI;

use crate::error::{OceanError, Result};

/// Gravitational acceleration in the simulation's unit system
/// (length-units per second squared).
pub const GRAV_ACCEL: f32 = 981.0;

/// Ocean simulation parameters, immutable per simulation instance.
#[derive(Debug, Clone)]
pub struct OceanParams {
    /// Displacement map dimension N (cells per side, must be a power of two)
    pub dimension: usize,

    /// Physical patch size L: world units spanned by the grid
    pub patch_size: f32,

    /// Time warp applied to elapsed time before spectrum evolution
    pub time_scale: f32,

    /// Overall wave amplitude scale A of the Phillips spectrum
    pub wave_amplitude: f32,

    /// Wind direction (normalized before use)
    pub wind_dir: Vec2,

    /// Wind speed in length-units per second
    pub wind_speed: f32,

    /// Suppression factor for waves moving against the wind (0..1)
    pub wind_dependency: f32,

    /// Horizontal displacement scale, applied downstream by the renderer
    pub choppy_scale: f32,

    /// Seed for the Gaussian draws of the base spectrum
    pub seed: u64,
}

impl Default for OceanParams {
    fn default() -> Self {
        Self {
            dimension: 256,
            patch_size: 2000.0,
            time_scale: 0.8,
            wave_amplitude: 0.35,
            wind_dir: Vec2::new(0.8, 0.6),
            wind_speed: 600.0,
            wind_dependency: 0.07,
            choppy_scale: 1.3,
            seed: 42,
        }
    }
}

impl OceanParams {
    /// Check the construction-time invariants: N a power of two, positive
    /// patch size, usable wind vector.
    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 || !self.dimension.is_power_of_two() {
            return Err(OceanError::Configuration(format!(
                "dimension must be a power of two, got {}",
                self.dimension
            )));
        }
        if self.patch_size <= 0.0 {
            return Err(OceanError::Configuration(format!(
                "patch size must be positive, got {}",
                self.patch_size
            )));
        }
        if self.wind_dir.length_squared() <= 0.0 {
            return Err(OceanError::Configuration(
                "wind direction must be a non-zero vector".into(),
            ));
        }
        if self.wind_speed < 0.0 {
            return Err(OceanError::Configuration(format!(
                "wind speed must be non-negative, got {}",
                self.wind_speed
            )));
        }
        Ok(())
    }

    /// Wavevector of grid cell (i, j):
    /// `K = ((j - N/2) * 2pi/L, (i - N/2) * 2pi/L)`.
    #[inline]
    pub fn wavevector(&self, i: usize, j: usize) -> Vec2 {
        let half = self.dimension as f32 / 2.0;
        let scale = 2.0 * PI / self.patch_size;
        Vec2::new(
            (j as f32 - half) * scale,
            (i as f32 - half) * scale,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_valid() {
        assert!(OceanParams::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_power_of_two_dimension() {
        let params = OceanParams {
            dimension: 100,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(OceanError::Configuration(_))
        ));
    }

    #[test]
    fn test_rejects_zero_dimension_and_patch() {
        let params = OceanParams {
            dimension: 0,
            ..Default::default()
        };
        assert!(params.validate().is_err());

        let params = OceanParams {
            patch_size: 0.0,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_wavevector_mapping() {
        let params = OceanParams {
            dimension: 8,
            patch_size: 2000.0,
            ..Default::default()
        };
        // Center cell is the DC term
        let k = params.wavevector(4, 4);
        assert_eq!(k, Vec2::ZERO);

        // One cell right of center moves Kx by 2pi/L
        let k = params.wavevector(4, 5);
        assert!((k.x - 2.0 * PI / 2000.0).abs() < 1e-9);
        assert_eq!(k.y, 0.0);
    }
}

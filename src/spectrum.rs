//! Base spectrum generation and per-frame spectral evolution.
//!
//! The base spectrum H0 and the dispersion field Omega are computed once per
//! parameter set. Every simulation step then evolves H0 analytically to the
//! height spectrum HK(t) and the two horizontal displacement spectra
//! Dx(t)/Dy(t); the evolution is a pure per-cell map (each output cell reads
//! only its own cell and its frequency mirror) and is what the GPU evolution
//! kernel computes in parallel.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{OceanError, Result};
use crate::grid::{Complex, ComplexGrid, RealGrid};
use crate::params::{OceanParams, GRAV_ACCEL};

const HALF_SQRT_2: f32 = 0.707_106_8;

/// Directional Phillips spectral density P(K).
///
/// `l = V^2/g` is the largest wave arising from a continuous wind of speed V;
/// waves shorter than `w = l/1000` are damped out, and waves running against
/// the wind are suppressed by `dir_depend`.
pub fn phillips(k: Vec2, wind_dir: Vec2, wind_speed: f32, amplitude: f32, dir_depend: f32) -> f32 {
    let k_sqr = k.length_squared();
    if k_sqr == 0.0 {
        // DC term carries no wave energy
        return 0.0;
    }

    let l = wind_speed * wind_speed / GRAV_ACCEL;
    let w = l / 1000.0;

    let k_cos = k.dot(wind_dir);
    let mut result = amplitude * (-1.0 / (k_sqr * l * l)).exp() / (k_sqr * k_sqr * k_sqr)
        * (k_cos * k_cos);

    if k_cos < 0.0 {
        result *= dir_depend;
    }

    result * (-k_sqr * w * w).exp()
}

/// One standard-normal sample via Box-Muller. Each call consumes its own
/// pair of uniforms; u1 is clamped away from the logarithm singularity.
fn gauss<R: Rng>(rng: &mut R) -> f32 {
    let u1 = rng.gen::<f32>().max(1e-6);
    let u2 = rng.gen::<f32>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
}

/// The static part of the simulation: base amplitudes and dispersion, plus
/// the raw Phillips and Gaussian grids kept for inspection/visualization.
#[derive(Clone, Debug)]
pub struct BaseSpectrum {
    pub h0: ComplexGrid,
    pub omega: RealGrid,
    pub phillips: RealGrid,
    pub gauss: ComplexGrid,
}

/// Build the base spectrum H0 and dispersion field Omega from wind
/// parameters. Deterministic for a fixed `params.seed`.
///
/// `H0(i,j) = sqrt(P(K)) * (xi_r, xi_i) / sqrt(2)` and
/// `Omega(i,j) = sqrt(g * |K|)` (deep-water gravity waves).
pub fn initialize(params: &OceanParams) -> Result<BaseSpectrum> {
    params.validate()?;

    let n = params.dimension;
    let wind_dir = params.wind_dir.normalize();
    // The amplitude knob is kept in renderer-friendly units; the spectral
    // density uses it at 1e-7 scale.
    let amplitude = params.wave_amplitude * 1e-7;

    let mut rng = StdRng::seed_from_u64(params.seed);

    let mut out = BaseSpectrum {
        h0: ComplexGrid::new(n),
        omega: RealGrid::new(n),
        phillips: RealGrid::new(n),
        gauss: ComplexGrid::new(n),
    };

    for i in 0..n {
        for j in 0..n {
            let k = params.wavevector(i, j);

            let amp = if k == Vec2::ZERO {
                0.0
            } else {
                phillips(k, wind_dir, params.wind_speed, amplitude, params.wind_dependency)
                    .sqrt()
            };

            let xi_r = gauss(&mut rng);
            let xi_i = gauss(&mut rng);

            out.h0
                .set(i, j, Complex::new(amp * xi_r * HALF_SQRT_2, amp * xi_i * HALF_SQRT_2));
            out.omega.set(i, j, (GRAV_ACCEL * k.length()).sqrt());
            out.phillips.set(i, j, amp);
            out.gauss.set(i, j, Complex::new(xi_r, xi_i));
        }
    }

    log::debug!(
        "initialized base spectrum: {}x{}, wind {:?} @ {}",
        n,
        n,
        wind_dir,
        params.wind_speed
    );

    Ok(out)
}

/// Evolve the base spectrum to time `t`.
///
/// For each cell with phase `phi = Omega(i,j) * t`:
/// `HK = H0(k) e^{i phi} + conj(H0(-k)) e^{-i phi}` where `-k` is the mirror
/// cell `((N-i) mod N, (N-j) mod N)`. The displacement spectra scale HK by
/// `Kx/|K|` and `Ky/|K|`; the `|K| = 0` cell displaces nothing.
pub fn evolve(
    h0: &ComplexGrid,
    omega: &RealGrid,
    params: &OceanParams,
    t: f32,
    hk: &mut ComplexGrid,
    dx: &mut ComplexGrid,
    dy: &mut ComplexGrid,
) -> Result<()> {
    let n = params.dimension;
    if h0.dim() != n || omega.dim() != n {
        return Err(OceanError::NotReady("base spectrum dimension mismatch"));
    }
    if hk.dim() != n || dx.dim() != n || dy.dim() != n {
        return Err(OceanError::NotReady("evolved spectrum dimension mismatch"));
    }

    for i in 0..n {
        let mi = (n - i) % n;
        for j in 0..n {
            let mj = (n - j) % n;

            let phi = omega.get(i, j) * t;
            let phase = Complex::from_angle(phi);

            let forward = h0.get(i, j);
            let mirrored = h0.get(mi, mj).conj();
            let ht = forward * phase + mirrored * phase.conj();

            hk.set(i, j, ht);

            let k = params.wavevector(i, j);
            let k_len = k.length();
            if k_len > 1e-12 {
                dx.set(i, j, ht.scale(k.x / k_len));
                dy.set(i, j, ht.scale(k.y / k_len));
            } else {
                dx.set(i, j, Complex::ZERO);
                dy.set(i, j, Complex::ZERO);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> OceanParams {
        OceanParams {
            dimension: 8,
            patch_size: 2000.0,
            wind_speed: 600.0,
            wind_dir: Vec2::new(0.8, 0.6),
            wave_amplitude: 0.35,
            ..Default::default()
        }
    }

    #[test]
    fn test_dc_cell_is_zero() {
        let spec = initialize(&small_params()).unwrap();
        let n = 8;
        // K = 0 at (N/2, N/2)
        assert_eq!(spec.h0.get(n / 2, n / 2), Complex::ZERO);
        assert_eq!(spec.omega.get(n / 2, n / 2), 0.0);
    }

    #[test]
    fn test_zero_wind_flattens_spectrum() {
        let params = OceanParams {
            wind_speed: 0.0,
            ..small_params()
        };
        let spec = initialize(&params).unwrap();
        for &c in spec.h0.as_slice() {
            assert_eq!(c, Complex::ZERO);
        }
    }

    #[test]
    fn test_initialize_is_deterministic_per_seed() {
        let params = small_params();
        let a = initialize(&params).unwrap();
        let b = initialize(&params).unwrap();
        assert_eq!(a.h0.as_slice(), b.h0.as_slice());

        let other = initialize(&OceanParams {
            seed: 1234,
            ..params
        })
        .unwrap();
        assert_ne!(a.h0.as_slice(), other.h0.as_slice());
    }

    #[test]
    fn test_phillips_suppresses_crosswind() {
        let wind = Vec2::new(1.0, 0.0);
        let with_wind = phillips(Vec2::new(0.01, 0.0), wind, 600.0, 1e-7, 0.07);
        let against = phillips(Vec2::new(-0.01, 0.0), wind, 600.0, 1e-7, 0.07);
        assert!(with_wind > 0.0);
        // Same magnitude against the wind keeps only the dependency fraction
        assert!((against / with_wind - 0.07).abs() < 1e-3);
        // Perpendicular waves carry no energy (K . w = 0)
        assert_eq!(phillips(Vec2::new(0.0, 0.01), wind, 600.0, 1e-7, 0.07), 0.0);
    }

    #[test]
    fn test_evolve_identity_phases_at_t0() {
        let params = small_params();
        let spec = initialize(&params).unwrap();
        let n = params.dimension;

        let mut hk = ComplexGrid::new(n);
        let mut dx = ComplexGrid::new(n);
        let mut dy = ComplexGrid::new(n);
        evolve(&spec.h0, &spec.omega, &params, 0.0, &mut hk, &mut dx, &mut dy).unwrap();

        for i in 0..n {
            for j in 0..n {
                // Phase factors are identity at t = 0
                let expected = spec.h0.get(i, j) + spec.h0.get((n - i) % n, (n - j) % n).conj();
                let got = hk.get(i, j);
                assert!((got.re - expected.re).abs() < 1e-6);
                assert!((got.im - expected.im).abs() < 1e-6);
            }
        }

        // The combination is exactly Hermitian, so the spatial field is real
        for i in 0..n {
            for j in 0..n {
                let mirror = hk.get((n - i) % n, (n - j) % n);
                let here = hk.get(i, j);
                assert!((mirror.re - here.re).abs() < 1e-6);
                assert!((mirror.im + here.im).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_evolve_zero_k_cell_displaces_nothing() {
        let params = small_params();
        let spec = initialize(&params).unwrap();
        let n = params.dimension;

        let mut hk = ComplexGrid::new(n);
        let mut dx = ComplexGrid::new(n);
        let mut dy = ComplexGrid::new(n);
        evolve(&spec.h0, &spec.omega, &params, 3.7, &mut hk, &mut dx, &mut dy).unwrap();

        assert_eq!(dx.get(n / 2, n / 2), Complex::ZERO);
        assert_eq!(dy.get(n / 2, n / 2), Complex::ZERO);
    }

    #[test]
    fn test_evolve_rejects_mismatched_grids() {
        let params = small_params();
        let spec = initialize(&params).unwrap();

        let mut hk = ComplexGrid::new(4);
        let mut dx = ComplexGrid::new(4);
        let mut dy = ComplexGrid::new(4);
        let err = evolve(&spec.h0, &spec.omega, &params, 0.0, &mut hk, &mut dx, &mut dy);
        assert!(matches!(err, Err(OceanError::NotReady(_))));
    }
}

//! 2D radix-2 decimation-in-time FFT, CPU reference path.
//!
//! The transform is expressed as the same four stages the GPU pipeline
//! dispatches - butterfly, row bit-reversal, transpose, copy - executed
//! serially over a ping-pong buffer pair. Each stage reads the full output
//! of the previous stage; the structure is a barrier-ordered pipeline, not
//! free concurrency, which is why the stages never fuse.
//!
//! Convention: e^{+i theta} twiddles (frequency -> spatial), unnormalized.
//! Applying the transform twice therefore yields `N^2 * x[-i mod N][-j mod N]`,
//! which is what the round-trip tests assert.

use std::f32::consts::PI;

use crate::error::{OceanError, Result};
use crate::grid::{Complex, ComplexGrid};

/// Reverse the low log2(n) bits of `i` (n a power of two).
pub fn bit_reverse(mut i: usize, mut n: usize) -> usize {
    let mut dst = 0;
    while (n >> 1) != 0 {
        dst = (dst << 1) + (i & 1);
        i >>= 1;
        n >>= 1;
    }
    dst
}

/// One butterfly stage over all N*N/2 pairs of the flat grid.
///
/// `istride = (N*N/2) >> bit_count`; pair addresses and twiddle indices
/// follow the decimation-in-time addressing of the compute kernel.
fn butterfly_pass(input: &[Complex], output: &mut [Complex], dim: usize, bit_count: u32) {
    let thread_count = dim * dim / 2;
    let istride = thread_count >> bit_count;

    for k in 0..thread_count {
        let m = k & (istride - 1);
        let addr = ((k - m) << 1) + m;

        let t = input[addr];
        let u = input[addr + istride];

        let w = bit_reverse((addr - m) / (istride << 1), 1 << bit_count);
        let angle = 2.0 * PI * w as f32 / (1u32 << (bit_count + 1)) as f32;
        let twiddle = Complex::from_angle(angle);

        let wu = twiddle * u;
        output[addr] = t + wu;
        output[addr + istride] = t - wu;
    }
}

/// Restore natural row order after the butterfly stages.
fn permute_rows_pass(input: &[Complex], output: &mut [Complex], dim: usize, table: &[usize]) {
    for i in 0..dim {
        let r = table[i];
        output[r * dim..r * dim + dim].copy_from_slice(&input[i * dim..i * dim + dim]);
    }
}

/// Swap row/column roles so the next butterfly half works on columns.
fn transpose_pass(input: &[Complex], output: &mut [Complex], dim: usize) {
    for i in 0..dim {
        for j in 0..dim {
            output[j * dim + i] = input[i * dim + j];
        }
    }
}

/// Borrow the ping-pong pair as (read side, write side).
fn pingpong(bufs: &mut [Vec<Complex>; 2], cur: usize) -> (&[Complex], &mut [Complex]) {
    let (a, b) = bufs.split_at_mut(1);
    if cur == 0 {
        (&a[0], &mut b[0])
    } else {
        (&b[0], &mut a[0])
    }
}

/// CPU reference FFT engine for N x N grids, N a power of two.
///
/// Holds the precomputed bit-reversal permutation table and one scratch grid
/// for ping-pong; both are sized at construction and live for the engine's
/// lifetime. A non-power-of-two N is rejected here, never mid-transform.
pub struct CpuFft {
    dim: usize,
    stages: u32,
    bit_reverse_table: Vec<usize>,
    scratch: Vec<Complex>,
}

impl CpuFft {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 || !dim.is_power_of_two() {
            return Err(OceanError::Configuration(format!(
                "FFT dimension must be a power of two, got {}",
                dim
            )));
        }

        let bit_reverse_table = (0..dim).map(|i| bit_reverse(i, dim)).collect();

        Ok(Self {
            dim,
            stages: dim.trailing_zeros(),
            bit_reverse_table,
            scratch: vec![Complex::ZERO; dim * dim],
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn bit_reverse_table(&self) -> &[usize] {
        &self.bit_reverse_table
    }

    /// 2D FFT of `src` into `dst`. `dst` contents are fully replaced; `src`
    /// is only read (the first stage reads it directly, every later stage
    /// ping-pongs between `dst`'s storage and the internal scratch).
    pub fn transform(&mut self, src: &ComplexGrid, dst: &mut ComplexGrid) -> Result<()> {
        if src.dim() != self.dim || dst.dim() != self.dim {
            return Err(OceanError::NotReady("grid does not match FFT engine size"));
        }

        let dim = self.dim;
        let mut bufs = [std::mem::take(&mut dst.data), std::mem::take(&mut self.scratch)];
        // bufs[cur] holds the most recent stage output; every pass writes
        // the other buffer and flips cur.
        let mut cur = 0usize;
        let mut first = true;

        // Two halves: rows, then (after transpose) the original columns.
        for _half in 0..2 {
            for stage in 0..self.stages {
                let (read, write) = pingpong(&mut bufs, cur);
                let read = if first { src.as_slice() } else { read };
                butterfly_pass(read, write, dim, stage);
                first = false;
                cur ^= 1;
            }

            {
                let (read, write) = pingpong(&mut bufs, cur);
                let read = if first { src.as_slice() } else { read };
                permute_rows_pass(read, write, dim, &self.bit_reverse_table);
                first = false;
                cur ^= 1;
            }

            {
                let (read, write) = pingpong(&mut bufs, cur);
                transpose_pass(read, write, dim);
                cur ^= 1;
            }
        }

        // Reconcile: the result must live in the caller's buffer. The fixed
        // stage count always lands it there, but the copy stage stays as the
        // contract's final reconciliation step.
        if cur != 0 {
            let (write, read) = bufs.split_at_mut(1);
            write[0].copy_from_slice(&read[0]);
        }

        let [front, back] = bufs;
        dst.data = front;
        self.scratch = back;
        Ok(())
    }

    /// Cross-check the stage pipeline against the direct DFT on a
    /// deterministic pseudo-random grid. Intended for small N; the direct
    /// transform is O(N^4).
    pub fn self_test(&mut self) -> Result<()> {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let n = self.dim;
        let mut rng = StdRng::seed_from_u64(0x0cea);
        let mut src = ComplexGrid::new(n);
        for cell in src.as_mut_slice() {
            *cell = Complex::new(rng.gen::<f32>() * 2.0 - 1.0, rng.gen::<f32>() * 2.0 - 1.0);
        }

        let mut fast = ComplexGrid::new(n);
        self.transform(&src, &mut fast)?;

        let mut direct = ComplexGrid::new(n);
        dft2d(&src, &mut direct);

        let scale = direct
            .as_slice()
            .iter()
            .map(|c| c.norm())
            .fold(1.0f32, f32::max);
        for (a, b) in fast.as_slice().iter().zip(direct.as_slice()) {
            if (*a - *b).norm() > 1e-3 * scale {
                return Err(OceanError::Configuration(format!(
                    "FFT self-test failed: {:?} vs direct {:?}",
                    a, b
                )));
            }
        }
        Ok(())
    }
}

/// Direct O(N^4) 2D discrete Fourier transform, same e^{+i theta}
/// convention as the fast path. The correctness oracle.
pub fn dft2d(src: &ComplexGrid, dst: &mut ComplexGrid) {
    let n = src.dim();
    for z in 0..n {
        for x in 0..n {
            let mut acc = Complex::ZERO;
            for m in 0..n {
                for l in 0..n {
                    // Reduce the phase index mod N before going to float
                    let idx = (m * z % n + l * x % n) % n;
                    let angle = 2.0 * PI * idx as f32 / n as f32;
                    acc = acc + src.get(m, l) * Complex::from_angle(angle);
                }
            }
            dst.set(z, x, acc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_grid(n: usize, seed: u64) -> ComplexGrid {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut grid = ComplexGrid::new(n);
        for cell in grid.as_mut_slice() {
            *cell = Complex::new(rng.gen::<f32>() * 2.0 - 1.0, rng.gen::<f32>() * 2.0 - 1.0);
        }
        grid
    }

    fn max_norm(grid: &ComplexGrid) -> f32 {
        grid.as_slice().iter().map(|c| c.norm()).fold(0.0, f32::max)
    }

    #[test]
    fn test_bit_reverse_involution() {
        for n in [1usize, 2, 4, 8, 64, 256] {
            for i in 0..n {
                assert_eq!(bit_reverse(bit_reverse(i, n), n), i);
            }
        }
    }

    #[test]
    fn test_bit_reverse_known_values() {
        // 3 bits: 0b001 -> 0b100, 0b011 -> 0b110
        assert_eq!(bit_reverse(1, 8), 4);
        assert_eq!(bit_reverse(3, 8), 6);
        assert_eq!(bit_reverse(0, 8), 0);
        assert_eq!(bit_reverse(7, 8), 7);
    }

    #[test]
    fn test_rejects_non_power_of_two() {
        assert!(CpuFft::new(0).is_err());
        assert!(CpuFft::new(3).is_err());
        assert!(CpuFft::new(12).is_err());
        assert!(CpuFft::new(8).is_ok());
    }

    #[test]
    fn test_dimension_one_is_identity() {
        let mut fft = CpuFft::new(1).unwrap();
        let mut src = ComplexGrid::new(1);
        src.set(0, 0, Complex::new(2.5, -1.5));
        let mut dst = ComplexGrid::new(1);
        fft.transform(&src, &mut dst).unwrap();
        assert_eq!(dst.get(0, 0), Complex::new(2.5, -1.5));
    }

    #[test]
    fn test_mismatched_grid_is_not_ready() {
        let mut fft = CpuFft::new(8).unwrap();
        let src = ComplexGrid::new(4);
        let mut dst = ComplexGrid::new(8);
        assert!(matches!(
            fft.transform(&src, &mut dst),
            Err(OceanError::NotReady(_))
        ));
    }

    #[test]
    fn test_matches_direct_dft() {
        let n = 8;
        let src = random_grid(n, 7);

        let mut fast = ComplexGrid::new(n);
        CpuFft::new(n).unwrap().transform(&src, &mut fast).unwrap();

        let mut direct = ComplexGrid::new(n);
        dft2d(&src, &mut direct);

        let tol = 1e-3 * max_norm(&direct).max(1.0);
        for (a, b) in fast.as_slice().iter().zip(direct.as_slice()) {
            assert!(
                (*a - *b).norm() < tol,
                "fast {:?} != direct {:?}",
                a,
                b
            );
        }
    }

    #[test]
    fn test_self_test_passes() {
        CpuFft::new(8).unwrap().self_test().unwrap();
    }

    #[test]
    fn test_matches_rustfft() {
        use rustfft::num_complex::Complex as RfComplex;
        use rustfft::FftPlanner;

        let n = 16;
        let src = random_grid(n, 99);

        let mut fast = ComplexGrid::new(n);
        CpuFft::new(n).unwrap().transform(&src, &mut fast).unwrap();

        // Row-column 2D inverse transform with rustfft (same unnormalized
        // e^{+i} convention).
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_inverse(n);
        let mut data: Vec<RfComplex<f32>> = src
            .as_slice()
            .iter()
            .map(|c| RfComplex::new(c.re, c.im))
            .collect();
        for row in data.chunks_mut(n) {
            fft.process(row);
        }
        let mut transposed = vec![RfComplex::new(0.0f32, 0.0); n * n];
        for i in 0..n {
            for j in 0..n {
                transposed[j * n + i] = data[i * n + j];
            }
        }
        for row in transposed.chunks_mut(n) {
            fft.process(row);
        }
        // Transpose back to row-major
        for i in 0..n {
            for j in 0..n {
                data[i * n + j] = transposed[j * n + i];
            }
        }

        let scale = data.iter().map(|c| c.norm()).fold(1.0f32, f32::max);
        for (a, b) in fast.as_slice().iter().zip(&data) {
            assert!((a.re - b.re).abs() < 1e-3 * scale);
            assert!((a.im - b.im).abs() < 1e-3 * scale);
        }
    }

    #[test]
    fn test_round_trip_law() {
        // F(F(x))[i][j] = N^2 * x[(N-i)%N][(N-j)%N]
        for n in [4usize, 8, 16, 64] {
            let src = random_grid(n, n as u64);
            let mut fft = CpuFft::new(n).unwrap();

            let mut once = ComplexGrid::new(n);
            fft.transform(&src, &mut once).unwrap();
            let mut twice = ComplexGrid::new(n);
            fft.transform(&once, &mut twice).unwrap();

            let norm = 1.0 / (n * n) as f32;
            for i in 0..n {
                for j in 0..n {
                    let back = twice.get((n - i) % n, (n - j) % n).scale(norm);
                    let orig = src.get(i, j);
                    assert!(
                        (back - orig).norm() < 1e-3,
                        "N={} cell ({},{}): {:?} != {:?}",
                        n,
                        i,
                        j,
                        back,
                        orig
                    );
                }
            }
        }
    }
}

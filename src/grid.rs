//! Grid containers shared by the spectrum and FFT stages.
//!
//! A `ComplexGrid` is the currency between every pipeline stage: N*N complex
//! values stored as a flat row-major sequence of (re, im) float pairs, the
//! exact layout the GPU kernels consume.

use bytemuck::{Pod, Zeroable};
use std::ops::{Add, Mul, Sub};

/// A single complex value, laid out as two consecutive f32 (matches the
/// `vec2<f32>` cells of the WGSL kernels).
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Complex {
    pub re: f32,
    pub im: f32,
}

impl Complex {
    pub const ZERO: Self = Self { re: 0.0, im: 0.0 };

    pub fn new(re: f32, im: f32) -> Self {
        Self { re, im }
    }

    /// Unit complex e^{i*angle}.
    pub fn from_angle(angle: f32) -> Self {
        Self {
            re: angle.cos(),
            im: angle.sin(),
        }
    }

    pub fn conj(self) -> Self {
        Self {
            re: self.re,
            im: -self.im,
        }
    }

    pub fn scale(self, s: f32) -> Self {
        Self {
            re: self.re * s,
            im: self.im * s,
        }
    }

    pub fn norm(self) -> f32 {
        (self.re * self.re + self.im * self.im).sqrt()
    }
}

impl Add for Complex {
    type Output = Complex;

    fn add(self, rhs: Complex) -> Complex {
        Complex::new(self.re + rhs.re, self.im + rhs.im)
    }
}

impl Sub for Complex {
    type Output = Complex;

    fn sub(self, rhs: Complex) -> Complex {
        Complex::new(self.re - rhs.re, self.im - rhs.im)
    }
}

impl Mul for Complex {
    type Output = Complex;

    fn mul(self, rhs: Complex) -> Complex {
        Complex::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }
}

/// N*N grid of complex values, flat row-major: `index(i, j) = i*N + j`.
#[derive(Clone, Debug)]
pub struct ComplexGrid {
    dim: usize,
    pub(crate) data: Vec<Complex>,
}

impl ComplexGrid {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            data: vec![Complex::ZERO; dim * dim],
        }
    }

    /// Wrap an existing flat row-major buffer (length must be dim*dim).
    pub(crate) fn from_data(dim: usize, data: Vec<Complex>) -> Self {
        debug_assert_eq!(data.len(), dim * dim);
        Self { dim, data }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        i * self.dim + j
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Complex {
        self.data[i * self.dim + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: Complex) {
        self.data[i * self.dim + j] = value;
    }

    pub fn fill_zero(&mut self) {
        self.data.fill(Complex::ZERO);
    }

    pub fn as_slice(&self) -> &[Complex] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [Complex] {
        &mut self.data
    }

    /// Raw bytes for GPU upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

/// N*N grid of scalar values (one real per cell), same row-major indexing.
#[derive(Clone, Debug)]
pub struct RealGrid {
    dim: usize,
    pub(crate) data: Vec<f32>,
}

impl RealGrid {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            data: vec![0.0; dim * dim],
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[i * self.dim + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f32) {
        self.data[i * self.dim + j] = value;
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }
}

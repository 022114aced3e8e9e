//! Oceansim - statistical (Tessendorf-style) ocean wave field synthesis.
//!
//! A frequency-domain wave spectrum is generated once from wind parameters,
//! evolved analytically per time step, and converted to a spatial-domain
//! height/displacement grid with a custom radix-2 FFT. The FFT exists in two
//! renditions: a serial CPU reference and a wgpu compute pipeline with the
//! same stage structure.

pub mod cli;
pub mod error;
pub mod fft;
pub mod gpu;
pub mod grid;
pub mod ocean;
pub mod params;
pub mod spectrum;

pub use error::OceanError;
pub use fft::CpuFft;
pub use grid::{Complex, ComplexGrid, RealGrid};
pub use ocean::OceanSimulation;
pub use params::OceanParams;
pub use spectrum::{evolve, initialize, BaseSpectrum};

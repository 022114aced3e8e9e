//! Command-line argument parsing for the demo binary.

use clap::Parser;
use glam::Vec2;

use crate::params::OceanParams;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "oceansim")]
#[command(about = "Statistical FFT ocean wave-field simulator", long_about = None)]
pub struct Args {
    /// Grid dimension N (power of two)
    #[arg(long, default_value_t = 64)]
    pub dimension: usize,

    /// Physical patch size in world units
    #[arg(long, default_value_t = 2000.0)]
    pub patch_size: f32,

    /// Wind speed (length-units per second)
    #[arg(long, default_value_t = 600.0)]
    pub wind_speed: f32,

    /// Wind direction x component
    #[arg(long, default_value_t = 0.8)]
    pub wind_x: f32,

    /// Wind direction y component
    #[arg(long, default_value_t = 0.6)]
    pub wind_y: f32,

    /// Wave amplitude scale
    #[arg(long, default_value_t = 0.35)]
    pub amplitude: f32,

    /// RNG seed for the base spectrum
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of simulation steps to run
    #[arg(long, default_value_t = 8)]
    pub steps: u32,

    /// Simulated time between steps (seconds)
    #[arg(long, default_value_t = 0.016)]
    pub dt: f32,

    /// Run the wgpu compute backend instead of the CPU reference
    #[arg(long)]
    pub gpu: bool,

    /// Cross-check the FFT pipeline against the direct DFT before running
    /// (O(N^4), only sensible for small dimensions)
    #[arg(long)]
    pub self_test: bool,

    /// Write the final height field as a grayscale PNG
    #[arg(long, value_name = "PATH")]
    pub output: Option<String>,
}

impl Args {
    pub fn to_params(&self) -> OceanParams {
        OceanParams {
            dimension: self.dimension,
            patch_size: self.patch_size,
            wind_speed: self.wind_speed,
            wind_dir: Vec2::new(self.wind_x, self.wind_y),
            wave_amplitude: self.amplitude,
            seed: self.seed,
            ..Default::default()
        }
    }
}

//! Oceansim demo binary: runs the spectral ocean simulation for a number of
//! steps and reports height-field statistics, optionally dumping the final
//! heights as a grayscale PNG.

use clap::Parser;
use image::{GrayImage, Luma};
use std::time::Instant;

use oceansim::cli::Args;
use oceansim::fft::CpuFft;
use oceansim::gpu::{GpuContext, GpuOceanSimulation};
use oceansim::grid::ComplexGrid;
use oceansim::ocean::OceanSimulation;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();
    let params = args.to_params();

    println!("Oceansim - FFT ocean height-field simulator");
    println!(
        "  Grid: {}x{}, patch {}",
        params.dimension, params.dimension, params.patch_size
    );
    println!(
        "  Wind: ({}, {}) @ {}, amplitude {}",
        params.wind_dir.x, params.wind_dir.y, params.wind_speed, params.wave_amplitude
    );

    if args.self_test {
        print!("  FFT self-test ... ");
        CpuFft::new(params.dimension)?.self_test()?;
        println!("ok");
    }

    let start = Instant::now();
    let heights = if args.gpu {
        let ctx = GpuContext::new_blocking()?;
        let mut sim = GpuOceanSimulation::new(ctx, params)?;
        run(&args, |t| {
            sim.step(t)?;
            Ok(report(sim.height_field()))
        })?;
        sim.height_field().clone()
    } else {
        let mut sim = OceanSimulation::new(params)?;
        run(&args, |t| {
            sim.step(t)?;
            Ok(report(sim.height_field()))
        })?;
        sim.height_field().clone()
    };
    let elapsed = start.elapsed();

    println!(
        "  {} steps in {:.2}ms ({})",
        args.steps,
        elapsed.as_secs_f64() * 1000.0,
        if args.gpu { "gpu" } else { "cpu" }
    );

    if let Some(path) = &args.output {
        save_heightmap(&heights, path)?;
        println!("  Output: {}", path);
    }

    Ok(())
}

/// Drive the per-step closure over the configured schedule.
fn run(
    args: &Args,
    mut step: impl FnMut(f32) -> Result<(f32, f32), Box<dyn std::error::Error>>,
) -> Result<(), Box<dyn std::error::Error>> {
    for s in 0..args.steps {
        let t = s as f32 * args.dt;
        let (min, max) = step(t)?;
        log::debug!("step {} t={:.3}: height range [{:.4}, {:.4}]", s, t, min, max);
    }
    Ok(())
}

fn report(heights: &ComplexGrid) -> (f32, f32) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for c in heights.as_slice() {
        min = min.min(c.re);
        max = max.max(c.re);
    }
    (min, max)
}

/// Normalize heights to 0..255 and save as grayscale PNG.
fn save_heightmap(heights: &ComplexGrid, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let n = heights.dim() as u32;
    let (min, max) = report(heights);
    let range = (max - min).max(1e-12);

    let mut img = GrayImage::new(n, n);
    for i in 0..n {
        for j in 0..n {
            let h = heights.get(i as usize, j as usize).re;
            let gray = ((h - min) / range * 255.0).clamp(0.0, 255.0) as u8;
            img.put_pixel(j, i, Luma([gray]));
        }
    }
    img.save(path)?;
    Ok(())
}

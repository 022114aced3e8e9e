//! GPU compute backend: the dispatch-shaped rendition of the pipeline.
//!
//! Every stage is a compute kernel over a full cell range; stages are
//! strictly ordered (each dispatch's input is the complete output of the
//! previous one) and never fused.

mod fft;
mod ocean;
mod spectrum;

pub use fft::GpuFft;
pub use ocean::GpuOceanSimulation;
pub use spectrum::GpuSpectrum;

use crate::error::{OceanError, Result};
use crate::grid::Complex;

/// Headless wgpu device/queue pair shared by the compute pipelines.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl GpuContext {
    pub async fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| OceanError::Gpu("no suitable GPU adapter".into()))?;

        log::info!("gpu adapter: {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Ocean Compute Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .map_err(|e| OceanError::Gpu(format!("failed to request device: {}", e)))?;

        Ok(Self { device, queue })
    }

    /// Blocking constructor for non-async callers.
    pub fn new_blocking() -> Result<Self> {
        pollster::block_on(Self::new())
    }

    /// Map a staging buffer and copy its first `len_bytes` back to the host.
    pub(crate) fn read_back(&self, staging: &wgpu::Buffer, len_bytes: u64) -> Result<Vec<u8>> {
        let slice = staging.slice(..len_bytes);
        let (sender, receiver) = futures::channel::oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        self.device.poll(wgpu::Maintain::Wait);

        pollster::block_on(receiver)
            .map_err(|_| OceanError::Gpu("readback channel dropped".into()))?
            .map_err(|e| OceanError::Gpu(format!("buffer map failed: {:?}", e)))?;

        let data = slice.get_mapped_range().to_vec();
        staging.unmap();
        Ok(data)
    }

    /// Read a staging buffer back as complex cells.
    pub(crate) fn read_back_complex(
        &self,
        staging: &wgpu::Buffer,
        len_bytes: u64,
    ) -> Result<Vec<Complex>> {
        let bytes = self.read_back(staging, len_bytes)?;
        // pod_collect handles the 1-byte alignment of the raw readback
        Ok(bytemuck::pod_collect_to_vec(&bytes))
    }
}

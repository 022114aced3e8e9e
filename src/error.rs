//! Error taxonomy for the simulation core.

use thiserror::Error;

/// Errors surfaced by the ocean simulation core.
///
/// Configuration problems are detected at construction time and refuse to
/// build the offending component. Missing or mismatched grids surface as
/// `NotReady` instead of being silently skipped, so callers can tell
/// "nothing to do yet" apart from a lost update.
#[derive(Debug, Error)]
pub enum OceanError {
    /// Invalid simulation parameters (dimension not a power of two,
    /// non-positive patch size, degenerate wind direction).
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A required grid or scratch buffer is absent or of the wrong size.
    #[error("simulation not ready: {0}")]
    NotReady(&'static str),

    /// GPU device acquisition, dispatch, or readback failure.
    #[error("gpu error: {0}")]
    Gpu(String),
}

pub type Result<T> = std::result::Result<T, OceanError>;

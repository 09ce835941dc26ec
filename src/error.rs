//! Typed errors at the core's few fallible boundaries. The correlation
//! kernels themselves (mixer, dot-product, correlators) stay infallible
//! pure functions; `Result` only shows up here, at I/O and argument
//! validation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GnssCoreError {
    #[error("FFT plan cache full ({0} entries); cannot cache a plan for a new transform length")]
    PlanCacheFull(usize),

    #[error("IF data read error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported IF sample format: {0}")]
    UnsupportedSampleFormat(String),

    #[error("window [{ix}, {ix}+{len}) exceeds buffer capacity {capacity}")]
    InvalidWindow {
        ix: usize,
        len: usize,
        capacity: usize,
    },

    #[error("unknown PRN {0}")]
    UnknownPrn(u8),
}

pub type Result<T> = std::result::Result<T, GnssCoreError>;

//! DAB Core - sample types and receiver front end
//!
//! This crate provides the complex sample type, fixed-length symbol
//! buffers, the FFT front end and IQ file I/O shared by the DAB
//! synchronisation crates.

pub mod buffer;
pub mod fft;
pub mod iq;
pub mod error;

pub use error::{CoreError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        buffer::{Complex, SymbolBuffer},
        fft::{FftProcessor, FftConfig},
        error::{CoreError, Result},
    };
}

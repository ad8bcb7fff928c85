//! Error types for DAB Core

use thiserror::Error;

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid sample rate: {rate}")]
    InvalidSampleRate { rate: f64 },
    
    #[error("Buffer size mismatch: expected {expected}, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },
    
    #[error("Invalid symbol length: {msg}")]
    InvalidSymbolLength { msg: String },
    
    #[error("FFT error: {msg}")]
    FftError { msg: String },
    
    #[error("Malformed IQ data: {len} bytes is not a whole number of f32 I/Q pairs")]
    MalformedIq { len: usize },
    
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for DAB Core operations
pub type Result<T> = std::result::Result<T, CoreError>;

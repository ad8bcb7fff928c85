//! Error types for DAB Sync

use thiserror::Error;

/// Synchronisation error types
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Invalid carrier geometry: {msg}")]
    InvalidGeometry { msg: String },
    
    #[error("Invalid parameters: {msg}")]
    InvalidParameters { msg: String },
    
    #[error("Unsupported DAB mode: {mode}")]
    UnsupportedMode { mode: String },
    
    #[error("Symbol length mismatch: expected {expected}, got {actual}")]
    SymbolLengthMismatch { expected: usize, actual: usize },
    
    #[error("Missing stream buffer on port {port}")]
    MissingBuffer { port: usize },
    
    #[error("Stream buffer on port {port} too short: expected at least {expected}, got {actual}")]
    BufferTooShort { port: usize, expected: usize, actual: usize },
    
    #[error("Configuration error: {msg}")]
    Config { msg: String },
    
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    
    #[error("Core error: {0}")]
    Core(#[from] dab_core::CoreError),
}

/// Result type for DAB Sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

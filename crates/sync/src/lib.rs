//! DAB Sync - coarse frequency synchronisation
//!
//! This crate estimates the integer subcarrier offset of a mistuned DAB
//! signal from the energy pattern of its reference symbol and rotates
//! every frequency-domain OFDM symbol back onto the expected carriers.

pub mod energy;
pub mod geometry;
pub mod coarse;
pub mod stream;
pub mod config;
pub mod error;

pub use error::{SyncError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        energy::mag_squared,
        geometry::{CarrierGeometry, DabMode},
        coarse::{CoarseEstimate, CoarseFrequencyCorrector, ReferenceSymbol},
        stream::{StreamBlock, SymbolProcessor},
        config::CorrectorConfig,
        error::{SyncError, Result},
    };
}

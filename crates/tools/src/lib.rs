//! DAB Tools library

pub mod correct;
pub mod synth;
pub mod common;

pub use correct::{CorrectConfig, CoarseCorrection, CorrectionReport, EstimateRecord};
pub use synth::SynthConfig;
pub use common::{SampleFileFormat, init_logging};

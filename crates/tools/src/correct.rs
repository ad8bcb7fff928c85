//! Coarse frequency correction of recorded symbol streams

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

use dab_core::buffer::{remove_cyclic_prefix, Complex, SymbolBuffer};
use dab_core::fft::{fft_shift, FftConfig, FftProcessor};
use dab_sync::geometry::DAB_SAMPLE_RATE;
use dab_sync::prelude::*;

/// Correction configuration
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "correct")]
#[command(about = "Estimate and remove the integer carrier offset of DAB symbols")]
pub struct CorrectConfig {
    /// Input file (cf32 or stereo WAV), one OFDM symbol after another
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file for the corrected symbols
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// DAB transmission mode (I-IV or 1-4)
    #[arg(short, long, default_value = "I")]
    pub mode: String,

    /// Corrector configuration file (TOML or JSON); replaces --mode
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Input holds time-domain symbols with cyclic prefix, null symbols already removed
    #[arg(long)]
    pub time_domain: bool,

    /// Write only the used carriers of each symbol
    #[arg(long)]
    pub extract: bool,

    /// Largest offset searched, in carriers
    #[arg(long)]
    pub max_offset: Option<usize>,

    /// Re-estimate on every symbol
    #[arg(long)]
    pub every_symbol: bool,

    /// Sample rate in Hz, used to express offsets in Hz
    #[arg(long, default_value_t = DAB_SAMPLE_RATE)]
    pub sample_rate: f64,

    /// Write the estimate report as JSON
    #[arg(long)]
    pub report: Option<PathBuf>,
}

impl Default for CorrectConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("symbols.cf32"),
            output: None,
            mode: "I".to_string(),
            config: None,
            time_domain: false,
            extract: false,
            max_offset: None,
            every_symbol: false,
            sample_rate: DAB_SAMPLE_RATE,
            report: None,
        }
    }
}

impl CorrectConfig {
    /// Corrector configuration from the file, or from the mode and flags
    pub fn corrector_config(&self) -> Result<CorrectorConfig> {
        let mut config = match &self.config {
            Some(path) => CorrectorConfig::from_file(path)
                .with_context(|| format!("Failed to load corrector config: {:?}", path))?,
            None => CorrectorConfig::from_mode(self.mode.parse::<DabMode>()?),
        };

        if self.max_offset.is_some() {
            config.max_offset = self.max_offset;
        }
        if self.every_symbol {
            config.estimate_every_symbol = true;
        }

        Ok(config)
    }
}

/// One offset estimate taken from a reference symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateRecord {
    /// Index of the symbol in the input stream
    pub symbol_index: usize,
    pub delta_f: i64,
    pub offset_hz: f64,
    pub concentration: f64,
}

/// Result of correcting a stream
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorrectionReport {
    pub symbols: usize,
    pub estimates: Vec<EstimateRecord>,
}

impl CorrectionReport {
    /// Offset applied to the last symbol, if any estimate was taken
    pub fn final_delta_f(&self) -> Option<i64> {
        self.estimates.last().map(|e| e.delta_f)
    }
}

/// Corrector plus the optional time-domain front end
pub struct CoarseCorrection {
    block: StreamBlock<CoarseFrequencyCorrector>,
    front_end: Option<FftProcessor>,
    sample_rate: f64,
    extract: bool,
}

impl CoarseCorrection {
    pub fn new(config: &CorrectConfig) -> Result<Self> {
        let corrector = config.corrector_config()?.build()?;
        let geometry = *corrector.geometry();

        let front_end = if config.time_domain {
            let fft_config = FftConfig::new(geometry.fft_length(), config.sample_rate)?;
            Some(FftProcessor::new(fft_config)?)
        } else {
            None
        };

        info!(
            "Correcting {} bin symbols, search range {:?}",
            geometry.fft_length(),
            corrector.search_range()
        );

        Ok(Self {
            block: StreamBlock::new(corrector),
            front_end,
            sample_rate: config.sample_rate,
            extract: config.extract,
        })
    }

    pub fn corrector(&self) -> &CoarseFrequencyCorrector {
        self.block.processor()
    }

    /// Samples per input symbol
    pub fn input_symbol_len(&self) -> usize {
        let geometry = self.corrector().geometry();
        match self.front_end {
            Some(_) => geometry.symbol_length(),
            None => geometry.fft_length(),
        }
    }

    /// Correct every whole symbol in `samples`
    pub fn run(&mut self, samples: &[Complex]) -> Result<(Vec<Complex>, CorrectionReport)> {
        let input_len = self.input_symbol_len();
        let whole = samples.len() - samples.len() % input_len;
        if whole < samples.len() {
            warn!(
                "Ignoring {} trailing samples (not a whole symbol)",
                samples.len() - whole
            );
        }
        let input = SymbolBuffer::from_samples(samples[..whole].to_vec(), input_len)?;

        let geometry = *self.corrector().geometry();
        let fft_length = geometry.fft_length();
        let carrier_spacing = self.sample_rate / fft_length as f64;
        let out_len = if self.extract { geometry.num_carriers() } else { fft_length };

        let mut output = SymbolBuffer::new(input.num_symbols(), out_len)?;
        let mut bins = vec![Complex::default(); fft_length];
        let mut corrected = vec![Complex::default(); fft_length];
        let mut report = CorrectionReport::default();

        for (index, symbol) in input.symbols().enumerate() {
            match self.front_end.as_mut() {
                Some(fft) => {
                    let body = remove_cyclic_prefix(symbol, fft_length, geometry.cp_length())?;
                    fft.fft(body, &mut bins)?;
                    fft_shift(&mut bins);
                }
                None => bins.copy_from_slice(symbol),
            }

            let is_reference = {
                let corrector = self.block.processor();
                corrector.reference().is_reference(corrector.symbol_num())
            };

            self.block.work(1, &[&bins[..]], &mut [&mut corrected[..]])?;

            if is_reference {
                if let Some(estimate) = self.block.processor().last_estimate() {
                    report.estimates.push(EstimateRecord {
                        symbol_index: index,
                        delta_f: estimate.delta_f,
                        offset_hz: estimate.delta_f as f64 * carrier_spacing,
                        concentration: estimate.concentration(),
                    });
                }
            }

            let slot = output
                .symbol_mut(index)
                .context("output symbol out of range")?;
            if self.extract {
                geometry.extract_carriers(&corrected, slot)?;
            } else {
                slot.copy_from_slice(&corrected);
            }
        }

        report.symbols = input.num_symbols();
        Ok((output.into_inner(), report))
    }
}

/// Run the `correct` command end to end
pub fn run_correct(config: &CorrectConfig) -> Result<CorrectionReport> {
    let samples = crate::common::read_samples(&config.input)?;
    let mut correction = CoarseCorrection::new(config)?;
    let (corrected, report) = correction.run(&samples)?;

    if let Some(output) = &config.output {
        crate::common::write_samples(output, &corrected, config.sample_rate)?;
    }

    if let Some(path) = &config.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {:?}", path))?;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{generate, SynthConfig};

    fn synth(offset: i64, frames: usize, time_domain: bool) -> Vec<Complex> {
        let config = SynthConfig {
            mode: "II".to_string(),
            offset,
            frames,
            time_domain,
            seed: Some(7),
            ..SynthConfig::default()
        };
        generate(&config).unwrap()
    }

    fn correct_config(time_domain: bool) -> CorrectConfig {
        CorrectConfig {
            mode: "II".to_string(),
            time_domain,
            ..CorrectConfig::default()
        }
    }

    #[test]
    fn test_correct_config_default() {
        let config = CorrectConfig::default();
        let corrector = config.corrector_config().unwrap();
        assert_eq!(corrector.mode, Some(DabMode::I));
        assert!(!corrector.estimate_every_symbol);
    }

    #[test]
    fn test_flags_override_file_settings() {
        let config = CorrectConfig {
            max_offset: Some(10),
            every_symbol: true,
            ..correct_config(false)
        };
        let corrector = config.corrector_config().unwrap();
        assert_eq!(corrector.max_offset, Some(10));
        assert!(corrector.estimate_every_symbol);
    }

    #[test]
    fn test_recovers_offset_in_frequency_domain() {
        let samples = synth(-9, 2, false);
        let mut correction = CoarseCorrection::new(&correct_config(false)).unwrap();

        let (corrected, report) = correction.run(&samples).unwrap();

        assert_eq!(report.symbols, 2 * DabMode::II.symbols_per_frame());
        assert_eq!(report.estimates.len(), 2);
        assert_eq!(report.estimates[1].symbol_index, DabMode::II.symbols_per_frame());
        assert!(report.estimates.iter().all(|e| e.delta_f == -9));
        assert!((report.estimates[0].offset_hz + 36_000.0).abs() < 1e-6);
        assert_eq!(corrected.len(), samples.len());

        let expected = synth(0, 2, false);
        assert_eq!(corrected, expected);
    }

    #[test]
    fn test_recovers_offset_in_time_domain() {
        let samples = synth(5, 1, true);
        let mut correction = CoarseCorrection::new(&correct_config(true)).unwrap();
        assert_eq!(correction.input_symbol_len(), 512 + 126);

        let (_, report) = correction.run(&samples).unwrap();
        assert_eq!(report.final_delta_f(), Some(5));
    }

    #[test]
    fn test_extract_writes_used_carriers_only() {
        let samples = synth(3, 1, false);
        let config = CorrectConfig {
            extract: true,
            ..correct_config(false)
        };
        let mut correction = CoarseCorrection::new(&config).unwrap();

        let (carriers, _) = correction.run(&samples).unwrap();
        assert_eq!(carriers.len(), DabMode::II.symbols_per_frame() * 384);
        assert!(carriers.iter().all(|c| (c.magnitude() - 1.0).abs() < 1e-9));
    }

    #[test]
    fn test_trailing_partial_symbol_ignored() {
        let mut samples = synth(0, 1, false);
        samples.extend(vec![Complex::default(); 100]);
        let mut correction = CoarseCorrection::new(&correct_config(false)).unwrap();

        let (corrected, report) = correction.run(&samples).unwrap();
        assert_eq!(report.symbols, DabMode::II.symbols_per_frame());
        assert_eq!(corrected.len(), samples.len() - 100);
    }

    #[test]
    fn test_run_correct_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.cf32");
        let output = dir.path().join("out.cf32");
        let report_path = dir.path().join("report.json");
        crate::common::write_samples(&input, &synth(2, 1, false), DAB_SAMPLE_RATE).unwrap();

        let config = CorrectConfig {
            input,
            output: Some(output.clone()),
            report: Some(report_path.clone()),
            ..correct_config(false)
        };
        let report = run_correct(&config).unwrap();

        assert_eq!(report.final_delta_f(), Some(2));
        assert!(output.exists());
        let saved: CorrectionReport =
            serde_json::from_str(&std::fs::read_to_string(report_path).unwrap()).unwrap();
        assert_eq!(saved.estimates, report.estimates);
    }
}

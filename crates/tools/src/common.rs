//! Common utilities for tools: sample files and logging

use anyhow::{Context, Result};
use dab_core::buffer::Complex;
use dab_core::iq;
use std::path::Path;
use tracing::info;

/// Sample file format detection and handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFileFormat {
    /// Interleaved little-endian f32 I/Q
    Raw,
    /// Two-channel WAV, left = I, right = Q
    Wav,
}

impl SampleFileFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("wav") => SampleFileFormat::Wav,
            _ => SampleFileFormat::Raw, // cf32, iq, raw, ...
        }
    }
}

/// Read complex samples, picking the format from the extension
pub fn read_samples(path: &Path) -> Result<Vec<Complex>> {
    let samples = match SampleFileFormat::from_path(path) {
        SampleFileFormat::Raw => iq::read_file(path)
            .with_context(|| format!("Failed to read IQ file: {:?}", path))?,
        SampleFileFormat::Wav => read_wav_iq(path)?,
    };

    info!("Read {} samples from {:?}", samples.len(), path);
    Ok(samples)
}

/// Write complex samples, picking the format from the extension
pub fn write_samples(path: &Path, samples: &[Complex], sample_rate: f64) -> Result<()> {
    match SampleFileFormat::from_path(path) {
        SampleFileFormat::Raw => iq::write_file(path, samples)
            .with_context(|| format!("Failed to write IQ file: {:?}", path))?,
        SampleFileFormat::Wav => write_wav_iq(path, samples, sample_rate)?,
    }

    info!("Wrote {} samples to {:?}", samples.len(), path);
    Ok(())
}

fn read_wav_iq(path: &Path) -> Result<Vec<Complex>> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to open WAV file: {:?}", path))?;

    let spec = reader.spec();
    if spec.channels != 2 {
        anyhow::bail!(
            "WAV file {:?} has {} channel(s), expected 2 (I and Q)",
            path,
            spec.channels
        );
    }

    let values: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|v| v as f64))
            .collect::<Result<_, _>>()
            .context("Failed to read WAV samples")?,
        hound::SampleFormat::Int => {
            let scale = int_full_scale(spec.bits_per_sample)
                .with_context(|| format!("Malformed WAV header in {:?}", path))?;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64 / scale))
                .collect::<Result<_, _>>()
                .context("Failed to read WAV samples")?
        }
    };

    Ok(values
        .chunks_exact(2)
        .map(|pair| Complex::new(pair[0], pair[1]))
        .collect())
}

/// Full-scale value of a signed integer sample of `bits` bits
fn int_full_scale(bits: u16) -> Result<f64> {
    match bits.checked_sub(1) {
        Some(shift) if shift < 32 => Ok((1i64 << shift) as f64),
        _ => anyhow::bail!("unsupported integer sample width of {} bits", bits),
    }
}

fn write_wav_iq(path: &Path, samples: &[Complex], sample_rate: f64) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: sample_rate as u32,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {:?}", path))?;

    for sample in samples {
        writer.write_sample(sample.real as f32)?;
        writer.write_sample(sample.imag as f32)?;
    }

    writer.finalize()?;
    Ok(())
}

/// Initialize logging: WARN by default, INFO when verbose, DEBUG when debugging
pub fn init_logging(verbose: bool, debug: bool) {
    let log_level = if debug {
        tracing::Level::DEBUG
    } else if verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();
}

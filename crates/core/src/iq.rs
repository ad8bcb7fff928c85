//! Interleaved little-endian `f32` IQ sample files
//!
//! This is the raw format produced by most SDR front ends (`cf32_le`):
//! each sample is an I value followed by a Q value, 8 bytes per sample.

use crate::{buffer::Complex, CoreError, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

/// Bytes per complex sample
pub const BYTES_PER_SAMPLE: usize = 8;

/// Decode every sample from `reader`
pub fn read_samples<R: Read>(mut reader: R) -> Result<Vec<Complex>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    if bytes.len() % BYTES_PER_SAMPLE != 0 {
        return Err(CoreError::MalformedIq { len: bytes.len() });
    }

    let samples = bytes
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|chunk| {
            let i = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            let q = f32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
            Complex::new(i as f64, q as f64)
        })
        .collect();

    Ok(samples)
}

/// Encode `samples` to `writer`
pub fn write_samples<W: Write>(mut writer: W, samples: &[Complex]) -> Result<()> {
    for sample in samples {
        writer.write_all(&(sample.real as f32).to_le_bytes())?;
        writer.write_all(&(sample.imag as f32).to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a whole IQ file
pub fn read_file(path: &Path) -> Result<Vec<Complex>> {
    let file = File::open(path)?;
    let samples = read_samples(BufReader::new(file))?;
    debug!("Read {} IQ samples from {:?}", samples.len(), path);
    Ok(samples)
}

/// Write an IQ file, replacing any existing content
pub fn write_file(path: &Path, samples: &[Complex]) -> Result<()> {
    let file = File::create(path)?;
    write_samples(BufWriter::new(file), samples)?;
    debug!("Wrote {} IQ samples to {:?}", samples.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_layout_is_i_then_q() {
        let mut bytes = Vec::new();
        write_samples(&mut bytes, &[Complex::new(1.0, -2.0)]).unwrap();
        assert_eq!(bytes.len(), BYTES_PER_SAMPLE);
        assert_eq!(&bytes[..4], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[4..], &(-2.0f32).to_le_bytes());
    }

    #[test]
    fn test_truncated_input_rejected() {
        let bytes = vec![0u8; BYTES_PER_SAMPLE + 3];
        let result = read_samples(Cursor::new(bytes));
        assert!(matches!(result, Err(CoreError::MalformedIq { len: 11 })));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("symbols.cf32");
        let samples = vec![Complex::new(0.5, 0.25), Complex::new(-3.0, 9.0)];

        write_file(&path, &samples).unwrap();
        let loaded = read_file(&path).unwrap();
        assert_eq!(loaded, samples);
    }
}

//! FFT processing wrapper

use crate::{buffer::Complex, CoreError, Result};
use rustfft::{FftPlanner, num_complex::Complex64};
use std::sync::Arc;

/// FFT configuration
#[derive(Debug, Clone)]
pub struct FftConfig {
    pub size: usize,
    pub sample_rate: f64,
}

impl FftConfig {
    pub fn new(size: usize, sample_rate: f64) -> Result<Self> {
        if size == 0 || !size.is_power_of_two() {
            return Err(CoreError::FftError {
                msg: format!("FFT size must be a power of 2, got {}", size),
            });
        }

        if sample_rate <= 0.0 {
            return Err(CoreError::InvalidSampleRate { rate: sample_rate });
        }

        Ok(Self { size, sample_rate })
    }
}

/// FFT processor turning time-domain OFDM symbols into frequency-domain symbols and back
pub struct FftProcessor {
    config: FftConfig,
    fft: Arc<dyn rustfft::Fft<f64>>,
    ifft: Arc<dyn rustfft::Fft<f64>>,
    work: Vec<Complex64>,
}

impl FftProcessor {
    /// Create a new FFT processor
    pub fn new(config: FftConfig) -> Result<Self> {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(config.size);
        let ifft = planner.plan_fft_inverse(config.size);
        let work = vec![Complex64::new(0.0, 0.0); config.size];

        Ok(Self {
            config,
            fft,
            ifft,
            work,
        })
    }

    fn check_sizes(&self, input: &[Complex], output: &[Complex]) -> Result<()> {
        if input.len() != self.config.size || output.len() != self.config.size {
            return Err(CoreError::BufferSizeMismatch {
                expected: self.config.size,
                actual: if input.len() != self.config.size { input.len() } else { output.len() },
            });
        }
        Ok(())
    }

    /// Perform forward FFT
    pub fn fft(&mut self, input: &[Complex], output: &mut [Complex]) -> Result<()> {
        self.check_sizes(input, output)?;

        for (w, c) in self.work.iter_mut().zip(input) {
            *w = Complex64::new(c.real, c.imag);
        }

        self.fft.process(&mut self.work);

        for (o, c) in output.iter_mut().zip(&self.work) {
            *o = Complex::new(c.re, c.im);
        }

        Ok(())
    }

    /// Perform inverse FFT, normalised by `1/N`
    pub fn ifft(&mut self, input: &[Complex], output: &mut [Complex]) -> Result<()> {
        self.check_sizes(input, output)?;

        for (w, c) in self.work.iter_mut().zip(input) {
            *w = Complex64::new(c.real, c.imag);
        }

        self.ifft.process(&mut self.work);

        let scale = 1.0 / self.config.size as f64;
        for (o, c) in output.iter_mut().zip(&self.work) {
            *o = Complex::new(c.re * scale, c.im * scale);
        }

        Ok(())
    }
}

/// Move the DC bin to the centre (`numpy.fft.fftshift`)
pub fn fft_shift(bins: &mut [Complex]) {
    let half = bins.len() / 2;
    bins.rotate_right(half);
}

/// Undo [`fft_shift`]
pub fn ifft_shift(bins: &mut [Complex]) {
    let half = bins.len() / 2;
    bins.rotate_left(half);
}

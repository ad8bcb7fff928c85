//! Complex samples and fixed-length symbol buffers

use crate::{CoreError, Result};
use std::ops::{Add, AddAssign, Index, IndexMut, Mul, Sub};

/// Complex number representation for IQ data
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Complex {
    pub real: f64,
    pub imag: f64,
}

impl Complex {
    pub fn new(real: f64, imag: f64) -> Self {
        Self { real, imag }
    }

    /// Unit phasor `e^{j*phase}`
    pub fn from_phase(phase: f64) -> Self {
        Self::new(phase.cos(), phase.sin())
    }

    pub fn magnitude(&self) -> f64 {
        self.norm_sqr().sqrt()
    }

    pub fn norm_sqr(&self) -> f64 {
        self.real * self.real + self.imag * self.imag
    }

    pub fn phase(&self) -> f64 {
        self.imag.atan2(self.real)
    }
}

impl Add for Complex {
    type Output = Complex;

    fn add(self, rhs: Complex) -> Self::Output {
        Complex::new(self.real + rhs.real, self.imag + rhs.imag)
    }
}

impl AddAssign for Complex {
    fn add_assign(&mut self, rhs: Complex) {
        self.real += rhs.real;
        self.imag += rhs.imag;
    }
}

impl Sub for Complex {
    type Output = Complex;

    fn sub(self, rhs: Complex) -> Self::Output {
        Complex::new(self.real - rhs.real, self.imag - rhs.imag)
    }
}

impl Mul for Complex {
    type Output = Complex;

    fn mul(self, rhs: Complex) -> Self::Output {
        Complex::new(
            self.real * rhs.real - self.imag * rhs.imag,
            self.real * rhs.imag + self.imag * rhs.real,
        )
    }
}

impl Mul<f64> for Complex {
    type Output = Complex;

    fn mul(self, rhs: f64) -> Self::Output {
        Complex::new(self.real * rhs, self.imag * rhs)
    }
}

/// A run of OFDM symbols stored back to back, each `symbol_len` samples long
#[derive(Debug, Clone)]
pub struct SymbolBuffer {
    data: Vec<Complex>,
    symbol_len: usize,
}

impl SymbolBuffer {
    /// Create a zeroed buffer holding `num_symbols` symbols
    pub fn new(num_symbols: usize, symbol_len: usize) -> Result<Self> {
        if symbol_len == 0 {
            return Err(CoreError::InvalidSymbolLength {
                msg: "symbol length must be greater than 0".to_string(),
            });
        }

        Ok(Self {
            data: vec![Complex::default(); num_symbols * symbol_len],
            symbol_len,
        })
    }

    /// Wrap existing samples; the sample count must be a whole number of symbols
    pub fn from_samples(data: Vec<Complex>, symbol_len: usize) -> Result<Self> {
        if symbol_len == 0 {
            return Err(CoreError::InvalidSymbolLength {
                msg: "symbol length must be greater than 0".to_string(),
            });
        }

        if data.len() % symbol_len != 0 {
            return Err(CoreError::InvalidSymbolLength {
                msg: format!(
                    "{} samples is not a multiple of the symbol length {}",
                    data.len(),
                    symbol_len
                ),
            });
        }

        Ok(Self { data, symbol_len })
    }

    /// Samples per symbol
    pub fn symbol_len(&self) -> usize {
        self.symbol_len
    }

    /// Number of complete symbols held
    pub fn num_symbols(&self) -> usize {
        self.data.len() / self.symbol_len
    }

    /// Borrow symbol `index`
    pub fn symbol(&self, index: usize) -> Option<&[Complex]> {
        let start = index.checked_mul(self.symbol_len)?;
        self.data.get(start..start + self.symbol_len)
    }

    /// Mutably borrow symbol `index`
    pub fn symbol_mut(&mut self, index: usize) -> Option<&mut [Complex]> {
        let start = index.checked_mul(self.symbol_len)?;
        self.data.get_mut(start..start + self.symbol_len)
    }

    /// Iterate over the symbols in order
    pub fn symbols(&self) -> std::slice::ChunksExact<'_, Complex> {
        self.data.chunks_exact(self.symbol_len)
    }

    pub fn into_inner(self) -> Vec<Complex> {
        self.data
    }
}

impl Index<usize> for SymbolBuffer {
    type Output = Complex;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<usize> for SymbolBuffer {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.data[index]
    }
}

/// Prepend the last `cp_length` samples of `symbol` as a cyclic prefix
pub fn add_cyclic_prefix(symbol: &[Complex], cp_length: usize) -> Result<Vec<Complex>> {
    if cp_length > symbol.len() {
        return Err(CoreError::InvalidSymbolLength {
            msg: format!(
                "cyclic prefix of {} exceeds symbol length {}",
                cp_length,
                symbol.len()
            ),
        });
    }

    let mut result = Vec::with_capacity(symbol.len() + cp_length);
    result.extend_from_slice(&symbol[symbol.len() - cp_length..]);
    result.extend_from_slice(symbol);
    Ok(result)
}

/// Strip the cyclic prefix from a time-domain symbol of `cp_length + fft_length` samples
pub fn remove_cyclic_prefix(
    received: &[Complex],
    fft_length: usize,
    cp_length: usize,
) -> Result<&[Complex]> {
    let expected = fft_length + cp_length;
    if received.len() != expected {
        return Err(CoreError::BufferSizeMismatch {
            expected,
            actual: received.len(),
        });
    }
    Ok(&received[cp_length..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complex_operations() {
        let c = Complex::new(3.0, 4.0);
        assert_eq!(c.magnitude(), 5.0);
        assert_eq!(c.norm_sqr(), 25.0);
        assert!((c.phase() - 0.9272952180016122).abs() < 1e-10);
        assert_eq!(c * Complex::new(3.0, -4.0), Complex::new(25.0, 0.0));
    }

    #[test]
    fn test_symbol_buffer_from_samples() {
        let data = vec![Complex::new(1.0, 0.0); 12];
        let buffer = SymbolBuffer::from_samples(data, 4).unwrap();
        assert_eq!(buffer.num_symbols(), 3);
        assert_eq!(buffer.symbols().count(), 3);
        assert!(buffer.symbol(2).is_some());
        assert!(buffer.symbol(3).is_none());
    }

    #[test]
    fn test_symbol_buffer_rejects_partial_symbol() {
        let data = vec![Complex::default(); 10];
        assert!(SymbolBuffer::from_samples(data, 4).is_err());
        assert!(SymbolBuffer::new(2, 0).is_err());
    }

    #[test]
    fn test_cyclic_prefix() {
        let symbol: Vec<Complex> = (0..8).map(|i| Complex::new(i as f64, 0.0)).collect();
        let with_cp = add_cyclic_prefix(&symbol, 2).unwrap();
        assert_eq!(with_cp.len(), 10);
        assert_eq!(with_cp[0].real, 6.0);
        assert_eq!(with_cp[1].real, 7.0);

        let stripped = remove_cyclic_prefix(&with_cp, 8, 2).unwrap();
        assert_eq!(stripped, &symbol[..]);
        assert!(remove_cyclic_prefix(&with_cp[1..], 8, 2).is_err());
    }
}

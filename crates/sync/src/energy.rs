//! Energy profile of frequency-domain symbols

use crate::{Result, SyncError};
use dab_core::buffer::Complex;

/// Squared magnitude `|x|^2` of one sample, unnormalised
#[inline]
pub fn mag_squared(sample: Complex) -> f64 {
    sample.real * sample.real + sample.imag * sample.imag
}

/// Write the energy of every bin of `symbol` into `energy`
pub fn energy_profile(symbol: &[Complex], energy: &mut [f64]) -> Result<()> {
    if symbol.len() != energy.len() {
        return Err(SyncError::SymbolLengthMismatch {
            expected: energy.len(),
            actual: symbol.len(),
        });
    }

    for (e, &sample) in energy.iter_mut().zip(symbol) {
        *e = mag_squared(sample);
    }

    Ok(())
}

/// Energy of the `span` bins starting at `start`
///
/// Summed front to back so equal profiles always give bit-identical totals.
pub fn band_energy(energy: &[f64], start: usize, span: usize) -> f64 {
    energy[start..start + span].iter().sum()
}

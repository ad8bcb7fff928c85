//! Coarse frequency offset estimation and correction
//!
//! A receiver mistuned by a whole number of carrier spacings sees the
//! occupied band of every frequency-domain symbol displaced by that many
//! bins. On the reference symbol of each frame the corrector slides a
//! window of the band's width over the symbol's energy profile and latches
//! the displacement holding the most energy. Every symbol, reference or
//! not, is then rotated back by the latched displacement.

use crate::energy::{band_energy, energy_profile};
use crate::geometry::{CarrierGeometry, DabMode};
use crate::stream::SymbolProcessor;
use crate::{Result, SyncError};
use dab_core::buffer::Complex;
use tracing::{debug, trace, warn};

/// Which symbols of a frame are used to estimate the offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSymbol {
    /// Estimate on symbol `index` of frames `frame_symbols` long
    FrameIndex { index: usize, frame_symbols: usize },
    /// Estimate on every symbol
    Every,
}

impl ReferenceSymbol {
    /// The phase reference symbol, first symbol after the null symbol
    pub fn phase_reference(mode: DabMode) -> Self {
        ReferenceSymbol::FrameIndex {
            index: 0,
            frame_symbols: mode.symbols_per_frame(),
        }
    }

    fn validate(&self) -> Result<()> {
        if let ReferenceSymbol::FrameIndex { index, frame_symbols } = *self {
            if frame_symbols == 0 {
                return Err(SyncError::InvalidParameters {
                    msg: "frame must contain at least one symbol".to_string(),
                });
            }
            if index >= frame_symbols {
                return Err(SyncError::InvalidParameters {
                    msg: format!(
                        "reference symbol {} outside frame of {} symbols",
                        index, frame_symbols
                    ),
                });
            }
        }
        Ok(())
    }

    pub fn is_reference(&self, symbol_num: usize) -> bool {
        match *self {
            ReferenceSymbol::FrameIndex { index, .. } => symbol_num == index,
            ReferenceSymbol::Every => true,
        }
    }

    fn next(&self, symbol_num: usize) -> usize {
        match *self {
            ReferenceSymbol::FrameIndex { frame_symbols, .. } => (symbol_num + 1) % frame_symbols,
            ReferenceSymbol::Every => 0,
        }
    }
}

/// Outcome of one search over a reference symbol
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoarseEstimate {
    /// Latched shift in bins, positive when the band arrived above its nominal position
    pub delta_f: i64,
    /// First bin of the band as received
    pub band_start: usize,
    pub in_band_energy: f64,
    pub total_energy: f64,
    /// Frame position of the symbol the estimate was taken from
    pub symbol_num: usize,
}

impl CoarseEstimate {
    /// Fraction of the symbol's energy inside the detected band; 0 for a blank symbol
    pub fn concentration(&self) -> f64 {
        if self.total_energy > 0.0 {
            self.in_band_energy / self.total_energy
        } else {
            0.0
        }
    }
}

/// Rotate `input` by `-delta_f` bins into `output`
///
/// Bin `i` of the input lands in bin `(i - delta_f) mod N` of the output.
pub fn shift_bins(input: &[Complex], output: &mut [Complex], delta_f: i64) -> Result<()> {
    let n = input.len();
    if output.len() != n {
        return Err(SyncError::SymbolLengthMismatch {
            expected: n,
            actual: output.len(),
        });
    }
    if n == 0 {
        return Ok(());
    }

    let d = delta_f.rem_euclid(n as i64) as usize;
    output[..n - d].copy_from_slice(&input[d..]);
    output[n - d..].copy_from_slice(&input[..d]);
    Ok(())
}

/// Candidate shifts in tie-break order: 0, -1, 1, -2, 2, ... restricted to `[lo, hi]`
fn candidates(lo: i64, hi: i64) -> impl Iterator<Item = i64> {
    let reach = lo.unsigned_abs().max(hi.unsigned_abs()) as i64;
    std::iter::once(0)
        .chain((1..=reach).flat_map(|m| [-m, m]))
        .filter(move |k| (lo..=hi).contains(k))
}

/// Integer carrier offset estimator and corrector
#[derive(Debug, Clone)]
pub struct CoarseFrequencyCorrector {
    geometry: CarrierGeometry,
    reference: ReferenceSymbol,
    min_shift: i64,
    max_shift: i64,
    symbol_num: usize,
    freq_offset: usize,
    delta_f: i64,
    energy: Vec<f64>,
    last_estimate: Option<CoarseEstimate>,
}

impl CoarseFrequencyCorrector {
    /// Create a corrector searching every shift the geometry allows
    pub fn new(geometry: CarrierGeometry, reference: ReferenceSymbol) -> Result<Self> {
        reference.validate()?;
        let range = geometry.shift_range();

        Ok(Self {
            geometry,
            reference,
            min_shift: *range.start(),
            max_shift: *range.end(),
            symbol_num: 0,
            freq_offset: geometry.zeros_on_left(),
            delta_f: 0,
            energy: vec![0.0; geometry.fft_length()],
            last_estimate: None,
        })
    }

    /// Corrector for a DAB mode, estimating on the phase reference symbol
    pub fn for_mode(mode: DabMode) -> Result<Self> {
        Self::new(mode.geometry(), ReferenceSymbol::phase_reference(mode))
    }

    /// Narrow the search to `|k| <= max_offset`
    pub fn with_max_offset(mut self, max_offset: usize) -> Self {
        let limit = max_offset.min(i64::MAX as usize) as i64;
        let range = self.geometry.shift_range();
        self.min_shift = (*range.start()).max(-limit);
        self.max_shift = (*range.end()).min(limit);
        self
    }

    pub fn geometry(&self) -> &CarrierGeometry {
        &self.geometry
    }

    pub fn reference(&self) -> ReferenceSymbol {
        self.reference
    }

    /// Inclusive bounds of the shifts searched
    pub fn search_range(&self) -> (i64, i64) {
        (self.min_shift, self.max_shift)
    }

    /// Currently applied correction in bins
    pub fn delta_f(&self) -> i64 {
        self.delta_f
    }

    /// First bin of the band as found by the last search
    pub fn freq_offset(&self) -> usize {
        self.freq_offset
    }

    /// Frame position of the next symbol to be processed
    pub fn symbol_num(&self) -> usize {
        self.symbol_num
    }

    pub fn last_estimate(&self) -> Option<&CoarseEstimate> {
        self.last_estimate.as_ref()
    }

    /// Correct one symbol, estimating first if it is the reference symbol
    ///
    /// Returns the number of samples written to `output` (`fft_length`).
    pub fn process(&mut self, input: &[Complex], output: &mut [Complex]) -> Result<usize> {
        self.process_tagged(input, output, false)
    }

    /// Like [`process`](Self::process), resynchronising the frame position to 0 when `frame_start` is set
    pub fn process_tagged(
        &mut self,
        input: &[Complex],
        output: &mut [Complex],
        frame_start: bool,
    ) -> Result<usize> {
        let fft_length = self.geometry.fft_length();
        if input.len() != fft_length {
            return Err(SyncError::SymbolLengthMismatch {
                expected: fft_length,
                actual: input.len(),
            });
        }
        if output.len() != fft_length {
            return Err(SyncError::SymbolLengthMismatch {
                expected: fft_length,
                actual: output.len(),
            });
        }

        if frame_start {
            self.symbol_num = 0;
        }

        if self.reference.is_reference(self.symbol_num) {
            self.correlate_energy(input)?;
        }

        shift_bins(input, output, self.delta_f)?;
        trace!(symbol = self.symbol_num, delta_f = self.delta_f, "corrected symbol");

        self.symbol_num = self.reference.next(self.symbol_num);
        Ok(fft_length)
    }

    /// Allocating convenience wrapper around [`process`](Self::process)
    pub fn process_symbol(&mut self, input: &[Complex]) -> Result<Vec<Complex>> {
        let mut output = vec![Complex::default(); self.geometry.fft_length()];
        self.process(input, &mut output)?;
        Ok(output)
    }

    /// Search the reference symbol for the shift holding the most in-band energy
    fn correlate_energy(&mut self, symbol: &[Complex]) -> Result<()> {
        energy_profile(symbol, &mut self.energy)?;

        let zeros_on_left = self.geometry.zeros_on_left() as i64;
        let span = self.geometry.span();

        let mut best_shift = 0i64;
        let mut best_energy = f64::NEG_INFINITY;
        // strict `>` keeps the earliest candidate on ties; NaN never wins
        for k in candidates(self.min_shift, self.max_shift) {
            let start = (zeros_on_left + k) as usize;
            let energy = band_energy(&self.energy, start, span);
            if energy > best_energy {
                best_energy = energy;
                best_shift = k;
            }
        }

        let total_energy: f64 = self.energy.iter().sum();
        let band_start = (zeros_on_left + best_shift) as usize;
        let in_band_energy = band_energy(&self.energy, band_start, span);

        if self.last_estimate.is_some() && best_shift != self.delta_f {
            warn!(
                previous = self.delta_f,
                current = best_shift,
                "coarse frequency offset changed"
            );
        }

        self.freq_offset = band_start;
        self.delta_f = best_shift;

        let estimate = CoarseEstimate {
            delta_f: best_shift,
            band_start,
            in_band_energy,
            total_energy,
            symbol_num: self.symbol_num,
        };
        debug!(
            delta_f = estimate.delta_f,
            band_start = estimate.band_start,
            concentration = estimate.concentration(),
            "estimated coarse frequency offset"
        );
        self.last_estimate = Some(estimate);

        Ok(())
    }

    /// Forget the latched offset and restart at frame position 0
    pub fn reset(&mut self) {
        self.symbol_num = 0;
        self.freq_offset = self.geometry.zeros_on_left();
        self.delta_f = 0;
        self.energy.fill(0.0);
        self.last_estimate = None;
    }
}

impl SymbolProcessor for CoarseFrequencyCorrector {
    fn symbol_len(&self) -> usize {
        self.geometry.fft_length()
    }

    fn process_tagged(
        &mut self,
        input: &[Complex],
        output: &mut [Complex],
        frame_start: bool,
    ) -> Result<usize> {
        CoarseFrequencyCorrector::process_tagged(self, input, output, frame_start)
    }

    fn reset(&mut self) {
        CoarseFrequencyCorrector::reset(self)
    }
}

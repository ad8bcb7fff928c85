//! Streaming adapter between a host block runtime and symbol processors
//!
//! Host runtimes hand a block flat buffers of vector items: one item is
//! one symbol of `symbol_len` samples, and `noutput_items` symbols are
//! requested per call. [`StreamBlock::work`] slices those buffers into
//! symbols and runs the wrapped processor on each of them.

use crate::{Result, SyncError};
use dab_core::buffer::Complex;

/// A per-symbol processor with a fixed symbol length
pub trait SymbolProcessor {
    /// Samples per input and output symbol
    fn symbol_len(&self) -> usize;

    /// Process one symbol; `frame_start` marks the first symbol of a frame
    fn process_tagged(
        &mut self,
        input: &[Complex],
        output: &mut [Complex],
        frame_start: bool,
    ) -> Result<usize>;

    /// Process one symbol with no frame-start information
    fn process(&mut self, input: &[Complex], output: &mut [Complex]) -> Result<usize> {
        self.process_tagged(input, output, false)
    }

    /// Reset processor state
    fn reset(&mut self);
}

/// Host-facing wrapper around a [`SymbolProcessor`]
#[derive(Debug, Clone)]
pub struct StreamBlock<P> {
    processor: P,
    items_produced: u64,
}

impl<P: SymbolProcessor> StreamBlock<P> {
    pub fn new(processor: P) -> Self {
        Self {
            processor,
            items_produced: 0,
        }
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// Total symbols produced since construction or the last reset
    pub fn items_produced(&self) -> u64 {
        self.items_produced
    }

    /// Process `noutput_items` symbols from `input_items[0]` into `output_items[0]`
    ///
    /// Returns the number of symbols produced.
    pub fn work(
        &mut self,
        noutput_items: usize,
        input_items: &[&[Complex]],
        output_items: &mut [&mut [Complex]],
    ) -> Result<usize> {
        self.work_tagged(noutput_items, input_items, None, output_items)
    }

    /// Like [`work`](Self::work), with one frame-start flag byte per symbol (non-zero marks a frame start)
    pub fn work_tagged(
        &mut self,
        noutput_items: usize,
        input_items: &[&[Complex]],
        frame_starts: Option<&[u8]>,
        output_items: &mut [&mut [Complex]],
    ) -> Result<usize> {
        let symbol_len = self.processor.symbol_len();
        let needed = noutput_items
            .checked_mul(symbol_len)
            .ok_or_else(|| SyncError::InvalidParameters {
                msg: format!(
                    "{} items of {} samples overflow the buffer length",
                    noutput_items, symbol_len
                ),
            })?;

        let input = *input_items.first().ok_or(SyncError::MissingBuffer { port: 0 })?;
        let output = output_items
            .first_mut()
            .ok_or(SyncError::MissingBuffer { port: 0 })?;

        if input.len() < needed {
            return Err(SyncError::BufferTooShort {
                port: 0,
                expected: needed,
                actual: input.len(),
            });
        }
        if output.len() < needed {
            return Err(SyncError::BufferTooShort {
                port: 0,
                expected: needed,
                actual: output.len(),
            });
        }
        if let Some(flags) = frame_starts {
            if flags.len() < noutput_items {
                return Err(SyncError::BufferTooShort {
                    port: 1,
                    expected: noutput_items,
                    actual: flags.len(),
                });
            }
        }

        let symbols = input[..needed]
            .chunks_exact(symbol_len)
            .zip(output[..needed].chunks_exact_mut(symbol_len));

        for (i, (symbol_in, symbol_out)) in symbols.enumerate() {
            let frame_start = frame_starts.map_or(false, |flags| flags[i] != 0);
            self.processor.process_tagged(symbol_in, symbol_out, frame_start)?;
            self.items_produced += 1;
        }

        Ok(noutput_items)
    }

    /// Reset the wrapped processor and the item counter
    pub fn reset(&mut self) {
        self.processor.reset();
        self.items_produced = 0;
    }
}

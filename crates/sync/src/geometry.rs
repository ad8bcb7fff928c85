//! Carrier geometry and DAB transmission modes
//!
//! A frequency-domain OFDM symbol of `fft_length` bins carries its
//! `num_carriers` used carriers in one contiguous band that starts after
//! `zeros_on_left` guard bins. DAB additionally leaves the centre bin of
//! that band empty (the DC carrier), which widens the band by one bin.

use crate::{Result, SyncError};
use dab_core::buffer::Complex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Range, RangeInclusive};
use std::str::FromStr;

/// Baseband sample rate shared by all DAB modes (Hz)
pub const DAB_SAMPLE_RATE: f64 = 2_048_000.0;

/// DAB transmission mode (ETSI EN 300 401)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DabMode {
    I,
    II,
    III,
    IV,
}

impl DabMode {
    pub const ALL: [DabMode; 4] = [DabMode::I, DabMode::II, DabMode::III, DabMode::IV];

    /// Look a mode up by its number (1-4)
    pub fn from_number(number: u8) -> Result<Self> {
        match number {
            1 => Ok(DabMode::I),
            2 => Ok(DabMode::II),
            3 => Ok(DabMode::III),
            4 => Ok(DabMode::IV),
            other => Err(SyncError::UnsupportedMode {
                mode: format!("{} (modes 1-4 exist)", other),
            }),
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            DabMode::I => 1,
            DabMode::II => 2,
            DabMode::III => 3,
            DabMode::IV => 4,
        }
    }

    pub fn fft_length(&self) -> usize {
        match self {
            DabMode::I => 2048,
            DabMode::II => 512,
            DabMode::III => 256,
            DabMode::IV => 1024,
        }
    }

    pub fn cp_length(&self) -> usize {
        match self {
            DabMode::I => 504,
            DabMode::II => 126,
            DabMode::III => 63,
            DabMode::IV => 252,
        }
    }

    pub fn num_carriers(&self) -> usize {
        match self {
            DabMode::I => 1536,
            DabMode::II => 384,
            DabMode::III => 192,
            DabMode::IV => 768,
        }
    }

    /// OFDM symbols per transmission frame, not counting the null symbol
    pub fn symbols_per_frame(&self) -> usize {
        match self {
            DabMode::III => 153,
            _ => 76,
        }
    }

    /// Null symbol duration in samples
    pub fn null_symbol_length(&self) -> usize {
        match self {
            DabMode::I => 2656,
            DabMode::II => 664,
            DabMode::III => 345,
            DabMode::IV => 1328,
        }
    }

    /// Carrier spacing in Hz
    pub fn carrier_spacing(&self) -> f64 {
        DAB_SAMPLE_RATE / self.fft_length() as f64
    }

    /// Centred geometry with a DC carrier, as transmitted
    pub fn geometry(&self) -> CarrierGeometry {
        let fft_length = self.fft_length();
        let num_carriers = self.num_carriers();
        CarrierGeometry {
            fft_length,
            num_carriers,
            cp_length: self.cp_length(),
            zeros_on_left: (fft_length - num_carriers) / 2,
            dc_carrier: true,
        }
    }
}

impl fmt::Display for DabMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DabMode::I => "I",
            DabMode::II => "II",
            DabMode::III => "III",
            DabMode::IV => "IV",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for DabMode {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "1" | "I" => Ok(DabMode::I),
            "2" | "II" => Ok(DabMode::II),
            "3" | "III" => Ok(DabMode::III),
            "4" | "IV" => Ok(DabMode::IV),
            _ => Err(SyncError::UnsupportedMode { mode: s.to_string() }),
        }
    }
}

/// Where the used carriers sit inside the FFT output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarrierGeometry {
    fft_length: usize,
    num_carriers: usize,
    cp_length: usize,
    zeros_on_left: usize,
    dc_carrier: bool,
}

impl CarrierGeometry {
    /// Centred band without a DC carrier
    pub fn new(fft_length: usize, num_carriers: usize, cp_length: usize) -> Result<Self> {
        Self::centered(fft_length, num_carriers, cp_length, false)
    }

    /// Centred band: `zeros_on_left = (fft_length - num_carriers) / 2`
    pub fn centered(
        fft_length: usize,
        num_carriers: usize,
        cp_length: usize,
        dc_carrier: bool,
    ) -> Result<Self> {
        if num_carriers > fft_length {
            return Err(SyncError::InvalidGeometry {
                msg: format!(
                    "{} carriers do not fit in an FFT of {} bins",
                    num_carriers, fft_length
                ),
            });
        }
        let zeros_on_left = (fft_length - num_carriers) / 2;
        Self::with_layout(fft_length, num_carriers, cp_length, zeros_on_left, dc_carrier)
    }

    /// Fully explicit layout
    pub fn with_layout(
        fft_length: usize,
        num_carriers: usize,
        cp_length: usize,
        zeros_on_left: usize,
        dc_carrier: bool,
    ) -> Result<Self> {
        let geometry = Self {
            fft_length,
            num_carriers,
            cp_length,
            zeros_on_left,
            dc_carrier,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    fn validate(&self) -> Result<()> {
        if self.fft_length == 0 {
            return Err(SyncError::InvalidGeometry {
                msg: "FFT length must be greater than 0".to_string(),
            });
        }

        if self.num_carriers == 0 {
            return Err(SyncError::InvalidGeometry {
                msg: "number of carriers must be greater than 0".to_string(),
            });
        }

        let occupied = self.span().checked_add(self.zeros_on_left);
        if occupied.map_or(true, |end| end > self.fft_length) {
            return Err(SyncError::InvalidGeometry {
                msg: format!(
                    "band of {} bins after {} guard bins exceeds FFT length {}",
                    self.span(),
                    self.zeros_on_left,
                    self.fft_length
                ),
            });
        }

        Ok(())
    }

    pub fn fft_length(&self) -> usize {
        self.fft_length
    }

    pub fn num_carriers(&self) -> usize {
        self.num_carriers
    }

    pub fn cp_length(&self) -> usize {
        self.cp_length
    }

    pub fn zeros_on_left(&self) -> usize {
        self.zeros_on_left
    }

    pub fn zeros_on_right(&self) -> usize {
        self.fft_length - self.zeros_on_left - self.span()
    }

    pub fn has_dc_carrier(&self) -> bool {
        self.dc_carrier
    }

    /// Width of the occupied band in bins
    pub fn span(&self) -> usize {
        self.num_carriers + usize::from(self.dc_carrier)
    }

    /// Occupied bins of a correctly tuned symbol
    pub fn band(&self) -> Range<usize> {
        self.zeros_on_left..self.zeros_on_left + self.span()
    }

    /// Bin of the unused DC carrier, if the band has one
    pub fn dc_bin(&self) -> Option<usize> {
        self.dc_carrier
            .then(|| self.zeros_on_left + self.num_carriers / 2)
    }

    /// Time-domain samples per symbol including the cyclic prefix
    pub fn symbol_length(&self) -> usize {
        self.fft_length + self.cp_length
    }

    /// Every integer shift that keeps the band inside the FFT bins
    pub fn shift_range(&self) -> RangeInclusive<i64> {
        -(self.zeros_on_left as i64)..=self.zeros_on_right() as i64
    }

    /// Copy the used carriers of a corrected symbol into `carriers`, skipping the DC bin
    ///
    /// Returns the number of carriers written (`num_carriers`).
    pub fn extract_carriers(&self, symbol: &[Complex], carriers: &mut [Complex]) -> Result<usize> {
        if symbol.len() != self.fft_length {
            return Err(SyncError::SymbolLengthMismatch {
                expected: self.fft_length,
                actual: symbol.len(),
            });
        }

        if carriers.len() < self.num_carriers {
            return Err(SyncError::SymbolLengthMismatch {
                expected: self.num_carriers,
                actual: carriers.len(),
            });
        }

        let band = &symbol[self.band()];
        match self.dc_bin() {
            Some(dc) => {
                let lower = dc - self.zeros_on_left;
                carriers[..lower].copy_from_slice(&band[..lower]);
                carriers[lower..self.num_carriers].copy_from_slice(&band[lower + 1..]);
            }
            None => carriers[..self.num_carriers].copy_from_slice(band),
        }

        Ok(self.num_carriers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parameters() {
        let mode = DabMode::I;
        assert_eq!(mode.fft_length(), 2048);
        assert_eq!(mode.cp_length(), 504);
        assert_eq!(mode.num_carriers(), 1536);
        assert_eq!(mode.symbols_per_frame(), 76);
        assert!((mode.carrier_spacing() - 1000.0).abs() < 1e-9);
        assert_eq!(DabMode::III.symbols_per_frame(), 153);
        assert_eq!(DabMode::IV.null_symbol_length(), 1328);
    }

    #[test]
    fn test_mode_lookup() {
        assert_eq!(DabMode::from_number(2).unwrap(), DabMode::II);
        assert!(DabMode::from_number(0).is_err());
        assert!(DabMode::from_number(5).is_err());
        assert_eq!("iii".parse::<DabMode>().unwrap(), DabMode::III);
        assert_eq!("4".parse::<DabMode>().unwrap(), DabMode::IV);
        assert!("V".parse::<DabMode>().is_err());
        for mode in DabMode::ALL {
            assert_eq!(DabMode::from_number(mode.number()).unwrap(), mode);
            assert_eq!(mode.to_string().parse::<DabMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_mode_geometry_places_dc_in_centre() {
        for mode in DabMode::ALL {
            let geometry = mode.geometry();
            assert_eq!(geometry.dc_bin(), Some(mode.fft_length() / 2));
            assert_eq!(geometry.span(), mode.num_carriers() + 1);
            assert!(geometry.band().end <= geometry.fft_length());
        }
    }

    #[test]
    fn test_containment_invariant() {
        assert!(CarrierGeometry::with_layout(8, 4, 0, 1, false).is_ok());
        assert!(CarrierGeometry::with_layout(8, 4, 0, 4, false).is_ok());
        assert!(CarrierGeometry::with_layout(8, 4, 0, 5, false).is_err());
        assert!(CarrierGeometry::with_layout(8, 4, 0, 4, true).is_err());
        assert!(CarrierGeometry::with_layout(8, 9, 0, 0, false).is_err());
        assert!(CarrierGeometry::with_layout(0, 0, 0, 0, false).is_err());
        assert!(CarrierGeometry::with_layout(8, 0, 0, 0, false).is_err());
        assert!(CarrierGeometry::with_layout(8, 4, 0, usize::MAX, false).is_err());
        assert!(CarrierGeometry::new(8, 9, 2).is_err());
        assert!(CarrierGeometry::centered(8, 8, 2, true).is_err());
    }

    #[test]
    fn test_shift_range() {
        let geometry = CarrierGeometry::with_layout(8, 4, 0, 1, false).unwrap();
        assert_eq!(geometry.zeros_on_right(), 3);
        assert_eq!(geometry.shift_range(), -1..=3);

        let full = CarrierGeometry::new(8, 8, 0).unwrap();
        assert_eq!(full.shift_range(), 0..=0);
    }

    #[test]
    fn test_extract_carriers_skips_dc() {
        let geometry = CarrierGeometry::with_layout(8, 4, 2, 1, true).unwrap();
        assert_eq!(geometry.dc_bin(), Some(3));

        let symbol: Vec<Complex> = (0..8).map(|i| Complex::new(i as f64, 0.0)).collect();
        let mut carriers = vec![Complex::default(); 4];
        let written = geometry.extract_carriers(&symbol, &mut carriers).unwrap();

        assert_eq!(written, 4);
        let values: Vec<f64> = carriers.iter().map(|c| c.real).collect();
        assert_eq!(values, vec![1.0, 2.0, 4.0, 5.0]);
    }

    #[test]
    fn test_extract_carriers_without_dc() {
        let geometry = CarrierGeometry::with_layout(8, 4, 0, 1, false).unwrap();
        let symbol: Vec<Complex> = (0..8).map(|i| Complex::new(i as f64, 0.0)).collect();
        let mut carriers = vec![Complex::default(); 4];
        geometry.extract_carriers(&symbol, &mut carriers).unwrap();

        let values: Vec<f64> = carriers.iter().map(|c| c.real).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0]);
        assert!(geometry.extract_carriers(&symbol[..7], &mut carriers).is_err());
    }
}

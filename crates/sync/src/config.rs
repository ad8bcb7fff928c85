//! Corrector configuration
//!
//! A corrector is described either by a DAB mode, which fixes the whole
//! carrier geometry, or by an explicit FFT length, carrier count and
//! cyclic prefix. Files are TOML unless the extension is `.json`.

use crate::coarse::{CoarseFrequencyCorrector, ReferenceSymbol};
use crate::geometry::{CarrierGeometry, DabMode};
use crate::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Coarse frequency corrector configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrectorConfig {
    /// DAB mode; overrides the explicit geometry fields when set
    pub mode: Option<DabMode>,
    pub fft_length: usize,
    pub num_carriers: usize,
    pub cp_length: usize,
    /// Guard bins before the band; centred when unset
    pub zeros_on_left: Option<usize>,
    pub dc_carrier: bool,
    /// Largest absolute shift searched, in bins
    pub max_offset: Option<usize>,
    /// Frame position of the reference symbol
    pub reference_index: usize,
    /// Symbols per frame; a DAB mode supplies its own
    pub frame_symbols: usize,
    /// Re-estimate on every symbol instead of once per frame
    pub estimate_every_symbol: bool,
}

impl Default for CorrectorConfig {
    fn default() -> Self {
        // mode I values spelled out, so explicit fields in a file take effect
        Self {
            mode: None,
            ..Self::from_mode(DabMode::I)
        }
    }
}

impl CorrectorConfig {
    /// Configuration matching a DAB mode, estimating on the phase reference symbol
    pub fn from_mode(mode: DabMode) -> Self {
        Self {
            mode: Some(mode),
            fft_length: mode.fft_length(),
            num_carriers: mode.num_carriers(),
            cp_length: mode.cp_length(),
            zeros_on_left: None,
            dc_carrier: true,
            max_offset: None,
            reference_index: 0,
            frame_symbols: mode.symbols_per_frame(),
            estimate_every_symbol: false,
        }
    }

    /// Resolve the carrier geometry
    pub fn geometry(&self) -> Result<CarrierGeometry> {
        let (fft_length, num_carriers, cp_length, dc_carrier) = match self.mode {
            Some(mode) => (mode.fft_length(), mode.num_carriers(), mode.cp_length(), true),
            None => (self.fft_length, self.num_carriers, self.cp_length, self.dc_carrier),
        };

        match self.zeros_on_left {
            Some(zeros_on_left) => CarrierGeometry::with_layout(
                fft_length,
                num_carriers,
                cp_length,
                zeros_on_left,
                dc_carrier,
            ),
            None => CarrierGeometry::centered(fft_length, num_carriers, cp_length, dc_carrier),
        }
    }

    /// Resolve which symbols are used for estimation
    pub fn reference(&self) -> Result<ReferenceSymbol> {
        if self.estimate_every_symbol {
            return Ok(ReferenceSymbol::Every);
        }

        let frame_symbols = self
            .mode
            .map_or(self.frame_symbols, |mode| mode.symbols_per_frame());

        Ok(ReferenceSymbol::FrameIndex {
            index: self.reference_index,
            frame_symbols,
        })
    }

    /// Build the corrector this configuration describes
    pub fn build(&self) -> Result<CoarseFrequencyCorrector> {
        let corrector = CoarseFrequencyCorrector::new(self.geometry()?, self.reference()?)?;
        Ok(match self.max_offset {
            Some(max_offset) => corrector.with_max_offset(max_offset),
            None => corrector,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| SyncError::Config {
            msg: format!("failed to parse TOML: {}", e),
        })
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| SyncError::Config {
            msg: format!("failed to serialize TOML: {}", e),
        })
    }

    /// Load configuration from a TOML or JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        if is_json(path) {
            serde_json::from_str(&content).map_err(|e| SyncError::Config {
                msg: format!("failed to parse {:?}: {}", path, e),
            })
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Save configuration to a TOML or JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = if is_json(path) {
            serde_json::to_string_pretty(self).map_err(|e| SyncError::Config {
                msg: format!("failed to serialize JSON: {}", e),
            })?
        } else {
            self.to_toml_string()?
        };

        std::fs::write(path, content)?;
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_mode_i() {
        let config = CorrectorConfig::default();
        assert_eq!(config.geometry().unwrap(), DabMode::I.geometry());
        let corrector = config.build().unwrap();
        assert_eq!(corrector.geometry().fft_length(), 2048);
        assert_eq!(corrector.geometry().zeros_on_left(), 256);
        assert_eq!(
            corrector.reference(),
            ReferenceSymbol::FrameIndex { index: 0, frame_symbols: 76 }
        );
    }

    #[test]
    fn test_explicit_geometry_from_toml() {
        let config = CorrectorConfig::from_toml_str(
            r#"
            fft_length = 8
            num_carriers = 4
            cp_length = 2
            zeros_on_left = 1
            dc_carrier = false
            frame_symbols = 5
            reference_index = 2
            max_offset = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, None);
        let corrector = config.build().unwrap();
        assert_eq!(corrector.geometry().band(), 1..5);
        assert_eq!(corrector.search_range(), (-1, 1));
        assert!(corrector.reference().is_reference(2));
    }

    #[test]
    fn test_mode_from_toml() {
        let config = CorrectorConfig::from_toml_str("mode = \"III\"\n").unwrap();
        let geometry = config.geometry().unwrap();
        assert_eq!(geometry.fft_length(), 256);
        assert!(geometry.has_dc_carrier());
        assert_eq!(
            config.reference().unwrap(),
            ReferenceSymbol::FrameIndex { index: 0, frame_symbols: 153 }
        );
    }

    #[test]
    fn test_invalid_configurations() {
        let mut config = CorrectorConfig::from_mode(DabMode::II);
        config.mode = None;
        config.frame_symbols = 0;
        assert!(matches!(config.build(), Err(SyncError::InvalidParameters { .. })));

        let mut config = CorrectorConfig::from_mode(DabMode::II);
        config.zeros_on_left = Some(400);
        assert!(matches!(config.build(), Err(SyncError::InvalidGeometry { .. })));

        let mut config = CorrectorConfig::from_mode(DabMode::II);
        config.reference_index = 76;
        assert!(matches!(config.build(), Err(SyncError::InvalidParameters { .. })));

        assert!(CorrectorConfig::from_toml_str("mode = \"V\"").is_err());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = CorrectorConfig::from_mode(DabMode::IV);
        config.max_offset = Some(32);
        config.estimate_every_symbol = true;

        for name in ["corrector.toml", "corrector.json"] {
            let path = dir.path().join(name);
            config.save_to_file(&path).unwrap();
            let loaded = CorrectorConfig::from_file(&path).unwrap();
            assert_eq!(loaded, config);
        }
    }

    #[test]
    fn test_mode_config_survives_toml() {
        for mode in DabMode::ALL {
            let config = CorrectorConfig::from_mode(mode);
            let loaded = CorrectorConfig::from_toml_str(&config.to_toml_string().unwrap()).unwrap();
            assert_eq!(loaded, config);
            assert_eq!(loaded.frame_symbols, mode.symbols_per_frame());
        }

        let mut config = CorrectorConfig::from_mode(DabMode::III);
        config.mode = None;
        let loaded = CorrectorConfig::from_toml_str(&config.to_toml_string().unwrap()).unwrap();
        assert_eq!(
            loaded.reference().unwrap(),
            ReferenceSymbol::FrameIndex { index: 0, frame_symbols: 153 }
        );
    }
}

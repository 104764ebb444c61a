//! Capture and engine configuration.
//!
//! These structs are consumed read-only by the core; loading them from a
//! file or CLI is the embedding application's job (the serde derives make
//! that loader a one-liner). `validate()` rejects degenerate parameters
//! at construction time, before any audio stream is opened.

use serde::{Deserialize, Serialize};

use crate::error::{LoquiError, Result};
use crate::features::MAX_CEPSTRAL_COEFFICIENTS;

/// Audio capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Capture sample rate (Hz). Default: 44100.
    pub sample_rate: u32,
    /// Samples per hardware block. Default: 1024 (~23 ms at 44.1 kHz).
    pub block_size: usize,
    /// Channel count requested from the device. Multi-channel input is
    /// down-mixed to mono before feature extraction. Default: 1.
    pub channels: u16,
    /// RMS level above which a block counts as speech. Default: 0.015.
    pub energy_threshold: f32,
    /// Input device index from `list_input_devices()`. `None` = system
    /// default input.
    pub device_index: Option<usize>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            block_size: 1024,
            channels: 1,
            energy_threshold: 0.015,
            device_index: None,
        }
    }
}

impl CaptureConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(LoquiError::InvalidConfig("sample_rate must be > 0".into()));
        }
        if self.block_size == 0 {
            return Err(LoquiError::InvalidConfig("block_size must be > 0".into()));
        }
        if self.channels == 0 {
            return Err(LoquiError::InvalidConfig("channels must be >= 1".into()));
        }
        validate_threshold(self.energy_threshold)
    }
}

/// Which classification strategy the engine constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// Energy-threshold baseline: mouth open on any loud block.
    Energy,
    /// Cepstral vowel classification (A/O/E when speech is present).
    Cepstral,
}

/// Lip-sync engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Strategy selection. Default: `Cepstral`.
    pub classifier: ClassifierKind,
    /// Speech gate threshold handed to the constructed strategy.
    /// Default: 0.015.
    pub energy_threshold: f32,
    /// Cepstral coefficients per feature vector. Default: 13.
    pub coefficient_count: usize,
    /// Classification results retained for temporal smoothing. Default: 3.
    pub smoothing_window: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierKind::Cepstral,
            energy_threshold: 0.015,
            coefficient_count: 13,
            smoothing_window: 3,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.coefficient_count == 0 || self.coefficient_count > MAX_CEPSTRAL_COEFFICIENTS {
            return Err(LoquiError::InvalidConfig(format!(
                "coefficient_count must be in 1..={MAX_CEPSTRAL_COEFFICIENTS}, got {}",
                self.coefficient_count
            )));
        }
        if self.smoothing_window == 0 {
            return Err(LoquiError::InvalidConfig(
                "smoothing_window must be >= 1".into(),
            ));
        }
        validate_threshold(self.energy_threshold)
    }
}

/// Aggregate configuration for the full pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub capture: CaptureConfig,
    pub engine: EngineConfig,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.capture.validate()?;
        self.engine.validate()
    }
}

fn validate_threshold(threshold: f32) -> Result<()> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(LoquiError::InvalidConfig(format!(
            "energy_threshold must be finite and >= 0, got {threshold}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().expect("defaults must validate");
        assert_eq!(CaptureConfig::default().sample_rate, 44_100);
        assert_eq!(CaptureConfig::default().block_size, 1024);
        assert_eq!(EngineConfig::default().coefficient_count, 13);
        assert_eq!(EngineConfig::default().smoothing_window, 3);
        assert_eq!(EngineConfig::default().classifier, ClassifierKind::Cepstral);
    }

    #[test]
    fn zero_block_size_rejected() {
        let cfg = CaptureConfig {
            block_size: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(LoquiError::InvalidConfig(_))));
    }

    #[test]
    fn zero_smoothing_window_rejected() {
        let cfg = EngineConfig {
            smoothing_window: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(LoquiError::InvalidConfig(_))));
    }

    #[test]
    fn oversized_coefficient_count_rejected() {
        let cfg = EngineConfig {
            coefficient_count: MAX_CEPSTRAL_COEFFICIENTS + 1,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(LoquiError::InvalidConfig(_))));
    }

    #[test]
    fn negative_threshold_rejected() {
        let cfg = CaptureConfig {
            energy_threshold: -0.1,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(LoquiError::InvalidConfig(_))));
    }

    #[test]
    fn config_round_trips_through_json_with_snake_case_keys() {
        let cfg = Config::default();
        let json = serde_json::to_value(&cfg).expect("serialize config");
        assert_eq!(json["capture"]["sample_rate"], 44_100);
        assert_eq!(json["capture"]["block_size"], 1024);
        assert_eq!(json["engine"]["classifier"], "cepstral");
        assert_eq!(json["engine"]["smoothing_window"], 3);

        let round_trip: Config = serde_json::from_value(json).expect("deserialize config");
        assert_eq!(round_trip.capture.channels, 1);
        assert_eq!(round_trip.engine.coefficient_count, 13);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: Config =
            serde_json::from_str(r#"{"capture": {"sample_rate": 48000}}"#).expect("parse");
        assert_eq!(cfg.capture.sample_rate, 48_000);
        assert_eq!(cfg.capture.block_size, 1024);
        assert_eq!(cfg.engine.classifier, ClassifierKind::Cepstral);
    }
}

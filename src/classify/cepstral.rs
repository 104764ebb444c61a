//! Cepstral vowel classification.
//!
//! ## Discriminant
//!
//! The first-order cepstral coefficient tracks spectral tilt: back and
//! rounded vowels ("oh") concentrate energy in the low mel bands and push
//! c1 up, front vowels ("eh") carry high-frequency energy and pull it
//! down, open vowels ("ah") sit between. The two band edges are tunable;
//! the defaults were picked against natural-log mel energies under an
//! orthonormal DCT-II.

use super::{LipSyncStrategy, MouthShape};
use crate::features::FeatureVector;

const DEFAULT_BACK_TILT: f32 = 6.0;
const DEFAULT_FRONT_TILT: f32 = -2.0;

/// Vowel classifier over the low-order cepstrum.
///
/// Silence (by the extractor's `is_speech` flag, or RMS at or below this
/// strategy's own threshold) always maps to `Closed`.
#[derive(Debug, Clone)]
pub struct CepstralStrategy {
    /// Secondary silence gate, applied on top of `is_speech`.
    energy_threshold: f32,
    /// c1 strictly above this bound classifies as `O`.
    back_tilt: f32,
    /// c1 strictly below this bound classifies as `E`.
    front_tilt: f32,
}

impl CepstralStrategy {
    pub fn new(energy_threshold: f32) -> Self {
        Self {
            energy_threshold,
            back_tilt: DEFAULT_BACK_TILT,
            front_tilt: DEFAULT_FRONT_TILT,
        }
    }

    /// Override the tilt band edges (`front < back`). Values outside that
    /// order collapse the `A` band but keep the output total.
    pub fn with_tilt_bands(mut self, front_tilt: f32, back_tilt: f32) -> Self {
        self.front_tilt = front_tilt;
        self.back_tilt = back_tilt;
        self
    }
}

impl LipSyncStrategy for CepstralStrategy {
    fn classify(&mut self, features: &FeatureVector) -> MouthShape {
        if !features.is_speech || features.rms_energy <= self.energy_threshold {
            return MouthShape::Closed;
        }

        let tilt = features.cepstral.get(1).copied().unwrap_or(0.0);
        if tilt > self.back_tilt {
            MouthShape::O
        } else if tilt < self.front_tilt {
            MouthShape::E
        } else {
            MouthShape::A
        }
    }
}

//! Energy-threshold baseline strategy.

use super::{LipSyncStrategy, MouthShape};
use crate::features::FeatureVector;

/// The crude baseline: mouth open (`A`) on any block whose RMS exceeds
/// the threshold, closed otherwise. Deterministic, stateless, O(1), and
/// intentionally blind to every field except `rms_energy`.
#[derive(Debug, Clone)]
pub struct EnergyStrategy {
    /// RMS level strictly above which the mouth opens.
    threshold: f32,
}

impl EnergyStrategy {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }
}

impl LipSyncStrategy for EnergyStrategy {
    fn classify(&mut self, features: &FeatureVector) -> MouthShape {
        if features.rms_energy > self.threshold {
            MouthShape::A
        } else {
            MouthShape::Closed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features_with_energy(rms_energy: f32) -> FeatureVector {
        FeatureVector {
            rms_energy,
            ..FeatureVector::silence(13)
        }
    }

    #[test]
    fn opens_strictly_above_threshold() {
        let mut strategy = EnergyStrategy::new(0.05);
        let eps = 1e-4;
        assert_eq!(
            strategy.classify(&features_with_energy(0.05 - eps)),
            MouthShape::Closed
        );
        assert_eq!(
            strategy.classify(&features_with_energy(0.05)),
            MouthShape::Closed
        );
        assert_eq!(
            strategy.classify(&features_with_energy(0.05 + eps)),
            MouthShape::A
        );
    }

    #[test]
    fn ignores_every_field_but_rms_energy() {
        let mut strategy = EnergyStrategy::new(0.05);
        let distractor = FeatureVector {
            rms_energy: 0.5,
            cepstral: vec![1e6; 13],
            spectral_centroid_hz: 9_999.0,
            zero_crossing_rate: 1.0,
            is_speech: false,
        };
        assert_eq!(strategy.classify(&distractor), MouthShape::A);

        let quiet_distractor = FeatureVector {
            rms_energy: 0.0,
            is_speech: true,
            ..distractor
        };
        assert_eq!(strategy.classify(&quiet_distractor), MouthShape::Closed);
    }

    #[test]
    fn zero_threshold_still_requires_nonzero_energy() {
        let mut strategy = EnergyStrategy::new(0.0);
        assert_eq!(
            strategy.classify(&features_with_energy(0.0)),
            MouthShape::Closed
        );
        assert_eq!(
            strategy.classify(&features_with_energy(1e-6)),
            MouthShape::A
        );
    }
}

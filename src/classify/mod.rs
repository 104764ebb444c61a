//! Mouth-shape classification.
//!
//! The `LipSyncStrategy` trait is the primary extensibility point: swap
//! `EnergyStrategy` (baseline), `CepstralStrategy` (default), or any
//! future classifier without touching the engine.

pub mod cepstral;
pub mod energy;

pub use cepstral::CepstralStrategy;
pub use energy::EnergyStrategy;

use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;

/// The four viseme categories the renderer can display.
///
/// `Closed` is the rest position; `A`, `O`, and `E` are the open-mouth
/// shapes for low, back-rounded, and front vowels respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouthShape {
    #[default]
    Closed,
    A,
    O,
    E,
}

impl MouthShape {
    /// Stable index used by the smoother's occurrence counting.
    pub(crate) fn index(self) -> usize {
        match self {
            MouthShape::Closed => 0,
            MouthShape::A => 1,
            MouthShape::O => 2,
            MouthShape::E => 3,
        }
    }

    pub(crate) const COUNT: usize = 4;
}

/// Trait for all classification strategies.
///
/// `&mut self` permits stateful implementations (hysteresis counters,
/// model hidden states); the shipped strategies are stateless.
pub trait LipSyncStrategy: Send + 'static {
    /// Map one feature vector to a mouth shape.
    fn classify(&mut self, features: &FeatureVector) -> MouthShape;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_shape_is_closed() {
        assert_eq!(MouthShape::default(), MouthShape::Closed);
    }

    #[test]
    fn shapes_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&MouthShape::Closed).unwrap(),
            r#""closed""#
        );
        assert_eq!(serde_json::to_string(&MouthShape::A).unwrap(), r#""a""#);

        let parsed: MouthShape = serde_json::from_str(r#""o""#).unwrap();
        assert_eq!(parsed, MouthShape::O);
        assert!(serde_json::from_str::<MouthShape>(r#""O""#).is_err());
    }
}

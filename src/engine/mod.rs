//! `LipSyncEngine` — classification orchestrator.
//!
//! On each `update` the engine runs the active strategy, pushes the
//! result into the bounded shape history, and recomputes the stable
//! shape by mode smoothing. `current_shape` is a pure read, polled by
//! the renderer once per frame.
//!
//! All state lives in the instance; multiple engines (one per animated
//! character) coexist without interference.

pub mod smoothing;

use tracing::debug;

use crate::classify::{CepstralStrategy, EnergyStrategy, LipSyncStrategy, MouthShape};
use crate::config::{ClassifierKind, EngineConfig};
use crate::error::Result;
use crate::features::FeatureVector;
use smoothing::ShapeHistory;

pub struct LipSyncEngine {
    strategy: Box<dyn LipSyncStrategy>,
    history: ShapeHistory,
    current: MouthShape,
}

impl LipSyncEngine {
    /// Build an engine with the strategy selected by `config.classifier`.
    ///
    /// # Errors
    /// `LoquiError::InvalidConfig` when the configuration fails validation.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let strategy: Box<dyn LipSyncStrategy> = match config.classifier {
            ClassifierKind::Energy => Box::new(EnergyStrategy::new(config.energy_threshold)),
            ClassifierKind::Cepstral => Box::new(CepstralStrategy::new(config.energy_threshold)),
        };
        Ok(Self::with_strategy(strategy, config.smoothing_window))
    }

    /// Build an engine around an injected strategy.
    pub fn with_strategy(strategy: Box<dyn LipSyncStrategy>, smoothing_window: usize) -> Self {
        Self {
            strategy,
            history: ShapeHistory::new(smoothing_window),
            current: MouthShape::Closed,
        }
    }

    /// Feed the next feature vector through classify → history → smooth.
    pub fn update(&mut self, features: &FeatureVector) {
        let shape = self.strategy.classify(features);
        self.history.push(shape);
        self.current = smoothing::smooth(&self.history);
    }

    /// The current stable mouth shape.
    pub fn current_shape(&self) -> MouthShape {
        self.current
    }

    /// Swap the classifier at runtime. History and the current shape are
    /// deliberately untouched so an A/B swap does not glitch the animation.
    pub fn set_strategy(&mut self, strategy: Box<dyn LipSyncStrategy>) {
        self.strategy = strategy;
        debug!("lip-sync strategy swapped");
    }

    /// Clear history and return to `Closed`. Used on stream restart or
    /// explicit silence.
    pub fn reset(&mut self) {
        self.history.clear();
        self.current = MouthShape::Closed;
    }
}

impl std::fmt::Debug for LipSyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LipSyncEngine")
            .field("current", &self.current)
            .field("history_len", &self.history.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassifierKind;

    fn features_with_energy(rms_energy: f32) -> FeatureVector {
        FeatureVector {
            rms_energy,
            is_speech: rms_energy > 0.05,
            ..FeatureVector::silence(13)
        }
    }

    fn energy_engine(threshold: f32, window: usize) -> LipSyncEngine {
        LipSyncEngine::with_strategy(Box::new(EnergyStrategy::new(threshold)), window)
    }

    #[test]
    fn fresh_engine_reports_closed() {
        let engine = energy_engine(0.05, 3);
        assert_eq!(engine.current_shape(), MouthShape::Closed);
    }

    #[test]
    fn loud_blocks_open_the_mouth_and_reset_closes_it() {
        let mut engine = energy_engine(0.05, 3);
        for _ in 0..3 {
            engine.update(&features_with_energy(0.5));
        }
        assert_eq!(engine.current_shape(), MouthShape::A);

        engine.reset();
        assert_eq!(engine.current_shape(), MouthShape::Closed);
    }

    #[test]
    fn smoothing_rides_over_a_single_quiet_block() {
        // rms sequence [0.5, 0.5, 0.02]: mode is still A (2 vs 1).
        let mut engine = energy_engine(0.05, 3);
        engine.update(&features_with_energy(0.5));
        assert_eq!(engine.current_shape(), MouthShape::A);
        engine.update(&features_with_energy(0.5));
        assert_eq!(engine.current_shape(), MouthShape::A);
        engine.update(&features_with_energy(0.02));
        assert_eq!(engine.current_shape(), MouthShape::A);
    }

    #[test]
    fn strategy_hot_swap_preserves_history_and_current_shape() {
        let mut engine = energy_engine(0.05, 3);
        engine.update(&features_with_energy(0.5));
        engine.update(&features_with_energy(0.5));
        let before = engine.current_shape();

        engine.set_strategy(Box::new(CepstralStrategy::new(0.05)));
        assert_eq!(engine.current_shape(), before);

        // One quiet block after the swap: the retained history still
        // outvotes the new classification.
        engine.update(&features_with_energy(0.0));
        assert_eq!(engine.current_shape(), MouthShape::A);
    }

    #[test]
    fn config_selects_the_classifier() {
        let mut config = EngineConfig::default();
        config.classifier = ClassifierKind::Energy;
        config.energy_threshold = 0.05;
        let mut engine = LipSyncEngine::new(&config).expect("valid config");

        // EnergyStrategy opens on raw energy even when is_speech is false.
        let features = FeatureVector {
            rms_energy: 0.5,
            is_speech: false,
            ..FeatureVector::silence(13)
        };
        engine.update(&features);
        assert_eq!(engine.current_shape(), MouthShape::A);

        config.classifier = ClassifierKind::Cepstral;
        let mut engine = LipSyncEngine::new(&config).expect("valid config");
        engine.update(&features);
        assert_eq!(engine.current_shape(), MouthShape::Closed);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EngineConfig {
            smoothing_window: 0,
            ..Default::default()
        };
        assert!(LipSyncEngine::new(&config).is_err());
    }

    #[test]
    fn engines_do_not_share_state() {
        let mut left = energy_engine(0.05, 3);
        let right = energy_engine(0.05, 3);
        left.update(&features_with_energy(0.5));
        assert_eq!(left.current_shape(), MouthShape::A);
        assert_eq!(right.current_shape(), MouthShape::Closed);
    }
}

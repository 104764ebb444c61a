//! # loqui-core
//!
//! Real-time microphone-to-viseme lip-sync engine SDK.
//!
//! ## Architecture
//!
//! ```text
//! Microphone → cpal callback → FeatureExtractor → FeatureSlot (last write wins)
//!                                                      │
//!                             LipSyncEngine::update()  │  (render thread, per frame)
//!                                                      │
//!                              Strategy → ShapeHistory → mode smoothing
//!                                                      │
//!                              current_shape() → sprite renderer (external)
//! ```
//!
//! The audio callback only down-mixes, extracts features, and publishes
//! into the single-value slot — the two threads never share more than
//! one pending `FeatureVector` and the callback never waits on the
//! consumer.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod audio;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;

// Convenience re-exports for downstream crates
pub use audio::{device::list_input_devices, device::DeviceInfo, AudioCapture, FeatureSlot};
pub use classify::{CepstralStrategy, EnergyStrategy, LipSyncStrategy, MouthShape};
pub use config::{CaptureConfig, ClassifierKind, Config, EngineConfig};
pub use engine::LipSyncEngine;
pub use error::{LoquiError, Result};
pub use features::{FeatureExtractor, FeatureVector};

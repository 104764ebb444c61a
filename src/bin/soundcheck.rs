//! Soundcheck — live capture diagnostic.
//!
//! Lists input devices, then runs the full pipeline against the
//! microphone for a few seconds, printing every stable shape change.
//! No argument parsing; overrides come from the environment:
//!
//! - `LOQUI_DEVICE`  — input device index (default: system default)
//! - `LOQUI_SECONDS` — run duration in seconds (default: 10)
//! - `RUST_LOG`      — tracing filter (default: `info`)

use std::time::{Duration, Instant};

use loqui_core::{
    list_input_devices, AudioCapture, Config, LipSyncEngine, LoquiError, MouthShape,
};
use tracing_subscriber::EnvFilter;

/// Render-thread polling period (~30 Hz).
const FRAME_PERIOD: Duration = Duration::from_millis(33);

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let devices = list_input_devices();
    println!("input devices:");
    println!("{}", serde_json::to_string_pretty(&devices)?);

    let seconds: u64 = env_parse("LOQUI_SECONDS").unwrap_or(10);
    let mut config = Config::default();
    config.capture.device_index = env_parse("LOQUI_DEVICE");

    let capture = AudioCapture::new(config.capture.clone(), config.engine.coefficient_count)?;
    let mut engine = LipSyncEngine::new(&config.engine)?;

    match capture.start() {
        Ok(()) => {}
        Err(e @ (LoquiError::DeviceUnavailable(_) | LoquiError::NoInputDevice)) => {
            // Features-absent fallback: the engine holds Closed.
            eprintln!("microphone unavailable ({e}); shape stays {:?}", engine.current_shape());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    println!("listening for {seconds}s — speak into the microphone");

    let deadline = Instant::now() + Duration::from_secs(seconds);
    let mut last_printed = MouthShape::Closed;
    while Instant::now() < deadline {
        if let Some(features) = capture.latest_features() {
            engine.update(&features);
            let shape = engine.current_shape();
            if shape != last_printed {
                println!(
                    "shape={shape:?} rms={:.4} centroid={:.0}Hz",
                    features.rms_energy, features.spectral_centroid_hz
                );
                last_printed = shape;
            }
        }
        std::thread::sleep(FRAME_PERIOD);
    }

    capture.stop();
    println!("done");
    Ok(())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|raw| raw.trim().parse().ok())
}

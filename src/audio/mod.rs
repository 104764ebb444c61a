//! Audio capture via cpal backend.
//!
//! # Design constraints
//!
//! The cpal input callback runs on an OS audio thread at elevated
//! priority. It **must not**:
//! - Allocate unboundedly
//! - Block on a contested lock
//! - Perform I/O
//!
//! The callback therefore only checks the running flag, down-mixes into a
//! pre-allocated buffer, runs the (pre-allocated) feature extractor, and
//! publishes into the single-value `FeatureSlot`.
//!
//! # Threading
//!
//! `cpal::Stream` is `!Send` on most platforms (COM on Windows, CoreAudio
//! on macOS). `start()` therefore spawns a dedicated capture thread that
//! creates, parks over, and finally drops the stream; a sync oneshot
//! channel propagates open-device errors back to the caller. This keeps
//! `AudioCapture` itself `Send + Sync`, so `stop()` may be called from
//! any thread.

pub mod device;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc, Arc,
};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    SampleFormat, SampleRate, StreamConfig,
};
use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::config::CaptureConfig;
use crate::error::{LoquiError, Result};
use crate::features::{FeatureExtractor, FeatureVector, MAX_CEPSTRAL_COEFFICIENTS};

/// How often the parked capture thread rechecks the running flag.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Single-value hand-off between the audio thread and the engine thread.
///
/// Last write wins with no backpressure: the callback always overwrites,
/// so it can never stall on a slow consumer; the reader may observe the
/// same vector twice (polling faster than audio arrives) or skip vectors
/// entirely (audio arriving faster than polling). The mutex is held only
/// for the value move/clone, never during feature computation, so no
/// reader can observe a partially written vector.
#[derive(Debug, Clone, Default)]
pub struct FeatureSlot {
    inner: Arc<Mutex<Option<FeatureVector>>>,
}

impl FeatureSlot {
    /// Replace the published vector. Called from the audio callback.
    pub fn publish(&self, features: FeatureVector) {
        *self.inner.lock() = Some(features);
    }

    /// The most recently published vector, or `None` if no block has been
    /// processed yet. Never blocks the caller meaningfully.
    pub fn latest(&self) -> Option<FeatureVector> {
        self.inner.lock().clone()
    }
}

/// Handle to the microphone capture source.
///
/// `Send + Sync` — the `!Send` stream lives on the capture thread, all
/// fields here use interior mutability.
pub struct AudioCapture {
    config: CaptureConfig,
    coefficient_count: usize,
    /// `true` while capture is active. The callback no-ops once cleared.
    running: Arc<AtomicBool>,
    slot: FeatureSlot,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AudioCapture {
    /// Validate the configuration and build an idle capture source.
    /// Opens nothing — call `start()`.
    pub fn new(config: CaptureConfig, coefficient_count: usize) -> Result<Self> {
        config.validate()?;
        if coefficient_count == 0 || coefficient_count > MAX_CEPSTRAL_COEFFICIENTS {
            return Err(LoquiError::InvalidConfig(format!(
                "coefficient_count must be in 1..={MAX_CEPSTRAL_COEFFICIENTS}, got {coefficient_count}"
            )));
        }
        Ok(Self {
            config,
            coefficient_count,
            running: Arc::new(AtomicBool::new(false)),
            slot: FeatureSlot::default(),
            worker: Mutex::new(None),
        })
    }

    /// Open the input stream and begin publishing features.
    ///
    /// Blocks until the device is confirmed open (or fails), then returns;
    /// capture continues on a background thread.
    ///
    /// # Errors
    /// - `LoquiError::AlreadyRunning` if capture is active.
    /// - `LoquiError::DeviceUnavailable` / `NoInputDevice` /
    ///   `AudioStream` on device or stream failure; `is_active()` remains
    ///   `false` in that case.
    pub fn start(&self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(LoquiError::AlreadyRunning);
        }

        let config = self.config.clone();
        let coefficient_count = self.coefficient_count;
        let running = Arc::clone(&self.running);
        let slot = self.slot.clone();

        // Sync oneshot: the capture thread reports open success/failure.
        let (open_tx, open_rx) = mpsc::channel::<Result<()>>();

        let worker = thread::Builder::new()
            .name("loqui-capture".into())
            .spawn(move || {
                // The stream must be created and dropped on this thread.
                let stream =
                    match open_stream(&config, coefficient_count, Arc::clone(&running), slot) {
                        Ok(stream) => {
                            let _ = open_tx.send(Ok(()));
                            stream
                        }
                        Err(e) => {
                            let _ = open_tx.send(Err(e));
                            return;
                        }
                    };

                while running.load(Ordering::Acquire) {
                    thread::park_timeout(STOP_POLL_INTERVAL);
                }

                // Dropping the stream halts the callback and releases the
                // device, still on the thread that created it.
                drop(stream);
            })
            .map_err(|e| LoquiError::Other(anyhow::anyhow!("failed to spawn capture thread: {e}")))?;

        *self.worker.lock() = Some(worker);

        match open_rx.recv() {
            Ok(Ok(())) => {
                info!(
                    sample_rate = self.config.sample_rate,
                    block_size = self.config.block_size,
                    channels = self.config.channels,
                    "capture started"
                );
                Ok(())
            }
            Ok(Err(e)) => {
                self.running.store(false, Ordering::SeqCst);
                self.join_worker();
                Err(e)
            }
            Err(_) => {
                // Channel closed before a message was sent.
                self.running.store(false, Ordering::SeqCst);
                self.join_worker();
                Err(LoquiError::Other(anyhow::anyhow!(
                    "capture thread exited before reporting device status"
                )))
            }
        }
    }

    /// Stop capture and release the device.
    ///
    /// Idempotent, callable from any thread. The callback stops
    /// publishing the instant the flag clears; the stream itself is
    /// dropped (and the device released) before this returns.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("capture stop requested");
        }
        self.join_worker();
    }

    pub fn is_active(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The most recently published feature vector, or `None` if no block
    /// has been processed yet.
    pub fn latest_features(&self) -> Option<FeatureVector> {
        self.slot.latest()
    }

    /// A cloneable reader handle for threads that should poll features
    /// without holding the capture source itself.
    pub fn feature_slot(&self) -> FeatureSlot {
        self.slot.clone()
    }

    fn join_worker(&self) {
        if let Some(worker) = self.worker.lock().take() {
            worker.thread().unpark();
            if worker.join().is_err() {
                warn!("capture thread panicked");
            }
        }
    }
}

impl Drop for AudioCapture {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Open the configured device and start the input stream. Runs on the
/// capture thread.
fn open_stream(
    config: &CaptureConfig,
    coefficient_count: usize,
    running: Arc<AtomicBool>,
    slot: FeatureSlot,
) -> Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = select_device(&host, config.device_index)?;

    info!(
        device = device.name().unwrap_or_default().as_str(),
        "opening input device"
    );

    let supported = device
        .default_input_config()
        .map_err(|e| LoquiError::DeviceUnavailable(e.to_string()))?;

    let stream_config = StreamConfig {
        channels: config.channels,
        sample_rate: SampleRate(config.sample_rate),
        buffer_size: cpal::BufferSize::Fixed(config.block_size as u32),
    };

    let mut extractor = FeatureExtractor::new(
        config.sample_rate,
        config.block_size,
        coefficient_count,
        config.energy_threshold,
    )?;
    let channels = config.channels as usize;

    // Overflow/underflow and other stream faults are non-fatal; log and
    // keep capturing.
    let err_fn = |err| error!("audio stream error: {err}");

    let stream = match supported.sample_format() {
        SampleFormat::F32 => {
            let mut mono_buf: Vec<f32> = Vec::with_capacity(config.block_size);
            device.build_input_stream(
                &stream_config,
                move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                    if !running.load(Ordering::Relaxed) {
                        return;
                    }
                    if channels == 1 {
                        publish_block(&mut extractor, &slot, data);
                    } else {
                        downmix_f32(data, channels, &mut mono_buf);
                        publish_block(&mut extractor, &slot, &mono_buf);
                    }
                },
                err_fn,
                None,
            )
        }

        SampleFormat::I16 => {
            let mut mono_buf: Vec<f32> = Vec::with_capacity(config.block_size);
            device.build_input_stream(
                &stream_config,
                move |data: &[i16], _info: &cpal::InputCallbackInfo| {
                    if !running.load(Ordering::Relaxed) {
                        return;
                    }
                    downmix_i16(data, channels, &mut mono_buf);
                    publish_block(&mut extractor, &slot, &mono_buf);
                },
                err_fn,
                None,
            )
        }

        fmt => {
            return Err(LoquiError::AudioStream(format!(
                "unsupported sample format: {fmt:?}"
            )))
        }
    }
    .map_err(|e| LoquiError::DeviceUnavailable(e.to_string()))?;

    stream
        .play()
        .map_err(|e| LoquiError::DeviceUnavailable(e.to_string()))?;

    Ok(stream)
}

fn select_device(host: &cpal::Host, index: Option<usize>) -> Result<cpal::Device> {
    if let Some(index) = index {
        let mut devices = host
            .input_devices()
            .map_err(|e| LoquiError::DeviceUnavailable(e.to_string()))?;
        return devices.nth(index).ok_or_else(|| {
            LoquiError::DeviceUnavailable(format!("input device index {index} not found"))
        });
    }

    if let Some(default) = host.default_input_device() {
        return Ok(default);
    }

    let mut devices = host
        .input_devices()
        .map_err(|e| LoquiError::DeviceUnavailable(e.to_string()))?;
    let fallback = devices.next().ok_or(LoquiError::NoInputDevice)?;
    warn!("no default input device, falling back to first available input");
    Ok(fallback)
}

fn publish_block(extractor: &mut FeatureExtractor, slot: &FeatureSlot, samples: &[f32]) {
    if samples.is_empty() {
        return;
    }
    slot.publish(extractor.extract(samples));
}

fn downmix_f32(data: &[f32], channels: usize, out: &mut Vec<f32>) {
    let frames = data.len() / channels;
    out.resize(frames, 0.0);
    for (f, sample) in out.iter_mut().enumerate() {
        let base = f * channels;
        let mut sum = 0f32;
        for c in 0..channels {
            sum += data[base + c];
        }
        *sample = sum / channels as f32;
    }
}

fn downmix_i16(data: &[i16], channels: usize, out: &mut Vec<f32>) {
    let frames = data.len() / channels;
    out.resize(frames, 0.0);
    for (f, sample) in out.iter_mut().enumerate() {
        let base = f * channels;
        let mut sum = 0f32;
        for c in 0..channels {
            sum += data[base + c] as f32 / 32_768.0;
        }
        *sample = sum / channels as f32;
    }
}

//! Per-block acoustic feature extraction.
//!
//! One `FeatureVector` is produced per captured audio block. The block
//! itself is the analysis frame (no overlap-add): RMS energy, a single
//! mel-cepstral frame, spectral centroid, zero-crossing rate, and the
//! speech/silence flag.
//!
//! # Real-time constraints
//!
//! `extract` runs inside the audio callback. The FFT plan, window,
//! filterbank, DCT basis, and all scratch buffers are allocated once in
//! `new`; the only per-call allocation is the returned coefficient
//! vector (13 floats by default).

mod mel;

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::Serialize;

use crate::error::{LoquiError, Result};

/// Upper bound on the configurable cepstral coefficient count — one
/// coefficient per mel filter.
pub const MAX_CEPSTRAL_COEFFICIENTS: usize = mel::N_MELS;

/// Ceiling on the analysis window; shorter blocks clamp the window to the
/// block length instead.
const MAX_FFT_SIZE: usize = 2048;

/// Log-energy floor, keeps the cepstral transform finite on near-silence.
const LOG_FLOOR: f32 = 1e-10;

/// Acoustic features for one audio block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    /// Root-mean-square amplitude of the block.
    pub rms_energy: f32,
    /// Mel-cepstral coefficients; length is fixed for the lifetime of the
    /// extractor that produced this vector.
    pub cepstral: Vec<f32>,
    /// Energy-weighted mean frequency of the magnitude spectrum (Hz).
    /// Zero for a silent block.
    pub spectral_centroid_hz: f32,
    /// Fraction of adjacent-sample sign changes, in [0, 1].
    pub zero_crossing_rate: f32,
    /// Whether the block's RMS exceeded the configured energy threshold.
    pub is_speech: bool,
}

impl FeatureVector {
    /// The all-zero vector reported for degenerate (empty or silent) input.
    pub fn silence(coefficient_count: usize) -> Self {
        Self {
            rms_energy: 0.0,
            cepstral: vec![0.0; coefficient_count],
            spectral_centroid_hz: 0.0,
            zero_crossing_rate: 0.0,
            is_speech: false,
        }
    }
}

/// Turns raw mono blocks into `FeatureVector`s.
pub struct FeatureExtractor {
    sample_rate: u32,
    coefficient_count: usize,
    energy_threshold: f32,
    fft_size: usize,
    window: Vec<f32>,
    filterbank: Vec<Vec<f32>>,
    dct: Vec<Vec<f32>>,
    fft: Arc<dyn Fft<f32>>,
    fft_buf: Vec<Complex<f32>>,
    fft_scratch: Vec<Complex<f32>>,
    log_mel: Vec<f32>,
}

impl FeatureExtractor {
    /// Build an extractor for blocks of (at most) `block_size` samples at
    /// `sample_rate`.
    ///
    /// # Errors
    /// `LoquiError::InvalidConfig` on a zero block size or sample rate, a
    /// coefficient count outside `1..=MAX_CEPSTRAL_COEFFICIENTS`, or a
    /// non-finite/negative threshold.
    pub fn new(
        sample_rate: u32,
        block_size: usize,
        coefficient_count: usize,
        energy_threshold: f32,
    ) -> Result<Self> {
        if sample_rate == 0 {
            return Err(LoquiError::InvalidConfig("sample_rate must be > 0".into()));
        }
        if block_size == 0 {
            return Err(LoquiError::InvalidConfig("block_size must be > 0".into()));
        }
        if coefficient_count == 0 || coefficient_count > MAX_CEPSTRAL_COEFFICIENTS {
            return Err(LoquiError::InvalidConfig(format!(
                "coefficient_count must be in 1..={MAX_CEPSTRAL_COEFFICIENTS}, got {coefficient_count}"
            )));
        }
        if !energy_threshold.is_finite() || energy_threshold < 0.0 {
            return Err(LoquiError::InvalidConfig(format!(
                "energy_threshold must be finite and >= 0, got {energy_threshold}"
            )));
        }

        let fft_size = block_size.min(MAX_FFT_SIZE);
        let fft = FftPlanner::<f32>::new().plan_fft_forward(fft_size);
        let fft_scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Ok(Self {
            sample_rate,
            coefficient_count,
            energy_threshold,
            fft_size,
            window: mel::hann_window(fft_size),
            filterbank: mel::mel_filterbank(
                fft_size,
                sample_rate,
                mel::N_MELS,
                0.0,
                sample_rate as f32 / 2.0,
            ),
            dct: mel::dct_basis(coefficient_count, mel::N_MELS),
            fft,
            fft_buf: vec![Complex::new(0.0, 0.0); fft_size],
            fft_scratch,
            log_mel: vec![0.0; mel::N_MELS],
        })
    }

    /// Cepstral coefficients per extracted vector.
    pub fn coefficient_count(&self) -> usize {
        self.coefficient_count
    }

    /// Extract features from one mono block.
    ///
    /// Never errors: empty or all-zero input yields the zero-valued
    /// vector. Blocks longer than the analysis window contribute their
    /// first `fft_size` samples to the spectrum (RMS and ZCR always cover
    /// the whole block); shorter blocks are zero-padded.
    pub fn extract(&mut self, samples: &[f32]) -> FeatureVector {
        let rms = rms(samples);
        if samples.is_empty() || rms == 0.0 {
            return FeatureVector::silence(self.coefficient_count);
        }

        let zero_crossing_rate = zero_crossing_rate(samples);

        // Windowed single frame, zero-padded when the block is short.
        let frame_len = samples.len().min(self.fft_size);
        for (buf, (&s, &w)) in self
            .fft_buf
            .iter_mut()
            .zip(samples.iter().zip(self.window.iter()))
        {
            *buf = Complex::new(s * w, 0.0);
        }
        for buf in self.fft_buf[frame_len..].iter_mut() {
            *buf = Complex::new(0.0, 0.0);
        }
        self.fft
            .process_with_scratch(&mut self.fft_buf, &mut self.fft_scratch);

        let n_bins = self.fft_size / 2 + 1;
        let bin_hz = self.sample_rate as f32 / self.fft_size as f32;

        let mut magnitude_sum = 0f32;
        let mut weighted_sum = 0f32;
        for (k, bin) in self.fft_buf[..n_bins].iter().enumerate() {
            let magnitude = bin.norm();
            magnitude_sum += magnitude;
            weighted_sum += magnitude * k as f32 * bin_hz;
        }
        let spectral_centroid_hz = if magnitude_sum > 0.0 {
            weighted_sum / magnitude_sum
        } else {
            0.0
        };

        for (log_energy, filter) in self.log_mel.iter_mut().zip(self.filterbank.iter()) {
            let mut energy = 0f32;
            for (&w, bin) in filter.iter().zip(self.fft_buf[..n_bins].iter()) {
                if w > 0.0 {
                    energy += w * bin.norm_sqr();
                }
            }
            *log_energy = energy.max(LOG_FLOOR).ln();
        }

        let cepstral = self
            .dct
            .iter()
            .map(|row| row.iter().zip(self.log_mel.iter()).map(|(b, e)| b * e).sum())
            .collect();

        FeatureVector {
            rms_energy: rms,
            cepstral,
            spectral_centroid_hz,
            zero_crossing_rate,
            is_speech: rms > self.energy_threshold,
        }
    }
}

impl std::fmt::Debug for FeatureExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureExtractor")
            .field("sample_rate", &self.sample_rate)
            .field("coefficient_count", &self.coefficient_count)
            .field("fft_size", &self.fft_size)
            .finish_non_exhaustive()
    }
}

fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

fn zero_crossing_rate(samples: &[f32]) -> f32 {
    if samples.len() < 2 {
        return 0.0;
    }
    let crossings = samples
        .windows(2)
        .filter(|pair| (pair[0] >= 0.0) != (pair[1] >= 0.0))
        .count();
    crossings as f32 / (samples.len() - 1) as f32
}

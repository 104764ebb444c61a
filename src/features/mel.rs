//! Mel filterbank and cepstral transform tables.
//!
//! Everything here is computed once at extractor construction; the
//! per-block hot path only does multiply-accumulate over these tables.

/// Triangular filters in the mel filterbank.
pub(crate) const N_MELS: usize = 26;

pub(crate) fn hann_window(n: usize) -> Vec<f32> {
    use std::f32::consts::PI;
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / n as f32).cos()))
        .collect()
}

/// Slaney-scale mel filterbank: `n_mels` triangular filters over
/// `fmin..fmax`, each row holding one weight per FFT bin.
pub(crate) fn mel_filterbank(
    fft_size: usize,
    sample_rate: u32,
    n_mels: usize,
    fmin: f32,
    fmax: f32,
) -> Vec<Vec<f32>> {
    let n_bins = fft_size / 2 + 1;

    // n_mels filters need n_mels + 2 edge points, evenly spaced in mel.
    let mel_lo = hz_to_mel(fmin);
    let mel_hi = hz_to_mel(fmax);
    let edges_hz: Vec<f32> = (0..=(n_mels + 1))
        .map(|i| mel_to_hz(mel_lo + (mel_hi - mel_lo) * i as f32 / (n_mels + 1) as f32))
        .collect();

    let bin_hz = sample_rate as f32 / fft_size as f32;

    let mut filters = vec![vec![0f32; n_bins]; n_mels];
    for (m, row) in filters.iter_mut().enumerate() {
        let lower = edges_hz[m];
        let center = edges_hz[m + 1];
        let upper = edges_hz[m + 2];
        let rise = (center - lower).max(1e-10);
        let fall = (upper - center).max(1e-10);
        // Slaney area normalisation keeps filter response independent of width.
        let norm = 2.0 / (upper - lower).max(1e-10);

        for (k, w) in row.iter_mut().enumerate() {
            let freq = k as f32 * bin_hz;
            let tri = if freq >= lower && freq <= center {
                (freq - lower) / rise
            } else if freq > center && freq <= upper {
                (upper - freq) / fall
            } else {
                0.0
            };
            *w = (tri * norm).max(0.0);
        }
    }
    filters
}

/// Orthonormal DCT-II basis, `n_coeffs` rows of `n_mels` weights.
/// Row `k` dotted with the log-mel energies yields cepstral coefficient `k`.
pub(crate) fn dct_basis(n_coeffs: usize, n_mels: usize) -> Vec<Vec<f32>> {
    use std::f32::consts::PI;
    (0..n_coeffs)
        .map(|k| {
            let scale = if k == 0 {
                (1.0 / n_mels as f32).sqrt()
            } else {
                (2.0 / n_mels as f32).sqrt()
            };
            (0..n_mels)
                .map(|m| scale * (PI * k as f32 * (2 * m + 1) as f32 / (2 * n_mels) as f32).cos())
                .collect()
        })
        .collect()
}

// Slaney mel scale: linear below 1 kHz, logarithmic above.
fn hz_to_mel(hz: f32) -> f32 {
    let f_sp = 200.0 / 3.0;
    let min_log_hz = 1_000.0;
    let min_log_mel = min_log_hz / f_sp;
    let logstep = (6.4_f32).ln() / 27.0;
    if hz >= min_log_hz {
        min_log_mel + (hz / min_log_hz).ln() / logstep
    } else {
        hz / f_sp
    }
}

fn mel_to_hz(mel: f32) -> f32 {
    let f_sp = 200.0 / 3.0;
    let min_log_hz = 1_000.0;
    let min_log_mel = min_log_hz / f_sp;
    let logstep = (6.4_f32).ln() / 27.0;
    if mel >= min_log_mel {
        min_log_hz * (logstep * (mel - min_log_mel)).exp()
    } else {
        mel * f_sp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mel_scale_round_trips() {
        for hz in [0.0, 120.0, 440.0, 1_000.0, 4_000.0, 16_000.0] {
            assert_relative_eq!(mel_to_hz(hz_to_mel(hz)), hz, max_relative = 1e-4);
        }
    }

    #[test]
    fn filterbank_rows_cover_distinct_bands() {
        let filters = mel_filterbank(1024, 44_100, N_MELS, 0.0, 22_050.0);
        assert_eq!(filters.len(), N_MELS);
        assert_eq!(filters[0].len(), 513);

        // Each filter has some response, and filter centers move upward.
        let center_bin = |row: &[f32]| {
            row.iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                .map(|(k, _)| k)
                .unwrap()
        };
        let mut prev = 0usize;
        for row in &filters {
            assert!(row.iter().any(|&w| w > 0.0));
            let c = center_bin(row);
            assert!(c >= prev, "filter centers must be non-decreasing");
            prev = c;
        }
    }

    #[test]
    fn dct_basis_rows_are_orthonormal() {
        let basis = dct_basis(N_MELS, N_MELS);
        for i in 0..N_MELS {
            for j in 0..N_MELS {
                let dot: f32 = (0..N_MELS).map(|m| basis[i][m] * basis[j][m]).sum();
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(dot, expected, epsilon = 1e-4);
            }
        }
    }
}

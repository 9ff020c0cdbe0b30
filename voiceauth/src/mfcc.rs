use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::spectrum::{dct2_ortho, hamming_window, mel_filterbank, RealFft};

/// Configures mel-frequency cepstral coefficient extraction.
///
/// Defaults: 25ms frames, 10ms step, 13 coefficients from 26 mel filters
/// over a 512-point FFT, pre-emphasis 0.97, lifter 22, Hamming window and
/// log frame energy in place of coefficient 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MfccConfig {
    /// Frame length in seconds (default: 0.025).
    pub frame_secs: f64,
    /// Frame step in seconds (default: 0.010).
    pub step_secs: f64,
    /// Number of cepstral coefficients kept per frame (default: 13).
    pub num_coeffs: usize,
    /// Number of mel filters (default: 26).
    pub num_filters: usize,
    /// FFT size (default: 512).
    pub fft_size: usize,
    /// Low cutoff of the filterbank in Hz (default: 0).
    pub low_freq: f64,
    /// High cutoff in Hz, non-positive means Nyquist (default: 0).
    pub high_freq: f64,
    /// Pre-emphasis coefficient (default: 0.97).
    pub pre_emphasis: f64,
    /// Sinusoidal lifter length, 0 disables liftering (default: 22).
    pub cep_lifter: usize,
    /// Replace coefficient 0 with the log frame energy (default: true).
    pub append_energy: bool,
}

impl Default for MfccConfig {
    fn default() -> Self {
        Self {
            frame_secs: 0.025,
            step_secs: 0.010,
            num_coeffs: 13,
            num_filters: 26,
            fft_size: 512,
            low_freq: 0.0,
            high_freq: 0.0,
            pre_emphasis: 0.97,
            cep_lifter: 22,
            append_energy: true,
        }
    }
}

impl MfccConfig {
    /// Frame length in samples at `sample_rate`, rounded half up.
    pub fn frame_len(&self, sample_rate: u32) -> usize {
        (self.frame_secs * sample_rate as f64 + 0.5).floor() as usize
    }

    /// Frame step in samples at `sample_rate`, rounded half up.
    pub fn frame_step(&self, sample_rate: u32) -> usize {
        (self.step_secs * sample_rate as f64 + 0.5).floor() as usize
    }
}

/// Computes MFCCs for a mono signal.
///
/// Output: `[num_frames][num_coeffs]`. The last frame is zero padded, so any
/// non-empty signal yields at least one frame.
///
/// Returns `None` for an empty signal or a degenerate configuration.
pub fn compute_mfcc(signal: &[f64], sample_rate: u32, cfg: &MfccConfig) -> Option<Vec<Vec<f64>>> {
    let frame_len = cfg.frame_len(sample_rate);
    let step = cfg.frame_step(sample_rate);
    if signal.is_empty()
        || frame_len == 0
        || step == 0
        || cfg.fft_size == 0
        || cfg.num_filters == 0
        || cfg.num_coeffs == 0
        || sample_rate == 0
    {
        return None;
    }

    // Pre-emphasis over the whole signal.
    let mut emphasized = Vec::with_capacity(signal.len());
    emphasized.push(signal[0]);
    for i in 1..signal.len() {
        emphasized.push(signal[i] - cfg.pre_emphasis * signal[i - 1]);
    }

    let num_frames = if emphasized.len() <= frame_len {
        1
    } else {
        1 + (emphasized.len() - frame_len).div_ceil(step)
    };
    emphasized.resize((num_frames - 1) * step + frame_len, 0.0);

    let high_freq = if cfg.high_freq <= 0.0 {
        sample_rate as f64 / 2.0
    } else {
        cfg.high_freq
    };
    let filterbank = mel_filterbank(cfg.num_filters, cfg.fft_size, sample_rate, cfg.low_freq, high_freq);
    let window = hamming_window(frame_len);
    let lifter = lifter_weights(cfg.num_coeffs, cfg.cep_lifter);
    let mut fft = RealFft::new(cfg.fft_size);
    let mut frame = vec![0.0f64; frame_len];

    let mut result = Vec::with_capacity(num_frames);
    for f in 0..num_frames {
        let offset = f * step;
        for (i, v) in frame.iter_mut().enumerate() {
            *v = emphasized[offset + i] * window[i];
        }

        // Power spectrum: |X[k]|^2 / N.
        let power: Vec<f64> = fft
            .process(&frame)
            .iter()
            .map(|c| c.norm_sqr() / cfg.fft_size as f64)
            .collect();

        let mut energy: f64 = power.iter().sum();
        if energy <= 0.0 {
            energy = f64::EPSILON;
        }

        let log_mel: Vec<f64> = filterbank
            .iter()
            .map(|filter| {
                let e: f64 = filter.iter().zip(&power).map(|(w, p)| w * p).sum();
                if e <= 0.0 { f64::EPSILON.ln() } else { e.ln() }
            })
            .collect();

        let mut coeffs = dct2_ortho(&log_mel, cfg.num_coeffs);
        for (c, w) in coeffs.iter_mut().zip(&lifter) {
            *c *= w;
        }
        if cfg.append_energy {
            coeffs[0] = energy.ln();
        }
        result.push(coeffs);
    }

    Some(result)
}

/// Sinusoidal lifter `1 + (L/2) sin(pi n / L)`; all ones when `L == 0`.
fn lifter_weights(num_coeffs: usize, lifter: usize) -> Vec<f64> {
    if lifter == 0 {
        return vec![1.0; num_coeffs];
    }
    let l = lifter as f64;
    (0..num_coeffs)
        .map(|n| 1.0 + (l / 2.0) * (PI * n as f64 / l).sin())
        .collect()
}

/// Per-coefficient statistics across frames.
#[derive(Debug, Clone, PartialEq)]
pub struct CepstralStats {
    pub mean: Vec<f64>,
    /// Population standard deviation.
    pub std: Vec<f64>,
    pub min: Vec<f64>,
    pub max: Vec<f64>,
}

/// Reduces a `[frames][coeffs]` matrix to four per-coefficient rows.
///
/// Returns `None` when there are no frames.
pub fn cepstral_stats(frames: &[Vec<f64>]) -> Option<CepstralStats> {
    let first = frames.first()?;
    let dims = first.len();
    let n = frames.len() as f64;

    let mut mean = vec![0.0f64; dims];
    let mut min = vec![f64::INFINITY; dims];
    let mut max = vec![f64::NEG_INFINITY; dims];
    for frame in frames {
        for (d, &v) in frame.iter().enumerate().take(dims) {
            mean[d] += v;
            min[d] = min[d].min(v);
            max[d] = max[d].max(v);
        }
    }
    for m in &mut mean {
        *m /= n;
    }

    let mut std = vec![0.0f64; dims];
    for frame in frames {
        for (d, &v) in frame.iter().enumerate().take(dims) {
            let diff = v - mean[d];
            std[d] += diff * diff;
        }
    }
    for s in &mut std {
        *s = (*s / n).sqrt();
    }

    Some(CepstralStats { mean, std, min, max })
}

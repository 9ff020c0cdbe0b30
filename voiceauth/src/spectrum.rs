//! Spectral building blocks shared by feature extraction and liveness.

use std::f64::consts::PI;
use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Symmetric Hamming window.
pub fn hamming_window(n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![1.0];
    }
    (0..n)
        .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / (n - 1) as f64).cos())
        .collect()
}

/// Periodic Hann window, the usual choice for short-time analysis.
pub fn hann_window(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos())
        .collect()
}

pub fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

pub fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0)
}

/// Computes triangular mel filterbank weights.
/// Returns `[num_filters][fft_size / 2 + 1]` weights.
///
/// Band edges are placed at `floor((fft_size + 1) * hz / sample_rate)`.
pub fn mel_filterbank(
    num_filters: usize,
    fft_size: usize,
    sample_rate: u32,
    low_freq: f64,
    high_freq: f64,
) -> Vec<Vec<f64>> {
    let half_fft = fft_size / 2 + 1;
    let mel_low = hz_to_mel(low_freq);
    let mel_high = hz_to_mel(high_freq);

    let bins: Vec<usize> = (0..num_filters + 2)
        .map(|i| {
            let mel = mel_low + i as f64 * (mel_high - mel_low) / (num_filters + 1) as f64;
            let bin = ((fft_size + 1) as f64 * mel_to_hz(mel) / sample_rate as f64).floor();
            (bin.max(0.0) as usize).min(half_fft - 1)
        })
        .collect();

    let mut fb = Vec::with_capacity(num_filters);
    for m in 0..num_filters {
        let mut filter = vec![0.0f64; half_fft];
        let (left, center, right) = (bins[m], bins[m + 1], bins[m + 2]);
        for k in left..center {
            filter[k] = (k - left) as f64 / (center - left) as f64;
        }
        for k in center..right {
            filter[k] = (right - k) as f64 / (right - center) as f64;
        }
        fb.push(filter);
    }
    fb
}

/// Orthonormal DCT-II, keeping the first `num_coeffs` outputs.
pub fn dct2_ortho(input: &[f64], num_coeffs: usize) -> Vec<f64> {
    let n = input.len();
    if n == 0 {
        return vec![0.0; num_coeffs];
    }
    let nf = n as f64;
    (0..num_coeffs)
        .map(|k| {
            let sum: f64 = input
                .iter()
                .enumerate()
                .map(|(i, &x)| x * (PI * k as f64 * (2 * i + 1) as f64 / (2.0 * nf)).cos())
                .sum();
            let scale = if k == 0 { (1.0 / nf).sqrt() } else { (2.0 / nf).sqrt() };
            sum * scale
        })
        .collect()
}

/// Forward real-input FFT of a fixed size.
///
/// Input shorter than the size is zero padded, longer input is truncated.
/// Returns the `size / 2 + 1` non-negative frequency bins.
pub struct RealFft {
    size: usize,
    fft: Arc<dyn Fft<f64>>,
    buf: Vec<Complex<f64>>,
}

impl RealFft {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::<f64>::new();
        Self {
            size,
            fft: planner.plan_fft_forward(size),
            buf: vec![Complex::new(0.0, 0.0); size],
        }
    }

    /// Number of one-sided bins.
    pub fn bins(&self) -> usize {
        self.size / 2 + 1
    }

    /// Transforms `input` and returns the one-sided spectrum.
    pub fn process(&mut self, input: &[f64]) -> &[Complex<f64>] {
        for (i, slot) in self.buf.iter_mut().enumerate() {
            let re = input.get(i).copied().unwrap_or(0.0);
            *slot = Complex::new(re, 0.0);
        }
        self.fft.process(&mut self.buf);
        let bins = self.bins();
        &self.buf[..bins]
    }
}

/// Magnitude spectrum of a whole signal, one FFT over its full length.
pub fn magnitude_spectrum(signal: &[f64]) -> Vec<f64> {
    if signal.is_empty() {
        return Vec::new();
    }
    let mut fft = RealFft::new(signal.len());
    fft.process(signal).iter().map(|c| c.norm()).collect()
}

/// Configures [`stft_magnitudes`].
#[derive(Debug, Clone, Copy)]
pub struct StftConfig {
    /// Segment length in samples.
    pub segment_len: usize,
    /// Hop between segments in samples.
    pub hop: usize,
}

/// Short-time magnitude spectra.
///
/// Pads `segment_len / 2` zeros on both sides, pads the tail so the last
/// segment is complete, applies a periodic Hann window and scales each
/// magnitude by `1 / sum(window)`. Returns `[num_frames][segment_len / 2 + 1]`.
pub fn stft_magnitudes(signal: &[f64], cfg: StftConfig) -> Vec<Vec<f64>> {
    if cfg.segment_len == 0 || cfg.hop == 0 || signal.is_empty() {
        return Vec::new();
    }
    let seg = cfg.segment_len;
    let pad = seg / 2;

    let mut padded = vec![0.0f64; pad];
    padded.extend_from_slice(signal);
    padded.resize(padded.len() + pad, 0.0);
    if padded.len() < seg {
        padded.resize(seg, 0.0);
    }
    let num_frames = (padded.len() - seg).div_ceil(cfg.hop) + 1;
    padded.resize((num_frames - 1) * cfg.hop + seg, 0.0);

    let window = hann_window(seg);
    let scale = 1.0 / window.iter().sum::<f64>();
    let mut fft = RealFft::new(seg);
    let mut frame = vec![0.0f64; seg];

    let mut result = Vec::with_capacity(num_frames);
    for f in 0..num_frames {
        let offset = f * cfg.hop;
        for (i, v) in frame.iter_mut().enumerate() {
            *v = padded[offset + i] * window[i];
        }
        let mags: Vec<f64> = fft.process(&frame).iter().map(|c| c.norm() * scale).collect();
        result.push(mags);
    }
    result
}

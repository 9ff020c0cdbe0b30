use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::features::{mean_square, zero_crossing_rate};
use crate::spectrum::{stft_magnitudes, StftConfig};
use crate::waveform::Waveform;

/// Estimates whether a waveform was captured from a live speaker.
///
/// Implementations must be total: any internal failure is reported as
/// `{confidence: 0, is_live: false}` rather than an error.
///
/// # Thread Safety
///
/// Implementations must be safe for concurrent use.
pub trait LivenessScorer: Send + Sync {
    fn score(&self, waveform: &Waveform) -> LivenessResult;
}

/// Output of a [`LivenessScorer`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LivenessResult {
    /// Value in [0, 1]; higher means more likely live.
    pub confidence: f64,
    pub is_live: bool,
    /// Per-cue scores, when the scorer exposes them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<LivenessBreakdown>,
}

impl LivenessResult {
    /// The fail-closed result.
    pub fn rejected() -> Self {
        Self {
            confidence: 0.0,
            is_live: false,
            breakdown: None,
        }
    }
}

/// The five sub-scores of [`HeuristicLiveness`], each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LivenessBreakdown {
    pub zero_crossing: f64,
    pub high_freq_ratio: f64,
    pub spectral_flux: f64,
    pub dynamic_range: f64,
    pub snr: f64,
}

/// Weights combining the sub-scores into a confidence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessWeights {
    pub zero_crossing: f64,
    pub high_freq_ratio: f64,
    pub spectral_flux: f64,
    pub dynamic_range: f64,
    pub snr: f64,
}

impl Default for LivenessWeights {
    fn default() -> Self {
        Self {
            zero_crossing: 0.15,
            high_freq_ratio: 0.25,
            spectral_flux: 0.30,
            dynamic_range: 0.15,
            snr: 0.15,
        }
    }
}

impl LivenessWeights {
    fn combine(&self, s: &LivenessBreakdown) -> f64 {
        self.zero_crossing * s.zero_crossing
            + self.high_freq_ratio * s.high_freq_ratio
            + self.spectral_flux * s.spectral_flux
            + self.dynamic_range * s.dynamic_range
            + self.snr * s.snr
    }
}

/// Configures [`HeuristicLiveness`].
///
/// The scale factors are empirical and kept as tunable defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    /// Confidence at or above which audio counts as live (default: 0.5).
    pub spoof_threshold: f64,
    /// Short-time transform segment length in samples (default: 256).
    pub segment_len: usize,
    /// Zero-crossing rate multiplier (default: 100).
    pub zcr_scale: f64,
    /// High-frequency energy ratio multiplier (default: 3).
    pub high_freq_scale: f64,
    /// Mean spectral flux multiplier (default: 0.01).
    pub flux_scale: f64,
    /// Flux score when fewer than two frames exist (default: 0.5).
    pub flux_default: f64,
    /// Peak-to-peak amplitude multiplier (default: 2).
    pub dynamic_range_scale: f64,
    /// SNR in dB is divided by this (default: 40).
    pub snr_db_divisor: f64,
    /// Trailing samples used as the noise estimate (default: 100).
    pub snr_tail_samples: usize,
    /// Added to the noise variance (default: 1e-10).
    pub snr_epsilon: f64,
    /// SNR score for a zero-power signal (default: 0.5).
    pub snr_default: f64,
    pub weights: LivenessWeights,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            spoof_threshold: 0.5,
            segment_len: 256,
            zcr_scale: 100.0,
            high_freq_scale: 3.0,
            flux_scale: 0.01,
            flux_default: 0.5,
            dynamic_range_scale: 2.0,
            snr_db_divisor: 40.0,
            snr_tail_samples: 100,
            snr_epsilon: 1e-10,
            snr_default: 0.5,
            weights: LivenessWeights::default(),
        }
    }
}

/// Replay detection from spectral and temporal cues.
///
/// # Cues
///
/// - zero-crossing rate: replays suppress high-frequency noise
/// - high-frequency energy ratio: live capture keeps more upper-band energy
/// - spectral flux: live speech varies more frame to frame than a loop
/// - dynamic range: replays are often compressed
/// - SNR against the trailing samples
#[derive(Debug, Clone, Default)]
pub struct HeuristicLiveness {
    cfg: LivenessConfig,
}

impl HeuristicLiveness {
    pub fn new(cfg: LivenessConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &LivenessConfig {
        &self.cfg
    }

    /// Computes the sub-scores for raw samples.
    /// Returns `None` when the input cannot be analysed.
    pub fn breakdown(&self, samples: &[f64]) -> Option<LivenessBreakdown> {
        if samples.is_empty() || self.cfg.segment_len < 2 {
            return None;
        }
        let cfg = &self.cfg;

        let zero_crossing = (zero_crossing_rate(samples) * cfg.zcr_scale).min(1.0);

        let frames = stft_magnitudes(
            samples,
            StftConfig {
                segment_len: cfg.segment_len,
                hop: cfg.segment_len / 2,
            },
        );
        let high_freq_ratio = (high_freq_ratio(&frames) * cfg.high_freq_scale).min(1.0);
        let spectral_flux = match mean_flux(&frames) {
            Some(flux) => (flux * cfg.flux_scale).min(1.0),
            None => cfg.flux_default,
        };

        let (lo, hi) = samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| (lo.min(s), hi.max(s)));
        let dynamic_range = ((hi - lo) * cfg.dynamic_range_scale).min(1.0);

        let snr = self.snr_score(samples);

        Some(LivenessBreakdown {
            zero_crossing,
            high_freq_ratio,
            spectral_flux,
            dynamic_range,
            snr,
        })
    }

    fn snr_score(&self, samples: &[f64]) -> f64 {
        let cfg = &self.cfg;
        let power = mean_square(samples);
        if power == 0.0 {
            return cfg.snr_default;
        }
        let tail = &samples[samples.len().saturating_sub(cfg.snr_tail_samples)..];
        let noise = variance(tail);
        let snr_db = 10.0 * (power / (noise + cfg.snr_epsilon)).log10();
        (snr_db / cfg.snr_db_divisor).clamp(0.0, 1.0)
    }
}

impl LivenessScorer for HeuristicLiveness {
    fn score(&self, waveform: &Waveform) -> LivenessResult {
        let Some(breakdown) = self.breakdown(waveform.samples()) else {
            warn!("liveness analysis failed, rejecting");
            return LivenessResult::rejected();
        };

        let confidence = self.cfg.weights.combine(&breakdown);
        if !confidence.is_finite() {
            warn!(?breakdown, "non-finite liveness confidence, rejecting");
            return LivenessResult::rejected();
        }
        let confidence = confidence.clamp(0.0, 1.0);
        let is_live = confidence >= self.cfg.spoof_threshold;

        debug!(
            zcr = breakdown.zero_crossing,
            hf = breakdown.high_freq_ratio,
            flux = breakdown.spectral_flux,
            dr = breakdown.dynamic_range,
            snr = breakdown.snr,
            confidence,
            is_live,
            "liveness scored"
        );

        LivenessResult {
            confidence,
            is_live,
            breakdown: Some(breakdown),
        }
    }
}

/// Share of spectral power in the upper half of the bins.
fn high_freq_ratio(frames: &[Vec<f64>]) -> f64 {
    let mut low = 0.0f64;
    let mut high = 0.0f64;
    for frame in frames {
        let split = frame.len() / 2;
        for (k, m) in frame.iter().enumerate() {
            if k < split {
                low += m * m;
            } else {
                high += m * m;
            }
        }
    }
    let total = low + high;
    if total > 0.0 { high / total } else { 0.0 }
}

/// Mean over consecutive frames of the summed squared magnitude change.
fn mean_flux(frames: &[Vec<f64>]) -> Option<f64> {
    if frames.len() < 2 {
        return None;
    }
    let total: f64 = frames
        .windows(2)
        .map(|w| {
            w[1].iter()
                .zip(&w[0])
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f64>()
        })
        .sum();
    Some(total / (frames.len() - 1) as f64)
}

/// Population variance.
fn variance(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let n = x.len() as f64;
    let mean = x.iter().sum::<f64>() / n;
    x.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n
}

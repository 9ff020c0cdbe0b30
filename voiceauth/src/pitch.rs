use serde::{Deserialize, Serialize};

/// Configures autocorrelation pitch estimation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PitchConfig {
    /// Analysis window in seconds (default: 0.025).
    pub frame_secs: f64,
    /// Hop between windows in seconds (default: 0.010).
    pub hop_secs: f64,
    /// Lowest fundamental searched, in Hz (default: 80).
    pub min_freq: f64,
    /// Highest fundamental searched, in Hz (default: 400).
    pub max_freq: f64,
    /// Mean reported when no window is voiced (default: 150).
    pub default_mean: f64,
    /// Standard deviation reported when no window is voiced (default: 20).
    pub default_std: f64,
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            frame_secs: 0.025,
            hop_secs: 0.010,
            min_freq: 80.0,
            max_freq: 400.0,
            default_mean: 150.0,
            default_std: 20.0,
        }
    }
}

/// Aggregated pitch over an utterance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchStats {
    pub mean: f64,
    pub std: f64,
    /// Number of windows that produced an estimate.
    /// Zero means `mean` and `std` are the configured defaults.
    pub voiced_frames: usize,
}

/// Estimates the fundamental frequency of one window via autocorrelation.
///
/// The window is peak-normalized first. Returns `None` for a silent window,
/// a non-positive zero-lag energy, or when the lag range does not fit in
/// the window.
pub fn estimate_pitch(frame: &[f64], sample_rate: u32, cfg: &PitchConfig) -> Option<f64> {
    if cfg.max_freq <= 0.0 || cfg.min_freq <= 0.0 {
        return None;
    }
    let peak = frame.iter().fold(0.0f64, |m, &s| m.max(s.abs()));
    if peak == 0.0 || !peak.is_finite() {
        return None;
    }

    let min_lag = (sample_rate as f64 / cfg.max_freq) as usize;
    let max_lag = (sample_rate as f64 / cfg.min_freq) as usize;
    if max_lag >= frame.len() || min_lag >= max_lag {
        return None;
    }

    let normalized: Vec<f64> = frame.iter().map(|&s| s / peak).collect();
    let energy = autocorr(&normalized, 0);
    if !(energy > 0.0) {
        return None;
    }

    let mut best_lag = min_lag;
    let mut best = f64::NEG_INFINITY;
    for lag in min_lag..max_lag {
        let c = autocorr(&normalized, lag);
        if c > best {
            best = c;
            best_lag = lag;
        }
    }
    if best_lag == 0 {
        return None;
    }
    Some(sample_rate as f64 / best_lag as f64)
}

fn autocorr(x: &[f64], lag: usize) -> f64 {
    x.iter().zip(&x[lag..]).map(|(a, b)| a * b).sum()
}

/// Runs [`estimate_pitch`] over sliding windows and aggregates the results.
///
/// Windows start at `0, hop, 2*hop, ...` strictly before `len - window`.
/// When no window yields an estimate the configured defaults are returned.
pub fn pitch_stats(signal: &[f64], sample_rate: u32, cfg: &PitchConfig) -> PitchStats {
    let frame_len = (cfg.frame_secs * sample_rate as f64).round() as usize;
    let hop = (cfg.hop_secs * sample_rate as f64).round() as usize;

    let mut pitches = Vec::new();
    if frame_len > 0 && hop > 0 && signal.len() > frame_len {
        let mut start = 0;
        while start < signal.len() - frame_len {
            if let Some(p) = estimate_pitch(&signal[start..start + frame_len], sample_rate, cfg) {
                pitches.push(p);
            }
            start += hop;
        }
    }

    if pitches.is_empty() {
        return PitchStats {
            mean: cfg.default_mean,
            std: cfg.default_std,
            voiced_frames: 0,
        };
    }

    let n = pitches.len() as f64;
    let mean = pitches.iter().sum::<f64>() / n;
    let var = pitches.iter().map(|p| (p - mean) * (p - mean)).sum::<f64>() / n;
    PitchStats {
        mean,
        std: var.sqrt(),
        voiced_frames: pitches.len(),
    }
}

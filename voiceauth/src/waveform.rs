use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AudioDefect, VoiceAuthError};
use crate::resample;

/// Canonical sample rate for all feature work.
pub const SAMPLE_RATE: u32 = 16000;

/// Decoded audio as handed over by the caller.
///
/// Samples are interleaved when `channels > 1`, the layout produced by WAV
/// and most other PCM decoders.
#[derive(Debug, Clone)]
pub struct RawAudio {
    pub samples: Vec<f64>,
    pub channels: u16,
    pub sample_rate: u32,
}

impl RawAudio {
    /// Creates single-channel audio.
    pub fn mono(samples: Vec<f64>, sample_rate: u32) -> Self {
        Self {
            samples,
            channels: 1,
            sample_rate,
        }
    }

    /// Creates audio from interleaved multi-channel samples.
    pub fn interleaved(samples: Vec<f64>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    /// Number of sample frames (samples per channel).
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Duration in seconds, 0 for a zero sample rate.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    /// Collapses all channels to mono by per-frame averaging.
    /// A trailing partial frame is dropped.
    pub fn to_mono(&self) -> Vec<f64> {
        let ch = self.channels as usize;
        if ch <= 1 {
            return self.samples.clone();
        }
        self.samples
            .chunks_exact(ch)
            .map(|frame| frame.iter().sum::<f64>() / ch as f64)
            .collect()
    }
}

/// Configures waveform loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Output sample rate in Hz (default: 16000).
    pub target_sample_rate: u32,
    /// Minimum duration after resampling, in seconds (default: 0.5).
    pub min_duration_secs: f64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: SAMPLE_RATE,
            min_duration_secs: 0.5,
        }
    }
}

/// A mono, peak-normalized waveform at a fixed sample rate.
///
/// Only [`load`] builds one, so every instance is non-empty, not silent,
/// and has a peak magnitude of exactly 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<f64>,
    sample_rate: u32,
}

impl Waveform {
    /// Returns the normalized samples.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Returns the sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false for a loaded waveform.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Validates, downmixes, resamples and peak-normalizes decoded audio.
///
/// # Errors
///
/// Returns [`VoiceAuthError::InvalidAudio`] when the input is empty, holds
/// NaN or infinite samples, is all zero, is shorter than
/// `cfg.min_duration_secs` after resampling, or has no usable peak.
pub fn load(raw: &RawAudio, cfg: &LoaderConfig) -> Result<Waveform, VoiceAuthError> {
    if raw.channels == 0 {
        return Err(AudioDefect::Format("zero channels".into()).into());
    }
    if raw.sample_rate == 0 {
        return Err(AudioDefect::Format("zero sample rate".into()).into());
    }
    if cfg.target_sample_rate == 0 {
        return Err(AudioDefect::Format("zero target sample rate".into()).into());
    }

    let mono = raw.to_mono();
    if mono.is_empty() {
        return Err(AudioDefect::Empty.into());
    }
    let non_finite = mono.iter().filter(|s| !s.is_finite()).count();
    if non_finite > 0 {
        return Err(AudioDefect::NonFinite { count: non_finite }.into());
    }
    if mono.iter().all(|&s| s == 0.0) {
        return Err(AudioDefect::Silent.into());
    }

    let mut samples = if raw.sample_rate != cfg.target_sample_rate {
        debug!(
            from = raw.sample_rate,
            to = cfg.target_sample_rate,
            "resampling waveform"
        );
        resample::resample(&mono, raw.sample_rate, cfg.target_sample_rate)
            .map_err(|e| AudioDefect::Unreadable(e.to_string()))?
    } else {
        mono
    };

    let min_samples = (cfg.min_duration_secs * cfg.target_sample_rate as f64) as usize;
    if samples.len() < min_samples {
        return Err(AudioDefect::TooShort {
            min_secs: cfg.min_duration_secs,
            got_secs: samples.len() as f64 / cfg.target_sample_rate as f64,
        }
        .into());
    }

    let peak = samples.iter().fold(0.0f64, |m, &s| m.max(s.abs()));
    if peak == 0.0 || !peak.is_finite() {
        return Err(AudioDefect::ZeroAmplitude.into());
    }
    for s in &mut samples {
        *s /= peak;
    }

    debug!(
        samples = samples.len(),
        duration_secs = samples.len() as f64 / cfg.target_sample_rate as f64,
        "waveform loaded"
    );

    Ok(Waveform {
        samples,
        sample_rate: cfg.target_sample_rate,
    })
}

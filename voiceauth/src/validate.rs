//! Pre-save sanity gate for uploaded utterances.
//!
//! Callers run [`validate`] before persisting a recording. It is looser
//! than what the extractor needs and independent of [`crate::load`].

use serde::{Deserialize, Serialize};

use crate::waveform::RawAudio;

/// Configures the pre-save validation gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Shortest accepted recording in seconds (default: 1.0).
    pub min_duration_secs: f64,
    /// Longest accepted recording in seconds (default: 15.0).
    pub max_duration_secs: f64,
    /// Minimum mean-square energy of the mono mix (default: 1e-6).
    pub min_energy: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: 1.0,
            max_duration_secs: 15.0,
            min_energy: 1e-6,
        }
    }
}

/// Result of [`validate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioReport {
    pub valid: bool,
    pub duration_secs: f64,
    pub sample_rate: u32,
    pub channels: u16,
    /// Set when `valid` is false.
    pub reason: Option<String>,
}

/// Checks duration and loudness of a recording.
pub fn validate(raw: &RawAudio, cfg: &ValidationConfig) -> AudioReport {
    let duration_secs = raw.duration_secs();
    let report = |reason: Option<String>| AudioReport {
        valid: reason.is_none(),
        duration_secs,
        sample_rate: raw.sample_rate,
        channels: raw.channels,
        reason,
    };

    if raw.sample_rate == 0 || raw.channels == 0 {
        return report(Some("invalid audio format".into()));
    }
    if duration_secs < cfg.min_duration_secs {
        return report(Some(format!(
            "audio too short ({duration_secs:.1}s < {}s)",
            cfg.min_duration_secs
        )));
    }
    if duration_secs > cfg.max_duration_secs {
        return report(Some(format!(
            "audio too long ({duration_secs:.1}s > {}s)",
            cfg.max_duration_secs
        )));
    }

    let mono = raw.to_mono();
    let energy = mono.iter().map(|s| s * s).sum::<f64>() / mono.len() as f64;
    if !(energy >= cfg.min_energy) {
        return report(Some("audio is too quiet or silent".into()));
    }

    report(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_config_default() {
        let cfg = ValidationConfig::default();
        assert_eq!(cfg.min_duration_secs, 1.0);
        assert_eq!(cfg.max_duration_secs, 15.0);
        assert_eq!(cfg.min_energy, 1e-6);
    }

    #[test]
    fn accepts_normal_recording() {
        let raw = RawAudio::mono(vec![0.1; 32000], 16000);
        let report = validate(&raw, &ValidationConfig::default());
        assert!(report.valid);
        assert_eq!(report.reason, None);
        assert!((report.duration_secs - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_short_recording() {
        let raw = RawAudio::mono(vec![0.1; 8000], 16000);
        let report = validate(&raw, &ValidationConfig::default());
        assert!(!report.valid);
        assert_eq!(report.reason.as_deref(), Some("audio too short (0.5s < 1s)"));
    }

    #[test]
    fn rejects_long_recording() {
        let raw = RawAudio::mono(vec![0.1; 16000 * 16], 16000);
        let report = validate(&raw, &ValidationConfig::default());
        assert!(!report.valid);
        assert_eq!(report.reason.as_deref(), Some("audio too long (16.0s > 15s)"));
    }

    #[test]
    fn rejects_quiet_recording() {
        let raw = RawAudio::mono(vec![1e-4; 32000], 16000);
        let report = validate(&raw, &ValidationConfig::default());
        assert!(!report.valid);
        assert_eq!(report.reason.as_deref(), Some("audio is too quiet or silent"));
    }

    #[test]
    fn stereo_duration_counts_frames() {
        let raw = RawAudio::interleaved(vec![0.1; 64000], 2, 16000);
        let report = validate(&raw, &ValidationConfig::default());
        assert!(report.valid);
        assert_eq!(report.channels, 2);
        assert!((report.duration_secs - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_zero_sample_rate() {
        let raw = RawAudio::mono(vec![0.1; 100], 0);
        let report = validate(&raw, &ValidationConfig::default());
        assert!(!report.valid);
    }
}

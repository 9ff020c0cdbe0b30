use thiserror::Error;

/// Errors returned by voice authentication operations.
#[derive(Debug, Error)]
pub enum VoiceAuthError {
    #[error("invalid audio: {0}")]
    InvalidAudio(AudioDefect),

    #[error("feature extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("resample error: {0}")]
    Resample(String),
}

/// Why a waveform was rejected by the loader.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioDefect {
    #[error("audio is empty")]
    Empty,

    #[error("audio contains only silence")]
    Silent,

    #[error("audio too short: {got_secs:.2}s (need at least {min_secs}s)")]
    TooShort { min_secs: f64, got_secs: f64 },

    #[error("audio has zero or non-finite peak amplitude")]
    ZeroAmplitude,

    #[error("audio contains {count} non-finite samples")]
    NonFinite { count: usize },

    #[error("unsupported format: {0}")]
    Format(String),

    #[error("audio could not be processed: {0}")]
    Unreadable(String),
}

impl From<AudioDefect> for VoiceAuthError {
    fn from(d: AudioDefect) -> Self {
        VoiceAuthError::InvalidAudio(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_audio_display() {
        let err: VoiceAuthError = AudioDefect::TooShort {
            min_secs: 0.5,
            got_secs: 0.25,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "invalid audio: audio too short: 0.25s (need at least 0.5s)"
        );
    }

    #[test]
    fn dimension_mismatch_display() {
        let err = VoiceAuthError::DimensionMismatch {
            expected: 57,
            got: 3,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 57, got 3");
    }

    #[test]
    fn non_finite_display() {
        let err: VoiceAuthError = AudioDefect::NonFinite { count: 2 }.into();
        assert_eq!(err.to_string(), "invalid audio: audio contains 2 non-finite samples");
    }
}

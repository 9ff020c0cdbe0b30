use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::VoiceAuthError;
use crate::mfcc::{cepstral_stats, compute_mfcc, MfccConfig};
use crate::pitch::{pitch_stats, PitchConfig};
use crate::spectrum::magnitude_spectrum;
use crate::waveform::Waveform;

/// Number of cepstral coefficients per statistic row.
pub const CEPSTRAL_DIM: usize = 13;

/// Length of every [`FeatureVector`]: four cepstral rows, two pitch
/// statistics and three spectral descriptors.
pub const FEATURE_DIM: usize = 4 * CEPSTRAL_DIM + 2 + 3;

const PITCH_OFFSET: usize = 4 * CEPSTRAL_DIM;
const DESCRIPTOR_OFFSET: usize = PITCH_OFFSET + 2;

/// A fixed-length voice feature vector.
///
/// Layout:
///
/// ```text
///  0..13  cepstral mean
/// 13..26  cepstral std
/// 26..39  cepstral min
/// 39..52  cepstral max
/// 52      pitch mean (Hz)
/// 53      pitch std (Hz)
/// 54      energy
/// 55      zero-crossing rate
/// 56      spectral centroid (Hz)
/// ```
///
/// Every element is finite: non-finite inputs are replaced with 0.0 on
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    /// Returns the all-zero vector.
    pub fn zeros() -> Self {
        Self(vec![0.0; FEATURE_DIM])
    }

    /// Builds a vector from exactly [`FEATURE_DIM`] values.
    pub fn from_slice(values: &[f64]) -> Result<Self, VoiceAuthError> {
        if values.len() != FEATURE_DIM {
            return Err(VoiceAuthError::DimensionMismatch {
                expected: FEATURE_DIM,
                got: values.len(),
            });
        }
        Ok(Self(values.iter().map(|&v| finite_or_zero(v)).collect()))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// True when every element is exactly zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&v| v == 0.0)
    }

    pub fn cepstral_mean(&self) -> &[f64] {
        &self.0[..CEPSTRAL_DIM]
    }

    pub fn cepstral_std(&self) -> &[f64] {
        &self.0[CEPSTRAL_DIM..2 * CEPSTRAL_DIM]
    }

    pub fn cepstral_min(&self) -> &[f64] {
        &self.0[2 * CEPSTRAL_DIM..3 * CEPSTRAL_DIM]
    }

    pub fn cepstral_max(&self) -> &[f64] {
        &self.0[3 * CEPSTRAL_DIM..PITCH_OFFSET]
    }

    pub fn pitch_mean(&self) -> f64 {
        self.0[PITCH_OFFSET]
    }

    pub fn pitch_std(&self) -> f64 {
        self.0[PITCH_OFFSET + 1]
    }

    pub fn energy(&self) -> f64 {
        self.0[DESCRIPTOR_OFFSET]
    }

    pub fn zero_crossing_rate(&self) -> f64 {
        self.0[DESCRIPTOR_OFFSET + 1]
    }

    pub fn spectral_centroid(&self) -> f64 {
        self.0[DESCRIPTOR_OFFSET + 2]
    }

    /// Encodes the vector as [`FEATURE_DIM`] little-endian f64 values.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(FEATURE_DIM * 8);
        for v in &self.0 {
            out.extend_from_slice(&v.to_le_bytes());
        }
        out
    }

    /// Decodes a blob written by [`FeatureVector::to_le_bytes`].
    pub fn from_le_bytes(data: &[u8]) -> Result<Self, VoiceAuthError> {
        if data.len() != FEATURE_DIM * 8 {
            return Err(VoiceAuthError::DimensionMismatch {
                expected: FEATURE_DIM * 8,
                got: data.len(),
            });
        }
        let values: Vec<f64> = data
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
            .collect();
        Self::from_slice(&values)
    }
}

impl TryFrom<Vec<f64>> for FeatureVector {
    type Error = VoiceAuthError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::from_slice(&values)
    }
}

impl From<FeatureVector> for Vec<f64> {
    fn from(v: FeatureVector) -> Self {
        v.0
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// Outcome of feature extraction.
///
/// Extraction never fails past its boundary; a failure degrades to the
/// all-zero vector and is tagged so callers can audit it.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Extracted(FeatureVector),
    Degraded {
        vector: FeatureVector,
        cause: String,
    },
}

impl Extraction {
    /// Returns the vector, all zeros when degraded.
    pub fn vector(&self) -> &FeatureVector {
        match self {
            Self::Extracted(v) => v,
            Self::Degraded { vector, .. } => vector,
        }
    }

    pub fn into_vector(self) -> FeatureVector {
        match self {
            Self::Extracted(v) => v,
            Self::Degraded { vector, .. } => vector,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// Returns why extraction degraded.
    pub fn cause(&self) -> Option<&str> {
        match self {
            Self::Extracted(_) => None,
            Self::Degraded { cause, .. } => Some(cause),
        }
    }
}

/// Configures [`FeatureExtractor`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub mfcc: MfccConfig,
    pub pitch: PitchConfig,
}

/// Turns a normalized waveform into a [`FeatureVector`].
///
/// # Pipeline
///
/// 1. Waveform -> [`compute_mfcc`] -> per-frame cepstra
/// 2. Cepstra -> mean / std / min / max rows
/// 3. Waveform -> [`pitch_stats`] -> pitch mean / std
/// 4. Waveform -> energy, zero-crossing rate, spectral centroid
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    cfg: FeatureConfig,
}

impl FeatureExtractor {
    pub fn new(cfg: FeatureConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.cfg
    }

    /// Extracts features from a loaded waveform.
    pub fn extract(&self, waveform: &Waveform) -> Extraction {
        self.extract_samples(waveform.samples(), waveform.sample_rate())
    }

    /// Extracts features from already normalized samples.
    ///
    /// Empty, silent or otherwise unusable input degrades to the all-zero
    /// vector instead of failing.
    pub fn extract_samples(&self, samples: &[f64], sample_rate: u32) -> Extraction {
        match self.try_extract(samples, sample_rate) {
            Ok(vector) => Extraction::Extracted(vector),
            Err(e) => {
                warn!(error = %e, "feature extraction degraded to zero vector");
                Extraction::Degraded {
                    vector: FeatureVector::zeros(),
                    cause: e.to_string(),
                }
            }
        }
    }

    fn try_extract(&self, samples: &[f64], sample_rate: u32) -> Result<FeatureVector, VoiceAuthError> {
        if samples.is_empty() {
            return Err(VoiceAuthError::ExtractionFailed("audio is empty".into()));
        }
        if sample_rate == 0 {
            return Err(VoiceAuthError::ExtractionFailed("zero sample rate".into()));
        }
        if samples.iter().all(|&s| s == 0.0) {
            return Err(VoiceAuthError::ExtractionFailed(
                "audio contains only silence".into(),
            ));
        }

        let frames = compute_mfcc(samples, sample_rate, &self.cfg.mfcc)
            .ok_or_else(|| VoiceAuthError::ExtractionFailed("no cepstral frames extracted".into()))?;
        let stats = cepstral_stats(&frames)
            .ok_or_else(|| VoiceAuthError::ExtractionFailed("no cepstral frames extracted".into()))?;
        if stats.mean.len() != CEPSTRAL_DIM {
            return Err(VoiceAuthError::ExtractionFailed(format!(
                "expected {CEPSTRAL_DIM} cepstral coefficients, got {}",
                stats.mean.len()
            )));
        }

        let pitch = pitch_stats(samples, sample_rate, &self.cfg.pitch);
        if pitch.voiced_frames == 0 {
            debug!("no voiced frames, using default pitch");
        }

        let energy = mean_square(samples);
        let zcr = zero_crossing_rate(samples);
        let centroid = spectral_centroid(samples, sample_rate);

        debug!(
            frames = frames.len(),
            pitch_mean = pitch.mean,
            pitch_std = pitch.std,
            energy,
            zcr,
            centroid,
            "features extracted"
        );

        let mut values = Vec::with_capacity(FEATURE_DIM);
        values.extend_from_slice(&stats.mean);
        values.extend_from_slice(&stats.std);
        values.extend_from_slice(&stats.min);
        values.extend_from_slice(&stats.max);
        values.extend_from_slice(&[pitch.mean, pitch.std, energy, zcr, centroid]);

        if values.iter().any(|v| !v.is_finite()) {
            debug!("replacing non-finite feature values with zeros");
        }
        FeatureVector::from_slice(&values)
    }
}

/// Mean of squared samples.
pub fn mean_square(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s * s).sum::<f64>() / samples.len() as f64
}

/// Fraction of sign changes: `sum |sign(x[i+1]) - sign(x[i])| / (2 n)`.
///
/// An exact zero has sign 0, so touching zero counts as half a crossing.
pub fn zero_crossing_rate(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let changes: f64 = samples
        .windows(2)
        .map(|w| (sign(w[1]) - sign(w[0])).abs())
        .sum();
    changes / (2.0 * samples.len() as f64)
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Magnitude-weighted mean frequency of the full-length spectrum, in Hz.
/// Returns 0 when the spectrum has no energy.
pub fn spectral_centroid(samples: &[f64], sample_rate: u32) -> f64 {
    let mags = magnitude_spectrum(samples);
    let total: f64 = mags.iter().sum();
    if !(total > 0.0) {
        return 0.0;
    }
    let bin_hz = sample_rate as f64 / samples.len() as f64;
    let weighted: f64 = mags
        .iter()
        .enumerate()
        .map(|(k, m)| k as f64 * bin_hz * m)
        .sum();
    weighted / total
}

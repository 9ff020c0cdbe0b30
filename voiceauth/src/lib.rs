//! Voice authentication from a single spoken utterance.
//!
//! # Architecture
//!
//! An attempt runs through four stages:
//!
//! 1. [`load`]: decoded audio -> mono 16kHz peak-normalized [`Waveform`]
//! 2. [`LivenessScorer::score`]: waveform -> replay confidence
//! 3. [`FeatureExtractor::extract`]: waveform -> 57-dim [`FeatureVector`]
//! 4. [`TemplateMatcher::compare`]: live vector vs enrolled template
//!
//! [`Authenticator`] wires them together and only runs stages 3 and 4 when
//! stage 2 says the audio is live.
//!
//! # Feature Vector
//!
//! ```text
//! 13 cepstral means | 13 stds | 13 mins | 13 maxes | pitch mean, std | energy, zcr, centroid
//! ```
//!
//! Cepstra follow the usual MFCC recipe:
//! - Pre-emphasis 0.97
//! - 25ms Hamming frames, 10ms step
//! - 512-point FFT, 26 mel filters
//! - Orthonormal DCT-II, lifter 22, log energy as coefficient 0
//!
//! # Templates
//!
//! A template is an enrolled [`FeatureVector`]. It persists as 57
//! little-endian f64 values ([`FeatureVector::to_le_bytes`]) or as a JSON
//! array.

mod auth;
mod config;
mod error;
pub mod features;
pub mod liveness;
pub mod matcher;
pub mod mfcc;
pub mod pitch;
mod resample;
pub mod spectrum;
mod validate;
mod waveform;

pub use auth::{AuthOutcome, Authenticator, Rejection};
pub use config::VoiceAuthConfig;
pub use error::{AudioDefect, VoiceAuthError};
pub use features::{Extraction, FeatureConfig, FeatureExtractor, FeatureVector, CEPSTRAL_DIM, FEATURE_DIM};
pub use liveness::{HeuristicLiveness, LivenessBreakdown, LivenessConfig, LivenessResult, LivenessScorer, LivenessWeights};
pub use matcher::{BlockScale, CosineMatcher, FeatureScaling, MatchResult, MatcherConfig, TemplateMatcher};
pub use mfcc::MfccConfig;
pub use pitch::PitchConfig;
pub use resample::resample;
pub use validate::{validate, AudioReport, ValidationConfig};
pub use waveform::{load, LoaderConfig, RawAudio, Waveform, SAMPLE_RATE};

use std::sync::Arc;

use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::VoiceAuthConfig;
use crate::error::{AudioDefect, VoiceAuthError};
use crate::features::{Extraction, FeatureExtractor, FeatureVector};
use crate::liveness::{HeuristicLiveness, LivenessScorer};
use crate::matcher::{CosineMatcher, TemplateMatcher};
use crate::waveform::{load, LoaderConfig, RawAudio, Waveform};

/// Why an authentication attempt was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("possible spoof detected")]
    PossibleSpoof,

    #[error("voice does not match template")]
    VoiceMismatch,

    #[error("invalid audio: {0}")]
    InvalidAudio(AudioDefect),
}

impl Serialize for Rejection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Final decision of [`Authenticator::authenticate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthOutcome {
    pub authenticated: bool,
    /// Liveness confidence.
    pub spoof_score: f64,
    /// Template similarity, 0.0 when matching never ran.
    pub match_score: f64,
    /// Absent on acceptance.
    pub reason: Option<Rejection>,
    /// True when the live features degraded to the zero vector.
    pub degraded_extraction: bool,
}

impl AuthOutcome {
    fn rejected(reason: Rejection, spoof_score: f64, match_score: f64) -> Self {
        Self {
            authenticated: false,
            spoof_score,
            match_score,
            reason: Some(reason),
            degraded_extraction: false,
        }
    }
}

/// Two-stage voice authentication: liveness first, then template matching.
///
/// The matcher only runs for audio judged live. The authenticator never
/// fails; every problem ends in a rejected [`AuthOutcome`].
///
/// # Example
///
/// ```ignore
/// let auth = Authenticator::from_config(&VoiceAuthConfig::default());
/// let template = auth.enroll(&enrollment_audio)?.into_vector();
/// let outcome = auth.authenticate_raw(&attempt_audio, &template);
/// if outcome.authenticated { /* grant */ }
/// ```
#[derive(Clone)]
pub struct Authenticator {
    loader: LoaderConfig,
    extractor: FeatureExtractor,
    liveness: Arc<dyn LivenessScorer>,
    matcher: Arc<dyn TemplateMatcher>,
}

impl Authenticator {
    pub fn new(
        loader: LoaderConfig,
        extractor: FeatureExtractor,
        liveness: Arc<dyn LivenessScorer>,
        matcher: Arc<dyn TemplateMatcher>,
    ) -> Self {
        Self {
            loader,
            extractor,
            liveness,
            matcher,
        }
    }

    /// Builds the default heuristic liveness and cosine matcher from `cfg`.
    pub fn from_config(cfg: &VoiceAuthConfig) -> Self {
        Self::new(
            cfg.loader.clone(),
            FeatureExtractor::new(cfg.features.clone()),
            Arc::new(HeuristicLiveness::new(cfg.liveness.clone())),
            Arc::new(CosineMatcher::new(cfg.matcher.clone())),
        )
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn loader_config(&self) -> &LoaderConfig {
        &self.loader
    }

    /// Loads and extracts an enrollment utterance.
    ///
    /// The caller persists `extraction.vector()` and decides what to do
    /// with a degraded extraction.
    pub fn enroll(&self, raw: &RawAudio) -> Result<Extraction, VoiceAuthError> {
        let waveform = load(raw, &self.loader)?;
        let extraction = self.extractor.extract(&waveform);
        if let Some(cause) = extraction.cause() {
            warn!(cause, "enrollment extraction degraded");
        }
        Ok(extraction)
    }

    /// Loads `raw` and authenticates it against `template`.
    ///
    /// A loader failure becomes an `InvalidAudio` rejection with both
    /// scores at 0.0.
    pub fn authenticate_raw(&self, raw: &RawAudio, template: &FeatureVector) -> AuthOutcome {
        match load(raw, &self.loader) {
            Ok(waveform) => self.authenticate(&waveform, template),
            Err(e) => {
                let defect = match e {
                    VoiceAuthError::InvalidAudio(d) => d,
                    other => AudioDefect::Unreadable(other.to_string()),
                };
                info!(reason = %defect, "authentication rejected: invalid audio");
                AuthOutcome::rejected(Rejection::InvalidAudio(defect), 0.0, 0.0)
            }
        }
    }

    /// Authenticates a loaded waveform against `template`.
    pub fn authenticate(&self, waveform: &Waveform, template: &FeatureVector) -> AuthOutcome {
        let liveness = self.liveness.score(waveform);
        if !liveness.is_live {
            info!(
                spoof_score = liveness.confidence,
                "authentication rejected: possible spoof"
            );
            return AuthOutcome::rejected(Rejection::PossibleSpoof, liveness.confidence, 0.0);
        }

        let extraction = self.extractor.extract(waveform);
        let degraded = extraction.is_degraded();
        let result = self.matcher.compare(extraction.vector(), template);

        let outcome = AuthOutcome {
            authenticated: result.is_match,
            spoof_score: liveness.confidence,
            match_score: result.similarity,
            reason: (!result.is_match).then_some(Rejection::VoiceMismatch),
            degraded_extraction: degraded,
        };
        info!(
            authenticated = outcome.authenticated,
            spoof_score = outcome.spoof_score,
            match_score = outcome.match_score,
            degraded,
            "authentication decided"
        );
        outcome
    }
}

impl Default for Authenticator {
    fn default() -> Self {
        Self::from_config(&VoiceAuthConfig::default())
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("loader", &self.loader)
            .field("extractor", &self.extractor)
            .finish_non_exhaustive()
    }
}

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::features::{FeatureVector, CEPSTRAL_DIM};

/// Compares a live feature vector against an enrolled template.
///
/// # Thread Safety
///
/// Implementations must be safe for concurrent use.
pub trait TemplateMatcher: Send + Sync {
    fn compare(&self, live: &FeatureVector, template: &FeatureVector) -> MatchResult;
}

/// Output of a [`TemplateMatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchResult {
    /// Value in [0, 1]; 1.0 means identical direction.
    pub similarity: f64,
    pub is_match: bool,
}

/// Reference offset and spread for one feature block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockScale {
    pub center: f64,
    pub scale: f64,
}

impl BlockScale {
    pub const IDENTITY: BlockScale = BlockScale {
        center: 0.0,
        scale: 1.0,
    };

    pub const fn new(center: f64, scale: f64) -> Self {
        Self { center, scale }
    }

    fn apply(&self, v: f64) -> f64 {
        let scale = if self.scale > 0.0 && self.scale.is_finite() {
            self.scale
        } else {
            1.0
        };
        (v - self.center) / scale
    }
}

/// Per-block normalization applied before the cosine.
///
/// The raw vector mixes cepstra with values in Hz, which would otherwise
/// dominate the angle. Each block is mapped to `(x - center) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureScaling {
    pub cepstral_mean: BlockScale,
    pub cepstral_std: BlockScale,
    pub cepstral_min: BlockScale,
    pub cepstral_max: BlockScale,
    pub pitch_mean: BlockScale,
    pub pitch_std: BlockScale,
    pub energy: BlockScale,
    pub zero_crossing_rate: BlockScale,
    pub spectral_centroid: BlockScale,
}

impl Default for FeatureScaling {
    fn default() -> Self {
        Self {
            cepstral_mean: BlockScale::new(0.0, 10.0),
            cepstral_std: BlockScale::new(5.0, 5.0),
            cepstral_min: BlockScale::new(-10.0, 10.0),
            cepstral_max: BlockScale::new(10.0, 10.0),
            pitch_mean: BlockScale::new(150.0, 50.0),
            pitch_std: BlockScale::new(20.0, 20.0),
            energy: BlockScale::new(0.1, 0.1),
            zero_crossing_rate: BlockScale::new(0.1, 0.1),
            spectral_centroid: BlockScale::new(1500.0, 1000.0),
        }
    }
}

impl FeatureScaling {
    /// Leaves the vector untouched.
    pub fn identity() -> Self {
        let id = BlockScale::IDENTITY;
        Self {
            cepstral_mean: id,
            cepstral_std: id,
            cepstral_min: id,
            cepstral_max: id,
            pitch_mean: id,
            pitch_std: id,
            energy: id,
            zero_crossing_rate: id,
            spectral_centroid: id,
        }
    }

    fn block_for(&self, index: usize) -> &BlockScale {
        match index {
            i if i < CEPSTRAL_DIM => &self.cepstral_mean,
            i if i < 2 * CEPSTRAL_DIM => &self.cepstral_std,
            i if i < 3 * CEPSTRAL_DIM => &self.cepstral_min,
            i if i < 4 * CEPSTRAL_DIM => &self.cepstral_max,
            i => match i - 4 * CEPSTRAL_DIM {
                0 => &self.pitch_mean,
                1 => &self.pitch_std,
                2 => &self.energy,
                3 => &self.zero_crossing_rate,
                _ => &self.spectral_centroid,
            },
        }
    }

    /// Returns the normalized copy of `v`.
    pub fn apply(&self, v: &FeatureVector) -> Vec<f64> {
        v.as_slice()
            .iter()
            .enumerate()
            .map(|(i, &x)| self.block_for(i).apply(x))
            .collect()
    }
}

/// Configures [`CosineMatcher`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Similarity at or above which vectors match (default: 0.7).
    pub match_threshold: f64,
    pub scaling: FeatureScaling,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            match_threshold: 0.7,
            scaling: FeatureScaling::default(),
        }
    }
}

/// Cosine similarity rescaled to [0, 1].
#[derive(Debug, Clone, Default)]
pub struct CosineMatcher {
    cfg: MatcherConfig,
}

impl CosineMatcher {
    pub fn new(cfg: MatcherConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.cfg
    }

    /// Similarity of two vectors under the configured scaling.
    ///
    /// Returns 0.0 when either raw vector is all zeros. A vector that
    /// scales onto the origin is compared unscaled instead.
    pub fn similarity(&self, a: &FeatureVector, b: &FeatureVector) -> f64 {
        if a.is_zero() || b.is_zero() {
            return 0.0;
        }
        let scaled_a = self.cfg.scaling.apply(a);
        let scaled_b = self.cfg.scaling.apply(b);
        let cos = cosine_similarity(&scaled_a, &scaled_b)
            .or_else(|| cosine_similarity(a.as_slice(), b.as_slice()));
        match cos {
            Some(cos) => ((cos + 1.0) / 2.0).clamp(0.0, 1.0),
            None => 0.0,
        }
    }
}

impl TemplateMatcher for CosineMatcher {
    fn compare(&self, live: &FeatureVector, template: &FeatureVector) -> MatchResult {
        let similarity = self.similarity(live, template);
        let is_match = similarity >= self.cfg.match_threshold;
        debug!(similarity, is_match, "template compared");
        MatchResult {
            similarity,
            is_match,
        }
    }
}

/// Cosine of the angle between `a` and `b`.
///
/// Returns `None` for mismatched lengths, a zero norm or a non-finite
/// result. Computed as `dot / sqrt(|a|^2 |b|^2)` so a vector compared
/// with itself yields exactly 1.0.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> Option<f64> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let mut dot = 0.0f64;
    let mut na = 0.0f64;
    let mut nb = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return None;
    }
    let cos = dot / (na * nb).sqrt();
    cos.is_finite().then_some(cos)
}

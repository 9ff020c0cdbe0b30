use serde::{Deserialize, Serialize};

use crate::features::FeatureConfig;
use crate::liveness::LivenessConfig;
use crate::matcher::MatcherConfig;
use crate::validate::ValidationConfig;
use crate::waveform::LoaderConfig;

/// All tunables of the pipeline in one document.
///
/// Every section and field is optional when deserializing; omitted values
/// take their defaults.
///
/// ```yaml
/// liveness:
///   spoof_threshold: 0.55
/// matcher:
///   match_threshold: 0.75
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceAuthConfig {
    pub loader: LoaderConfig,
    pub validation: ValidationConfig,
    pub features: FeatureConfig,
    pub liveness: LivenessConfig,
    pub matcher: MatcherConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_is_default() {
        let cfg: VoiceAuthConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg.loader.target_sample_rate, 16000);
        assert_eq!(cfg.liveness.spoof_threshold, 0.5);
        assert_eq!(cfg.matcher.match_threshold, 0.7);
        assert_eq!(cfg.features.mfcc.num_coeffs, 13);
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let yaml = r#"
liveness:
  spoof_threshold: 0.55
  weights:
    spectral_flux: 0.4
matcher:
  match_threshold: 0.75
features:
  pitch:
    min_freq: 60
"#;
        let cfg: VoiceAuthConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.liveness.spoof_threshold, 0.55);
        assert_eq!(cfg.liveness.segment_len, 256);
        assert_eq!(cfg.liveness.weights.spectral_flux, 0.4);
        assert_eq!(cfg.liveness.weights.high_freq_ratio, 0.25);
        assert_eq!(cfg.matcher.match_threshold, 0.75);
        assert_eq!(cfg.features.pitch.min_freq, 60.0);
        assert_eq!(cfg.features.pitch.max_freq, 400.0);
        assert_eq!(cfg.validation.max_duration_secs, 15.0);
    }

    #[test]
    fn json_roundtrip() {
        let mut cfg = VoiceAuthConfig::default();
        cfg.loader.min_duration_secs = 0.75;
        let json = serde_json::to_string(&cfg).unwrap();
        let back: VoiceAuthConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.loader.min_duration_secs, 0.75);
        assert_eq!(back.matcher.scaling, cfg.matcher.scaling);
    }
}

//! End-to-end enrollment and verification over synthetic utterances.

use std::f64::consts::PI;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use giztoy_voiceauth::{
    AudioDefect, Authenticator, CosineMatcher, FeatureExtractor, HeuristicLiveness, LivenessScorer,
    LoaderConfig, RawAudio, Rejection, TemplateMatcher, VoiceAuthConfig, VoiceAuthError, load,
    FEATURE_DIM,
};

const SR: u32 = 16000;

fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// A voiced tone with a bright 5 kHz component and broadband noise,
/// ending in a near-silent tail.
fn live_voice(secs: f64, f0: f64, seed: u64) -> Vec<f64> {
    let mut rng = seeded(seed);
    let n = (secs * SR as f64) as usize;
    let tail = (0.1 * SR as f64) as usize;
    (0..n)
        .map(|i| {
            if i >= n - tail {
                return 0.001 * rng.gen_range(-1.0f64..1.0);
            }
            let t = i as f64 / SR as f64;
            0.6 * (2.0 * PI * f0 * t).sin()
                + 0.4 * (2.0 * PI * 5000.0 * t).sin()
                + 0.3 * rng.gen_range(-1.0f64..1.0)
        })
        .collect()
}

/// Five harmonics under a 3 Hz amplitude envelope.
fn speaker(secs: f64, f0: f64, seed: u64) -> Vec<f64> {
    let mut rng = seeded(seed);
    let n = (secs * SR as f64) as usize;
    (0..n)
        .map(|i| {
            let t = i as f64 / SR as f64;
            let env = 0.55 + 0.45 * (2.0 * PI * 3.0 * t).sin();
            let v: f64 = (1..=5)
                .map(|k| (2.0 * PI * f0 * k as f64 * t).sin() / k as f64)
                .sum();
            env * v + 0.02 * rng.gen_range(-1.0f64..1.0)
        })
        .collect()
}

fn noise(secs: f64, seed: u64) -> Vec<f64> {
    let mut rng = seeded(seed);
    (0..(secs * SR as f64) as usize).map(|_| rng.gen_range(-1.0f64..1.0)).collect()
}

/// One 128-sample cycle repeated: no frame-to-frame variation and a
/// compressed range.
fn looped(secs: f64) -> Vec<f64> {
    let unit: Vec<f64> = (0..128)
        .map(|i| 0.8 + 0.2 * (2.0 * PI * i as f64 / 128.0).sin())
        .collect();
    (0..(secs * SR as f64) as usize).map(|i| unit[i % 128]).collect()
}

fn mono(samples: Vec<f64>) -> RawAudio {
    RawAudio::mono(samples, SR)
}

#[test]
fn identical_live_utterance_is_accepted() {
    let auth = Authenticator::default();
    let audio = mono(live_voice(2.0, 220.0, 7));

    let template = auth.enroll(&audio).unwrap();
    assert!(!template.is_degraded());

    let outcome = auth.authenticate_raw(&audio, template.vector());
    assert!(outcome.match_score >= 0.7, "match {}", outcome.match_score);
    assert!(outcome.spoof_score >= 0.5, "spoof {}", outcome.spoof_score);
    assert!(outcome.authenticated);
    assert_eq!(outcome.reason, None);
    assert!(!outcome.degraded_extraction);
}

#[test]
fn silent_enrollment_is_invalid_audio() {
    let auth = Authenticator::default();
    let err = auth.enroll(&mono(vec![0.0; 2 * SR as usize])).unwrap_err();
    assert!(matches!(err, VoiceAuthError::InvalidAudio(AudioDefect::Silent)));
}

#[test]
fn enrollment_with_nan_sample_is_invalid_audio() {
    let auth = Authenticator::default();
    let mut samples = speaker(2.0, 140.0, 3);
    samples[1000] = f64::NAN;
    let err = auth.enroll(&mono(samples)).unwrap_err();
    assert!(matches!(
        err,
        VoiceAuthError::InvalidAudio(AudioDefect::NonFinite { count: 1 })
    ));
}

#[test]
fn verification_with_infinite_sample_is_rejected() {
    let auth = Authenticator::default();
    let template = auth.enroll(&mono(live_voice(2.0, 220.0, 7))).unwrap().into_vector();

    let mut samples = live_voice(2.0, 220.0, 7);
    samples[5000] = f64::INFINITY;
    let outcome = auth.authenticate_raw(&mono(samples), &template);
    assert!(!outcome.authenticated);
    assert_eq!(outcome.spoof_score, 0.0);
    assert_eq!(outcome.match_score, 0.0);
    assert_eq!(
        outcome.reason,
        Some(Rejection::InvalidAudio(AudioDefect::NonFinite { count: 1 }))
    );
}

#[test]
fn unrelated_noise_does_not_match_speaker() {
    let auth = Authenticator::default();
    let template = auth.enroll(&mono(speaker(2.0, 140.0, 3))).unwrap().into_vector();

    let outcome = auth.authenticate_raw(&mono(noise(2.0, 99)), &template);
    assert!(outcome.spoof_score >= 0.5, "noise should pass liveness, got {}", outcome.spoof_score);
    assert!(outcome.match_score < 0.7, "match {}", outcome.match_score);
    assert!(!outcome.authenticated);
    assert_eq!(outcome.reason, Some(Rejection::VoiceMismatch));
    assert_eq!(
        outcome.reason.map(|r| r.to_string()).as_deref(),
        Some("voice does not match template")
    );
}

#[test]
fn looped_replay_is_flagged_as_spoof() {
    let auth = Authenticator::default();
    let template = auth.enroll(&mono(speaker(2.0, 140.0, 3))).unwrap().into_vector();

    let outcome = auth.authenticate_raw(&mono(looped(2.0)), &template);
    assert!(outcome.spoof_score < 0.5, "spoof {}", outcome.spoof_score);
    assert!(!outcome.authenticated);
    assert_eq!(outcome.match_score, 0.0);
    assert_eq!(outcome.reason, Some(Rejection::PossibleSpoof));
}

#[test]
fn every_extraction_has_57_finite_values() {
    let extractor = FeatureExtractor::default();
    let cfg = LoaderConfig::default();
    let inputs = vec![
        mono(live_voice(2.0, 220.0, 7)),
        mono(speaker(1.0, 140.0, 3)),
        mono(noise(0.6, 1)),
        mono(looped(2.0)),
        RawAudio::mono(speaker(1.5, 150.0, 4), 44100),
        RawAudio::interleaved(noise(2.0, 5), 2, SR),
    ];
    for raw in inputs {
        let wf = load(&raw, &cfg).unwrap();
        let v = extractor.extract(&wf).into_vector();
        assert_eq!(v.as_slice().len(), FEATURE_DIM);
        assert!(v.as_slice().iter().all(|x| x.is_finite()));
    }
}

#[test]
fn same_speaker_with_different_noise_matches() {
    let extractor = FeatureExtractor::default();
    let a = extractor.extract_samples(&speaker(2.0, 140.0, 3), SR).into_vector();
    let b = extractor.extract_samples(&speaker(2.0, 140.0, 5), SR).into_vector();
    let result = CosineMatcher::default().compare(&a, &b);
    assert!(result.is_match, "similarity {}", result.similarity);
}

#[test]
fn liveness_orders_live_above_replay() {
    let scorer = HeuristicLiveness::default();
    let cfg = LoaderConfig::default();
    let live = scorer.score(&load(&mono(live_voice(2.0, 220.0, 7)), &cfg).unwrap());
    let replay = scorer.score(&load(&mono(looped(2.0)), &cfg).unwrap());
    assert!(live.is_live);
    assert!(!replay.is_live);
    assert!(live.confidence > replay.confidence);
}

#[test]
fn degraded_template_never_matches() {
    let auth = Authenticator::from_config(&VoiceAuthConfig::default());
    let zero = giztoy_voiceauth::FeatureVector::zeros();
    let outcome = auth.authenticate_raw(&mono(live_voice(2.0, 220.0, 7)), &zero);
    assert!(!outcome.authenticated);
    assert_eq!(outcome.match_score, 0.0);
    assert_eq!(outcome.reason, Some(Rejection::VoiceMismatch));
}

#[test]
fn authenticator_is_shareable_across_threads() {
    let auth = Arc::new(Authenticator::default());
    let template = auth.enroll(&mono(live_voice(2.0, 220.0, 7))).unwrap().into_vector();
    let template = Arc::new(template);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let auth = Arc::clone(&auth);
            let template = Arc::clone(&template);
            std::thread::spawn(move || auth.authenticate_raw(&mono(live_voice(2.0, 220.0, 7)), &template))
        })
        .collect();
    for h in handles {
        assert!(h.join().unwrap().authenticated);
    }
}

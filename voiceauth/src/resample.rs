//! Sample rate conversion for whole utterances.
//!
//! Uses rubato's windowed-sinc resampler (time domain) and compensates for
//! its output delay so the result lines up with the input and keeps the
//! original duration.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::error::VoiceAuthError;

impl From<rubato::ResamplerConstructionError> for VoiceAuthError {
    fn from(e: rubato::ResamplerConstructionError) -> Self {
        VoiceAuthError::Resample(e.to_string())
    }
}

impl From<rubato::ResampleError> for VoiceAuthError {
    fn from(e: rubato::ResampleError) -> Self {
        VoiceAuthError::Resample(e.to_string())
    }
}

/// Returns the number of output samples for `n` input samples.
///
/// Matches `floor(duration * to_rate)`.
pub fn output_len(n: usize, from_rate: u32, to_rate: u32) -> usize {
    if from_rate == 0 {
        return 0;
    }
    (n as u64 * to_rate as u64 / from_rate as u64) as usize
}

/// Resamples a mono signal from `from_rate` to `to_rate`.
///
/// The whole buffer is processed as a single chunk, then flushed with one
/// chunk of silence so the interpolator's delay line drains.
pub fn resample(samples: &[f64], from_rate: u32, to_rate: u32) -> Result<Vec<f64>, VoiceAuthError> {
    if from_rate == 0 || to_rate == 0 {
        return Err(VoiceAuthError::Resample(format!(
            "invalid sample rates: {from_rate} -> {to_rate}"
        )));
    }
    if samples.is_empty() || from_rate == to_rate {
        return Ok(samples.to_vec());
    }

    let target = output_len(samples.len(), from_rate, to_rate);
    let ratio = to_rate as f64 / from_rate as f64;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f64>::new(ratio, 1.0, params, samples.len(), 1)?;
    let delay = resampler.output_delay();

    let mut out = resampler.process(&[samples][..], None)?.swap_remove(0);
    let tail = resampler.process_partial::<&[f64]>(None, None)?.swap_remove(0);
    out.extend_from_slice(&tail);

    out.drain(..delay.min(out.len()));
    out.resize(target, 0.0);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn sine(freq: f64, rate: u32, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / rate as f64).sin())
            .collect()
    }

    #[test]
    fn output_len_preserves_duration() {
        assert_eq!(output_len(44100, 44100, 16000), 16000);
        assert_eq!(output_len(48000 * 2, 48000, 16000), 32000);
        assert_eq!(output_len(8000, 8000, 16000), 16000);
        assert_eq!(output_len(100, 0, 16000), 0);
    }

    #[test]
    fn same_rate_is_passthrough() {
        let input = sine(440.0, 16000, 1000);
        let out = resample(&input, 16000, 16000).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn zero_rate_is_error() {
        assert!(resample(&[0.5; 10], 0, 16000).is_err());
    }

    #[test]
    fn downsample_keeps_duration() {
        let input = sine(440.0, 48000, 48000);
        let out = resample(&input, 48000, 16000).unwrap();
        assert_eq!(out.len(), 16000);
    }

    #[test]
    fn upsample_keeps_duration() {
        let input = sine(440.0, 8000, 12000);
        let out = resample(&input, 8000, 16000).unwrap();
        assert_eq!(out.len(), 24000);
    }

    #[test]
    fn downsample_keeps_tone_amplitude() {
        let input = sine(440.0, 44100, 44100);
        let out = resample(&input, 44100, 16000).unwrap();
        // Skip the edges where the sinc filter sees zero padding.
        let mid = &out[2000..14000];
        let peak = mid.iter().fold(0.0f64, |m, &x| m.max(x.abs()));
        assert!(peak > 0.9 && peak < 1.1, "peak should stay near 1, got {peak}");
    }
}

//! Utility functions for CLI commands.

use std::path::Path;

use anyhow::Context;
use serde::Serialize;

use giztoy_voiceauth::{FeatureVector, RawAudio, VoiceAuthConfig};

use crate::Cli;

/// Header fields of a decoded WAV file.
#[derive(Debug, Clone, Serialize)]
pub struct WavInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub sample_format: String,
    pub frames: usize,
    pub duration_secs: f64,
}

/// Loads the pipeline configuration, defaults when no file is given.
pub fn get_config(cli: &Cli) -> anyhow::Result<VoiceAuthConfig> {
    match cli.config.as_deref() {
        Some(path) => load_request(path).with_context(|| format!("load config {path}")),
        None => Ok(VoiceAuthConfig::default()),
    }
}

/// Loads a request from a YAML or JSON file.
pub fn load_request<T: serde::de::DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)?;
    let result = if is_json(path) {
        serde_json::from_str(&content)?
    } else {
        serde_yaml::from_str(&content)?
    };
    Ok(result)
}

fn is_json(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Decodes a WAV file into interleaved samples in [-1, 1].
///
/// Integer PCM is scaled by `2^(bits - 1)`; float samples pass through.
pub fn read_wav(path: &str) -> anyhow::Result<(RawAudio, WavInfo)> {
    let mut reader = hound::WavReader::open(path).with_context(|| format!("open wav {path}"))?;
    let spec = reader.spec();

    let samples: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                anyhow::bail!("unsupported bits per sample: {}", spec.bits_per_sample);
            }
            let scale = (1u64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64 / scale))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    let raw = RawAudio::interleaved(samples, spec.channels, spec.sample_rate);
    let info = WavInfo {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
        sample_format: match spec.sample_format {
            hound::SampleFormat::Float => "float".to_string(),
            hound::SampleFormat::Int => "int".to_string(),
        },
        frames: raw.frames(),
        duration_secs: raw.duration_secs(),
    };
    Ok((raw, info))
}

/// Reads a template: a JSON array for `.json` paths, otherwise the
/// little-endian f64 blob.
pub fn read_template(path: &str) -> anyhow::Result<FeatureVector> {
    let template = if is_json(path) {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).with_context(|| format!("parse template {path}"))?
    } else {
        let data = std::fs::read(path)?;
        FeatureVector::from_le_bytes(&data).with_context(|| format!("decode template {path}"))?
    };
    Ok(template)
}

/// Writes a template in the format implied by the path.
pub fn write_template(path: &str, template: &FeatureVector) -> anyhow::Result<()> {
    if is_json(path) {
        std::fs::write(path, serde_json::to_string(template)?)?;
    } else {
        std::fs::write(path, template.to_le_bytes())?;
    }
    Ok(())
}

/// Outputs result as JSON or YAML.
pub fn output_result<T: Serialize>(
    result: &T,
    output_path: Option<&str>,
    as_json: bool,
) -> anyhow::Result<()> {
    let output = if as_json {
        serde_json::to_string_pretty(result)?
    } else {
        serde_yaml::to_string(result)?
    };

    match output_path {
        Some(path) => std::fs::write(path, output)?,
        None => print!("{}", output),
    }

    Ok(())
}

/// Prints verbose output if enabled.
pub fn print_verbose(cli: &Cli, msg: &str) {
    if cli.verbose {
        eprintln!("[verbose] {}", msg);
    }
}

/// Prints success message.
pub fn print_success(msg: &str) {
    eprintln!("\x1b[32m✓\x1b[0m {}", msg);
}

/// Prints error message.
pub fn print_error(msg: &str) {
    eprintln!("\x1b[31m✗\x1b[0m {}", msg);
}

/// Prints warning message.
pub fn print_warning(msg: &str) {
    eprintln!("\x1b[33m⚠\x1b[0m {}", msg);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_pcm16(path: &Path, samples: &[i16], channels: u16) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 16000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn read_pcm16_scales_to_unit_range() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.wav");
        write_pcm16(&path, &[0, 16384, -32768, 32767], 1);

        let (raw, info) = read_wav(path.to_str().unwrap()).unwrap();
        assert_eq!(raw.samples, vec![0.0, 0.5, -1.0, 32767.0 / 32768.0]);
        assert_eq!(info.sample_rate, 16000);
        assert_eq!(info.bits_per_sample, 16);
        assert_eq!(info.sample_format, "int");
        assert_eq!(info.frames, 4);
    }

    #[test]
    fn read_stereo_keeps_interleaving() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("s.wav");
        write_pcm16(&path, &[16384, 0, 16384, 0], 2);

        let (raw, info) = read_wav(path.to_str().unwrap()).unwrap();
        assert_eq!(raw.channels, 2);
        assert_eq!(info.frames, 2);
        assert_eq!(raw.to_mono(), vec![0.25, 0.25]);
    }

    #[test]
    fn read_float_wav() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("f.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for s in [0.25f32, -0.5] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let (raw, info) = read_wav(path.to_str().unwrap()).unwrap();
        assert_eq!(raw.samples, vec![0.25, -0.5]);
        assert_eq!(info.sample_format, "float");
    }

    #[test]
    fn template_roundtrip_by_extension() {
        let dir = tempdir().unwrap();
        let values: Vec<f64> = (0..giztoy_voiceauth::FEATURE_DIM).map(|i| i as f64 / 7.0).collect();
        let template = FeatureVector::from_slice(&values).unwrap();

        for name in ["t.bin", "t.json"] {
            let path = dir.path().join(name);
            let path = path.to_str().unwrap();
            write_template(path, &template).unwrap();
            assert_eq!(read_template(path).unwrap(), template);
        }
        assert_eq!(std::fs::metadata(dir.path().join("t.bin")).unwrap().len(), 456);
    }

    #[test]
    fn truncated_template_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.bin");
        std::fs::write(&path, [0u8; 100]).unwrap();
        assert!(read_template(path.to_str().unwrap()).is_err());
    }

    #[test]
    fn config_loads_yaml_and_json() {
        let dir = tempdir().unwrap();
        let yaml = dir.path().join("c.yaml");
        std::fs::write(&yaml, "matcher:\n  match_threshold: 0.8\n").unwrap();
        let cfg: VoiceAuthConfig = load_request(yaml.to_str().unwrap()).unwrap();
        assert_eq!(cfg.matcher.match_threshold, 0.8);
        assert_eq!(cfg.liveness.spoof_threshold, 0.5);

        let json = dir.path().join("c.JSON");
        std::fs::write(&json, r#"{"liveness": {"spoof_threshold": 0.6}}"#).unwrap();
        let cfg: VoiceAuthConfig = load_request(json.to_str().unwrap()).unwrap();
        assert_eq!(cfg.liveness.spoof_threshold, 0.6);
        assert_eq!(cfg.matcher.match_threshold, 0.7);
    }
}

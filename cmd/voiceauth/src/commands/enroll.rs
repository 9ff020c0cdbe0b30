//! Template enrollment command.

use std::process::ExitCode;

use clap::Args;
use serde::Serialize;

use giztoy_voiceauth::{validate, Authenticator, Extraction};

use super::{get_config, print_success, print_verbose, print_warning, read_wav, write_template};
use crate::Cli;

/// Extracts a voice template from an utterance.
///
/// The template is written to the `-o` path: a JSON array when the path
/// ends in `.json`, otherwise a 456-byte little-endian blob.
#[derive(Args)]
pub struct EnrollCommand {
    /// Input WAV file
    wav: String,
}

#[derive(Serialize)]
struct EnrollSummary<'a> {
    template: &'a str,
    duration_secs: f64,
    pitch_mean: f64,
    spectral_centroid: f64,
}

impl EnrollCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<ExitCode> {
        let output = cli
            .output
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("template output path is required, use -o flag"))?;
        let cfg = get_config(cli)?;

        let (raw, info) = read_wav(&self.wav)?;
        print_verbose(
            cli,
            &format!(
                "{}: {} Hz, {} ch, {:.2}s",
                self.wav, info.sample_rate, info.channels, info.duration_secs
            ),
        );

        let report = validate(&raw, &cfg.validation);
        if let Some(reason) = report.reason {
            anyhow::bail!("{}: {reason}", self.wav);
        }

        let auth = Authenticator::from_config(&cfg);
        let template = match auth.enroll(&raw)? {
            Extraction::Extracted(v) => v,
            Extraction::Degraded { cause, .. } => {
                print_warning(&cause);
                anyhow::bail!("feature extraction degraded, refusing to enroll {}", self.wav);
            }
        };

        write_template(output, &template)?;
        print_success(&format!("template written to {output}"));

        if cli.json {
            let summary = EnrollSummary {
                template: output,
                duration_secs: info.duration_secs,
                pitch_mean: template.pitch_mean(),
                spectral_centroid: template.spectral_centroid(),
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Ok(ExitCode::SUCCESS)
    }
}

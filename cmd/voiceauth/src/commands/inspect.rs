//! Audio inspection command.

use std::process::ExitCode;

use clap::Args;
use serde::Serialize;

use giztoy_voiceauth::{
    load, validate, AudioReport, Authenticator, HeuristicLiveness, LivenessResult, LivenessScorer,
};

use super::{get_config, output_result, print_warning, read_wav, WavInfo};
use crate::Cli;

/// Shows WAV info, the validation report, the liveness breakdown and a
/// feature summary for one file.
#[derive(Args)]
pub struct InspectCommand {
    /// Input WAV file
    wav: String,
}

#[derive(Serialize)]
struct InspectReport {
    file: WavInfo,
    validation: AudioReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    load_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    liveness: Option<LivenessResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    features: Option<FeatureSummary>,
}

#[derive(Serialize)]
struct FeatureSummary {
    degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    cause: Option<String>,
    pitch_mean: f64,
    pitch_std: f64,
    energy: f64,
    zero_crossing_rate: f64,
    spectral_centroid: f64,
}

impl InspectCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<ExitCode> {
        let cfg = get_config(cli)?;
        let (raw, file) = read_wav(&self.wav)?;
        let validation = validate(&raw, &cfg.validation);

        let mut report = InspectReport {
            file,
            validation,
            load_error: None,
            liveness: None,
            features: None,
        };

        let auth = Authenticator::from_config(&cfg);
        match load(&raw, auth.loader_config()) {
            Ok(waveform) => {
                let scorer = HeuristicLiveness::new(cfg.liveness.clone());
                report.liveness = Some(scorer.score(&waveform));

                let extraction = auth.extractor().extract(&waveform);
                let v = extraction.vector();
                report.features = Some(FeatureSummary {
                    degraded: extraction.is_degraded(),
                    cause: extraction.cause().map(str::to_string),
                    pitch_mean: v.pitch_mean(),
                    pitch_std: v.pitch_std(),
                    energy: v.energy(),
                    zero_crossing_rate: v.zero_crossing_rate(),
                    spectral_centroid: v.spectral_centroid(),
                });
            }
            Err(e) => {
                print_warning(&e.to_string());
                report.load_error = Some(e.to_string());
            }
        }

        output_result(&report, cli.output.as_deref(), cli.json)?;
        Ok(ExitCode::SUCCESS)
    }
}

//! Utterance verification command.

use std::process::ExitCode;

use clap::Args;

use giztoy_voiceauth::Authenticator;

use super::{get_config, output_result, print_error, print_success, print_verbose, read_template, read_wav};
use crate::Cli;

/// Verifies an utterance against an enrolled template.
///
/// Prints the outcome and exits with status 1 when not authenticated.
#[derive(Args)]
pub struct VerifyCommand {
    /// Input WAV file
    wav: String,

    /// Enrolled template (blob or .json)
    #[arg(short = 't', long)]
    template: String,
}

impl VerifyCommand {
    pub fn run(&self, cli: &Cli) -> anyhow::Result<ExitCode> {
        let cfg = get_config(cli)?;
        let template = read_template(&self.template)?;
        let (raw, info) = read_wav(&self.wav)?;
        print_verbose(
            cli,
            &format!(
                "{}: {} Hz, {} ch, {:.2}s",
                self.wav, info.sample_rate, info.channels, info.duration_secs
            ),
        );

        let auth = Authenticator::from_config(&cfg);
        let outcome = auth.authenticate_raw(&raw, &template);
        output_result(&outcome, cli.output.as_deref(), cli.json)?;

        match &outcome.reason {
            None => {
                print_success("authenticated");
                Ok(ExitCode::SUCCESS)
            }
            Some(reason) => {
                print_error(&format!("rejected: {reason}"));
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

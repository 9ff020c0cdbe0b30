//! voiceauth CLI - enroll voice templates and verify utterances against them.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

use commands::{EnrollCommand, InspectCommand, VerifyCommand};

/// voiceauth CLI - voice-biometric enrollment and verification.
///
/// Reads PCM or float WAV files of any sample rate and channel count:
///   - enroll: extract a template from an utterance
///   - verify: run liveness and template matching on an utterance
///   - inspect: show file info, validation and liveness diagnostics
///
/// Thresholds and analysis parameters come from an optional YAML or JSON
/// config file; omitted fields keep their defaults.
#[derive(Parser)]
#[command(name = "voiceauth")]
#[command(about = "Voice authentication CLI tool")]
#[command(version)]
pub struct Cli {
    /// Config file (YAML or JSON)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output file (default: stdout; for enroll, the template path)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract a voice template from a WAV file
    Enroll(EnrollCommand),
    /// Verify a WAV file against a stored template
    Verify(VerifyCommand),
    /// Show WAV info, validation and liveness diagnostics
    Inspect(InspectCommand),
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .init();
    }

    match &cli.command {
        Commands::Enroll(cmd) => cmd.run(&cli),
        Commands::Verify(cmd) => cmd.run(&cli),
        Commands::Inspect(cmd) => cmd.run(&cli),
    }
}

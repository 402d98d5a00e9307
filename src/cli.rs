//! CLI argument parser.
//!
//! Provides a command-line interface for building mixes from local audio
//! files and for inspecting a single track's highlights, without any
//! remote retrieval infrastructure.

use std::path::PathBuf;

use clap::Parser;

use crate::config::AutodjConfig;

/// autodj-daemon: automated DJ mix assembly from source tracks
#[derive(Parser, Debug)]
#[command(name = "autodj-daemon")]
#[command(about = "Automated DJ mix daemon: highlight detection and crossfaded mix assembly")]
#[command(version)]
pub struct Cli {
    /// Local audio files to mix (repeatable)
    #[arg(short, long = "input", value_name = "FILE")]
    pub inputs: Vec<PathBuf>,

    /// Title recorded on the mix
    #[arg(short, long, default_value = "Automated DJ Mix")]
    pub title: String,

    /// Genre label recorded on the mix and its tracks
    #[arg(short, long, default_value = "Unknown")]
    pub genre: String,

    /// Copy the exported mix to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Analyze one file and print its highlights as JSON
    #[arg(long, value_name = "FILE")]
    pub analyze: Option<PathBuf>,

    /// Directory for exported mixes
    #[arg(long)]
    pub mix_dir: Option<PathBuf>,

    /// Bound on concurrent track workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Print the resulting mix record as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Returns true if running in analyze mode.
    pub fn is_analyze_mode(&self) -> bool {
        self.analyze.is_some()
    }

    /// Returns true if running in mix mode.
    pub fn is_mix_mode(&self) -> bool {
        !self.inputs.is_empty()
    }

    /// Builds the daemon configuration: environment defaults overridden by
    /// command-line flags.
    pub fn to_config(&self) -> AutodjConfig {
        let mut config = AutodjConfig::from_env();
        if let Some(ref dir) = self.mix_dir {
            config.mix_dir = Some(dir.clone());
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        config
    }
}

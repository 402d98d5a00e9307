//! autodj-daemon: automated DJ mix assembly.
//!
//! This binary can run in two modes:
//! - Mix mode: build a crossfaded mix from local audio files
//! - Analyze mode: print one track's highlight analysis as JSON

use std::sync::Arc;

use autodj_daemon::cli::Cli;
use autodj_daemon::error::{AutodjError, Result};
use autodj_daemon::fetch::AutoTrackSource;
use autodj_daemon::mixer::{MixJob, MixJobResult, MixJobRunner};
use autodj_daemon::store::{MixRegistry, TrackRegistry};
use autodj_daemon::types::{Mix, Track};
use autodj_daemon::{analysis, audio};

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse_args();

    if cli.is_analyze_mode() {
        run_analyze_mode(&cli)
    } else if cli.is_mix_mode() {
        run_mix_mode(&cli)
    } else {
        print_usage();
        Ok(())
    }
}

/// Analyzes a single file and prints its highlights as JSON.
fn run_analyze_mode(cli: &Cli) -> Result<()> {
    let path = cli.analyze.as_ref().expect("analyze path required");
    let config = cli.to_config();

    let signal = audio::decode_file(path)?;
    let envelope = analysis::extract(&signal, config.frame_length, config.hop_length)?;
    let highlights = analysis::detect(&envelope, signal.duration_sec());

    let report = serde_json::json!({
        "file": path,
        "duration_sec": signal.duration_sec(),
        "sample_rate": signal.sample_rate,
        "highlights": highlights,
    });
    println!("{}", serde_json::to_string_pretty(&report).unwrap());

    Ok(())
}

/// Builds a mix from the CLI input files and waits for the job to finish.
fn run_mix_mode(cli: &Cli) -> Result<()> {
    let config = cli.to_config();
    if let Some(problem) = config.validate() {
        return Err(AutodjError::invalid_request(problem));
    }

    let tracks: Vec<Track> = cli
        .inputs
        .iter()
        .map(|path| {
            let title = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "Unknown Title".to_string());
            Track::new(title, None, cli.genre.clone(), path.to_string_lossy().to_string())
        })
        .collect();

    eprintln!("=== autodj-daemon ===");
    eprintln!("Title: \"{}\"", cli.title);
    eprintln!("Genre: {}", cli.genre);
    eprintln!("Tracks: {}", tracks.len());
    eprintln!("Mix directory: {}", config.effective_mix_dir().display());
    eprintln!();

    let mixes = MixRegistry::new();
    let track_registry = TrackRegistry::new();

    let track_ids = tracks.iter().map(|t| t.track_id.clone()).collect();
    let mix = Mix::new(cli.title.clone(), cli.genre.clone(), track_ids);
    let mix_id = mix.mix_id.clone();
    mixes.insert(mix);

    let source = Arc::new(AutoTrackSource::new(config.fetch_timeout()));
    let runner = MixJobRunner::new(mixes.clone(), track_registry, source, config);
    runner.submit(MixJob::new(mix_id.clone(), tracks))?;

    eprintln!("Mix {} submitted, assembling...", mix_id);

    let result = runner
        .recv_result()
        .ok_or_else(|| AutodjError::invalid_request("job runner exited without a result"))?;

    match result {
        MixJobResult::Completed {
            file_path,
            duration_sec,
            contributing,
            skipped,
            ..
        } => {
            eprintln!();
            eprintln!("Mix complete!");
            eprintln!("  Duration: {:.1}s", duration_sec);
            eprintln!("  Tracks contributing: {}", contributing);
            if skipped > 0 {
                eprintln!("  Tracks skipped: {}", skipped);
            }
            eprintln!("  Saved to: {}", file_path.display());

            if let Some(ref output) = cli.output {
                std::fs::copy(&file_path, output).map_err(|e| {
                    AutodjError::export_failed(format!(
                        "failed to copy mix to {}: {}",
                        output.display(),
                        e
                    ))
                })?;
                eprintln!("  Copied to: {}", output.display());
            }

            if cli.json {
                let record = mixes.get(&mix_id).expect("completed mix is queryable");
                println!("{}", serde_json::to_string_pretty(&record).unwrap());
            }

            Ok(())
        }
        MixJobResult::Failed { error, .. } => Err(AutodjError::export_failed(error)),
    }
}

/// Prints usage information.
fn print_usage() {
    eprintln!("autodj-daemon: automated DJ mix assembly from source tracks");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  Build a mix from local files:");
    eprintln!("    autodj-daemon -i one.mp3 -i two.mp3 -i three.mp3 --title \"Friday Mix\"");
    eprintln!();
    eprintln!("  Inspect a track's highlights:");
    eprintln!("    autodj-daemon --analyze track.mp3");
    eprintln!();
    eprintln!("Run 'autodj-daemon --help' for full options.");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_usage_doesnt_panic() {
        print_usage();
    }
}

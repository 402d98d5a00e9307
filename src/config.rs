//! Daemon configuration module.
//!
//! Contains the runtime configuration for the autodj-daemon, including
//! working/output directories, analysis frame geometry, and the bound on
//! concurrent track processing.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default number of frames per analysis window.
pub const DEFAULT_FRAME_LENGTH: usize = 2048;

/// Default stride between analysis windows.
pub const DEFAULT_HOP_LENGTH: usize = 1024;

/// Default bound on concurrent track fetch/analysis workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Default per-track fetch timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 120;

/// Runtime configuration for the daemon.
///
/// This configuration is typically loaded from command-line arguments
/// or environment variables at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutodjConfig {
    /// Directory for downloaded source tracks.
    /// If None, uses the platform-specific default cache location.
    pub work_dir: Option<PathBuf>,

    /// Directory for exported mixes.
    /// If None, uses the platform-specific default cache location.
    pub mix_dir: Option<PathBuf>,

    /// Bound on concurrent track fetch/analysis workers.
    pub workers: usize,

    /// Per-track fetch timeout in seconds. A timeout is treated the same
    /// as an unreadable track: the track is skipped, the mix continues.
    pub fetch_timeout_secs: u64,

    /// Analysis frame length in samples.
    pub frame_length: usize,

    /// Analysis hop length in samples.
    pub hop_length: usize,
}

impl AutodjConfig {
    /// Creates a new AutodjConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an AutodjConfig from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `AUTODJ_WORK_DIR` - Directory for downloaded source tracks
    /// - `AUTODJ_MIX_DIR` - Directory for exported mixes
    /// - `AUTODJ_WORKERS` - Concurrent track worker bound
    /// - `AUTODJ_FETCH_TIMEOUT` - Per-track fetch timeout in seconds
    ///
    /// Falls back to defaults for unset variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("AUTODJ_WORK_DIR") {
            config.work_dir = Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("AUTODJ_MIX_DIR") {
            config.mix_dir = Some(PathBuf::from(path));
        }

        if let Ok(workers_str) = std::env::var("AUTODJ_WORKERS") {
            if let Ok(workers) = workers_str.parse::<usize>() {
                if workers > 0 {
                    config.workers = workers;
                }
            }
        }

        if let Ok(timeout_str) = std::env::var("AUTODJ_FETCH_TIMEOUT") {
            if let Ok(timeout) = timeout_str.parse::<u64>() {
                if timeout > 0 {
                    config.fetch_timeout_secs = timeout;
                }
            }
        }

        config
    }

    /// Returns the effective track work directory, using platform defaults
    /// if not specified.
    pub fn effective_work_dir(&self) -> PathBuf {
        if let Some(ref path) = self.work_dir {
            path.clone()
        } else {
            default_work_dir()
        }
    }

    /// Returns the effective mix output directory, using platform defaults
    /// if not specified.
    pub fn effective_mix_dir(&self) -> PathBuf {
        if let Some(ref path) = self.mix_dir {
            path.clone()
        } else {
            default_mix_dir()
        }
    }

    /// Returns the per-track fetch timeout as a Duration.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Validates the configuration.
    ///
    /// Returns an error message if validation fails, None otherwise.
    pub fn validate(&self) -> Option<String> {
        if self.workers == 0 {
            return Some("workers must be > 0".to_string());
        }
        if self.workers > 64 {
            return Some(format!("workers too high: {} (max 64)", self.workers));
        }
        if self.hop_length == 0 {
            return Some("hop_length must be > 0".to_string());
        }
        if self.frame_length < self.hop_length {
            return Some(format!(
                "frame_length {} must be >= hop_length {}",
                self.frame_length, self.hop_length
            ));
        }

        None
    }
}

impl Default for AutodjConfig {
    fn default() -> Self {
        Self {
            work_dir: None,
            mix_dir: None,
            workers: DEFAULT_WORKERS,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            frame_length: DEFAULT_FRAME_LENGTH,
            hop_length: DEFAULT_HOP_LENGTH,
        }
    }
}

/// Returns the platform-specific default track storage path.
///
/// Uses the `directories` crate to find appropriate locations:
/// - macOS: ~/Library/Caches/autodj/tracks
/// - Linux: ~/.cache/autodj/tracks
/// - Windows: C:\Users\<user>\AppData\Local\autodj\cache\tracks
fn default_work_dir() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "autodj") {
        proj_dirs.cache_dir().join("tracks")
    } else {
        // Fallback to current directory
        PathBuf::from("./tracks")
    }
}

/// Returns the platform-specific default mix storage path.
///
/// Uses the `directories` crate to find appropriate locations:
/// - macOS: ~/Library/Caches/autodj/mixes
/// - Linux: ~/.cache/autodj/mixes
/// - Windows: C:\Users\<user>\AppData\Local\autodj\cache\mixes
fn default_mix_dir() -> PathBuf {
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "autodj") {
        proj_dirs.cache_dir().join("mixes")
    } else {
        // Fallback to current directory
        PathBuf::from("./mixes")
    }
}

//! Track retrieval seam.
//!
//! The mix pipeline fetches source audio through the [`TrackSource`] trait
//! so the retrieval collaborator stays swappable: HTTP downloads in
//! production, local files in the CLI and tests.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AutodjError, Result};
use crate::fetch::http::HttpTrackSource;
use crate::types::Track;

/// Retrieves a track's audio to local storage.
///
/// A fetch failure is always per-track: the caller skips the track and the
/// mix continues.
pub trait TrackSource: Send + Sync {
    /// Fetches the track's source audio and returns the local path.
    fn fetch(&self, track: &Track, dest_dir: &Path) -> Result<PathBuf>;
}

/// Resolves source locators that are already local file paths.
///
/// Used by the CLI (explicit input files) and by tests.
#[derive(Debug, Default)]
pub struct LocalTrackSource;

impl LocalTrackSource {
    /// Creates a new local-file source.
    pub fn new() -> Self {
        Self
    }
}

impl TrackSource for LocalTrackSource {
    fn fetch(&self, track: &Track, _dest_dir: &Path) -> Result<PathBuf> {
        let path = PathBuf::from(&track.source_url);
        if !path.is_file() {
            return Err(AutodjError::fetch_failed(format!(
                "no such file: {}",
                path.display()
            )));
        }
        Ok(path)
    }
}

/// Routes each locator to the HTTP or local-file implementation.
///
/// http(s) locators are downloaded into the work directory; anything else
/// is treated as a local path. This is the source the CLI runs with, so a
/// mix can combine remote and already-local tracks.
#[derive(Debug)]
pub struct AutoTrackSource {
    http: HttpTrackSource,
    local: LocalTrackSource,
}

impl AutoTrackSource {
    /// Creates a routing source with the given per-track download timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: HttpTrackSource::new(timeout),
            local: LocalTrackSource::new(),
        }
    }
}

impl TrackSource for AutoTrackSource {
    fn fetch(&self, track: &Track, dest_dir: &Path) -> Result<PathBuf> {
        if track.source_url.starts_with("http://") || track.source_url.starts_with("https://") {
            self.http.fetch(track, dest_dir)
        } else {
            self.local.fetch(track, dest_dir)
        }
    }
}

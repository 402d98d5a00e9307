//! HTTP track downloader.
//!
//! Streams remote source audio into the work directory. Each download runs
//! under the configured per-track timeout; a timed-out or failed download
//! is reported as a fetch error and the track is skipped by the caller.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;

use crate::error::{AutodjError, Result};
use crate::fetch::TrackSource;
use crate::types::Track;

/// Downloads http(s) source locators with a per-track timeout.
#[derive(Debug)]
pub struct HttpTrackSource {
    timeout: Duration,
}

impl HttpTrackSource {
    /// Creates a new HTTP source with the given per-track timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl TrackSource for HttpTrackSource {
    fn fetch(&self, track: &Track, dest_dir: &Path) -> Result<PathBuf> {
        if !track.source_url.starts_with("http://") && !track.source_url.starts_with("https://") {
            return Err(AutodjError::fetch_failed(format!(
                "not an http(s) locator: {}",
                track.source_url
            )));
        }

        fs::create_dir_all(dest_dir).map_err(|e| {
            AutodjError::fetch_failed(format!(
                "failed to create work directory {}: {}",
                dest_dir.display(),
                e
            ))
        })?;

        let dest = dest_dir.join(format!("{}.{}", track.track_id, extension_of(&track.source_url)));
        download_file_streaming(&track.source_url, &dest, self.timeout)?;
        Ok(dest)
    }
}

/// Guesses a file extension from the locator path, defaulting to mp3.
fn extension_of(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    match path.rsplit('.').next() {
        Some(ext) if ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphanumeric()) => ext,
        _ => "mp3",
    }
}

/// Downloads a file using streaming to handle large files.
fn download_file_streaming(url: &str, dest: &Path, timeout: Duration) -> Result<()> {
    debug!("downloading {} -> {}", url, dest.display());

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AutodjError::fetch_failed(format!("failed to create HTTP client: {}", e)))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| AutodjError::fetch_failed(format!("failed to download {}: {}", url, e)))?;

    if !response.status().is_success() {
        return Err(AutodjError::fetch_failed(format!(
            "HTTP {} for {}",
            response.status(),
            url
        )));
    }

    let mut file = fs::File::create(dest).map_err(|e| {
        AutodjError::fetch_failed(format!("failed to create file {}: {}", dest.display(), e))
    })?;

    // Stream the download in chunks
    let mut buffer = [0u8; 65536]; // 64KB buffer
    loop {
        let bytes_read = response
            .read(&mut buffer)
            .map_err(|e| AutodjError::fetch_failed(format!("failed to read response: {}", e)))?;

        if bytes_read == 0 {
            break;
        }

        file.write_all(&buffer[..bytes_read])
            .map_err(|e| AutodjError::fetch_failed(format!("failed to write file: {}", e)))?;
    }

    Ok(())
}

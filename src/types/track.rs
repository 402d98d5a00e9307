//! Track type representing a source track and its analysis results.
//!
//! A Track is created from source metadata only; retrieval and analysis
//! progressively populate the local path, duration, and highlight data.
//! Tracks are identified by a deterministic track_id computed from the
//! source locator.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::time::SystemTime;

use crate::analysis::Envelope;

/// A bounded time interval judged to be a track's most energetically
/// prominent moment.
///
/// Invariant: `0 <= start_sec <= peak_sec <= end_sec <= track duration`.
/// The window is nominally 10 seconds either side of the peak, clamped to
/// the track bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    /// Window start in seconds.
    pub start_sec: f32,

    /// Window end in seconds.
    pub end_sec: f32,

    /// Time of the energy peak the window is centered on.
    pub peak_sec: f32,

    /// Smoothed envelope value at the peak frame, in [0, 1].
    pub intensity: f32,
}

impl Highlight {
    /// Returns the window length in seconds.
    pub fn duration_sec(&self) -> f32 {
        self.end_sec - self.start_sec
    }

    /// Validates the window invariants against a track duration.
    ///
    /// Returns an error message if validation fails, None otherwise.
    pub fn validate(&self, track_duration: f32) -> Option<String> {
        if self.start_sec < 0.0 {
            return Some(format!("start_sec is negative: {}", self.start_sec));
        }
        if self.peak_sec < self.start_sec || self.peak_sec > self.end_sec {
            return Some(format!(
                "peak_sec {} outside window [{}, {}]",
                self.peak_sec, self.start_sec, self.end_sec
            ));
        }
        if self.end_sec > track_duration {
            return Some(format!(
                "end_sec {} exceeds track duration {}",
                self.end_sec, track_duration
            ));
        }

        None
    }
}

/// Analysis state of a track.
///
/// Retrieval or decoding failures leave a track `Unanalyzed`; a successful
/// analysis always yields `Analyzed`, even when no highlight cleared the
/// detection threshold (an empty highlight list is a valid outcome, handled
/// downstream by the fallback-excerpt policy).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum TrackAnalysis {
    /// No analysis result is available for this track.
    #[default]
    Unanalyzed,

    /// Envelope and highlight detection completed.
    Analyzed {
        /// Normalized per-frame energy envelope.
        envelope: Envelope,
        /// Highlight windows, ordered by descending intensity, at most 3.
        highlights: Vec<Highlight>,
    },
}

impl TrackAnalysis {
    /// Returns true if analysis has completed for this track.
    pub fn is_analyzed(&self) -> bool {
        matches!(self, TrackAnalysis::Analyzed { .. })
    }
}

/// A source track participating in a mix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Primary key - SHA256 hash of the source locator.
    /// Format: 16 hex characters.
    pub track_id: String,

    /// Display title.
    pub title: String,

    /// Display artist, if known.
    pub artist: Option<String>,

    /// Genre label the track was selected under.
    pub genre: String,

    /// Source locator: an http(s) URL or a local file path.
    pub source_url: String,

    /// Filesystem path of the retrieved audio, once fetched.
    pub local_path: Option<PathBuf>,

    /// Track duration in seconds, once decoded.
    pub duration_sec: Option<f32>,

    /// Envelope and highlight analysis state.
    pub analysis: TrackAnalysis,

    /// When the track record was created.
    #[serde(with = "system_time_serde")]
    pub created_at: SystemTime,
}

impl Track {
    /// Creates a new Track from source metadata.
    ///
    /// The track_id is computed from the source locator; local path,
    /// duration, and analysis start out absent.
    pub fn new(
        title: impl Into<String>,
        artist: Option<String>,
        genre: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        let source_url = source_url.into();
        let track_id = compute_track_id(&source_url);
        Self {
            track_id,
            title: title.into(),
            artist,
            genre: genre.into(),
            source_url,
            local_path: None,
            duration_sec: None,
            analysis: TrackAnalysis::Unanalyzed,
            created_at: SystemTime::now(),
        }
    }

    /// Returns the highlight windows, empty if the track is unanalyzed.
    pub fn highlights(&self) -> &[Highlight] {
        match &self.analysis {
            TrackAnalysis::Analyzed { highlights, .. } => highlights,
            TrackAnalysis::Unanalyzed => &[],
        }
    }

    /// Returns the highest-intensity highlight, if any.
    ///
    /// Highlights are stored ordered by descending intensity, so this is
    /// the first entry.
    pub fn top_highlight(&self) -> Option<&Highlight> {
        self.highlights().first()
    }

    /// Returns the mean intensity across this track's highlights.
    ///
    /// A track with no highlights (including an unanalyzed track) ranks as
    /// intensity 0.
    pub fn mean_highlight_intensity(&self) -> f32 {
        let highlights = self.highlights();
        if highlights.is_empty() {
            return 0.0;
        }
        highlights.iter().map(|h| h.intensity).sum::<f32>() / highlights.len() as f32
    }
}

/// Computes a deterministic track ID from the source locator.
///
/// The track ID is the first 16 hex characters of the SHA256 hash of the
/// locator. Identical locators always produce the same track_id, which
/// deduplicates repeat downloads of the same source.
pub fn compute_track_id(source_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_url.as_bytes());
    let result = hasher.finalize();
    // Take first 8 bytes (16 hex chars)
    hex::encode(&result[..8])
}

/// Custom serde implementation for SystemTime as a Unix timestamp.
mod system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration = time.duration_since(UNIX_EPOCH).unwrap_or(Duration::ZERO);
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(UNIX_EPOCH + Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_id_deterministic() {
        let id1 = compute_track_id("https://example.com/watch?v=abc");
        let id2 = compute_track_id("https://example.com/watch?v=abc");
        assert_eq!(id1, id2);
        assert_eq!(id1.len(), 16);
        assert!(id1.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn track_id_varies_with_locator() {
        let id1 = compute_track_id("https://example.com/watch?v=abc");
        let id2 = compute_track_id("https://example.com/watch?v=def");
        assert_ne!(id1, id2);
    }

    #[test]
    fn new_track_starts_unanalyzed() {
        let track = Track::new("Title", None, "House", "https://example.com/a");
        assert!(!track.analysis.is_analyzed());
        assert!(track.local_path.is_none());
        assert!(track.duration_sec.is_none());
        assert!(track.highlights().is_empty());
        assert_eq!(track.mean_highlight_intensity(), 0.0);
    }

    #[test]
    fn mean_intensity_over_highlights() {
        let mut track = Track::new("Title", None, "House", "https://example.com/a");
        track.analysis = TrackAnalysis::Analyzed {
            envelope: Envelope::empty(2048, 1024, 44100),
            highlights: vec![
                Highlight {
                    start_sec: 10.0,
                    end_sec: 30.0,
                    peak_sec: 20.0,
                    intensity: 0.8,
                },
                Highlight {
                    start_sec: 40.0,
                    end_sec: 60.0,
                    peak_sec: 50.0,
                    intensity: 0.4,
                },
            ],
        };
        assert!((track.mean_highlight_intensity() - 0.6).abs() < 1e-6);
        assert_eq!(track.top_highlight().unwrap().intensity, 0.8);
    }

    #[test]
    fn highlight_validation() {
        let good = Highlight {
            start_sec: 20.0,
            end_sec: 40.0,
            peak_sec: 30.0,
            intensity: 1.0,
        };
        assert!(good.validate(60.0).is_none());

        let out_of_bounds = Highlight {
            start_sec: 50.0,
            end_sec: 70.0,
            peak_sec: 60.0,
            intensity: 1.0,
        };
        assert!(out_of_bounds.validate(60.0).is_some());

        let inverted = Highlight {
            start_sec: 20.0,
            end_sec: 40.0,
            peak_sec: 45.0,
            intensity: 1.0,
        };
        assert!(inverted.validate(60.0).is_some());
    }
}

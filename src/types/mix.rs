//! Mix type for tracking mix requests from submission through completion.
//!
//! A Mix is created `Pending`, moves to `Processing` when track retrieval
//! begins, and terminates in exactly one of `Completed` or `Failed`.
//! Transitions are monotonic; a terminal mix is immutable.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;

/// Status of a mix job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MixStatus {
    /// Mix record created, no work started.
    #[default]
    Pending,

    /// Track retrieval and analysis in progress.
    Processing,

    /// Output produced and duration recorded.
    Completed,

    /// Assembly or export failed; no output is exposed.
    Failed,
}

impl MixStatus {
    /// Returns true if the mix is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MixStatus::Completed | MixStatus::Failed)
    }

    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            MixStatus::Pending => "pending",
            MixStatus::Processing => "processing",
            MixStatus::Completed => "completed",
            MixStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for MixStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A mix request, tracked from submission through completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mix {
    /// Unique mix identifier (UUID v4 format).
    pub mix_id: String,

    /// Display title of the mix.
    pub title: String,

    /// Genre the constituent tracks were selected under.
    pub genre: String,

    /// Identities of the constituent tracks, in request order.
    pub track_ids: Vec<String>,

    /// Duration of the exported mix in seconds (set on completion).
    pub duration_sec: Option<f32>,

    /// Filesystem path of the exported mix (set on completion).
    pub file_path: Option<PathBuf>,

    /// Current mix state.
    pub status: MixStatus,

    /// When the mix was requested.
    #[serde(with = "system_time_serde")]
    pub created_at: SystemTime,
}

impl Mix {
    /// Creates a new pending Mix.
    pub fn new(
        title: impl Into<String>,
        genre: impl Into<String>,
        track_ids: Vec<String>,
    ) -> Self {
        Self {
            mix_id: generate_mix_id(),
            title: title.into(),
            genre: genre.into(),
            track_ids,
            duration_sec: None,
            file_path: None,
            status: MixStatus::Pending,
            created_at: SystemTime::now(),
        }
    }

    /// Marks the mix as processing.
    ///
    /// Only a pending mix may start processing; returns false (and leaves
    /// the mix untouched) for any other current state.
    pub fn set_processing(&mut self) -> bool {
        if self.status != MixStatus::Pending {
            return false;
        }
        self.status = MixStatus::Processing;
        true
    }

    /// Marks the mix as completed with its output location and duration.
    ///
    /// Only a processing mix may complete; returns false otherwise.
    pub fn set_completed(&mut self, file_path: PathBuf, duration_sec: f32) -> bool {
        if self.status != MixStatus::Processing {
            return false;
        }
        self.status = MixStatus::Completed;
        self.file_path = Some(file_path);
        self.duration_sec = Some(duration_sec);
        true
    }

    /// Marks the mix as failed.
    ///
    /// Only a processing mix may fail; returns false otherwise. A failed
    /// mix never carries an output locator.
    pub fn set_failed(&mut self) -> bool {
        if self.status != MixStatus::Processing {
            return false;
        }
        self.status = MixStatus::Failed;
        self.file_path = None;
        self.duration_sec = None;
        true
    }
}

/// Generates a simple UUID v4 (random) without external dependencies.
fn generate_mix_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    // Use system time components for randomness
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    let nanos = now.as_nanos();
    let secs = now.as_secs();

    // Create pseudo-random bytes from time components
    let bytes: [u8; 16] = [
        nanos as u8,
        (nanos >> 8) as u8,
        (nanos >> 16) as u8,
        (nanos >> 24) as u8,
        secs as u8,
        (secs >> 8) as u8,
        0x40 | ((nanos >> 32) as u8 & 0x0f), // Version 4
        (nanos >> 40) as u8,
        0x80 | ((secs >> 16) as u8 & 0x3f), // Variant 1
        (secs >> 24) as u8,
        (secs >> 32) as u8,
        (secs >> 40) as u8,
        (nanos >> 48) as u8,
        (nanos >> 56) as u8,
        (secs >> 48) as u8,
        (secs >> 56) as u8,
    ];

    format!(
        "{:02x}{:02x}{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
        bytes[0], bytes[1], bytes[2], bytes[3],
        bytes[4], bytes[5],
        bytes[6], bytes[7],
        bytes[8], bytes[9],
        bytes[10], bytes[11], bytes[12], bytes[13], bytes[14], bytes[15]
    )
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
    fn mix_status_terminal() {
        assert!(MixStatus::Completed.is_terminal());
        assert!(MixStatus::Failed.is_terminal());
        assert!(!MixStatus::Pending.is_terminal());
        assert!(!MixStatus::Processing.is_terminal());
    }

    #[test]
    fn mix_lifecycle_happy_path() {
        let mut mix = Mix::new("Friday Mix", "House", vec!["a".into(), "b".into()]);
        assert_eq!(mix.status, MixStatus::Pending);

        assert!(mix.set_processing());
        assert_eq!(mix.status, MixStatus::Processing);

        assert!(mix.set_completed(PathBuf::from("/tmp/mix.wav"), 56.0));
        assert_eq!(mix.status, MixStatus::Completed);
        assert_eq!(mix.duration_sec, Some(56.0));
        assert!(mix.file_path.is_some());
    }

    #[test]
    fn transitions_are_monotonic() {
        let mut mix = Mix::new("Mix", "House", vec![]);

        // Cannot complete or fail before processing
        assert!(!mix.set_completed(PathBuf::from("/tmp/x.wav"), 1.0));
        assert!(!mix.set_failed());

        mix.set_processing();
        assert!(mix.set_failed());

        // Terminal states are immutable
        assert!(!mix.set_processing());
        assert!(!mix.set_completed(PathBuf::from("/tmp/x.wav"), 1.0));
        assert_eq!(mix.status, MixStatus::Failed);
        assert!(mix.file_path.is_none());
    }

    #[test]
    fn failed_mix_has_no_output() {
        let mut mix = Mix::new("Mix", "House", vec![]);
        mix.set_processing();
        mix.set_failed();
        assert!(mix.file_path.is_none());
        assert!(mix.duration_sec.is_none());
    }

    #[test]
    fn mix_id_format() {
        let mix = Mix::new("Mix", "House", vec![]);
        // UUID v4 layout: 8-4-4-4-12 hex characters
        let parts: Vec<&str> = mix.mix_id.split('-').collect();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[0].len(), 8);
        assert_eq!(parts[4].len(), 12);
    }
}

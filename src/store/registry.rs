//! In-memory registries for track and mix records.
//!
//! The registries are the persistence seam of the daemon: callers read
//! records by identity and the mix job is the single writer for its mix.
//! Terminal mix updates (status, duration, file path) happen under one
//! lock, so a mix is never observably completed without its output
//! locator.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::types::{Mix, Track};

/// Shared keyed storage for mix records.
#[derive(Debug, Clone, Default)]
pub struct MixRegistry {
    inner: Arc<Mutex<HashMap<String, Mix>>>,
}

impl MixRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) a mix record.
    pub fn insert(&self, mix: Mix) {
        self.inner.lock().unwrap().insert(mix.mix_id.clone(), mix);
    }

    /// Returns a snapshot of a mix by ID.
    pub fn get(&self, mix_id: &str) -> Option<Mix> {
        self.inner.lock().unwrap().get(mix_id).cloned()
    }

    /// Returns the number of stored mixes.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// Returns true if no mixes are stored.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }

    /// Moves a mix from pending to processing.
    ///
    /// Returns false if the mix is unknown or not pending.
    pub fn mark_processing(&self, mix_id: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        inner
            .get_mut(mix_id)
            .map(|mix| mix.set_processing())
            .unwrap_or(false)
    }

    /// Terminates a mix as completed, recording its output path and
    /// duration atomically.
    ///
    /// Returns false if the mix is unknown or not processing.
    pub fn complete(&self, mix_id: &str, file_path: PathBuf, duration_sec: f32) -> bool {
        let mut inner = self.inner.lock().unwrap();
        inner
            .get_mut(mix_id)
            .map(|mix| mix.set_completed(file_path, duration_sec))
            .unwrap_or(false)
    }

    /// Terminates a mix as failed.
    ///
    /// Returns false if the mix is unknown or not processing.
    pub fn fail(&self, mix_id: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        inner
            .get_mut(mix_id)
            .map(|mix| mix.set_failed())
            .unwrap_or(false)
    }
}

/// Shared keyed storage for track records.
#[derive(Debug, Clone, Default)]
pub struct TrackRegistry {
    inner: Arc<Mutex<HashMap<String, Track>>>,
}

impl TrackRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) a track record.
    pub fn insert(&self, track: Track) {
        self.inner
            .lock()
            .unwrap()
            .insert(track.track_id.clone(), track);
    }

    /// Returns a snapshot of a track by ID.
    pub fn get(&self, track_id: &str) -> Option<Track> {
        self.inner.lock().unwrap().get(track_id).cloned()
    }

    /// Returns the number of stored tracks.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    /// Returns true if no tracks are stored.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MixStatus;

    #[test]
    fn mix_lifecycle_through_registry() {
        let registry = MixRegistry::new();
        let mix = Mix::new("Mix", "House", vec![]);
        let mix_id = mix.mix_id.clone();
        registry.insert(mix);

        assert!(registry.mark_processing(&mix_id));
        assert!(registry.complete(&mix_id, PathBuf::from("/tmp/out.wav"), 56.0));

        let stored = registry.get(&mix_id).unwrap();
        assert_eq!(stored.status, MixStatus::Completed);
        assert_eq!(stored.duration_sec, Some(56.0));
        assert_eq!(stored.file_path, Some(PathBuf::from("/tmp/out.wav")));
    }

    #[test]
    fn completed_mix_always_has_locator() {
        let registry = MixRegistry::new();
        let mix = Mix::new("Mix", "House", vec![]);
        let mix_id = mix.mix_id.clone();
        registry.insert(mix);
        registry.mark_processing(&mix_id);
        registry.complete(&mix_id, PathBuf::from("/tmp/out.wav"), 10.0);

        // The terminal write is atomic: status and locator are read
        // together.
        let stored = registry.get(&mix_id).unwrap();
        assert!(stored.status != MixStatus::Completed || stored.file_path.is_some());
    }

    #[test]
    fn terminal_mix_is_immutable() {
        let registry = MixRegistry::new();
        let mix = Mix::new("Mix", "House", vec![]);
        let mix_id = mix.mix_id.clone();
        registry.insert(mix);
        registry.mark_processing(&mix_id);
        registry.fail(&mix_id);

        assert!(!registry.mark_processing(&mix_id));
        assert!(!registry.complete(&mix_id, PathBuf::from("/tmp/x.wav"), 1.0));
        assert_eq!(registry.get(&mix_id).unwrap().status, MixStatus::Failed);
    }

    #[test]
    fn unknown_ids_are_rejected() {
        let registry = MixRegistry::new();
        assert!(!registry.mark_processing("missing"));
        assert!(!registry.fail("missing"));
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn track_registry_upserts() {
        let registry = TrackRegistry::new();
        let track = Track::new("T", None, "House", "https://example.com/a");
        let track_id = track.track_id.clone();
        registry.insert(track);

        let mut updated = registry.get(&track_id).unwrap();
        updated.duration_sec = Some(60.0);
        registry.insert(updated);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&track_id).unwrap().duration_sec, Some(60.0));
    }
}

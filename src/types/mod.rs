//! Core types for the autodj-daemon.
//!
//! This module re-exports all the core data types used throughout the daemon:
//! - [`Track`]: A source track with its retrieval and analysis state
//! - [`Highlight`]: A ranked high-energy interval within a track
//! - [`Mix`]: A mix request with its monotonic status lifecycle

mod mix;
mod track;

// Re-export all types at the module level
pub use mix::{Mix, MixStatus};
pub use track::{compute_track_id, Highlight, Track, TrackAnalysis};

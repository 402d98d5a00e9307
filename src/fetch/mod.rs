//! Track retrieval module.
//!
//! Provides the [`TrackSource`] seam plus the HTTP and local-file
//! implementations.

pub mod http;
pub mod source;

// Re-export commonly used items
pub use http::HttpTrackSource;
pub use source::{AutoTrackSource, LocalTrackSource, TrackSource};

//! Error types for the autodj-daemon.
//!
//! Defines all error codes and types used throughout the daemon for
//! consistent error handling and reporting.

use std::fmt;

/// Error codes attached to daemon errors.
///
/// Per-track problems (fetch/decode) are recovered locally by skipping the
/// track; only export problems are fatal to a mix job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Source track could not be downloaded.
    /// Trigger: network error, HTTP failure, or per-track timeout.
    FetchFailed,

    /// Local audio file could not be decoded.
    /// Trigger: missing file, unsupported codec, or corrupt stream.
    DecodeFailed,

    /// Audio signal has no samples.
    /// Trigger: decoding produced an empty buffer.
    EmptySignal,

    /// The assembled mix could not be exported.
    /// Trigger: output directory not writable, disk full.
    ExportFailed,

    /// The mix job queue is at maximum capacity.
    QueueFull,

    /// A request was rejected before any work started.
    /// Trigger: no input tracks, invalid configuration values.
    InvalidRequest,
}

impl ErrorCode {
    /// Returns the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::FetchFailed => "FETCH_FAILED",
            ErrorCode::DecodeFailed => "DECODE_FAILED",
            ErrorCode::EmptySignal => "EMPTY_SIGNAL",
            ErrorCode::ExportFailed => "EXPORT_FAILED",
            ErrorCode::QueueFull => "QUEUE_FULL",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
        }
    }

    /// Returns a human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::FetchFailed => "Source track could not be downloaded",
            ErrorCode::DecodeFailed => "Local audio file could not be decoded",
            ErrorCode::EmptySignal => "Audio signal contains no samples",
            ErrorCode::ExportFailed => "Assembled mix could not be exported",
            ErrorCode::QueueFull => "Mix job queue is at maximum capacity",
            ErrorCode::InvalidRequest => "Request was rejected before processing",
        }
    }

    /// Returns true if a mix job survives this error for a single track.
    ///
    /// Fetch and decode failures skip the affected track; everything else
    /// escalates to the job level.
    pub fn is_per_track(&self) -> bool {
        matches!(
            self,
            ErrorCode::FetchFailed | ErrorCode::DecodeFailed | ErrorCode::EmptySignal
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for daemon operations.
#[derive(Debug)]
pub struct AutodjError {
    /// The error code identifying the type of error.
    pub code: ErrorCode,
    /// Human-readable error message with context.
    pub message: String,
    /// Optional underlying cause of the error.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AutodjError {
    /// Creates a new AutodjError with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new AutodjError with an underlying cause.
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a FETCH_FAILED error.
    pub fn fetch_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::FetchFailed,
            format!("Failed to fetch track: {}", reason.into()),
        )
    }

    /// Creates a DECODE_FAILED error.
    pub fn decode_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::DecodeFailed,
            format!("Failed to decode audio: {}", reason.into()),
        )
    }

    /// Creates an EMPTY_SIGNAL error.
    pub fn empty_signal() -> Self {
        Self::new(ErrorCode::EmptySignal, "Audio signal contains no samples")
    }

    /// Creates an EXPORT_FAILED error.
    pub fn export_failed(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExportFailed,
            format!("Failed to export mix: {}", reason.into()),
        )
    }

    /// Creates a QUEUE_FULL error.
    pub fn queue_full(capacity: usize) -> Self {
        Self::new(
            ErrorCode::QueueFull,
            format!("Mix job queue is full (maximum {} pending jobs)", capacity),
        )
    }

    /// Creates an INVALID_REQUEST error.
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InvalidRequest,
            format!("Invalid request: {}", reason.into()),
        )
    }
}

impl fmt::Display for AutodjError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AutodjError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Result type alias using AutodjError.
pub type Result<T> = std::result::Result<T, AutodjError>;

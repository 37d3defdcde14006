use std::path::PathBuf;

use thiserror::Error;

/// Failures while acquiring an image from either capture source.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The file could not be read or decoded as an image.
    #[error("could not read image {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    #[error("image {} is {size} bytes, limit is {limit}", path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },

    /// Every camera acquisition failure collapses into this variant.
    #[error("camera access denied")]
    PermissionDenied,

    #[error("camera is not active")]
    CameraInactive,

    #[error("camera access request is still pending")]
    CameraPending,
}

impl CaptureError {
    /// Read errors are recoverable by submitting another file.
    pub fn is_read_error(&self) -> bool {
        matches!(self, CaptureError::Read { .. } | CaptureError::TooLarge { .. })
    }
}

/// The analysis step failed; the artifact is kept so the scan can be retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("analysis failed: {reason}")]
pub struct AnalysisError {
    pub reason: String,
}

impl AnalysisError {
    pub fn new(reason: impl Into<String>) -> Self {
        AnalysisError { reason: reason.into() }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("a scan is already in progress")]
    ScanInProgress,

    #[error("no image to scan, upload or capture one first")]
    NoImage,

    #[error("scan was cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid duration '{value}': {source}")]
    Duration {
        value: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error("{0}")]
    Invalid(String),
}

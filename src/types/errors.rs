use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriveError {
    #[error("Drive API not reachable. Check the base URL and your network.")]
    NotConnected,

    #[error("Drive API rejected the credentials (HTTP {0}). Refresh DRIVE_ACCESS_TOKEN.")]
    Unauthorized(u16),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout waiting for response")]
    Timeout,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BackRefError {
    #[error("row has no back-reference link")]
    Missing,

    #[error("malformed back-reference: {0}")]
    Malformed(String),

    #[error("unsupported back-reference version: {0}")]
    UnsupportedVersion(String),
}

#[derive(Error, Debug)]
pub enum WorkbookError {
    #[error("failed to access workbook {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("workbook {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid time zone '{0}': expected a zone name such as America/New_York, UTC, or an offset such as +05:30")]
    InvalidTimeZone(String),
}

/// Errors that end (strict mode) or are recorded by (lenient mode) a run.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Workbook(#[from] WorkbookError),

    #[error("{subject}: {source}")]
    Drive {
        subject: String,
        #[source]
        source: DriveError,
    },

    #[error("row {row}: {source}")]
    BackReference {
        row: usize,
        #[source]
        source: BackRefError,
    },

    #[error("row {row}: invalid action '{action}'. Must be one of: {allowed}")]
    InvalidAction {
        row: usize,
        action: String,
        allowed: String,
    },
}

impl RunError {
    pub fn drive(subject: impl Into<String>, source: DriveError) -> Self {
        RunError::Drive {
            subject: subject.into(),
            source,
        }
    }
}

//! Error types
//!
//! `StoreError` covers the data layer, `ApiError` is what handlers return.
//! Every variant maps to exactly one HTTP status.

use hyper::StatusCode;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the student/selection store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Required input was blank after trimming.
    #[error("{0}")]
    MissingFields(&'static str),

    #[error("Student {0} already exists")]
    DuplicateStudent(String),

    #[error("Student not found")]
    StudentNotFound(String),

    /// Data file could not be read or written.
    #[error("Data file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Data file exists but is not a valid store document.
    #[error("Data file {path:?} is malformed: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize store: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingFields(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateStudent(_) => StatusCode::CONFLICT,
            Self::StudentNotFound(_) => StatusCode::NOT_FOUND,
            Self::Io { .. } | Self::Malformed { .. } | Self::Serialize(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Errors returned by request handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("Request body too large (max: {max} bytes)")]
    PayloadTooLarge { max: u64 },

    #[error("CSV export failed: {0}")]
    Export(#[from] csv::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Store(e) => e.status(),
        }
    }

    /// Whether the failure is on our side rather than the caller's.
    pub fn is_internal(&self) -> bool {
        self.status().is_server_error()
    }
}

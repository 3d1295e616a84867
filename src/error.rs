//! Error types for the book inventory admin client

use reqwest::StatusCode;
use thiserror::Error;

use crate::models::FieldErrors;

/// Failure of a single HTTP exchange with the API
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server responded with {status}{}", suffix(.detail))]
    Status {
        status: StatusCode,
        detail: Option<String>,
    },

    #[error("Validation failed ({status}): {errors}")]
    Validation {
        status: StatusCode,
        errors: FieldErrors,
    },

    #[error("Unexpected response body: {0}")]
    Decode(String),
}

fn suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {}", d)).unwrap_or_default()
}

impl ApiError {
    /// True when the API could not be reached at all (as opposed to the API
    /// answering with a rejection).
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    /// Server-provided `detail` message, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

/// User-facing failures of the book collection operations.
///
/// None of these are fatal; every operation may simply be retried.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Failed to fetch books. Try again later.")]
    FetchFailed(#[source] ApiError),

    #[error("{0}")]
    Validation(FieldErrors),

    #[error("Failed to add book. Please try again.")]
    CreateFailed(#[source] ApiError),

    #[error("Failed to update book.")]
    UpdateFailed(#[source] ApiError),

    #[error("Failed to delete book.")]
    DeleteFailed(#[source] ApiError),
}

impl SyncError {
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::FetchFailed(_) => "fetch-failed",
            SyncError::Validation(_) => "validation-failed",
            SyncError::CreateFailed(_) => "create-failed",
            SyncError::UpdateFailed(_) => "update-failed",
            SyncError::DeleteFailed(_) => "delete-failed",
        }
    }
}

/// Token persistence errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt session file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("API client error: {0}")]
    Api(#[from] ApiError),
}

/// Result type alias for API calls
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for collection operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the fetch-and-persist pipeline.
///
/// Every variant is caught at a branch boundary and logged; none of them is
/// fatal to the process.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("{endpoint} returned HTTP {status}: {body}")]
    HttpFailure {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Filesystem error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl HarvestError {
    pub fn filesystem(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Filesystem { path, source }
    }

    #[must_use]
    pub const fn is_http_failure(&self) -> bool {
        matches!(self, Self::HttpFailure { .. })
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    #[must_use]
    pub const fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey(_))
    }
}

pub type Result<T, E = HarvestError> = std::result::Result<T, E>;

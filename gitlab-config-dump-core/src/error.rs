use crate::contract::ApiError;

/// Errors that can end an export run. None of them are retried or recovered from.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The repository string is neither `owner/name` nor a 5-segment URL path.
    #[error("invalid repository: {0}")]
    Parse(String),

    #[error("unable to determine project ID for {0}")]
    NotFound(String),

    #[error("listing accessible projects failed: {0}")]
    Lookup(#[source] ApiError),

    #[error("listing {path} failed: {source}")]
    Listing {
        path: String,
        #[source]
        source: ApiError,
    },

    #[error("downloading {path} failed: {source}")]
    Download {
        path: String,
        #[source]
        source: ApiError,
    },

    #[error("decoding {path} failed: {reason}")]
    Decode { path: String, reason: String },

    #[error("writing {path} failed: {reason}")]
    Write { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ExportError>;

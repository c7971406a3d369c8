use thiserror::Error;

/// Errors produced by the refresh pipeline, the store and the renderer
#[derive(Debug, Error)]
pub enum Error {
    /// An external source timed out, answered with a non-success status or
    /// returned a payload of the wrong shape
    #[error("Could not fetch data from {endpoint}: {reason}")]
    SourceUnavailable {
        endpoint: &'static str,
        reason: String,
    },

    #[error("{0}")]
    NotFound(&'static str),

    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to encode summary image: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

impl Error {
    pub fn unavailable(endpoint: &'static str, reason: impl ToString) -> Self {
        Error::SourceUnavailable {
            endpoint,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

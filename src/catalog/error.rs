//! Error types for catalog loading

use crate::error::AppError;
use std::path::PathBuf;

/// Result type for catalog operations
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Errors raised while reading a record source or publishing a generation
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Source file could not be read
    #[error("Failed to read record source {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source content could not be decoded into records
    #[error("Failed to parse record source {origin}: {message}")]
    Parse { origin: String, message: String },

    /// Source format could not be determined
    #[error("Unsupported record source format: {0}")]
    UnsupportedFormat(String),

    /// Building the generation off the request path failed
    #[error("Failed to build catalog generation: {0}")]
    Build(String),
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        AppError::Catalog(err.to_string())
    }
}

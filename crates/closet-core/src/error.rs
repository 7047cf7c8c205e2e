//! Unified error type for the closet crates.
//!
//! Every layer funnels its failures into [`Error`]. The repository façade
//! wraps these in its own outcome-specific error so callers can tell a failed
//! save from a missing image.

use std::fmt;

use crate::ids::ImageKey;

/// Unified error type covering all failure modes in closet.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "clothing", "style").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Input data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A database operation failed.
    #[error("Database error: {source}")]
    Database {
        /// The underlying database error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An I/O operation unrelated to a specific image failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Reading, writing, or deleting a stored image failed for a reason
    /// other than the image being absent.
    #[error("Persistence error for image {key}: {source}")]
    Persistence {
        /// The image the operation was addressing.
        key: ImageKey,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A hydration batch could not be completed.
    #[error("Hydration error: {0}")]
    Hydration(String),

    /// The operation was cancelled before it completed.
    #[error("Operation cancelled")]
    Cancelled,

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::Persistence`].
    pub fn persistence(key: ImageKey, source: std::io::Error) -> Self {
        Error::Persistence { key, source }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

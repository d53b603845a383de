//! Error types and result types for pipeline operations.
//!
//! This module provides error handling for all pipeline operations.
//! Use [`PipelineResult<T>`] as the return type for fallible operations.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when running a pipeline
/// operation against a storage backend.
///
/// Store-call failures are carried through unchanged as [`Backend`](Self::Backend)
/// variants; the pipeline layer performs no retry and swallows nothing.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Serialization/deserialization error when converting between document formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during source initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// No document matched the given identifier.
    /// The first argument is the identifier, the second is the collection name.
    #[error("Document not found {0} in collection {1}")]
    DocumentNotFound(String, String),
    /// The operation is not part of the adapter's contract. Raised on the
    /// dynamic-dispatch surface before any store call is issued; statically
    /// typed read-only adapters simply do not expose mutation entry points.
    #[error("Operation {operation} is not supported by {adapter}")]
    NotSupported {
        /// Name of the attempted operation.
        operation: &'static str,
        /// Name of the concrete adapter type.
        adapter: &'static str,
    },
    /// Operation options failed range validation.
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
    /// An error occurred in the underlying storage backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl PipelineError {
    /// Shorthand for the [`NotSupported`](Self::NotSupported) variant.
    pub fn not_supported(operation: &'static str, adapter: &'static str) -> Self {
        PipelineError::NotSupported { operation, adapter }
    }
}

/// A specialized `Result` type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

impl From<BsonError> for PipelineError {
    fn from(err: BsonError) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for PipelineError {
    fn from(err: SerdeJsonError) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

//! Error types for the conversion service.

use thiserror::Error;

use crate::artifact::StoreError;
use crate::error::{ErrorKind, JobFailure, ValidationError};

/// Request-level errors. Per-item failures are reported inside batch results.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was rejected before any work started.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Unknown, expired or deleted artifact.
    #[error("artifact not found: {0}")]
    NotFound(String),

    /// Artifact storage failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// A preview job failed.
    #[error("{0}")]
    Conversion(JobFailure),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Conversion(failure) => failure.kind,
        }
    }

    /// The offending parameter field of a validation error.
    pub fn validation_field(&self) -> Option<&'static str> {
        match self {
            Self::Validation(e) => e.field(),
            _ => None,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(handle) | StoreError::InvalidHandle(handle) => Self::NotFound(handle),
            StoreError::Io(e) => Self::Storage(e.to_string()),
        }
    }
}

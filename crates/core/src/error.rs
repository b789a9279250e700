//! Error taxonomy shared across the conversion pipeline.
//!
//! Component-specific failures (`FetchError`, `TracingError`, ...) live next to
//! the component that produces them. This module holds the request-level
//! [`ValidationError`] and the [`ErrorKind`] / [`JobFailure`] pair used to
//! report a failed job inside a batch.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Rejection of request input before any job is created.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Preset name is not in the preset table.
    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    /// Override value could not be parsed for its field.
    #[error("invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },

    /// Override value parsed but lies outside the field's domain.
    #[error("{field} out of range: {value} (expected {expected})")]
    OutOfRange {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    /// Request carried no input images.
    #[error("no files provided")]
    NoInputs,

    /// Batch exceeds the configured item limit.
    #[error("too many items in batch: {count} (max {max})")]
    TooManyItems { count: usize, max: usize },

    /// Remote source URL is malformed or uses an unsupported scheme.
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Upload item carried no bytes.
    #[error("item {index} is empty")]
    EmptySource { index: usize },

    /// Item source does not match the operation (e.g. URL passed to upload).
    #[error("item {index} must be {expected}")]
    SourceMismatch { index: usize, expected: &'static str },
}

impl ValidationError {
    pub(crate) fn out_of_range(
        field: &'static str,
        value: impl fmt::Display,
        expected: &'static str,
    ) -> Self {
        Self::OutOfRange {
            field,
            value: value.to_string(),
            expected,
        }
    }

    /// The parameter field this error is about, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidValue { field, .. } | Self::OutOfRange { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Category of a failure, as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Fetch,
    Tracing,
    Optimization,
    Render,
    NotFound,
    Storage,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Fetch => "fetch",
            Self::Tracing => "tracing",
            Self::Optimization => "optimization",
            Self::Render => "render",
            Self::NotFound => "not_found",
            Self::Storage => "storage",
            Self::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of a single job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl JobFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.kind, self.message)
    }
}

//! Error types for the tracer module.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Why a trace failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TracingReason {
    /// Bytes are not an image in a format the engine reads.
    UnsupportedFormat,
    /// Bytes look like an image but cannot be decoded.
    UndecodableImage,
    /// The engine binary could not be started.
    EngineUnavailable,
    /// The engine ran and reported an error.
    EngineFailed,
    /// The engine did not finish in time.
    Timeout,
    /// The engine finished but produced no usable SVG.
    InvalidOutput,
    /// Local I/O around the engine failed.
    Io,
}

impl TracingReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat => "unsupported_format",
            Self::UndecodableImage => "undecodable_image",
            Self::EngineUnavailable => "engine_unavailable",
            Self::EngineFailed => "engine_failed",
            Self::Timeout => "timeout",
            Self::InvalidOutput => "invalid_output",
            Self::Io => "io",
        }
    }
}

impl fmt::Display for TracingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracing failure with a reason code and detail message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}: {message}")]
pub struct TracingError {
    pub reason: TracingReason,
    pub message: String,
}

impl TracingError {
    pub fn new(reason: TracingReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }

    pub fn unsupported_format(message: impl Into<String>) -> Self {
        Self::new(TracingReason::UnsupportedFormat, message)
    }

    pub fn undecodable(message: impl Into<String>) -> Self {
        Self::new(TracingReason::UndecodableImage, message)
    }

    pub fn engine_failed(message: impl Into<String>) -> Self {
        Self::new(TracingReason::EngineFailed, message)
    }
}

impl From<std::io::Error> for TracingError {
    fn from(e: std::io::Error) -> Self {
        Self::new(TracingReason::Io, e.to_string())
    }
}

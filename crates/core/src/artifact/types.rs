//! Artifact handle and metadata types.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::error::StoreError;

static HANDLE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-f]{32}\.[a-z0-9]{1,5}$").expect("valid handle pattern"));

/// Opaque reference to a stored artifact: a random token plus an extension.
///
/// Handles are never derived from user input, so they are safe to use as file
/// names. Use [`ArtifactHandle::parse`] for handles that arrive over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ArtifactHandle(String);

impl ArtifactHandle {
    pub(crate) fn generate(extension: &str) -> Self {
        Self(format!("{}.{}", Uuid::new_v4().simple(), extension))
    }

    /// Validates an externally supplied handle.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        if HANDLE_PATTERN.is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(StoreError::InvalidHandle(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn extension(&self) -> &str {
        self.0.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("")
    }
}

impl fmt::Display for ArtifactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where an artifact's bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Upload,
    GeneratedSvg,
    GeneratedPng,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::GeneratedSvg => "generated_svg",
            Self::GeneratedPng => "generated_png",
        }
    }

    /// File extension for bytes of this kind. Uploads are sniffed.
    pub(crate) fn extension_for(&self, bytes: &[u8]) -> &'static str {
        match self {
            Self::GeneratedSvg => "svg",
            Self::GeneratedPng => "png",
            Self::Upload => image::guess_format(bytes)
                .ok()
                .and_then(|format| format.extensions_str().first().copied())
                .unwrap_or("bin"),
        }
    }
}

/// MIME type for an artifact extension.
pub fn content_type_for(extension: &str) -> &'static str {
    match extension {
        "svg" => "image/svg+xml",
        other => image::ImageFormat::from_extension(other)
            .map(|format| format.to_mime_type())
            .unwrap_or("application/octet-stream"),
    }
}

/// Metadata kept for every stored artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactMeta {
    pub handle: ArtifactHandle,
    pub kind: ArtifactKind,
    pub created_at: DateTime<Utc>,
    pub size_bytes: u64,
    /// Name to offer when the artifact is downloaded.
    pub original_name: Option<String>,
}

impl ArtifactMeta {
    pub(crate) fn new(
        handle: ArtifactHandle,
        kind: ArtifactKind,
        size_bytes: u64,
        original_name: Option<String>,
    ) -> Self {
        Self {
            handle,
            kind,
            created_at: Utc::now(),
            size_bytes,
            original_name,
        }
    }

    pub fn content_type(&self) -> &'static str {
        content_type_for(self.handle.extension())
    }

    /// File name offered to clients: the original stem with the artifact's
    /// extension, falling back to the handle itself.
    pub fn download_name(&self) -> String {
        let stem = self
            .original_name
            .as_deref()
            .and_then(|name| std::path::Path::new(name).file_stem())
            .and_then(|stem| stem.to_str())
            .map(|stem| {
                stem.chars()
                    .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
                    .collect::<String>()
            })
            .filter(|stem| !stem.is_empty());

        match stem {
            Some(stem) => format!("{}.{}", stem, self.handle.extension()),
            None => self.handle.to_string(),
        }
    }

    pub(crate) fn is_expired(&self, now: DateTime<Utc>, retention: chrono::Duration) -> bool {
        now.signed_duration_since(self.created_at) > retention
    }
}

/// A stored artifact with its bytes.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub meta: ArtifactMeta,
    pub bytes: Vec<u8>,
}

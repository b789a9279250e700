//! Conversion endpoints.

use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection, Multipart, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use tracery_core::{
    BatchResult, ConversionRequest, ConversionResult, ImageSource, OutputFormat,
    ParameterOverrides, ValidationError,
};

use super::error::{
    bad_request, internal_error, service_error, status_for_failure, validation_error, ApiError,
};
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

/// Body of `POST /api/convert-url`. Parameter overrides sit next to the URL.
#[derive(Debug, Deserialize)]
pub struct ConvertUrlRequest {
    pub url: String,
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub optimize: Option<bool>,
    #[serde(flatten)]
    pub overrides: ParameterOverrides,
}

/// Fields collected from a multipart conversion form.
#[derive(Debug, Default)]
struct ConvertForm {
    files: Vec<(Option<String>, Vec<u8>)>,
    preset: Option<String>,
    format: OutputFormat,
    optimize: Option<bool>,
    overrides: ParameterOverrides,
}

impl ConvertForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();

        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(e) => return Err(multipart_error("Failed to read form", e)),
            };
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "file" | "files" => {
                    let filename = field.file_name().map(|s| s.to_string());
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| multipart_error("Failed to read file", e))?;
                    form.files.push((filename, bytes.to_vec()));
                }
                _ => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| multipart_error("Failed to read field", e))?;
                    form.set(&name, &text).map_err(validation_error)?;
                }
            }
        }

        Ok(form)
    }

    /// Applies one text field. Empty values and unrelated keys are ignored.
    fn set(&mut self, name: &str, value: &str) -> Result<(), ValidationError> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(());
        }
        match name {
            "preset" => self.preset = Some(value.to_string()),
            "format" => self.format = parse_format(value)?,
            "optimize" => self.optimize = Some(parse_flag("optimize", value)?),
            _ => {
                self.overrides.set_field(name, value)?;
            }
        }
        Ok(())
    }

    fn into_requests(self) -> Vec<ConversionRequest> {
        let Self {
            files,
            preset,
            format,
            optimize,
            overrides,
        } = self;

        files
            .into_iter()
            .map(|(name, bytes)| ConversionRequest {
                source: ImageSource::Upload { name, bytes },
                preset: preset.clone(),
                overrides: overrides.clone(),
                format,
                optimize,
            })
            .collect()
    }
}

fn parse_format(value: &str) -> Result<OutputFormat, ValidationError> {
    OutputFormat::parse(value).ok_or_else(|| ValidationError::InvalidValue {
        field: "format",
        value: value.to_string(),
    })
}

fn parse_flag(field: &'static str, value: &str) -> Result<bool, ValidationError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ValidationError::InvalidValue {
            field,
            value: value.to_string(),
        }),
    }
}

fn multipart_error(context: &str, e: MultipartError) -> ApiError {
    bad_request(e.status(), format!("{}: {}", context, e.body_text()))
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/convert
///
/// Converts one or more uploaded images. Every item shares the form's preset,
/// overrides, format and optimize flag. Per-item failures are reported in the
/// result list; the response is 200 whenever the request itself was valid.
pub async fn convert_upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<BatchResult>, ApiError> {
    let form = ConvertForm::read(multipart).await?;
    debug!(files = form.files.len(), "Received conversion form");

    let batch = state
        .service()
        .convert_upload(form.into_requests())
        .await
        .map_err(service_error)?;
    Ok(Json(batch))
}

/// POST /api/convert-url
///
/// Converts one remote image. A failed job answers with its result body and
/// a status derived from the failure kind.
pub async fn convert_url(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ConvertUrlRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ConversionResult>), ApiError> {
    let Json(body) = body.map_err(|e| bad_request(e.status(), e.body_text()))?;
    let format = match body.format.as_deref() {
        Some(value) => parse_format(value).map_err(validation_error)?,
        None => OutputFormat::default(),
    };

    let request = ConversionRequest {
        source: ImageSource::RemoteUrl(body.url),
        preset: body.preset,
        overrides: body.overrides,
        format,
        optimize: body.optimize,
    };
    let result = state
        .service()
        .convert_from_url(vec![request])
        .await
        .map_err(service_error)?
        .into_items()
        .into_iter()
        .next()
        .ok_or_else(|| internal_error("conversion produced no result"))?;

    let status = match result.failure() {
        Some(failure) => status_for_failure(failure.kind),
        None => StatusCode::OK,
    };
    Ok((status, Json(result)))
}

/// POST /api/preview
///
/// Converts one uploaded image to SVG and returns the document inline
/// without keeping an output artifact.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = ConvertForm {
        format: OutputFormat::Svg,
        ..ConvertForm::read(multipart).await?
    };
    let mut requests = form.into_requests();
    if requests.len() > 1 {
        return Err(validation_error(ValidationError::TooManyItems {
            count: requests.len(),
            max: 1,
        }));
    }
    let request = requests
        .pop()
        .ok_or_else(|| validation_error(ValidationError::NoInputs))?;

    let document = state
        .service()
        .preview(request)
        .await
        .map_err(service_error)?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        document.bytes,
    )
        .into_response())
}

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::error::{service_error, ApiError};
use crate::state::AppState;

/// GET /api/download/{handle}
///
/// Serves a generated artifact with its content type and a download file name.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(handle): Path<String>,
) -> Result<Response, ApiError> {
    let artifact = state
        .service()
        .download(&handle)
        .await
        .map_err(service_error)?;

    // download names are restricted to [A-Za-z0-9._-]
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        artifact.meta.download_name()
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static(artifact.meta.content_type()),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response())
}

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use super::extract::{FormFields, JsonBody};
use super::schema::{
    FilesResponse, HealthResponse, OperationForm, ProcessResponse, RootResponse, UploadResponse,
    SERVICE_NAME,
};
use super::AppState;
use crate::error::DashError;
use crate::media::VideoCreateRequest;

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        status: "ok".to_string(),
        service: SERVICE_NAME.to_string(),
    })
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        ffmpeg: state.workflow.media().is_available().await,
    })
}

/// Store the multipart field `file` under a fresh identifier
#[tracing::instrument(skip_all)]
pub async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, DashError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(DashError::from)?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let stored = state.workflow.storage().save_upload(&filename, field).await?;
        return Ok(Json(stored.into()));
    }

    Err(DashError::InvalidInput("Field required: file".to_string()))
}

/// Shared handler for the single-input operation endpoints
pub async fn process<F: OperationForm + Send>(
    State(state): State<Arc<AppState>>,
    fields: FormFields,
) -> Result<Json<ProcessResponse>, DashError> {
    let form = F::from_fields(&fields)?;
    let outcome = state
        .workflow
        .run_operation(form.file_id(), &form.operation())
        .await?;
    Ok(Json(outcome.into()))
}

pub async fn create_video(
    State(state): State<Arc<AppState>>,
    JsonBody(request): JsonBody<VideoCreateRequest>,
) -> Result<Json<ProcessResponse>, DashError> {
    let outcome = state.workflow.create_video(&request).await?;
    Ok(Json(outcome.into()))
}

/// Stream a produced file as an untyped download
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, DashError> {
    let (file, len) = state.workflow.storage().open_output(&filename).await?;

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static("application/octet-stream")),
        (header::CONTENT_LENGTH, HeaderValue::from(len)),
        (header::CONTENT_DISPOSITION, disposition),
    ];

    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

/// The directory walk is synchronous, so it runs on the blocking pool
pub async fn list_files(State(state): State<Arc<AppState>>) -> Result<Json<FilesResponse>, DashError> {
    let storage = state.workflow.storage().clone();
    let files = tokio::task::spawn_blocking(move || storage.list_uploads())
        .await
        .map_err(|e| DashError::Io(std::io::Error::other(e)))??;
    Ok(Json(FilesResponse {
        files: files.into_iter().map(Into::into).collect(),
    }))
}

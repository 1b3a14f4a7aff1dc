//! HTTP mapping for [`DashError`].
//!
//! Handlers return `Result<_, DashError>`; the body is always `{"detail": "<message>"}`.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::schema::ErrorBody;
use crate::error::DashError;

impl DashError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DashError::NotFound(_) => StatusCode::NOT_FOUND,
            DashError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DashError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            DashError::Processing { .. }
            | DashError::Media(_)
            | DashError::Io(_)
            | DashError::Json(_)
            | DashError::Toml(_)
            | DashError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Body limit violations keep their 413; every other multipart failure is a malformed form.
impl From<MultipartError> for DashError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            DashError::PayloadTooLarge(e.body_text())
        } else {
            DashError::InvalidInput(e.body_text())
        }
    }
}

impl IntoResponse for DashError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, Json(ErrorBody { detail: self.to_string() })).into_response()
    }
}

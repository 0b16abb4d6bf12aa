//! HTTP status mapping for [`AppError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::AppError;

/// JSON error body returned by the API endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable reason.
    pub detail: String,
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Config(_)
            | Self::Db(_)
            | Self::Mail(_)
            | Self::Undeliverable(_)
            | Self::Template(_)
            | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = match self {
            Self::Validation(msg) | Self::NotFound(msg) => msg,
            other => {
                error!(err = %other, "request failed");
                "error interno al procesar la cita".to_owned()
            }
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Errors surfaced across the receiver and read-API request boundaries.
///
/// Variants map 1:1 onto the error kinds in the design's error-handling
/// section: decode failures and oversize payloads never mutate the store;
/// `NotFound`/`BadPagination` are read-path errors; `Internal` covers
/// anything else, including recovered panics.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("failed to decode request body: {0}")]
    Decode(String),
    #[error("request body of {actual} bytes exceeds the {limit} byte limit")]
    Oversize { actual: usize, limit: usize },
    #[error("{0} not found")]
    NotFound(String),
    #[error("invalid pagination: {0}")]
    BadPagination(String),
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::Decode(_) => "decode_error",
            AppError::Oversize { .. } => "payload_too_large",
            AppError::NotFound(_) => "not_found",
            AppError::BadPagination(_) => "bad_pagination",
            AppError::Internal(_) => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Decode(_) => StatusCode::BAD_REQUEST,
            AppError::Oversize { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadPagination(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Map to the closest gRPC status code, per the design's note that the
    /// gRPC paths reuse these same variants.
    pub fn to_tonic_status(&self) -> tonic::Status {
        match self {
            AppError::Decode(msg) => tonic::Status::invalid_argument(msg.clone()),
            AppError::Oversize { actual, limit } => tonic::Status::resource_exhausted(format!(
                "request body of {actual} bytes exceeds the {limit} byte limit"
            )),
            AppError::NotFound(msg) => tonic::Status::not_found(msg.clone()),
            AppError::BadPagination(msg) => tonic::Status::invalid_argument(msg.clone()),
            AppError::Internal(e) => tonic::Status::internal(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, AppError::Internal(_)) {
            tracing::error!(error = %self, "internal error");
        }
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
            code: self.code(),
        };
        (status, Json(body)).into_response()
    }
}

//! Maps pipeline errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use shepherd_core::ShepherdError;

pub type ApiResult<T> = Result<T, ApiError>;

/// A pipeline error carried to the HTTP layer together with its status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

/// JSON error body returned for every non-success response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl From<ShepherdError> for ApiError {
    fn from(err: ShepherdError) -> Self {
        let status = match &err {
            ShepherdError::Validation { .. } => StatusCode::BAD_REQUEST,
            ShepherdError::Upstream { .. }
            | ShepherdError::Retrieval { .. }
            | ShepherdError::StreamTransport { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            code: err.error_code(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}

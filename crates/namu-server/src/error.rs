//! Mapping from domain errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use namu_core::Error;

/// A domain error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    /// The HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::Config(_) | Error::Source(_) | Error::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Error::RemoteService { .. } | Error::ResponseShape { .. } => StatusCode::BAD_GATEWAY,
            Error::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::AlreadyRunning => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, status = status.as_u16(), "request failed");
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

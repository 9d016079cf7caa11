//! Error responses of the bridge.
//!
//! Every failure a client can see is one of four fixed JSON bodies of the
//! form `{"error": {"code": <status>, "message": <text>}}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use lib_qlsbridge::RetrieveError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Unknown path, missing `servers` query, or no usable address.
    #[error("Not found")]
    NotFound,

    /// Known path, wrong HTTP method.
    #[error("Not allowed")]
    MethodNotAllowed,

    /// The ranked server directory could not be fetched.
    #[error("ranked server directory unavailable: {0}")]
    DirectoryUnavailable(#[from] RetrieveError),

    /// The request did not complete within its deadline.
    #[error("Request timeout.")]
    DeadlineExceeded,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::DirectoryUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::DeadlineExceeded => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Client-facing message. Internal details never leave the process.
    pub fn message(&self) -> &'static str {
        match self {
            ApiError::NotFound => "Not found",
            ApiError::MethodNotAllowed => "Not allowed",
            ApiError::DirectoryUnavailable(_) => "Server error",
            ApiError::DeadlineExceeded => "Request timeout.",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::DirectoryUnavailable(e) => error!("Server error: {}", e),
            ApiError::DeadlineExceeded => warn!("Request deadline exceeded"),
            ApiError::NotFound | ApiError::MethodNotAllowed => {}
        }

        let status = self.status();
        let body = json!({
            "error": {
                "code": status.as_u16(),
                "message": self.message(),
            }
        });
        (status, Json(body)).into_response()
    }
}

use std::error::Error as StdError;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::ErrorReport;

const SOURCE: &str = "infra::http::api";

/// Failure envelope: `{"status": "<reason phrase>", "message": "..."}`.
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub status: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    report: ErrorReport,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let report = ErrorReport::from_message(SOURCE, status, message.clone());
        Self {
            status,
            message,
            report,
        }
    }

    /// Respond with a public message while logging the full error chain.
    pub fn with_error(
        status: StatusCode,
        message: impl Into<String>,
        error: &(dyn StdError + 'static),
    ) -> Self {
        Self {
            status,
            message: message.into(),
            report: ErrorReport::from_error(SOURCE, status, error),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn request_timeout() -> Self {
        Self::new(StatusCode::REQUEST_TIMEOUT, "Request Timeout")
    }

    pub fn internal(error: &(dyn StdError + 'static)) -> Self {
        Self::with_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error",
            error,
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            status: self
                .status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            message: self.message,
        };
        let mut response = (self.status, Json(body)).into_response();
        self.report.attach(&mut response);
        response
    }
}

//! JSON error responses for the HTTP adapters.
//!
//! Every error body has the shape `{"error": "...", "code": "..."}`, the
//! same shape the auth middleware uses. Internal failures keep their detail
//! only when the server runs outside production.

use std::any::Any;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Message returned in place of internal detail.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Human-readable message.
    pub error: String,

    /// Error code for programmatic handling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: Some(code.into()),
        }
    }
}

/// API error type that converts failures to HTTP responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request could not be processed as sent.
    BadRequest { code: String, message: String },

    /// The requested resource does not exist.
    NotFound { code: String, message: String },

    /// Unexpected server-side failure.
    Internal {
        message: String,
        /// When false the message is replaced by `INTERNAL_ERROR_MESSAGE`.
        expose_detail: bool,
    },
}

impl ApiError {
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::NotFound {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>, expose_detail: bool) -> Self {
        ApiError::Internal {
            message: message.into(),
            expose_detail,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request("INVALID_REQUEST", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::BadRequest { code, message } | ApiError::NotFound { code, message } => {
                ErrorResponse::new(code, message)
            }
            ApiError::Internal {
                message,
                expose_detail,
            } => {
                tracing::error!(error = %message, "Internal error while handling request");
                let message = if expose_detail {
                    message
                } else {
                    INTERNAL_ERROR_MESSAGE.to_string()
                };
                ErrorResponse::new("INTERNAL_ERROR", message)
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Response for a handler panic, used with `CatchPanicLayer::custom`.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %detail, "Request handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("INTERNAL_ERROR", INTERNAL_ERROR_MESSAGE)),
    )
        .into_response()
}

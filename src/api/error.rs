//! API error type with `IntoResponse`.
//!
//! Domain errors map through their `ErrorCode` to an HTTP status. Bodies are
//! `{ "error": CODE, "message": text }`; server errors are logged and get a
//! generic message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::{StructuredError, YabtError};

#[derive(Debug)]
pub enum ApiError {
    /// A service or storage error.
    Domain(YabtError),

    /// A malformed header or parameter (400).
    BadRequest { message: String },

    /// Lock poisoning or a failed blocking task (500, logged).
    Internal { message: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The status this error is answered with.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Domain(err) => {
                let code = StructuredError::from_error(err).code;
                StatusCode::from_u16(code.http_status())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<YabtError> for ApiError {
    fn from(err: YabtError) -> Self {
        Self::Domain(err)
    }
}

fn internal_body() -> serde_json::Value {
    json!({
        "error": "INTERNAL_ERROR",
        "message": "an internal error occurred"
    })
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Domain(err) if status.is_server_error() => {
                tracing::error!(error = %err, "Request failed");
                internal_body()
            }
            Self::Domain(err) => {
                let structured = StructuredError::from_error(err);
                let mut body = json!({
                    "error": structured.code.as_str(),
                    "message": structured.message,
                });
                if let Some(hint) = structured.hint {
                    body["hint"] = json!(hint);
                }
                if let Some(context) = structured.context {
                    body["context"] = context;
                }
                body
            }
            Self::BadRequest { message } => json!({
                "error": "BAD_REQUEST",
                "message": message
            }),
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                internal_body()
            }
        };

        (status, Json(body)).into_response()
    }
}

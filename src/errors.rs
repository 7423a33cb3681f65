use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("bad request: {message}")]
    BadRequest {
        code: &'static str,
        message: &'static str,
    },
    #[error("unauthorized: {message}")]
    Unauthorized {
        code: &'static str,
        message: &'static str,
    },
    #[error("not found: {message}")]
    NotFound {
        code: &'static str,
        message: &'static str,
    },
    #[error("method not allowed: {message}")]
    MethodNotAllowed {
        code: &'static str,
        message: &'static str,
    },
    #[error("unsupported media type: {message}")]
    UnsupportedMediaType {
        code: &'static str,
        message: &'static str,
    },
    #[error("internal error")]
    Internal { code: &'static str, message: String },
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub details: serde_json::Value,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: &'static str) -> Self {
        Self::BadRequest { code, message }
    }

    pub fn unauthorized(code: &'static str, message: &'static str) -> Self {
        Self::Unauthorized { code, message }
    }

    pub fn not_found(code: &'static str, message: &'static str) -> Self {
        Self::NotFound { code, message }
    }

    pub fn method_not_allowed(code: &'static str, message: &'static str) -> Self {
        Self::MethodNotAllowed { code, message }
    }

    pub fn unsupported_media_type(code: &'static str, message: &'static str) -> Self {
        Self::UnsupportedMediaType { code, message }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            code: "internal_error",
            message: message.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::BadRequest { code, message } => {
                (StatusCode::BAD_REQUEST, code, message.to_string())
            }
            Self::Unauthorized { code, message } => {
                (StatusCode::UNAUTHORIZED, code, message.to_string())
            }
            Self::NotFound { code, message } => (StatusCode::NOT_FOUND, code, message.to_string()),
            Self::MethodNotAllowed { code, message } => {
                (StatusCode::METHOD_NOT_ALLOWED, code, message.to_string())
            }
            Self::UnsupportedMediaType { code, message } => {
                (StatusCode::UNSUPPORTED_MEDIA_TYPE, code, message.to_string())
            }
            Self::Internal { code, message } => {
                tracing::error!(error = %message, "request failed with internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    code,
                    "internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorResponse {
                code: code.to_string(),
                message,
                details: json!({}),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let response = AppError::internal("dynamodb exploded").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        assert_eq!(
            body,
            "{\"code\":\"internal_error\",\"message\":\"internal server error\",\"details\":{}}"
        );
    }

    #[test]
    fn store_errors_become_internal() {
        let err = AppError::from(StoreError::LockPoisoned);
        assert!(matches!(err, AppError::Internal { .. }));
    }
}

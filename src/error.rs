use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::dto::ErrorResponse;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidPayload(_) | AppError::InvalidDate(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::BytesRejection(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                AppError::PayloadTooLarge(e.body_text())
            }
            // Body stream failed mid-read.
            JsonRejection::BytesRejection(e) => AppError::Internal(anyhow::anyhow!(e.body_text())),
            other => AppError::InvalidPayload(other.body_text()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, details) = match &self {
            AppError::InvalidPayload(msg) => {
                tracing::warn!(details = %msg, "Rejected survey payload");
                ("Invalid form data", msg.clone())
            }
            AppError::InvalidDate(msg) => {
                tracing::warn!(details = %msg, "Rejected survey date");
                ("Invalid date", msg.clone())
            }
            AppError::PayloadTooLarge(msg) => {
                tracing::warn!(details = %msg, "Rejected oversized survey payload");
                ("Payload too large", msg.clone())
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "Internal error");
                ("Failed to save form data", e.to_string())
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_client_errors() {
        assert_eq!(
            AppError::InvalidPayload("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidDate("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::PayloadTooLarge("x".into()).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn test_internal_error_is_server_error() {
        let err = AppError::from(anyhow::anyhow!("boom"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

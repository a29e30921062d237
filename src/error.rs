use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ApiError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid id format")]
    InvalidId,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("document store error: {0}")]
    Store(#[from] mongodb::error::Error),

    #[error("malformed document: {0}")]
    MalformedDocument(#[from] serde_json::Error),

    #[error("password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("pdf rendering failed: {0}")]
    Render(String),

    #[error("invalid mail address: {0}")]
    MailAddress(#[from] lettre::address::AddressError),

    #[error("mail message error: {0}")]
    MailCompose(#[from] lettre::error::Error),

    #[error("mail send failed: {0}")]
    MailSend(#[from] lettre::transport::smtp::Error),

    #[error("mail transport not configured")]
    MailNotConfigured,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Shorthand for field-level validation failures.
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            ApiError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody {
                    code: "VALIDATION".to_string(),
                    message: msg,
                },
            ),
            ApiError::InvalidId => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody {
                    code: "INVALID_ID".to_string(),
                    message: "invalid id format".to_string(),
                },
            ),
            ApiError::MailAddress(e) => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody {
                    code: "VALIDATION".to_string(),
                    message: format!("invalid mail address: {e}"),
                },
            ),
            ApiError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                ApiErrorBody {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{what} not found"),
                },
            ),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody {
                    code: "INVALID_CREDENTIALS".to_string(),
                    message: "invalid credentials".to_string(),
                },
            ),
            ApiError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ApiErrorBody {
                    code: "CONFLICT".to_string(),
                    message: msg,
                },
            ),
            ApiError::Store(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiErrorBody {
                    code: "STORE_UNAVAILABLE".to_string(),
                    message: "document store unavailable".to_string(),
                },
            ),
            ApiError::MailNotConfigured => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiErrorBody {
                    code: "MAIL_NOT_CONFIGURED".to_string(),
                    message: "mail transport is not configured".to_string(),
                },
            ),
            ApiError::MailSend(_) => (
                StatusCode::BAD_GATEWAY,
                ApiErrorBody {
                    code: "MAIL_SEND_FAILED".to_string(),
                    message: "mail transport failed to send".to_string(),
                },
            ),
            ApiError::MalformedDocument(_)
            | ApiError::PasswordHash(_)
            | ApiError::Render(_)
            | ApiError::MailCompose(_)
            | ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorBody {
                    code: "INTERNAL".to_string(),
                    message: "An internal server error occurred.".to_string(),
                },
            ),
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

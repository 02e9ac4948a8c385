use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Error returned by HTTP handlers.
///
/// Rendered as `{"message": ..., "context"?: ...}` with the status code carried
/// out of band. Upstream failures (database, email, internal) keep their detail
/// in the logs and only expose the generic message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("{0}")]
    BadRequest(anyhow::Error),

    #[error("{0}")]
    NotFound(anyhow::Error),

    #[error("{0}")]
    Unauthorized(anyhow::Error),

    #[error("{0}")]
    Forbidden(anyhow::Error),

    #[error("{0}")]
    Gone(anyhow::Error),

    #[error("{0}")]
    Conflict(anyhow::Error),

    #[error("Too many requests: {0}")]
    TooManyRequests(String, Option<u64>),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Email error: {0}")]
    EmailError(String),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(err: JsonRejection) -> Self {
        tracing::debug!(error = %err, "Rejected JSON body");
        AppError::BadRequest(anyhow::anyhow!("Invalid JSON request"))
    }
}

impl From<PathRejection> for AppError {
    fn from(err: PathRejection) -> Self {
        tracing::debug!(error = %err, "Rejected path parameters");
        AppError::BadRequest(anyhow::anyhow!("URL could not be understood"))
    }
}

impl AppError {
    /// Status code this error is rendered with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Gone(_) => StatusCode::GONE,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::TooManyRequests(_, _) => StatusCode::TOO_MANY_REQUESTS,
            AppError::InternalError(_)
            | AppError::DatabaseError(_)
            | AppError::EmailError(_)
            | AppError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (message, context, retry_after) = match self {
            AppError::ValidationError(err) => {
                ("Invalid request".to_string(), Some(err.to_string()), None)
            }
            AppError::BadRequest(err)
            | AppError::NotFound(err)
            | AppError::Unauthorized(err)
            | AppError::Forbidden(err)
            | AppError::Gone(err)
            | AppError::Conflict(err) => (err.to_string(), None, None),
            AppError::TooManyRequests(msg, retry) => (msg, None, retry),
            AppError::InternalError(err) => {
                tracing::error!(error = ?err, "Internal error");
                (
                    "Something happened on our end, please contact the support".to_string(),
                    None,
                    None,
                )
            }
            AppError::DatabaseError(err) => {
                tracing::error!(error = ?err, "Database error");
                ("Database Error".to_string(), None, None)
            }
            AppError::EmailError(msg) => {
                tracing::error!(error = %msg, "Email delivery failed");
                (
                    "It was not possible to send the verification email".to_string(),
                    None,
                    None,
                )
            }
            AppError::ConfigError(err) => {
                tracing::error!(error = ?err, "Configuration error");
                ("Configuration error".to_string(), None, None)
            }
        };

        let mut res = (status, Json(ErrorResponse { message, context })).into_response();

        if let Some(retry) = retry_after {
            res.headers_mut()
                .insert(axum::http::header::RETRY_AFTER, retry.into());
        }

        res
    }
}

use service_core::error::AppError;
use thiserror::Error;

use super::{email::EmailError, session::TokenError, store::StoreError};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Store(anyhow::Error),

    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account disabled")]
    AccountDisabled,

    #[error("Forbidden")]
    Forbidden,

    #[error("Not found")]
    NotFound,

    #[error("Token expired")]
    TokenExpired,

    #[error("User already taken")]
    DuplicateRegistrant,

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Still referenced: {0}")]
    InUse(String),

    #[error("User registration is disabled")]
    RegistrationDisabled,
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ServiceError::NotFound,
            StoreError::Duplicate(detail) => ServiceError::Duplicate(detail),
            StoreError::Referenced(detail) => ServiceError::InUse(detail),
            StoreError::Backend(e) => ServiceError::Store(e),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Store(e) => AppError::DatabaseError(e),
            ServiceError::Email(e) => AppError::EmailError(e.to_string()),
            ServiceError::Token(e) => {
                tracing::error!(error = %e, "Token generation failed");
                AppError::InternalError(anyhow::anyhow!("Token generation error"))
            }
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::Validation(e) => AppError::BadRequest(anyhow::anyhow!(e)),
            ServiceError::Unauthorized => AppError::Unauthorized(anyhow::anyhow!("Unauthorized")),
            ServiceError::InvalidCredentials => {
                AppError::Forbidden(anyhow::anyhow!("Invalid Credentials"))
            }
            ServiceError::AccountDisabled => AppError::Forbidden(anyhow::anyhow!("Account disabled")),
            ServiceError::Forbidden => AppError::Forbidden(anyhow::anyhow!(
                "Insufficient permissions for this resource"
            )),
            ServiceError::NotFound => AppError::NotFound(anyhow::anyhow!("Resource not found")),
            ServiceError::TokenExpired => AppError::Gone(anyhow::anyhow!("Token has expired")),
            ServiceError::DuplicateRegistrant => {
                AppError::Conflict(anyhow::anyhow!("User already taken"))
            }
            ServiceError::Duplicate(detail) => {
                tracing::debug!(detail = %detail, "Duplicate record");
                AppError::Conflict(anyhow::anyhow!("Resource already exists"))
            }
            ServiceError::InUse(detail) => {
                tracing::debug!(detail = %detail, "Record still referenced");
                AppError::Conflict(anyhow::anyhow!("Resource is still in use"))
            }
            ServiceError::RegistrationDisabled => {
                AppError::Conflict(anyhow::anyhow!("User registration is disabled"))
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        ServiceError::from(err).into()
    }
}

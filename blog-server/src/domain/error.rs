use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

use crate::infrastructure::storage::StorageError;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("post not found: {0}")]
    PostNotFound(i32),
    #[error("storage credentials not found")]
    CredentialsMissing,
    #[error("{0}")]
    Upload(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for DomainError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::CredentialsMissing => DomainError::CredentialsMissing,
            StorageError::Upload(message) => DomainError::Upload(message),
        }
    }
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::PostNotFound(_) => StatusCode::NOT_FOUND,
            DomainError::CredentialsMissing | DomainError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            DomainError::Upload(_) | DomainError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Store failures keep their detail in the logs only.
        let body = match self {
            DomainError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };
        HttpResponse::build(self.status_code())
            .content_type("text/plain; charset=utf-8")
            .body(body)
    }
}

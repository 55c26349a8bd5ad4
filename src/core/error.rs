use thiserror::Error;

use crate::core::protocol::{ErrorBody, ErrorCode};
use crate::core::store::StoreError;
use crate::games::hangman::GameError;

/// Errors surfaced to RPC callers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Rejected(#[from] GameError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::BadRequest(_) => ErrorCode::BadRequest,
            ApiError::NotFound(_) => ErrorCode::NotFound,
            ApiError::Conflict(_) => ErrorCode::Conflict,
            ApiError::Rejected(_) => ErrorCode::Forbidden,
            ApiError::Internal(_) => ErrorCode::Internal,
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUser(_) => {
                ApiError::Conflict("A User with that name already exists!".to_string())
            }
            StoreError::UnknownUser(_) => {
                ApiError::NotFound("A User with that name does not exist!".to_string())
            }
            StoreError::UnknownGame(_) => ApiError::NotFound("Game not found!".to_string()),
            err @ StoreError::VersionConflict { .. } => ApiError::Conflict(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

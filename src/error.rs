use serde::Serialize;
use thiserror::Error;

use crate::client::{ApiError, ApiErrorCode};
use crate::persistence::PersistenceError;
use crate::quiz::QuizError;
use crate::words::StoreError;

/// Coarse classification callers branch on. Codes are stable and carry no
/// display text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    SessionState,
    Network,
    Auth,
    Decode,
    Remote,
    NotFound,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::SessionState => "SESSION_STATE_ERROR",
            Self::Network => "NETWORK_ERROR",
            Self::Auth => "AUTH_ERROR",
            Self::Decode => "DECODE_ERROR",
            Self::Remote => "HTTP_ERROR",
            Self::NotFound => "NOT_FOUND",
            Self::Storage => "STORAGE_ERROR",
        }
    }
}

#[derive(Debug, Error)]
pub enum TrainerError {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl TrainerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Quiz(QuizError::Validation(_)) => ErrorKind::Validation,
            Self::Quiz(QuizError::SessionState(_)) => ErrorKind::SessionState,
            Self::Quiz(QuizError::Store(err)) | Self::Store(err) => store_kind(err),
            Self::Api(err) => api_kind(err),
            Self::Persistence(PersistenceError::Api(err)) => api_kind(err),
            Self::Persistence(_) => ErrorKind::Storage,
        }
    }
}

fn store_kind(err: &StoreError) -> ErrorKind {
    match err {
        StoreError::NotFound(_) => ErrorKind::NotFound,
        StoreError::InvalidInput(_) => ErrorKind::Validation,
    }
}

fn api_kind(err: &ApiError) -> ErrorKind {
    match err.code {
        ApiErrorCode::NetworkError | ApiErrorCode::Timeout | ApiErrorCode::Cancelled => {
            ErrorKind::Network
        }
        ApiErrorCode::Unauthorized | ApiErrorCode::SessionExpired => ErrorKind::Auth,
        ApiErrorCode::DecodeError => ErrorKind::Decode,
        ApiErrorCode::HttpError if err.status == Some(404) => ErrorKind::NotFound,
        ApiErrorCode::HttpError => ErrorKind::Remote,
    }
}

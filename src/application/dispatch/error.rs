use thiserror::Error;

use crate::application::dto::WorldValidationError;
use crate::application::ports::outbound::RepositoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchErrorKind {
    NotFound,
    Conflict,
    Validation,
    Timeout,
    Cancelled,
    Unavailable,
    Internal,
}

/// Client-facing failure of a dispatched request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DispatchError {
    pub kind: DispatchErrorKind,
    pub message: String,
}

impl DispatchError {
    pub fn new(kind: DispatchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(DispatchErrorKind::Validation, message)
    }

    /// HTTP-equivalent status code; 499 is the client-closed-request convention
    pub fn status_code(&self) -> u16 {
        match self.kind {
            DispatchErrorKind::NotFound => 404,
            DispatchErrorKind::Conflict => 409,
            DispatchErrorKind::Validation => 400,
            DispatchErrorKind::Timeout => 504,
            DispatchErrorKind::Cancelled => 499,
            DispatchErrorKind::Unavailable => 503,
            DispatchErrorKind::Internal => 500,
        }
    }
}

impl From<RepositoryError> for DispatchError {
    fn from(error: RepositoryError) -> Self {
        let kind = match &error {
            RepositoryError::NotFound { .. } => DispatchErrorKind::NotFound,
            RepositoryError::Conflict { .. } => DispatchErrorKind::Conflict,
            RepositoryError::InvalidArgument(_) | RepositoryError::InvalidPath(_) => {
                DispatchErrorKind::Validation
            }
            RepositoryError::Timeout { .. } => DispatchErrorKind::Timeout,
            RepositoryError::Cancelled { .. } => DispatchErrorKind::Cancelled,
            RepositoryError::StoreUnavailable { .. } => DispatchErrorKind::Unavailable,
            RepositoryError::Query { .. } | RepositoryError::Serialization(_) => {
                DispatchErrorKind::Internal
            }
        };
        Self::new(kind, error.to_string())
    }
}

impl From<WorldValidationError> for DispatchError {
    fn from(error: WorldValidationError) -> Self {
        Self::validation(error.to_string())
    }
}

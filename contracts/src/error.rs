//! Errors raised by template construction and transaction helpers.

use algo_protocol::error::{CryptoError, ValidationError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The requested amount, ratio or round window would be rejected by the
    /// template's own program.
    #[error("template constraint violated: {0}")]
    Constraint(String),

    /// Construction parameters that can never yield a usable program.
    #[error("invalid template parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Protocol(#[from] algo_protocol::Error),
}

impl From<ValidationError> for TemplateError {
    fn from(err: ValidationError) -> Self {
        TemplateError::Protocol(err.into())
    }
}

impl From<CryptoError> for TemplateError {
    fn from(err: CryptoError) -> Self {
        TemplateError::Protocol(err.into())
    }
}

pub type Result<T, E = TemplateError> = std::result::Result<T, E>;

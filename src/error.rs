use thiserror::Error;

/// Signal engine error types.
///
/// Insufficient data and failed validation gates are not errors: they surface
/// as `None` and [`crate::types::ValidationFailure`] respectively.
#[derive(Error, Debug)]
pub enum SignalError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl SignalError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        SignalError::InvalidConfiguration(msg.into())
    }

    pub(crate) fn input(msg: impl Into<String>) -> Self {
        SignalError::InvalidInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, SignalError>;

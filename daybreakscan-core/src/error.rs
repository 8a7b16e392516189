use thiserror::Error;

/// Errors raised by pure domain logic (no I/O involved).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

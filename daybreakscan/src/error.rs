//! Error kinds surfaced by the scan pipeline (spec §7). Every variant maps to
//! an HTTP status class one layer up; this crate never constructs the HTTP
//! response itself, only the typed error.

use serde::Serialize;
use thiserror::Error;

use crate::payment::PaymentDetails;
use crate::rpc::RouterError;

#[derive(Debug, Error, Clone, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum ScanError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("deployer not found")]
    DeployerNotFound,

    #[error("upstream rate limited")]
    UpstreamRateLimited,

    #[error("upstream error: {0}")]
    UpstreamError(String),

    #[error("scan timed out")]
    ScanTimeout,

    #[error("quota exceeded")]
    QuotaExceeded { payment: PaymentDetails },

    #[error("payment invalid")]
    PaymentInvalid,

    #[error("internal error")]
    InternalError(String),
}

impl From<daybreakscan_core::CoreError> for ScanError {
    fn from(e: daybreakscan_core::CoreError) -> Self {
        match e {
            daybreakscan_core::CoreError::InvalidAddress(msg) => ScanError::InvalidAddress(msg),
        }
    }
}

impl From<RouterError> for ScanError {
    fn from(e: RouterError) -> Self {
        match e {
            RouterError::NoProvidersConfigured => ScanError::InternalError("no RPC providers configured".into()),
            RouterError::UpstreamTimeout => ScanError::UpstreamError("upstream timeout".into()),
            RouterError::UpstreamRateLimited => ScanError::UpstreamRateLimited,
            RouterError::UpstreamError(msg) => ScanError::UpstreamError(msg),
        }
    }
}

impl From<sqlx::Error> for ScanError {
    fn from(e: sqlx::Error) -> Self {
        ScanError::InternalError(e.to_string())
    }
}

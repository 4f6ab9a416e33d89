//! Error Types
//!
//! Crate-wide error enum covering the tenant-facing failure kinds plus the
//! upstream gateway and persistence layers. `ErrorCode` is the stable code
//! an API surface maps each kind to.

use crate::gateway::GatewayError;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ZapgateError>;

/// All failure kinds surfaced by lifecycle and campaign operations.
#[derive(Debug, Error)]
pub enum ZapgateError {
    /// No session could be resolved for the request.
    #[error("no active session")]
    Unauthorized,

    /// The caller's role does not permit this operation.
    #[error("operation requires the owner or manager role")]
    Forbidden,

    /// A referenced record does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// An instance already exists for the organization.
    #[error("a WhatsApp instance already exists for organization {0}")]
    Conflict(String),

    /// A send was requested while the instance is not connected.
    #[error("WhatsApp instance for organization {0} is not connected")]
    NotConnected(String),

    /// The external gateway failed or returned a non-2xx response.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A store read or write failed.
    #[error("persistence error: {0}")]
    Persistence(#[from] sqlx::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Stable error codes for the tenant-facing API surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    UpstreamFailure,
    Internal,
}

impl ErrorCode {
    /// HTTP status the code maps to.
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::Unauthorized => 401,
            ErrorCode::Forbidden => 403,
            ErrorCode::NotFound => 404,
            ErrorCode::Conflict => 409,
            ErrorCode::UpstreamFailure => 502,
            ErrorCode::Internal => 500,
        }
    }
}

impl ZapgateError {
    /// Classify the error for the API surface.
    pub fn code(&self) -> ErrorCode {
        match self {
            ZapgateError::Unauthorized => ErrorCode::Unauthorized,
            ZapgateError::Forbidden => ErrorCode::Forbidden,
            ZapgateError::NotFound(_) => ErrorCode::NotFound,
            ZapgateError::Conflict(_) | ZapgateError::NotConnected(_) => ErrorCode::Conflict,
            ZapgateError::Gateway(_) => ErrorCode::UpstreamFailure,
            ZapgateError::Persistence(_) | ZapgateError::Config(_) => ErrorCode::Internal,
        }
    }
}

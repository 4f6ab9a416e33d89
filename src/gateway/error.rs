//! Gateway Errors

use thiserror::Error;

/// Result alias for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Failures talking to the external WhatsApp gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Transport-level failure (connect, timeout, TLS, body read).
    #[error("gateway request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway answered with a non-2xx status. Carries the upstream
    /// status and body so callers can log or surface it.
    #[error("gateway returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The gateway answered 2xx but the body did not match the expected shape.
    #[error("unexpected gateway response: {0}")]
    InvalidResponse(String),
}

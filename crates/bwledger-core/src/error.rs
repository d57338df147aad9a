//! Shared error type across bwLedger crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Malformed, missing, or non-positive input.
    InvalidArgument,
    /// Referenced user, policy, or allocation does not exist.
    NotFound,
    /// Operation not permitted for this role, or no global cap provisioned.
    Forbidden,
    /// Sub-allocation would overshoot the global cap.
    CapacityExceeded,
    /// Uniqueness violation (duplicate username/email).
    Conflict,
    /// Missing or unknown ticket.
    AuthFailed,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::InvalidArgument => "INVALID_ARGUMENT",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::Forbidden => "FORBIDDEN",
            ClientCode::CapacityExceeded => "CAPACITY_EXCEEDED",
            ClientCode::Conflict => "CONFLICT",
            ClientCode::AuthFailed => "AUTH_FAILED",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("bandwidth limit exceeded: {remaining} Mbps remaining out of {total} Mbps total")]
    CapacityExceeded {
        /// Unused headroom at the time of the check.
        remaining: f64,
        /// The user's global cap.
        total: f64,
    },
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("auth failed")]
    AuthFailed,
    #[error("internal: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            LedgerError::InvalidArgument(_) => ClientCode::InvalidArgument,
            LedgerError::NotFound(_) => ClientCode::NotFound,
            LedgerError::Forbidden(_) => ClientCode::Forbidden,
            LedgerError::CapacityExceeded { .. } => ClientCode::CapacityExceeded,
            LedgerError::Conflict(_) => ClientCode::Conflict,
            LedgerError::AuthFailed => ClientCode::AuthFailed,
            LedgerError::Internal(_) => ClientCode::Internal,
        }
    }

    /// Shorthand for the "missing required fields" rejection.
    pub fn missing_fields() -> Self {
        LedgerError::InvalidArgument("missing required fields".into())
    }
}

//! The module contains the errors the ledger can return.
//!
//! The errors are:
//!
//! - [`Validation`] returned when an expense fails its field invariants.
//! - [`Feed`] returned when the remote subscription cannot be established or
//!   was interrupted.
//! - [`InvariantViolation`] returned when the store receives an event that
//!   breaks its owner invariant.
//!
//!  [`Validation`]: LedgerError::Validation
//!  [`Feed`]: LedgerError::Feed
//!  [`InvariantViolation`]: LedgerError::InvariantViolation
use thiserror::Error;

/// Ledger custom errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Invalid expense: {0}")]
    Validation(String),
    #[error("Feed failure: {0}")]
    Feed(String),
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Remote store failure: {0}")]
    Remote(String),
}

impl LedgerError {
    /// Returns `true` when the error leaves the current store unusable and the
    /// caller must reset and resubscribe.
    #[must_use]
    pub fn requires_resubscribe(&self) -> bool {
        matches!(self, Self::Feed(_) | Self::InvariantViolation(_))
    }
}

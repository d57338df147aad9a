//! JSON handlers over the ledger.
//!
//! Handlers only translate: extract identity and body, call one ledger
//! operation, shape the response. Request bodies use optional fields so a
//! missing field becomes `INVALID_ARGUMENT` instead of an extractor error.

pub mod admin;
pub mod auth;
pub mod error;
pub mod user;

pub use error::ApiError;

use std::str::FromStr;

use bwledger_core::error::{LedgerError, Result};

/// Required string field: absent or blank is "missing".
fn required(v: Option<String>) -> Result<String> {
    v.filter(|s| !s.trim().is_empty())
        .ok_or_else(LedgerError::missing_fields)
}

/// Required field parsed via `FromStr`.
fn required_parsed<T>(v: Option<String>) -> Result<T>
where
    T: FromStr<Err = LedgerError>,
{
    required(v)?.parse()
}

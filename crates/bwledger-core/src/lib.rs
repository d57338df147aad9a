//! bwLedger core: domain records, error types, and the allocation arithmetic.
//!
//! This crate defines the data model and error surface shared by the gateway
//! and any other host of the ledger. It carries no transport, storage, or
//! runtime dependencies; stores and HTTP wiring live in `bwledger-gateway`.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `LedgerError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod accounting;
pub mod error;
pub mod model;

/// Shared result type.
pub use error::{LedgerError, Result};

//! bwLedger gateway library entry.
//!
//! This crate wires config, the in-memory collaborators, the allocation
//! ledger, identity extraction, and the HTTP handlers into one service. It is
//! consumed by the binary (`main.rs`) and by integration tests.

pub mod api;
pub mod app_state;
pub mod config;
pub mod context;
pub mod infra;
pub mod ledger;
pub mod obs;
pub mod ops;
pub mod router;

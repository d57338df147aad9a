//! Per-request identity.
//!
//! Every ledger operation takes the caller's user id explicitly; nothing is
//! read from ambient state. Roles are resolved once here, at the boundary.

pub mod identity;

pub use identity::{AdminIdentity, Identity, MemberIdentity, Principal};

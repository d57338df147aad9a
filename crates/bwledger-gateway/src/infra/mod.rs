//! In-memory collaborators the ledger depends on but does not own.
//!
//! The user directory and ticket store sit behind traits so a persistent
//! backend can replace them without touching the ledger.

pub mod ticket_store;
pub mod user_directory;

pub use ticket_store::{InMemoryTicketStore, TicketStore};
pub use user_directory::{InMemoryUserDirectory, UserDirectory};

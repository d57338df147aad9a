//! Top-level facade crate for bwLedger.
//!
//! Re-exports the core model and the gateway library so users can depend on a
//! single crate. `prelude` carries the types most embedders touch.

pub mod core {
    pub use bwledger_core::*;
}

pub mod gateway {
    pub use bwledger_gateway::*;
}

pub mod prelude {
    pub use bwledger_core::accounting::{AggregateSummary, UsageSummary};
    pub use bwledger_core::model::{GlobalPolicy, NewSubAllocation, Priority, Role, SubAllocation};
    pub use bwledger_core::{LedgerError, Result};
    pub use bwledger_gateway::infra::{InMemoryUserDirectory, UserDirectory};
    pub use bwledger_gateway::ledger::BandwidthLedger;
}

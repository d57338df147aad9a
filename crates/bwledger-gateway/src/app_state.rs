//! Shared application state for the bwLedger gateway.
//!
//! Built once from config: seeds the user directory and ticket store, then
//! wires the ledger. Startup errors are returned, not panicked.

use std::sync::Arc;

use chrono::Utc;

use bwledger_core::error::Result;
use bwledger_core::model::UserRecord;

use crate::config::LedgerConfig;
use crate::infra::{InMemoryTicketStore, InMemoryUserDirectory, TicketStore, UserDirectory};
use crate::ledger::{BandwidthLedger, DeletedUser};
use crate::obs::LedgerMetrics;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    ledger: Arc<BandwidthLedger>,
    metrics: Arc<LedgerMetrics>,
}

struct AppStateInner {
    cfg: LedgerConfig,
    tickets: Arc<dyn TicketStore>,
}

impl AppState {
    pub fn new(cfg: LedgerConfig) -> Result<Self> {
        let users: Arc<dyn UserDirectory> = Arc::new(InMemoryUserDirectory::new());
        let tickets: Arc<dyn TicketStore> = Arc::new(InMemoryTicketStore::new());

        for seed in &cfg.users {
            users.insert(UserRecord {
                id: seed.id.clone(),
                username: seed.username.clone(),
                email: seed.email.clone(),
                role: seed.role,
                created_at: Utc::now(),
            })?;
            tickets.insert(seed.ticket.clone(), seed.id.clone());
            tracing::debug!(user = %seed.id, role = seed.role.as_str(), "seeded user");
        }

        Ok(Self {
            ledger: Arc::new(BandwidthLedger::new(users)),
            metrics: Arc::new(LedgerMetrics::default()),
            inner: Arc::new(AppStateInner { cfg, tickets }),
        })
    }

    pub fn cfg(&self) -> &LedgerConfig {
        &self.inner.cfg
    }

    pub fn ledger(&self) -> &BandwidthLedger {
        &self.ledger
    }

    pub fn tickets(&self) -> &dyn TicketStore {
        self.inner.tickets.as_ref()
    }

    pub fn metrics(&self) -> &LedgerMetrics {
        &self.metrics
    }

    /// Ledger cascade plus ticket revocation.
    pub async fn delete_user(&self, user_id: &str) -> Result<DeletedUser> {
        let deleted = self.ledger.delete_user(user_id).await?;
        let revoked = self.tickets().revoke_user(user_id);
        tracing::debug!(user = %user_id, revoked, "tickets revoked");
        Ok(deleted)
    }

    pub fn set_draining(&self) {
        self.metrics.set_draining();
    }

    pub fn is_draining(&self) -> bool {
        self.metrics.is_draining()
    }

    /// Point-in-time store sizes for `/metrics`.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("bwledger_users_total", self.ledger.users().list().len() as u64),
            ("bwledger_global_policies_total", self.ledger.policies().len() as u64),
            ("bwledger_sub_allocations_total", self.ledger.allocations().len() as u64),
        ]
    }
}

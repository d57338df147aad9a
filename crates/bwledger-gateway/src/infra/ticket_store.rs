use dashmap::DashMap;
use uuid::Uuid;

use bwledger_core::error::{LedgerError, Result};

/// Bearer ticket -> user id.
pub trait TicketStore: Send + Sync {
    /// Resolve a ticket. Tickets are reusable until revoked.
    fn resolve(&self, ticket: &str) -> Result<String>;
    /// Mint a fresh ticket for `user_id`.
    fn issue(&self, user_id: &str) -> String;
    /// Register a known ticket (config seeds).
    fn insert(&self, ticket: String, user_id: String);
    /// Drop every ticket of a user. Returns how many were removed.
    fn revoke_user(&self, user_id: &str) -> usize;
}

#[derive(Default)]
pub struct InMemoryTicketStore {
    tickets: DashMap<String, String>,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self { tickets: DashMap::new() }
    }
}

impl TicketStore for InMemoryTicketStore {
    fn resolve(&self, ticket: &str) -> Result<String> {
        self.tickets
            .get(ticket)
            .map(|r| r.value().clone())
            .ok_or(LedgerError::AuthFailed)
    }

    fn issue(&self, user_id: &str) -> String {
        let ticket = Uuid::new_v4().simple().to_string();
        self.tickets.insert(ticket.clone(), user_id.to_string());
        ticket
    }

    fn insert(&self, ticket: String, user_id: String) {
        self.tickets.insert(ticket, user_id);
    }

    fn revoke_user(&self, user_id: &str) -> usize {
        let before = self.tickets.len();
        self.tickets.retain(|_, uid| uid != user_id);
        before.saturating_sub(self.tickets.len())
    }
}

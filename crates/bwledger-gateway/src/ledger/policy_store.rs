use std::sync::Arc;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use bwledger_core::accounting::ensure_positive_limit;
use bwledger_core::error::{LedgerError, Result};
use bwledger_core::model::{GlobalPolicy, Priority};

use crate::infra::UserDirectory;

/// Result of an upsert: the stored policy and whether it was new.
#[derive(Debug, Clone)]
pub struct Upsert {
    pub policy: GlobalPolicy,
    pub created: bool,
}

/// One global cap per user, keyed by user id.
pub struct GlobalPolicyStore {
    policies: DashMap<String, GlobalPolicy>,
    users: Arc<dyn UserDirectory>,
}

impl GlobalPolicyStore {
    pub fn new(users: Arc<dyn UserDirectory>) -> Self {
        Self {
            policies: DashMap::new(),
            users,
        }
    }

    /// Create the user's cap or overwrite `limit`/`priority` in place.
    ///
    /// Writing the values already stored is a no-op (timestamps included).
    /// Admin accounts never hold a cap. Callers serialize per user through
    /// `AllocationGuard::lock_user`; see `BandwidthLedger::assign_policy`.
    pub fn upsert(&self, user_id: &str, limit: f64, priority: Priority) -> Result<Upsert> {
        ensure_positive_limit(limit)?;

        let user = self
            .users
            .get(user_id)
            .ok_or_else(|| LedgerError::NotFound("user not found".into()))?;
        if user.role.is_admin() {
            return Err(LedgerError::NotFound("user is administrative".into()));
        }

        let now = Utc::now();
        let out = match self.policies.entry(user.id.clone()) {
            Entry::Occupied(mut e) => {
                let p = e.get_mut();
                if p.limit != limit || p.priority != priority {
                    p.limit = limit;
                    p.priority = priority;
                    p.updated_at = now;
                }
                Upsert { policy: p.clone(), created: false }
            }
            Entry::Vacant(e) => {
                let p = GlobalPolicy {
                    id: Uuid::new_v4(),
                    user_id: user.id.clone(),
                    limit,
                    priority,
                    created_at: now,
                    updated_at: now,
                };
                e.insert(p.clone());
                Upsert { policy: p, created: true }
            }
        };
        Ok(out)
    }

    pub fn get(&self, user_id: &str) -> Option<GlobalPolicy> {
        self.policies.get(user_id).map(|r| r.value().clone())
    }

    /// Every cap, sorted by user id.
    pub fn list(&self) -> Vec<GlobalPolicy> {
        let mut out: Vec<GlobalPolicy> = self.policies.iter().map(|r| r.value().clone()).collect();
        out.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        out
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Drop the user's cap (at most one). Cascade hook for user deletion.
    pub fn remove(&self, user_id: &str) -> Option<GlobalPolicy> {
        self.policies.remove(user_id).map(|(_, p)| p)
    }
}

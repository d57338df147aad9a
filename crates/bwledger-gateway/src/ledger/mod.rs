//! Bandwidth-allocation ledger.
//!
//! Wires the two stores (global caps, sub-allocations), the allocation guard,
//! and the two reporters into one facade that HTTP handlers call with an
//! already-authenticated user id.

pub mod aggregate;
pub mod allocations;
pub mod guard;
pub mod policy_store;
pub mod usage;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use bwledger_core::accounting::{AggregateSummary, UsageSummary, UNKNOWN_USER};
use bwledger_core::error::{LedgerError, Result};
use bwledger_core::model::{
    GlobalPolicy, NewSubAllocation, Priority, Role, SubAllocation, UserRecord,
};

use crate::infra::UserDirectory;

pub use aggregate::AdminAggregateReporter;
pub use allocations::SubAllocationLedger;
pub use guard::AllocationGuard;
pub use policy_store::{GlobalPolicyStore, Upsert};
pub use usage::UsageReporter;

const UNKNOWN_EMAIL: &str = "Unknown Email";

/// Global cap joined with its owner's identity.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyView {
    pub id: Uuid,
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub limit: f64,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}

/// Account joined with its global cap, if any.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bandwidth_limit: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

/// What a user cascade removed.
#[derive(Debug, Clone)]
pub struct DeletedUser {
    pub user: UserRecord,
    pub policy_removed: bool,
    pub allocations_removed: usize,
}

pub struct BandwidthLedger {
    users: Arc<dyn UserDirectory>,
    policies: Arc<GlobalPolicyStore>,
    allocations: Arc<SubAllocationLedger>,
    guard: AllocationGuard,
    usage: UsageReporter,
    aggregate: AdminAggregateReporter,
}

impl BandwidthLedger {
    pub fn new(users: Arc<dyn UserDirectory>) -> Self {
        let policies = Arc::new(GlobalPolicyStore::new(Arc::clone(&users)));
        let allocations = Arc::new(SubAllocationLedger::new());

        Self {
            guard: AllocationGuard::new(Arc::clone(&policies), Arc::clone(&allocations)),
            usage: UsageReporter::new(Arc::clone(&policies), Arc::clone(&allocations)),
            aggregate: AdminAggregateReporter::new(Arc::clone(&policies), Arc::clone(&users)),
            users,
            policies,
            allocations,
        }
    }

    pub fn users(&self) -> &dyn UserDirectory {
        self.users.as_ref()
    }

    pub fn policies(&self) -> &GlobalPolicyStore {
        &self.policies
    }

    pub fn allocations(&self) -> &SubAllocationLedger {
        &self.allocations
    }

    pub fn guard(&self) -> &AllocationGuard {
        &self.guard
    }

    // ---- admin side

    /// Create or overwrite the user's cap.
    ///
    /// Holds the user's lock so a concurrent `delete_user` cannot leave a cap
    /// behind for an account that no longer exists.
    pub async fn assign_policy(
        &self,
        user_id: &str,
        limit: f64,
        priority: Priority,
    ) -> Result<Upsert> {
        let held = self.guard.lock_user(user_id).await;
        let out = self.policies.upsert(user_id, limit, priority)?;
        drop(held);
        tracing::info!(
            user = %user_id,
            limit,
            priority = %priority,
            created = out.created,
            "global policy assigned"
        );
        Ok(out)
    }

    pub fn list_policies(&self) -> Vec<PolicyView> {
        self.policies
            .list()
            .into_iter()
            .map(|p| {
                let (username, email) = match self.users.get(&p.user_id) {
                    Some(u) => (u.username, u.email),
                    None => (UNKNOWN_USER.to_string(), UNKNOWN_EMAIL.to_string()),
                };
                PolicyView {
                    id: p.id,
                    user_id: p.user_id,
                    username,
                    email,
                    limit: p.limit,
                    priority: p.priority,
                    created_at: p.created_at,
                }
            })
            .collect()
    }

    pub fn list_users(&self) -> Vec<UserView> {
        self.users
            .list()
            .into_iter()
            .map(|u| {
                let policy: Option<GlobalPolicy> = self.policies.get(&u.id);
                UserView {
                    bandwidth_limit: policy.as_ref().map(|p| p.limit),
                    priority: policy.as_ref().map(|p| p.priority),
                    id: u.id,
                    username: u.username,
                    email: u.email,
                    role: u.role,
                    created_at: u.created_at,
                }
            })
            .collect()
    }

    /// Remove a non-admin user with its cap and every sub-allocation.
    ///
    /// Runs under the user's lock so an in-flight `allocate` or
    /// `assign_policy` either completes first or observes the missing user.
    pub async fn delete_user(&self, user_id: &str) -> Result<DeletedUser> {
        let held = self.guard.lock_user(user_id).await;
        // Looked up under the lock: a racing delete may already have won.
        let user = self
            .users
            .get(user_id)
            .ok_or_else(|| LedgerError::NotFound("user not found".into()))?;
        if user.role.is_admin() {
            return Err(LedgerError::Forbidden("cannot delete admin users".into()));
        }

        let policy_removed = self.policies.remove(user_id).is_some();
        let allocations_removed = self.allocations.remove_all(user_id);
        self.users.remove(user_id);
        drop(held);
        self.guard.forget(user_id);

        tracing::info!(
            user = %user_id,
            policy_removed,
            allocations_removed,
            "user deleted"
        );
        Ok(DeletedUser {
            user,
            policy_removed,
            allocations_removed,
        })
    }

    pub fn stats(&self) -> AggregateSummary {
        self.aggregate.report_all()
    }

    // ---- user side

    pub async fn allocate(&self, req: NewSubAllocation) -> Result<SubAllocation> {
        let alloc = self.guard.allocate(req).await?;
        tracing::info!(
            user = %alloc.user_id,
            id = %alloc.id,
            limit = alloc.limit,
            "sub-allocation created"
        );
        Ok(alloc)
    }

    pub fn list_allocations(&self, user_id: &str) -> Vec<SubAllocation> {
        self.allocations.list_by_user(user_id)
    }

    /// Delete one of `owner`'s sub-allocations.
    pub fn delete_allocation(&self, owner: &str, id: &Uuid) -> Result<SubAllocation> {
        let alloc = self
            .allocations
            .get(id)
            .ok_or_else(|| LedgerError::NotFound("policy not found".into()))?;
        if alloc.user_id != owner {
            return Err(LedgerError::Forbidden("policy belongs to another user".into()));
        }
        let removed = self.allocations.delete(id)?;
        tracing::info!(user = %owner, id = %id, limit = removed.limit, "sub-allocation deleted");
        Ok(removed)
    }

    pub fn usage(&self, user_id: &str) -> Result<UsageSummary> {
        self.usage.report(user_id)
    }
}

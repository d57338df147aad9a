use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use bwledger_core::accounting::check_capacity;
use bwledger_core::error::{LedgerError, Result};
use bwledger_core::model::{NewSubAllocation, SubAllocation};

use super::allocations::SubAllocationLedger;
use super::policy_store::GlobalPolicyStore;

/// Gates sub-allocation creation against the owner's remaining headroom.
///
/// `allocate` holds a per-user mutex across read-check-write, so concurrent
/// requests for one user are serialized and can never jointly overshoot the
/// cap. Different users never contend.
pub struct AllocationGuard {
    policies: Arc<GlobalPolicyStore>,
    ledger: Arc<SubAllocationLedger>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl AllocationGuard {
    pub fn new(policies: Arc<GlobalPolicyStore>, ledger: Arc<SubAllocationLedger>) -> Self {
        Self {
            policies,
            ledger,
            locks: DashMap::new(),
        }
    }

    /// Approve iff the user holds a cap, `requested > 0`, and
    /// `sum + requested <= cap`.
    ///
    /// Unprovisioned users are `Forbidden`, not `NotFound`: the account may
    /// exist without a cap.
    pub fn authorize(&self, user_id: &str, requested: f64) -> Result<()> {
        let policy = self.policies.get(user_id).ok_or_else(|| {
            LedgerError::Forbidden("no global allocation; contact administrator".into())
        })?;
        let current = self.ledger.sum_by_user(user_id);
        check_capacity(policy.limit, current, requested)
    }

    /// Authorize and create under the user's lock.
    pub async fn allocate(&self, req: NewSubAllocation) -> Result<SubAllocation> {
        // Malformed input is rejected before any headroom is consulted.
        req.validate()?;

        let _held = self.lock_user(&req.user_id).await;
        if let Err(e) = self.authorize(&req.user_id, req.limit) {
            tracing::warn!(user = %req.user_id, requested = req.limit, error = %e, "sub-allocation rejected");
            return Err(e);
        }
        self.ledger.create(req)
    }

    /// Exclusive access to one user's allocation state.
    pub async fn lock_user(&self, user_id: &str) -> OwnedMutexGuard<()> {
        // Clone the Arc out so no map shard stays locked across the await.
        let lock = self
            .locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        lock.lock_owned().await
    }

    /// Drop the lock entry of a deleted user.
    pub fn forget(&self, user_id: &str) {
        self.locks.remove(user_id);
    }
}

use std::sync::Arc;

use chrono::Utc;

use bwledger_core::accounting::UsageSummary;
use bwledger_core::error::{LedgerError, Result};

use super::allocations::SubAllocationLedger;
use super::policy_store::GlobalPolicyStore;

/// Read-only usage view of one user's cap.
pub struct UsageReporter {
    policies: Arc<GlobalPolicyStore>,
    ledger: Arc<SubAllocationLedger>,
}

impl UsageReporter {
    pub fn new(policies: Arc<GlobalPolicyStore>, ledger: Arc<SubAllocationLedger>) -> Self {
        Self { policies, ledger }
    }

    pub fn report(&self, user_id: &str) -> Result<UsageSummary> {
        let policy = self.policies.get(user_id).ok_or_else(|| {
            LedgerError::NotFound("no bandwidth allocation found for this user".into())
        })?;
        let limits = self.ledger.limits_by_user(user_id);
        Ok(UsageSummary::compute(policy.limit, limits, Utc::now()))
    }
}

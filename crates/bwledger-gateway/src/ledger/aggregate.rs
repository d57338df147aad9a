use std::sync::Arc;

use bwledger_core::accounting::{AggregateSummary, UserSummary, UNKNOWN_USER};

use super::policy_store::GlobalPolicyStore;
use crate::infra::UserDirectory;

/// Dashboard totals across every global cap.
pub struct AdminAggregateReporter {
    policies: Arc<GlobalPolicyStore>,
    users: Arc<dyn UserDirectory>,
}

impl AdminAggregateReporter {
    pub fn new(policies: Arc<GlobalPolicyStore>, users: Arc<dyn UserDirectory>) -> Self {
        Self { policies, users }
    }

    /// Never fails: an unresolvable owner becomes a placeholder row.
    pub fn report_all(&self) -> AggregateSummary {
        let rows = self
            .policies
            .list()
            .into_iter()
            .map(|p| {
                let username = match self.users.get(&p.user_id) {
                    Some(u) => u.username,
                    None => {
                        tracing::warn!(user = %p.user_id, "policy owner not in directory");
                        UNKNOWN_USER.to_string()
                    }
                };
                UserSummary {
                    username,
                    limit: p.limit,
                    priority: p.priority,
                }
            })
            .collect();

        AggregateSummary::from_summaries(rows)
    }
}

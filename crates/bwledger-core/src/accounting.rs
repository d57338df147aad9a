//! Allocation arithmetic: headroom checks and usage/aggregate summaries.
//!
//! Everything here is pure. Callers read the stores, hand the numbers in, and
//! get a decision or a summary back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};
use crate::model::Priority;

/// Display unit for every bandwidth figure.
pub const UNIT: &str = "Mbps";

/// Label used when a policy's owner cannot be resolved.
pub const UNKNOWN_USER: &str = "Unknown User";

/// Round to one decimal place, half away from zero (`f64::round` semantics).
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Reject zero, negative, NaN and infinite limits.
pub fn ensure_positive_limit(limit: f64) -> Result<f64> {
    if limit.is_finite() && limit > 0.0 {
        Ok(limit)
    } else {
        Err(LedgerError::InvalidArgument(format!(
            "limit must be greater than 0 (got {limit})"
        )))
    }
}

/// Unused portion of a cap. Negative when over-allocated.
pub fn headroom(cap: f64, current_total: f64) -> f64 {
    cap - current_total
}

/// Approve iff `requested > 0` and `current_total + requested <= cap`.
///
/// The rejection carries the exact remaining headroom and the cap so callers
/// can present an actionable message.
pub fn check_capacity(cap: f64, current_total: f64, requested: f64) -> Result<()> {
    ensure_positive_limit(requested)?;
    if current_total + requested > cap {
        return Err(LedgerError::CapacityExceeded {
            remaining: headroom(cap, current_total),
            total: cap,
        });
    }
    Ok(())
}

/// Per-user usage view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    /// Same figure as `allocated`; kept for dashboard compatibility.
    pub current: f64,
    pub limit: f64,
    pub allocated: f64,
    pub available: f64,
    pub unit: String,
    pub last_updated: DateTime<Utc>,
    /// Number of sub-allocations.
    pub policies: usize,
    pub utilization_rate: f64,
}

impl UsageSummary {
    /// Build a summary from the cap and the limits of every sub-allocation.
    pub fn compute<I>(cap: f64, limits: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let (allocated, policies) = limits
            .into_iter()
            .fold((0.0_f64, 0_usize), |(sum, n), l| (sum + l, n + 1));

        let utilization = if cap > 0.0 { allocated / cap * 100.0 } else { 0.0 };

        Self {
            current: round1(allocated),
            limit: round1(cap),
            allocated: round1(allocated),
            available: round1(headroom(cap, allocated)),
            unit: UNIT.to_string(),
            last_updated: now,
            policies,
            utilization_rate: round1(utilization),
        }
    }
}

/// One row of the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub username: String,
    pub limit: f64,
    pub priority: Priority,
}

/// Totals across every global cap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSummary {
    pub total_users: usize,
    pub total_bandwidth_allocated: f64,
    pub average_bandwidth_per_user: f64,
    pub user_summaries: Vec<UserSummary>,
}

impl AggregateSummary {
    /// One summary row per user holding a global cap.
    pub fn from_summaries(user_summaries: Vec<UserSummary>) -> Self {
        let total_users = user_summaries.len();
        let total: f64 = user_summaries.iter().map(|s| s.limit).sum();
        let average = if total_users > 0 {
            total / total_users as f64
        } else {
            0.0
        };

        Self {
            total_users,
            total_bandwidth_allocated: total,
            average_bandwidth_per_user: average,
            user_summaries,
        }
    }
}

//! Ledger records.
//!
//! Records are plain data. Invariants that span records (one global cap per
//! user, the sum constraint) are enforced by the stores and the guard in the
//! gateway crate, not here.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LedgerError, Result};

/// Advisory scheduling hint. Stored and displayed, never enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl FromStr for Priority {
    type Err = LedgerError;

    /// Case-insensitive: `"high"`, `"High"` and `"HIGH"` are all accepted.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(LedgerError::InvalidArgument(format!(
                "invalid priority: {s} (expected High, Medium or Low)"
            ))),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed set of account roles. Checked once at the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl FromStr for Role {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            _ => Err(LedgerError::InvalidArgument(format!("invalid role: {s}"))),
        }
    }
}

/// Account known to the user directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Admin-assigned bandwidth cap. At most one per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalPolicy {
    pub id: Uuid,
    pub user_id: String,
    /// Total cap in Mbps.
    pub limit: f64,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named slice of a user's global cap, scoped to an IP range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubAllocation {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    /// Free text; not parsed or validated.
    pub ip_range: String,
    /// Mbps.
    pub limit: f64,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
}

/// Request to create a sub-allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubAllocation {
    pub user_id: String,
    pub name: String,
    pub ip_range: String,
    pub limit: f64,
    pub priority: Priority,
}

impl NewSubAllocation {
    /// Blank text fields count as absent.
    pub fn validate(&self) -> Result<()> {
        let blank = [&self.user_id, &self.name, &self.ip_range]
            .iter()
            .any(|s| s.trim().is_empty());
        if blank {
            return Err(LedgerError::missing_fields());
        }
        crate::accounting::ensure_positive_limit(self.limit)?;
        Ok(())
    }
}

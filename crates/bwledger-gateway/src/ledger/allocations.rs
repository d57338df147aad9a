use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use dashmap::{DashMap, DashSet};
use uuid::Uuid;

use bwledger_core::error::{LedgerError, Result};
use bwledger_core::model::{NewSubAllocation, SubAllocation};

#[derive(Clone)]
struct LedgerEntry {
    alloc: SubAllocation,
    // Tie-breaker for equal `created_at`.
    seq: u64,
}

/// Sub-allocation ledger:
/// - `id -> SubAllocation`
/// - `user_id -> {id...}`
///
/// Does not enforce the global cap; `AllocationGuard` must approve first.
pub struct SubAllocationLedger {
    entries: DashMap<Uuid, LedgerEntry>,
    user_index: DashMap<String, DashSet<Uuid>>,
    seq: AtomicU64,
}

impl Default for SubAllocationLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl SubAllocationLedger {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            user_index: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }

    pub fn create(&self, req: NewSubAllocation) -> Result<SubAllocation> {
        req.validate()?;

        let alloc = SubAllocation {
            id: Uuid::new_v4(),
            user_id: req.user_id,
            name: req.name,
            ip_range: req.ip_range,
            limit: req.limit,
            priority: req.priority,
            created_at: Utc::now(),
        };
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);

        self.entries.insert(alloc.id, LedgerEntry { alloc: alloc.clone(), seq });
        self.user_index
            .entry(alloc.user_id.clone())
            .or_insert_with(DashSet::new)
            .insert(alloc.id);

        Ok(alloc)
    }

    pub fn get(&self, id: &Uuid) -> Option<SubAllocation> {
        self.entries.get(id).map(|r| r.value().alloc.clone())
    }

    /// Newest first.
    pub fn list_by_user(&self, user_id: &str) -> Vec<SubAllocation> {
        let mut rows = self.user_entries(user_id);
        rows.sort_by(|a, b| {
            b.alloc
                .created_at
                .cmp(&a.alloc.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });
        rows.into_iter().map(|e| e.alloc).collect()
    }

    pub fn delete(&self, id: &Uuid) -> Result<SubAllocation> {
        let (_, entry) = self
            .entries
            .remove(id)
            .ok_or_else(|| LedgerError::NotFound("policy not found".into()))?;
        self.unindex(&entry.alloc.user_id, id);
        Ok(entry.alloc)
    }

    /// Limits in insertion order (oldest first).
    pub fn limits_by_user(&self, user_id: &str) -> Vec<f64> {
        self.user_entries(user_id).into_iter().map(|e| e.alloc.limit).collect()
    }

    /// Sum of limits for the user; 0 when there are none.
    ///
    /// Summed oldest first so equal ledgers produce bit-identical totals.
    pub fn sum_by_user(&self, user_id: &str) -> f64 {
        self.limits_by_user(user_id).into_iter().sum()
    }

    pub fn count_by_user(&self, user_id: &str) -> usize {
        self.user_index.get(user_id).map(|s| s.len()).unwrap_or(0)
    }

    /// Total entries across all users.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cascade hook. Returns how many entries were removed.
    pub fn remove_all(&self, user_id: &str) -> usize {
        let Some((_, ids)) = self.user_index.remove(user_id) else { return 0; };
        let mut removed = 0;
        for id in ids.iter() {
            if self.entries.remove(id.key()).is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// Oldest first by `seq`; set iteration order is arbitrary.
    fn user_entries(&self, user_id: &str) -> Vec<LedgerEntry> {
        let Some(set) = self.user_index.get(user_id) else { return vec![]; };
        let mut rows: Vec<LedgerEntry> = set
            .iter()
            .filter_map(|id| self.entries.get(id.key()).map(|e| e.value().clone()))
            .collect();
        rows.sort_by_key(|e| e.seq);
        rows
    }

    fn unindex(&self, user_id: &str, id: &Uuid) {
        if let Some(set) = self.user_index.get(user_id) {
            set.remove(id);
        }
        self.user_index.remove_if(user_id, |_, set| set.is_empty());
    }
}

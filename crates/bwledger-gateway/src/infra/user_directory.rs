use std::sync::Mutex;

use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use bwledger_core::error::{LedgerError, Result};
use bwledger_core::model::{Role, UserRecord};

/// Account registry. The ledger only reads it, except for cascade deletes.
pub trait UserDirectory: Send + Sync {
    fn get(&self, user_id: &str) -> Option<UserRecord>;
    /// All accounts, oldest first.
    fn list(&self) -> Vec<UserRecord>;
    /// Create an account with a generated id.
    fn register(&self, username: &str, email: &str, role: Role) -> Result<UserRecord>;
    /// Insert an account with a caller-chosen id (config seeds).
    fn insert(&self, record: UserRecord) -> Result<UserRecord>;
    fn remove(&self, user_id: &str) -> Option<UserRecord>;
}

/// `DashMap`-backed directory. Usernames and emails are unique
/// case-insensitively.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: DashMap<String, UserRecord>,
    // Serializes uniqueness check + insert across the two keys.
    write_lock: Mutex<()>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    fn taken(&self, record: &UserRecord) -> Option<&'static str> {
        self.users.iter().find_map(|u| {
            let u = u.value();
            if u.id == record.id {
                Some("id")
            } else if u.username.eq_ignore_ascii_case(&record.username) {
                Some("username")
            } else if u.email.eq_ignore_ascii_case(&record.email) {
                Some("email")
            } else {
                None
            }
        })
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn get(&self, user_id: &str) -> Option<UserRecord> {
        self.users.get(user_id).map(|r| r.value().clone())
    }

    fn list(&self) -> Vec<UserRecord> {
        let mut out: Vec<UserRecord> = self.users.iter().map(|r| r.value().clone()).collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        out
    }

    fn register(&self, username: &str, email: &str, role: Role) -> Result<UserRecord> {
        let username = username.trim();
        let email = email.trim();
        if username.is_empty() || email.is_empty() {
            return Err(LedgerError::missing_fields());
        }

        self.insert(UserRecord {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            role,
            created_at: Utc::now(),
        })
    }

    fn insert(&self, record: UserRecord) -> Result<UserRecord> {
        // Poisoned: a writer panicked mid-insert.
        let _g = self
            .write_lock
            .lock()
            .map_err(|_| LedgerError::Internal("user directory lock poisoned".into()))?;

        if let Some(field) = self.taken(&record) {
            return Err(LedgerError::Conflict(format!("user already exists ({field})")));
        }
        self.users.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn remove(&self, user_id: &str) -> Option<UserRecord> {
        self.users.remove(user_id).map(|(_, u)| u)
    }
}

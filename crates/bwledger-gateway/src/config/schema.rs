use std::collections::HashSet;
use std::net::SocketAddr;

use serde::Deserialize;

use bwledger_core::error::{LedgerError, Result};
use bwledger_core::model::Role;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    /// Accounts seeded at startup. Admins can only come from here.
    #[serde(default)]
    pub users: Vec<UserSeed>,
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(LedgerError::InvalidArgument(format!(
                "unsupported config version: {}",
                self.version
            )));
        }
        if self.users.is_empty() {
            return Err(LedgerError::InvalidArgument("users must not be empty".into()));
        }
        if !self.users.iter().any(|u| u.role.is_admin()) {
            return Err(LedgerError::InvalidArgument(
                "users must contain at least one admin".into(),
            ));
        }

        self.gateway.validate()?;

        let mut ids = HashSet::new();
        let mut names = HashSet::new();
        let mut emails = HashSet::new();
        let mut tickets = HashSet::new();
        for u in &self.users {
            u.validate()?;
            if !ids.insert(u.id.as_str()) {
                return Err(dup("id", &u.id));
            }
            if !names.insert(u.username.to_ascii_lowercase()) {
                return Err(dup("username", &u.username));
            }
            if !emails.insert(u.email.to_ascii_lowercase()) {
                return Err(dup("email", &u.email));
            }
            if !tickets.insert(u.ticket.as_str()) {
                return Err(dup("ticket", &u.id));
            }
        }

        Ok(())
    }
}

fn dup(field: &str, value: &str) -> LedgerError {
    LedgerError::InvalidArgument(format!("duplicate user {field}: {value}"))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Expose `POST /v1/auth/signup`.
    #[serde(default = "default_allow_signup")]
    pub allow_signup: bool,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            allow_signup: default_allow_signup(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|_| {
            LedgerError::InvalidArgument(format!(
                "gateway.listen must be a valid SocketAddr (got {})",
                self.listen
            ))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_allow_signup() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserSeed {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    /// Bearer ticket resolving to this user.
    pub ticket: String,
}

impl UserSeed {
    fn validate(&self) -> Result<()> {
        let fields = [
            ("id", &self.id),
            ("username", &self.username),
            ("email", &self.email),
            ("ticket", &self.ticket),
        ];
        for (name, v) in fields {
            if v.trim().is_empty() {
                return Err(LedgerError::InvalidArgument(format!(
                    "users[].{name} must not be blank"
                )));
            }
        }
        Ok(())
    }
}

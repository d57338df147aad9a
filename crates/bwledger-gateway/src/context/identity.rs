use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};

use bwledger_core::error::LedgerError;
use bwledger_core::model::{Role, UserRecord};

use crate::api::ApiError;
use crate::app_state::AppState;

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub username: String,
}

/// Caller identity, split by role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Admin(Principal),
    Member(Principal),
}

impl Identity {
    pub fn from_record(u: UserRecord) -> Self {
        let p = Principal {
            user_id: u.id,
            username: u.username,
        };
        match u.role {
            Role::Admin => Identity::Admin(p),
            Role::User => Identity::Member(p),
        }
    }

    pub fn principal(&self) -> &Principal {
        match self {
            Identity::Admin(p) | Identity::Member(p) => p,
        }
    }
}

/// Caller proven to be an admin.
#[derive(Debug, Clone)]
pub struct AdminIdentity(pub Principal);

/// Caller proven to be a regular user.
#[derive(Debug, Clone)]
pub struct MemberIdentity(pub Principal);

impl MemberIdentity {
    pub fn user_id(&self) -> &str {
        &self.0.user_id
    }
}

fn bearer(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve `Authorization: Bearer <ticket>` to an identity.
pub fn resolve(state: &AppState, parts: &Parts) -> Result<Identity, LedgerError> {
    let ticket = bearer(parts).ok_or(LedgerError::AuthFailed)?;
    let user_id = state.tickets().resolve(ticket)?;
    // Ticket outlived its account.
    let user = state.ledger().users().get(&user_id).ok_or(LedgerError::AuthFailed)?;
    Ok(Identity::from_record(user))
}

#[async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(resolve(state, parts)?)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match resolve(state, parts)? {
            Identity::Admin(p) => Ok(AdminIdentity(p)),
            Identity::Member(_) => Err(LedgerError::Forbidden("admin role required".into()).into()),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for MemberIdentity {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match resolve(state, parts)? {
            Identity::Member(p) => Ok(MemberIdentity(p)),
            Identity::Admin(_) => Err(LedgerError::Forbidden(
                "admin accounts do not hold bandwidth allocations".into(),
            )
            .into()),
        }
    }
}

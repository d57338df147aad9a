//! Self-service signup.
//!
//! Issues an opaque ticket; there are no passwords. Signup always creates a
//! regular user, admins are seeded from config.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use bwledger_core::error::LedgerError;
use bwledger_core::model::Role;

use super::{required, ApiError};
use crate::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignupReq {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// `POST /v1/auth/signup`
pub async fn signup(
    State(state): State<AppState>,
    body: Result<Json<SignupReq>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if !state.cfg().gateway.allow_signup {
        return Err(LedgerError::Forbidden("signup is disabled".into()).into());
    }

    let Json(req) = body?;
    let username = required(req.username)?;
    let email = required(req.email)?;

    let user = state.ledger().users().register(&username, &email, Role::User)?;
    let ticket = state.tickets().issue(&user.id);
    tracing::info!(user = %user.id, username = %user.username, "user signed up");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "ticket": ticket,
            "user": user,
        })),
    ))
}

//! Admin endpoints: global caps, user management, dashboard totals.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use bwledger_core::accounting::AggregateSummary;
use bwledger_core::error::LedgerError;
use bwledger_core::model::Priority;

use super::{required, required_parsed, ApiError};
use crate::app_state::AppState;
use crate::context::AdminIdentity;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignPolicyReq {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub limit: Option<f64>,
    #[serde(default)]
    pub priority: Option<String>,
}

/// `POST /v1/admin/policies`
pub async fn assign_policy(
    State(state): State<AppState>,
    AdminIdentity(admin): AdminIdentity,
    body: Result<Json<AssignPolicyReq>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = body?;
    let user_id = required(req.user_id)?;
    let limit = req.limit.ok_or_else(LedgerError::missing_fields)?;
    let priority: Priority = required_parsed(req.priority)?;

    let out = state.ledger().assign_policy(&user_id, limit, priority).await?;
    tracing::debug!(admin = %admin.username, user = %user_id, "policy assignment handled");

    let message = if out.created {
        "Policy created successfully"
    } else {
        "Policy updated successfully"
    };
    Ok(Json(json!({ "message": message, "policy": out.policy })))
}

/// `GET /v1/admin/policies`
pub async fn list_policies(State(state): State<AppState>, _admin: AdminIdentity) -> Json<Value> {
    Json(json!({ "policies": state.ledger().list_policies() }))
}

/// `GET /v1/admin/users`
pub async fn list_users(State(state): State<AppState>, _admin: AdminIdentity) -> Json<Value> {
    Json(json!({ "users": state.ledger().list_users() }))
}

/// `DELETE /v1/admin/users/:user_id`
pub async fn delete_user(
    State(state): State<AppState>,
    _admin: AdminIdentity,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let deleted = state.delete_user(&user_id).await?;
    Ok(Json(json!({
        "message": "User deleted successfully",
        "deletedUser": {
            "id": deleted.user.id,
            "username": deleted.user.username,
            "email": deleted.user.email,
        },
        "policyRemoved": deleted.policy_removed,
        "allocationsRemoved": deleted.allocations_removed,
    })))
}

/// `GET /v1/admin/stats`
pub async fn stats(State(state): State<AppState>, _admin: AdminIdentity) -> Json<AggregateSummary> {
    Json(state.ledger().stats())
}

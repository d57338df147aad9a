//! User endpoints: sub-allocations and the usage report.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use bwledger_core::error::LedgerError;
use bwledger_core::model::NewSubAllocation;

use super::{required, required_parsed, ApiError};
use crate::app_state::AppState;
use crate::context::MemberIdentity;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAllocationReq {
    /// Optional; when present it must name the caller.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ip_range: Option<String>,
    #[serde(default)]
    pub limit: Option<f64>,
    #[serde(default)]
    pub priority: Option<String>,
}

/// `POST /v1/user/allocations`
pub async fn create_allocation(
    State(state): State<AppState>,
    me: MemberIdentity,
    body: Result<Json<CreateAllocationReq>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(req) = body?;
    if let Some(uid) = req.user_id.as_deref() {
        if uid != me.user_id() {
            return Err(LedgerError::Forbidden("cannot allocate for another user".into()).into());
        }
    }

    let new = NewSubAllocation {
        user_id: me.user_id().to_string(),
        name: required(req.name)?,
        ip_range: required(req.ip_range)?,
        limit: req.limit.ok_or_else(LedgerError::missing_fields)?,
        priority: required_parsed(req.priority)?,
    };

    let res = state.ledger().allocate(new).await;
    state.metrics().record_allocation(&res);
    let alloc = res?;

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": alloc }))))
}

/// `GET /v1/user/allocations`
pub async fn list_allocations(State(state): State<AppState>, me: MemberIdentity) -> Json<Value> {
    let rows = state.ledger().list_allocations(me.user_id());
    Json(json!({ "success": true, "data": rows }))
}

/// `DELETE /v1/user/allocations/:id`
pub async fn delete_allocation(
    State(state): State<AppState>,
    me: MemberIdentity,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id: Uuid = id
        .parse()
        .map_err(|_| LedgerError::InvalidArgument(format!("invalid policy id: {id}")))?;

    let removed = state.ledger().delete_allocation(me.user_id(), &id)?;

    Ok(Json(json!({
        "success": true,
        "message": "Policy deleted successfully",
        "data": removed,
    })))
}

/// `GET /v1/user/usage`
pub async fn usage(State(state): State<AppState>, me: MemberIdentity) -> Result<Json<Value>, ApiError> {
    let summary = state.ledger().usage(me.user_id())?;
    Ok(Json(json!({ "success": true, "data": summary })))
}

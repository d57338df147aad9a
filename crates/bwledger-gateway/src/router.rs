//! Axum router wiring.
//!
//! Ops endpoints are unauthenticated; everything under `/v1` resolves a
//! bearer ticket through the identity extractors.

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use crate::{api, app_state::AppState, obs, ops};

pub fn build_router(state: AppState) -> Router {
    let v1 = Router::new()
        .route("/v1/auth/signup", post(api::auth::signup))
        .route(
            "/v1/admin/policies",
            get(api::admin::list_policies).post(api::admin::assign_policy),
        )
        .route("/v1/admin/users", get(api::admin::list_users))
        .route("/v1/admin/users/:user_id", delete(api::admin::delete_user))
        .route("/v1/admin/stats", get(api::admin::stats))
        .route(
            "/v1/user/allocations",
            get(api::user::list_allocations).post(api::user::create_allocation),
        )
        .route("/v1/user/allocations/:id", delete(api::user::delete_allocation))
        .route("/v1/user/usage", get(api::user::usage))
        .route_layer(middleware::from_fn_with_state(state.clone(), obs::track_requests));

    Router::new()
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .merge(v1)
        .with_state(state)
}

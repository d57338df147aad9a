//! Lightweight in-process metrics (dependency-free).
//!
//! Metrics are stored as atomics keyed by label sets and rendered by the
//! `/metrics` handler. `track_requests` is the route layer that feeds the
//! HTTP counters.

pub mod metrics;

use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::app_state::AppState;

pub use metrics::LedgerMetrics;

/// Count and time every routed request, labelled by route template.
pub async fn track_requests(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());
    let method = req.method().as_str().to_owned();

    let started = Instant::now();
    let resp = next.run(req).await;
    let status = resp.status().as_u16().to_string();

    let m = state.metrics();
    m.http_requests
        .inc(&[("method", &method), ("route", &route), ("status", &status)]);
    m.http_duration
        .observe(&[("method", &method), ("route", &route)], started.elapsed());

    tracing::debug!(%method, %route, %status, elapsed_us = started.elapsed().as_micros() as u64, "request");
    resp
}

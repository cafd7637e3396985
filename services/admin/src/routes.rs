use std::sync::atomic::Ordering;

use auctionos::error::AppError;
use auctionos::workflows::regions::{RegionAggregate, ScopeHint, DEFAULT_BUCKETS};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::infra::{AppState, RegionsReport};

#[derive(Debug, Deserialize)]
pub(crate) struct ResolveRequest {
    pub(crate) aggregates: Vec<RegionAggregate>,
    #[serde(default)]
    pub(crate) scope_hint: Option<ScopeHint>,
    #[serde(default)]
    pub(crate) buckets: Option<usize>,
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/v1/regions/resolve", post(resolve_endpoint))
        .with_state(state)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn resolve_endpoint(
    State(state): State<AppState>,
    Json(payload): Json<ResolveRequest>,
) -> Result<Json<RegionsReport>, AppError> {
    let ResolveRequest {
        aggregates,
        scope_hint,
        buckets,
    } = payload;

    let buckets = buckets.unwrap_or(DEFAULT_BUCKETS);
    if buckets == 0 {
        return Err(AppError::InvalidRequest(
            "buckets must be at least 1".to_string(),
        ));
    }

    let boundaries = state.boundaries.features().await?;
    let report = RegionsReport::build(&aggregates, &boundaries, scope_hint.as_ref(), buckets);
    info!(
        aggregates = aggregates.len(),
        exact = report.summary.exact,
        ambiguous = report.summary.ambiguous,
        unmatched = report.summary.unmatched,
        "resolved regions"
    );

    Ok(Json(report))
}

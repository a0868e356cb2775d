//! REST API handlers.
//!
//! Each handler reads/writes via `StateStore` and returns JSON responses.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::debug;

use poolsmith_state::*;

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

fn state_error_response(e: &StateError) -> axum::response::Response {
    let status = match e {
        StateError::AlreadyExists(_) => StatusCode::CONFLICT,
        StateError::Invalid(_) => StatusCode::BAD_REQUEST,
        StateError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(&e.to_string(), status).into_response()
}

// ── Workloads ──────────────────────────────────────────────────

/// GET /api/v1/workloads
pub async fn list_workloads(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.list_workloads() {
        Ok(workloads) => ApiResponse::ok(workloads).into_response(),
        Err(e) => state_error_response(&e),
    }
}

/// GET /api/v1/workloads/{namespace}/{name}
pub async fn get_workload(
    State(state): State<ApiState>,
    Path((namespace, name)): Path<(String, String)>,
) -> impl IntoResponse {
    match state.store.get_workload(&format!("{namespace}/{name}")) {
        Ok(Some(workload)) => ApiResponse::ok(workload).into_response(),
        Ok(None) => error_response("workload not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => state_error_response(&e),
    }
}

/// POST /api/v1/workloads
///
/// Stores the workload and triggers a reconcile for it. Namespace and
/// name must be DNS-1123 labels (400 otherwise).
pub async fn put_workload(
    State(state): State<ApiState>,
    Json(mut workload): Json<Workload>,
) -> impl IntoResponse {
    if workload.created_at == 0 {
        workload.created_at = epoch_secs();
    }

    match state.store.put_workload(&workload) {
        Ok(()) => {
            let key = workload.table_key();
            state.queue.add(&key);
            debug!(workload = %key, "reconcile triggered");
            (StatusCode::CREATED, ApiResponse::ok(workload)).into_response()
        }
        Err(e) => state_error_response(&e),
    }
}

/// DELETE /api/v1/workloads/{namespace}/{name}
pub async fn delete_workload(
    State(state): State<ApiState>,
    Path((namespace, name)): Path<(String, String)>,
) -> impl IntoResponse {
    let key = format!("{namespace}/{name}");
    match state.store.delete_workload(&key) {
        Ok(true) => {
            state.queue.add(&key);
            ApiResponse::ok("deleted").into_response()
        }
        Ok(false) => error_response("workload not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => state_error_response(&e),
    }
}

// ── Pools ──────────────────────────────────────────────────────

/// GET /api/v1/pools
pub async fn list_pools(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.list_pool_objects() {
        Ok(pools) => ApiResponse::ok(pools).into_response(),
        Err(e) => state_error_response(&e),
    }
}

/// GET /api/v1/pools/{name}
pub async fn get_pool(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.store.get_pool_object(&name) {
        Ok(Some(pool)) => ApiResponse::ok(pool).into_response(),
        Ok(None) => error_response("pool not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => state_error_response(&e),
    }
}

/// POST /api/v1/pools
///
/// Registers a pool that poolsmith did not create. The body is stored
/// verbatim; the reconciler decides later whether it is usable.
pub async fn import_pool(
    State(state): State<ApiState>,
    Json(object): Json<PoolObject>,
) -> impl IntoResponse {
    match state.store.put_pool_object(&object) {
        Ok(()) => (StatusCode::CREATED, ApiResponse::ok(object)).into_response(),
        Err(e) => state_error_response(&e),
    }
}

// ── Health ─────────────────────────────────────────────────────

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

//! poolsmith-api — REST API for poolsmith.
//!
//! Lets other systems submit workloads and inspect or seed the pool
//! catalog. Every workload write enqueues a reconcile trigger.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/v1/workloads` | List all workloads |
//! | POST | `/api/v1/workloads` | Create or update a workload |
//! | GET | `/api/v1/workloads/{namespace}/{name}` | Get a workload |
//! | DELETE | `/api/v1/workloads/{namespace}/{name}` | Delete a workload |
//! | GET | `/api/v1/pools` | List the pool catalog |
//! | POST | `/api/v1/pools` | Import an externally managed pool |
//! | GET | `/api/v1/pools/{name}` | Get a pool document |
//! | GET | `/healthz` | Liveness |

pub mod handlers;

use axum::Router;
use axum::routing::get;
use poolsmith_queue::WorkQueue;
use poolsmith_state::StateStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: StateStore,
    pub queue: WorkQueue,
}

/// Build the complete API router.
pub fn build_router(store: StateStore, queue: WorkQueue) -> Router {
    let api_state = ApiState { store, queue };

    let api_routes = Router::new()
        .route(
            "/workloads",
            get(handlers::list_workloads).post(handlers::put_workload),
        )
        .route(
            "/workloads/{namespace}/{name}",
            get(handlers::get_workload).delete(handlers::delete_workload),
        )
        .route(
            "/pools",
            get(handlers::list_pools).post(handlers::import_pool),
        )
        .route("/pools/{name}", get(handlers::get_pool))
        .with_state(api_state);

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/healthz", get(handlers::healthz))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_router() -> (Router, StateStore, WorkQueue) {
        let store = StateStore::open_in_memory().unwrap();
        let queue = WorkQueue::default();
        (build_router(store.clone(), queue.clone()), store, queue)
    }

    fn post_workload(namespace: &str, name: &str) -> Request<Body> {
        let body = serde_json::json!({
            "namespace": namespace,
            "name": name,
            "phase": "Pending",
            "node_selector": { "provision-for-team": "payments" },
        });
        Request::builder()
            .method("POST")
            .uri("/api/v1/workloads")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn healthz_ok() {
        let (router, _, _) = test_router();
        let req = Request::builder().uri("/healthz").body(Body::empty()).unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn workload_created_then_addressable_by_path() {
        let (router, _, queue) = test_router();

        let resp = router.clone().oneshot(post_workload("default", "api")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        assert_eq!(queue.len(), 1);

        let req = Request::builder()
            .uri("/api/v1/workloads/default/api")
            .body(Body::empty())
            .unwrap();
        let resp = router.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let req = Request::builder()
            .method("DELETE")
            .uri("/api/v1/workloads/default/api")
            .body(Body::empty())
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn workload_with_slash_is_rejected() {
        let (router, store, queue) = test_router();

        let resp = router.clone().oneshot(post_workload("a", "b/c")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp = router.oneshot(post_workload("a/b", "c")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        assert!(store.list_workloads().unwrap().is_empty());
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn unknown_pool_is_not_found() {
        let (router, _, _) = test_router();
        let req = Request::builder()
            .uri("/api/v1/pools/pool-missing")
            .body(Body::empty())
            .unwrap();
        let resp = router.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}

//! Controller integration tests.
//!
//! Drive the full daemon stack in-process: workloads arrive through the
//! REST router, the controller reconciles them off the queue, and pools
//! land in an in-memory state store.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tokio::sync::watch;
use tower::ServiceExt;

use poolsmith_queue::WorkQueue;
use poolsmith_reconcile::{ProvisionerConfig, Reconciler};
use poolsmith_state::*;
use poolsmithd::{Controller, process_next};

fn workload_json(name: &str, team: Option<&str>) -> serde_json::Value {
    let mut selector = serde_json::Map::new();
    if let Some(team) = team {
        selector.insert("provision-for-team".to_string(), team.into());
    }
    serde_json::json!({
        "namespace": "default",
        "name": name,
        "phase": "Pending",
        "node_selector": selector,
    })
}

async fn post(router: &axum::Router, uri: &str, body: serde_json::Value) -> StatusCode {
    let resp = router
        .clone()
        .oneshot(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    resp.status()
}

async fn wait_for_pool(store: &StateStore, name: &str) -> Option<PoolObject> {
    for _ in 0..100 {
        if let Some(pool) = store.get_pool_object(name).unwrap() {
            return Some(pool);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    None
}

/// Reconcile until nothing is immediately ready.
async fn drain(reconciler: &Reconciler<StateStore>, queue: &WorkQueue) {
    while !queue.is_empty() {
        assert!(process_next(reconciler, queue).await);
    }
}

#[tokio::test]
async fn submitted_workload_gets_a_pool() {
    let store = StateStore::open_in_memory().unwrap();
    let queue = WorkQueue::default();
    let router = poolsmith_api::build_router(store.clone(), queue.clone());

    let reconciler = Reconciler::new(store.clone(), ProvisionerConfig::default());
    let controller = Controller::new(reconciler, queue.clone(), 2);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(controller.run(shutdown_rx));

    let status = post(
        &router,
        "/api/v1/workloads",
        workload_json("checkout", Some("payments")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let pool = wait_for_pool(&store, "pool-payments")
        .await
        .expect("pool should be provisioned");
    assert_eq!(
        pool.body["spec"]["template"]["spec"]["taints"][0]["value"],
        "payments"
    );
    assert_eq!(pool.body["kind"], "NodePool");

    shutdown_tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("controller should stop")
        .unwrap();
}

#[tokio::test]
async fn repeated_triggers_create_one_pool() {
    let store = StateStore::open_in_memory().unwrap();
    let queue = WorkQueue::default();
    let router = poolsmith_api::build_router(store.clone(), queue.clone());
    let reconciler = Reconciler::new(store.clone(), ProvisionerConfig::default());

    for name in ["a", "b", "c"] {
        let status = post(&router, "/api/v1/workloads", workload_json(name, Some("ml"))).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    // Resubmitting the same workload triggers it again.
    post(&router, "/api/v1/workloads", workload_json("a", Some("ml"))).await;

    drain(&reconciler, &queue).await;

    let pools = store.list_pool_objects().unwrap();
    assert_eq!(pools.len(), 1);
    assert_eq!(pools[0].name, "pool-ml");
}

#[tokio::test]
async fn imported_pool_satisfies_demand() {
    let store = StateStore::open_in_memory().unwrap();
    let queue = WorkQueue::default();
    let router = poolsmith_api::build_router(store.clone(), queue.clone());
    let reconciler = Reconciler::new(store.clone(), ProvisionerConfig::default());

    let status = post(
        &router,
        "/api/v1/pools",
        serde_json::json!({
            "name": "legacy-search",
            "body": {
                "spec": { "template": { "spec": { "taints": [
                    { "key": "provision-for-team", "value": "search", "effect": "NoSchedule" }
                ]}}}
            }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    post(&router, "/api/v1/workloads", workload_json("indexer", Some("search"))).await;
    drain(&reconciler, &queue).await;

    let names: Vec<String> = store
        .list_pool_objects()
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, vec!["legacy-search".to_string()]);
}

#[tokio::test]
async fn workloads_without_demand_are_ignored() {
    let store = StateStore::open_in_memory().unwrap();
    let queue = WorkQueue::default();
    let router = poolsmith_api::build_router(store.clone(), queue.clone());
    let reconciler = Reconciler::new(store.clone(), ProvisionerConfig::default());

    post(&router, "/api/v1/workloads", workload_json("plain", None)).await;
    drain(&reconciler, &queue).await;

    assert!(store.list_pool_objects().unwrap().is_empty());
    assert_eq!(queue.failures("default/plain"), 0);
}

#[tokio::test]
async fn deleted_workload_reconciles_cleanly() {
    let store = StateStore::open_in_memory().unwrap();
    let queue = WorkQueue::default();
    let router = poolsmith_api::build_router(store.clone(), queue.clone());
    let reconciler = Reconciler::new(store.clone(), ProvisionerConfig::default());

    post(&router, "/api/v1/workloads", workload_json("gone", Some("payments"))).await;
    let resp = router
        .clone()
        .oneshot(
            Request::delete("/api/v1/workloads/default/gone")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    drain(&reconciler, &queue).await;

    assert!(store.list_pool_objects().unwrap().is_empty());
    assert_eq!(queue.failures("default/gone"), 0);
}

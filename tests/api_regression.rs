//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` and exercise
//! the /api/v1/* endpoints using `tower::ServiceExt::oneshot()`.
//! No binary spawn, no network port.

use litterbox_hub::api::{create_app, HubState};
use litterbox_hub::classifier::{ClassifierAdapter, DecisionTree, TreeNode};
use litterbox_hub::cleaning::CleaningCoordinator;
use litterbox_hub::pipeline::{IngestPipeline, ReadingValidator};
use litterbox_hub::storage::{DetachedStore, InMemoryStore, PersistenceGateway, RecordStore};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

/// distance <= 14.5 -> needs cleaning
fn near_distance_tree() -> DecisionTree {
    DecisionTree::new(
        "near-distance",
        vec![
            TreeNode::Split {
                feature: 1,
                threshold: 14.5,
                left: 1,
                right: 2,
            },
            TreeNode::Leaf { label: 1 },
            TreeNode::Leaf { label: 0 },
        ],
    )
    .unwrap()
}

fn state_with(store: Arc<dyn RecordStore>, classifier: ClassifierAdapter) -> HubState {
    let pipeline = IngestPipeline::new(
        ReadingValidator::default(),
        Arc::new(classifier),
        PersistenceGateway::new(store),
    );
    HubState::new(
        pipeline,
        Arc::new(CleaningCoordinator::new()),
        PathBuf::from("/nonexistent/model.json"),
        10,
    )
}

fn create_test_state() -> HubState {
    state_with(
        Arc::new(InMemoryStore::new()),
        ClassifierAdapter::loaded(Arc::new(near_distance_tree()), "test"),
    )
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// All GET endpoints should return 200 on a fresh service.
#[tokio::test]
async fn test_get_endpoints_return_200() {
    let app = create_app(create_test_state());

    for endpoint in ["/api/v1/readings", "/api/v1/cleaning", "/api/v1/system/health"] {
        let (status, body) = send(&app, "GET", endpoint, None).await;
        assert_eq!(status, StatusCode::OK, "GET {endpoint}");
        assert!(body.get("data").is_some(), "GET {endpoint} missing envelope");
        assert_eq!(body["meta"]["version"], "1");
    }
}

#[tokio::test]
async fn test_ingest_then_read_back() {
    let app = create_app(create_test_state());

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/readings",
        Some(json!({"weight": 4.2, "distance": 12, "cleanlinessFlag": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body["data"],
        json!({"weight": 4.2, "distance": 12.0, "cleanlinessFlag": 0, "prediction": 1})
    );

    send(
        &app,
        "POST",
        "/api/v1/readings",
        Some(json!({"weight": 3.0, "distance": 40, "cleanlinessFlag": 1})),
    )
    .await;

    let (status, body) = send(&app, "GET", "/api/v1/readings?limit=10", None).await;
    assert_eq!(status, StatusCode::OK);
    let records = body["data"]["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["distance"], 40.0);
    assert_eq!(records[0]["prediction"], 0);
    assert_eq!(records[1]["prediction"], 1);
    assert!(records[0]["id"].as_u64().unwrap() > records[1]["id"].as_u64().unwrap());
    assert!(body["data"].get("message").is_none());
}

#[tokio::test]
async fn test_invalid_payload_is_400_with_field() {
    let app = create_app(create_test_state());

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/readings",
        Some(json!({"weight": "heavy", "distance": 10, "cleanlinessFlag": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert_eq!(body["error"]["field"], "weight");

    let (_, body) = send(&app, "GET", "/api/v1/readings", None).await;
    assert_eq!(body["data"], json!({"records": [], "message": "no records"}));
}

#[tokio::test]
async fn test_missing_field_is_400() {
    let app = create_app(create_test_state());
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/readings",
        Some(json!({"weight": 4.0, "distance": 10})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "cleanlinessFlag");
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let app = create_app(create_test_state());
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/readings")
                .header("content-type", "application/json")
                .body(Body::from("{\"weight\": "))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_legacy_firmware_route() {
    let state = create_test_state();
    let app = create_app(state.clone());

    let (status, body) = send(
        &app,
        "POST",
        "/api/datos",
        Some(json!({"peso": 5.1, "distancia": 8, "limpieza": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["weight"], 5.1);
    assert_eq!(body["data"]["prediction"], 1);
    assert_eq!(state.pipeline.gateway().count().unwrap(), 1);
}

#[tokio::test]
async fn test_limit_is_clamped_and_validated() {
    let state = create_test_state();
    let app = create_app(state);

    for i in 0..3 {
        send(
            &app,
            "POST",
            "/api/v1/readings",
            Some(json!({"weight": i, "distance": 20, "cleanlinessFlag": 0})),
        )
        .await;
    }

    let (_, body) = send(&app, "GET", "/api/v1/readings?limit=0", None).await;
    assert_eq!(body["data"]["records"].as_array().unwrap().len(), 1);

    let (_, body) = send(&app, "GET", "/api/v1/readings?limit=-4", None).await;
    assert_eq!(body["data"]["records"].as_array().unwrap().len(), 1);

    let (_, body) = send(&app, "GET", "/api/v1/readings?limit=1000", None).await;
    assert_eq!(body["data"]["records"].as_array().unwrap().len(), 3);

    let (status, body) = send(&app, "GET", "/api/v1/readings?limit=99999999999999999999", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["records"].as_array().unwrap().len(), 3);

    let (status, body) = send(&app, "GET", "/api/v1/readings?limit=-99999999999999999999", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["records"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "GET", "/api/v1/readings?limit=ten", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "limit");
}

#[tokio::test]
async fn test_unavailable_model_returns_null_prediction() {
    let app = create_app(state_with(
        Arc::new(InMemoryStore::new()),
        ClassifierAdapter::unavailable("no artifact"),
    ));

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/readings",
        Some(json!({"weight": 4.2, "distance": 12, "cleanlinessFlag": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["data"]["prediction"].is_null());

    let (_, body) = send(&app, "GET", "/api/v1/readings", None).await;
    assert!(body["data"]["records"][0]["prediction"].is_null());
}

#[tokio::test]
async fn test_unreachable_store() {
    let app = create_app(state_with(
        Arc::new(DetachedStore::new("database offline")),
        ClassifierAdapter::loaded(Arc::new(near_distance_tree()), "test"),
    ));

    // ingestion still succeeds
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/readings",
        Some(json!({"weight": 4.2, "distance": 12, "cleanlinessFlag": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["prediction"], 1);

    // read-back has no degraded path
    let (status, body) = send(&app, "GET", "/api/v1/readings", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");

    let (_, body) = send(&app, "GET", "/api/v1/system/health", None).await;
    assert_eq!(body["data"]["status"], "degraded");
    assert_eq!(body["data"]["ingest"]["unstored"], 1);
}

#[tokio::test]
async fn test_cleaning_handshake() {
    let app = create_app(create_test_state());

    let (_, body) = send(&app, "GET", "/api/v1/cleaning", None).await;
    assert_eq!(body["data"]["requested"], false);

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/cleaning/request",
        Some(json!({"activate": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["requested"], true);

    for _ in 0..2 {
        let (_, body) = send(&app, "GET", "/api/v1/cleaning", None).await;
        assert_eq!(body["data"]["requested"], true);
    }

    let (status, body) = send(&app, "POST", "/api/v1/cleaning/ack", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"acknowledged": true, "requested": false}));

    let (_, body) = send(&app, "GET", "/api/v1/cleaning", None).await;
    assert_eq!(body["data"]["requested"], false);
}

#[tokio::test]
async fn test_cleaning_request_requires_activate() {
    let app = create_app(create_test_state());

    let (status, body) = send(&app, "POST", "/api/v1/cleaning/request", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "activate");

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/cleaning/request",
        Some(json!({"activate": "yes"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, "GET", "/api/v1/cleaning", None).await;
    assert_eq!(body["data"]["requested"], false);
}

#[tokio::test]
async fn test_health_reports_counters() {
    let app = create_app(create_test_state());

    send(
        &app,
        "POST",
        "/api/v1/readings",
        Some(json!({"weight": 1, "distance": 1, "cleanlinessFlag": 0})),
    )
    .await;
    send(&app, "POST", "/api/v1/readings", Some(json!({"weight": 1}))).await;
    send(&app, "POST", "/api/v1/cleaning/request", Some(json!({"activate": true}))).await;

    let (status, body) = send(&app, "GET", "/api/v1/system/health", None).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["status"], "ok");
    assert_eq!(data["classifier"]["state"], "loaded");
    assert_eq!(data["classifier"]["model"], "near-distance");
    assert_eq!(data["storage"]["records"], 1);
    assert_eq!(data["ingest"]["accepted"], 1);
    assert_eq!(data["ingest"]["rejected"], 1);
    assert_eq!(data["ingest"]["stored"], 1);
    assert_eq!(data["cleaning"]["requested"], true);
    assert_eq!(data["cleaning"]["state"], "pending");
}

#[tokio::test]
async fn test_classifier_reload_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tree.json");
    std::fs::write(&path, r#"{"name": "always-clean", "nodes": [{"label": 0}]}"#).unwrap();

    let mut state = create_test_state();
    state.model_path = Arc::new(path);
    let app = create_app(state);

    let (status, body) = send(&app, "POST", "/api/v1/classifier/reload", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["model"], "always-clean");

    let (_, body) = send(
        &app,
        "POST",
        "/api/v1/readings",
        Some(json!({"weight": 4.2, "distance": 12, "cleanlinessFlag": 0})),
    )
    .await;
    assert_eq!(body["data"]["prediction"], 0);
}

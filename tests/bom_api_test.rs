//! HTTP surface of the BOM routes, driven through `tower::ServiceExt::oneshot`.

mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use common::{minutes_ago, InMemoryStore};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::sync::Arc;
use stockflow_bom::{app, handlers::AppServices, models::VersionStatus, AppState};
use tower::ServiceExt;
use uuid::Uuid;

fn router(store: &Arc<InMemoryStore>) -> Router {
    let services = AppServices::new(Arc::new(store.service()));
    app(AppState::with_services(services))
}

async fn send(
    router: Router,
    method: Method,
    uri: &str,
    branch: Option<Uuid>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(branch) = branch {
        builder = builder.header("x-branch-id", branch.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

#[tokio::test]
async fn health_returns_ok() {
    let store = InMemoryStore::new();
    let (status, body) = send(router(&store), Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("OK".into()));
}

#[tokio::test]
async fn list_and_get_bom() {
    let store = InMemoryStore::new();
    let branch = Uuid::new_v4();
    let parent = store.add_product(branch, "Frame", dec!(0), None, None);
    let a = store.add_product(branch, "Tube", dec!(10), Some(dec!(5)), None);
    let b = store.add_product(branch, "Weld", dec!(3), Some(dec!(2)), None);
    store.add_line(branch, parent, a, dec!(2), dec!(0), None);
    store.add_line(branch, parent, b, dec!(1), dec!(100), None);

    let (status, list) = send(router(&store), Method::GET, "/api/v1/boms", Some(branch), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().map(Vec::len), Some(1));
    assert_eq!(list[0]["buildable_quantity"], json!(1));

    let (status, bom) = send(
        router(&store),
        Method::GET,
        &format!("/api/v1/boms/{}", parent),
        Some(branch),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bom["name"], json!("Frame"));
    assert_eq!(bom["component_count"], json!(2));
    assert_eq!(bom["scope"]["kind"], json!("unversioned"));
}

#[tokio::test]
async fn missing_branch_header_returns_empty_list() {
    let store = InMemoryStore::new();
    let branch = Uuid::new_v4();
    let parent = store.add_product(branch, "Frame", dec!(0), None, None);
    let a = store.add_product(branch, "Tube", dec!(10), None, None);
    store.add_line(branch, parent, a, dec!(1), dec!(0), None);

    let (status, list) = send(router(&store), Method::GET, "/api/v1/boms", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list, json!([]));

    let (status, rows) = send(
        router(&store),
        Method::GET,
        &format!("/api/v1/boms/where-used/{}", a),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows, json!([]));
}

#[tokio::test]
async fn malformed_branch_header_is_rejected() {
    let store = InMemoryStore::new();
    let request = Request::builder()
        .uri("/api/v1/boms")
        .header("x-branch-id", "not-a-uuid")
        .body(Body::empty())
        .unwrap();

    let response = router(&store).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_status_filter_is_rejected() {
    let store = InMemoryStore::new();
    let (status, _) = send(
        router(&store),
        Method::GET,
        "/api/v1/boms?status=retired",
        Some(Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bulk_delete_reports_partial_failure() {
    let store = InMemoryStore::new();
    let branch = Uuid::new_v4();
    let a = store.add_product(branch, "Tube", dec!(10), None, None);
    let first = store.add_product(branch, "First", dec!(0), None, None);
    let second = store.add_product(branch, "Second", dec!(0), None, None);
    store.add_line(branch, first, a, dec!(1), dec!(0), None);
    store.add_line(branch, second, a, dec!(1), dec!(0), None);
    store.fail_line_delete_for(second);

    let (status, report) = send(
        router(&store),
        Method::POST,
        "/api/v1/boms/bulk-delete",
        Some(branch),
        Some(json!({ "parent_ids": [first, second] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["deleted"].as_array().map(Vec::len), Some(1));
    assert_eq!(report["failed"]["parent_product_id"], json!(second));
    assert_eq!(report["failed"]["stage"], json!("line_items"));
    assert_eq!(report["failed"]["reason"], json!("Database error"));
}

#[tokio::test]
async fn bulk_delete_requires_ids() {
    let store = InMemoryStore::new();
    let (status, _) = send(
        router(&store),
        Method::POST,
        "/api/v1/boms/bulk-delete",
        Some(Uuid::new_v4()),
        Some(json!({ "parent_ids": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn save_then_activate_version() {
    let store = InMemoryStore::new();
    let branch = Uuid::new_v4();
    let parent = store.add_product(branch, "Frame", dec!(0), None, None);
    let a = store.add_product(branch, "Tube", dec!(10), None, None);
    let draft = store.add_version(branch, parent, "0.9", VersionStatus::Draft, minutes_ago(30));

    let (status, saved) = send(
        router(&store),
        Method::POST,
        &format!("/api/v1/boms/{}/versions", parent),
        Some(branch),
        Some(json!({
            "version_number": "1.0",
            "components": [
                { "component_product_id": a, "quantity_required": "2" }
            ]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(saved["version"]["status"], json!("active"));
    assert_eq!(saved["line_items"][0]["unit_of_measure"], json!("pcs"));

    let (status, activated) = send(
        router(&store),
        Method::POST,
        &format!("/api/v1/boms/versions/{}/activate", draft),
        Some(branch),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(activated["status"], json!("active"));
    assert_eq!(store.versions_of(parent).iter().filter(|v| v.status == VersionStatus::Active).count(), 1);
}

#[tokio::test]
async fn line_update_with_zero_quantity_is_bad_request() {
    let store = InMemoryStore::new();
    let branch = Uuid::new_v4();
    let parent = store.add_product(branch, "Frame", dec!(0), None, None);
    let a = store.add_product(branch, "Tube", dec!(10), None, None);
    let line = store.add_line(branch, parent, a, dec!(1), dec!(0), None);

    let (status, body) = send(
        router(&store),
        Method::PUT,
        &format!("/api/v1/boms/lines/{}", line),
        Some(branch),
        Some(json!({ "quantity_required": "0" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap_or_default().contains("Validation"));
}

#[tokio::test]
async fn cost_component_lifecycle() {
    let store = InMemoryStore::new();
    let branch = Uuid::new_v4();
    let parent = store.add_product(branch, "Frame", dec!(0), None, None);
    let version = store.add_version(branch, parent, "1.0", VersionStatus::Active, minutes_ago(1));

    let (status, created) = send(
        router(&store),
        Method::POST,
        &format!("/api/v1/boms/versions/{}/cost-components", version),
        Some(branch),
        Some(json!({ "cost_type": "labor", "rate_per_unit": "12", "quantity": "2" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, breakdown) = send(
        router(&store),
        Method::GET,
        &format!("/api/v1/boms/versions/{}/cost", version),
        Some(branch),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(breakdown["labor"], json!("24"));

    let (status, _) = send(
        router(&store),
        Method::DELETE,
        &format!("/api/v1/boms/cost-components/{}", id),
        Some(branch),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        router(&store),
        Method::GET,
        &format!("/api/v1/boms/versions/{}/cost", Uuid::new_v4()),
        Some(branch),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn candidates_route_lists_non_variant_products() {
    let store = InMemoryStore::new();
    let branch = Uuid::new_v4();
    store.add_product(branch, "Frame", dec!(0), None, None);
    let variant = store.add_product(branch, "Frame Blue", dec!(0), None, None);
    store.mark_variant(variant);

    let (status, body) = send(
        router(&store),
        Method::GET,
        "/api/v1/boms/candidates",
        Some(branch),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["name"], json!("Frame"));
    assert_eq!(body[0]["has_bom"], json!(false));
}

#[tokio::test]
async fn empty_component_list_is_bad_request() {
    let store = InMemoryStore::new();
    let branch = Uuid::new_v4();
    let parent = store.add_product(branch, "Frame", dec!(0), None, None);

    let (status, body) = send(
        router(&store),
        Method::POST,
        &format!("/api/v1/boms/{}/versions", parent),
        Some(branch),
        Some(json!({ "version_number": "1.0", "components": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap_or_default()
        .contains("at least one component"));
}

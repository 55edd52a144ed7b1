//! HTTP API Integration Tests
//!
//! Drives the full router with `tower::ServiceExt::oneshot` against a
//! temporary database and checks status codes and JSON bodies.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use classifieds_server::{create_router, AppState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

/// Helper to create a router over a fresh database
async fn create_test_app() -> (Router, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let state = AppState::open(temp_dir.path().join("test.db"))
        .await
        .unwrap();
    (create_router(state), temp_dir)
}

/// Send a request as `role` (None = no identity headers) and decode the JSON body
async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    role: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(role) = role {
        builder = builder
            .header("x-actor-id", "1")
            .header("x-actor-role", role);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create(app: &Router, base: &str, name: &str, parent: Option<i64>) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        base,
        Some("admin"),
        Some(json!({ "name": name, "parentId": parent })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _temp) = create_test_app().await;
    let (status, body) = send(&app, "GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_tree_lifecycle() {
    let (app, _temp) = create_test_app().await;
    let base = "/api/categories";

    let vehicles = create(&app, base, "Vehicles", None).await;
    let cars = create(&app, base, "Cars", Some(vehicles)).await;
    let bikes = create(&app, base, "Bikes", Some(vehicles)).await;
    let sedans = create(&app, base, "Sedans", Some(cars)).await;

    let (status, tree) = send(&app, "GET", base, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tree[0]["name"], "Vehicles");
    assert_eq!(tree[0]["children"][0]["children"][0]["id"], sedans);
    assert_eq!(tree[0]["children"][1]["sortOrder"], 1);
    assert!(tree[0]["children"][1].get("children").is_none());

    let (status, children) = send(
        &app,
        "GET",
        &format!("{}?parentId={}", base, vehicles),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(children.as_array().unwrap().len(), 2);

    let (status, trail) = send(
        &app,
        "GET",
        &format!("{}/{}/breadcrumbs", base, sedans),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trail.as_array().unwrap().len(), 2);
    assert_eq!(trail[0]["id"], vehicles);
    assert_eq!(trail[1]["id"], cars);

    let (status, _) = send(
        &app,
        "POST",
        &format!("{}/reorder", base),
        Some("admin"),
        Some(json!({ "parentId": vehicles, "orderedIds": [bikes, cars] })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, subtree) = send(
        &app,
        "GET",
        &format!("{}/{}/subtree", base, vehicles),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(subtree["children"][0]["id"], bikes);

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("{}/{}", base, bikes),
        Some("admin"),
        Some(json!({ "name": "Motorbikes", "isActive": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Motorbikes");
    assert_eq!(updated["isActive"], false);

    let (status, moved) = send(
        &app,
        "POST",
        &format!("{}/{}/move", base, sedans),
        Some("admin"),
        Some(json!({ "parentId": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(moved["parentId"].is_null());
    assert_eq!(moved["sortOrder"], 1);

    let (status, deleted) = send(
        &app,
        "DELETE",
        &format!("{}/{}", base, vehicles),
        Some("admin"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["deletedCount"], 3);

    let (status, body) = send(&app, "GET", &format!("{}/{}", base, cars), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NODE_NOT_FOUND");
}

#[tokio::test]
async fn test_error_status_codes() {
    let (app, _temp) = create_test_app().await;
    let base = "/api/locations";

    let a = create(&app, base, "Europe", None).await;
    let b = create(&app, base, "Germany", Some(a)).await;
    let c = create(&app, base, "Berlin", Some(b)).await;

    // Cycle
    let (status, body) = send(
        &app,
        "POST",
        &format!("{}/{}/move", base, a),
        Some("admin"),
        Some(json!({ "parentId": c })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "CYCLE_REJECTED");

    // Stale sibling set
    let (status, body) = send(
        &app,
        "POST",
        &format!("{}/reorder", base),
        Some("admin"),
        Some(json!({ "parentId": a, "orderedIds": [b, c] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["details"].as_str().unwrap().contains("unexpected"));

    // Non-empty delete under requireEmpty
    let (status, body) = send(
        &app,
        "DELETE",
        &format!("{}/{}?requireEmpty=true", base, a),
        Some("admin"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    // Guests and members are read-only
    for role in [None, Some("member")] {
        let (status, body) = send(
            &app,
            "POST",
            base,
            role,
            Some(json!({ "name": "Paris" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["code"], "FORBIDDEN");
    }

    // Bad identity header
    let (status, _) = send(&app, "GET", base, Some("superuser"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Blank name
    let (status, body) = send(
        &app,
        "POST",
        base,
        Some("admin"),
        Some(json!({ "name": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    // Nothing changed
    let (_, trail) = send(&app, "GET", &format!("{}/{}/breadcrumbs", base, c), None, None).await;
    assert_eq!(trail[0]["id"], a);
    assert_eq!(trail[1]["id"], b);
}

#[tokio::test]
async fn test_category_fields() {
    let (app, _temp) = create_test_app().await;
    let cars = create(&app, "/api/categories", "Cars", None).await;

    let (status, fuel) = send(
        &app,
        "POST",
        "/api/fields",
        Some("admin"),
        Some(json!({
            "categoryId": cars,
            "label": "Fuel",
            "fieldType": "select",
            "options": ["Petrol", "Diesel"],
            "isRequired": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, mileage) = send(
        &app,
        "POST",
        "/api/fields",
        Some("admin"),
        Some(json!({ "categoryId": cars, "label": "Mileage", "fieldType": "number" })),
    )
    .await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/fields/reorder",
        Some("admin"),
        Some(json!({ "categoryId": cars, "orderedIds": [mileage["id"], fuel["id"]] })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, fields) = send(
        &app,
        "GET",
        &format!("/api/fields?categoryId={}", cars),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fields[0]["label"], "Mileage");
    assert_eq!(fields[1]["options"], json!(["Petrol", "Diesel"]));

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/api/fields/{}", fuel["id"]),
        Some("admin"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(
        &app,
        "POST",
        "/api/fields",
        Some("admin"),
        Some(json!({ "categoryId": cars, "label": "Color", "fieldType": "select" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

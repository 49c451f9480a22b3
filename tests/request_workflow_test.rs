mod common;

use axum::http::{Method, StatusCode};
use chrono::Utc;
use common::TestApp;
use rust_decimal_macros::dec;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn approve_endpoint_runs_the_full_flow() {
    let app = TestApp::new().await;

    let rice = app.seed_product("Rice", None).await;
    let warehouse = app.seed_location("Main warehouse").await;
    app.seed_batch(rice.id, warehouse.id, dec!(10), Utc::now())
        .await;
    let request = app.seed_request("rice", dec!(4), None).await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/requests/{}/approve", request.id),
            Some(json!({ "actor_id": Uuid::new_v4(), "comment": "ok" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = TestApp::read_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["success"], json!(true));
    assert!(body["data"]["message"]
        .as_str()
        .unwrap()
        .contains("approved"));

    // The request shows up as approved through the read API
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/requests/{}", request.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::read_json(response).await;
    assert_eq!(body["data"]["status"], json!("approved"));

    // And the movement ledger is visible
    let response = app.request(Method::GET, "/api/v1/movements", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::read_json(response).await;
    let headers = body["data"].as_array().unwrap();
    assert_eq!(headers.len(), 1);

    let header_id = headers[0]["id"].as_i64().unwrap();
    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/movements/{}/details", header_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::read_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn approving_a_decided_request_is_a_bad_request() {
    let app = TestApp::new().await;

    let request = app.seed_request("rice", dec!(1), None).await;
    let uri = format!("/api/v1/requests/{}/approve", request.id);
    let body = json!({ "actor_id": Uuid::new_v4() });

    let first = app.request(Method::POST, &uri, Some(body.clone())).await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.request(Method::POST, &uri, Some(body)).await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_request_returns_not_found() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/requests/{}/approve", Uuid::new_v4()),
            Some(json!({ "actor_id": Uuid::new_v4() })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reject_then_revert_round_trip() {
    let app = TestApp::new().await;

    let request = app.seed_request("beans", dec!(2), None).await;

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/requests/{}/reject", request.id),
            Some(json!({ "actor_id": Uuid::new_v4(), "comment": "no beans" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/requests/{}/revert", request.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::read_json(response).await;
    assert_eq!(body["data"]["success"], json!(true));

    // Back to pending, visible through the filtered list
    let response = app
        .request(Method::GET, "/api/v1/requests?status=pending", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::read_json(response).await;
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], json!(request.id.to_string()));
}

#[tokio::test]
async fn reverting_a_pending_request_is_a_bad_request() {
    let app = TestApp::new().await;

    let request = app.seed_request("beans", dec!(2), None).await;
    let response = app
        .request(
            Method::POST,
            &format!("/api/v1/requests/{}/revert", request.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_status_filter_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api/v1/requests?status=bogus", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_endpoint_reports_database_state() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = TestApp::read_json(response).await;
    assert_eq!(body["data"]["checks"]["database"], json!("healthy"));
}

//! Registration endpoint tests.
//!
//! Run with: cargo test -p photobooth-integration-tests

use axum::http::StatusCode;
use photobooth_integration_tests::{PNG_BYTES, TestContext};
use serde_json::{Value, json};

// ============================================================================
// Success
// ============================================================================

#[tokio::test]
async fn test_register_returns_success_message() {
    let ctx = TestContext::new();

    let body = ctx
        .register("Ada Lovelace", "ada@example.com", "Engineering")
        .await;

    assert_eq!(body, json!({ "message": "Registration successful" }));
}

#[tokio::test]
async fn test_register_sets_http_only_session_cookie() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/api/register")
        .json(&json!({
            "name": "Ada Lovelace",
            "email": "ada@example.com",
            "department": "Engineering",
        }))
        .await;

    response.assert_status_ok();
    let cookie = response.cookie("photobooth_session");
    assert_eq!(cookie.http_only(), Some(true));
    assert_eq!(cookie.path(), Some("/"));
}

#[tokio::test]
async fn test_reregistering_replaces_previous_details() {
    let ctx = TestContext::new();

    ctx.register("Ada Lovelace", "ada@example.com", "Engineering")
        .await;
    ctx.register("Grace Hopper", "grace@example.com", "Research")
        .await;

    ctx.upload("photo.png", PNG_BYTES).await.assert_status_ok();

    let records = ctx.employees.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Grace Hopper");
    assert_eq!(records[0].department.as_str(), "Research");
    assert!(ctx.stored_files("Engineering").is_empty());
    assert_eq!(ctx.stored_files("Research").len(), 1);
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_missing_field_is_rejected_without_creating_session() {
    let bodies = [
        json!({ "email": "ada@example.com", "department": "Engineering" }),
        json!({ "name": "Ada", "department": "Engineering" }),
        json!({ "name": "Ada", "email": "ada@example.com" }),
        json!({ "name": "", "email": "ada@example.com", "department": "Engineering" }),
        json!({}),
    ];

    for body in bodies {
        let ctx = TestContext::new();

        let response = ctx.server.post("/api/register").json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>(),
            json!({ "error": "All fields are required" })
        );

        // No registration was stored, so the upload gate still rejects.
        ctx.upload("photo.png", PNG_BYTES)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        assert!(ctx.employees.records().is_empty());
    }
}

#[tokio::test]
async fn test_invalid_registration_keeps_previous_session() {
    let ctx = TestContext::new();
    ctx.register("Ada Lovelace", "ada@example.com", "Engineering")
        .await;

    ctx.server
        .post("/api/register")
        .json(&json!({ "name": "Mallory", "department": "Finance" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    ctx.upload("photo.png", PNG_BYTES).await.assert_status_ok();
    let records = ctx.employees.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "Ada Lovelace");
    assert_eq!(records[0].department.as_str(), "Engineering");
}

#[tokio::test]
async fn test_invalid_email_is_rejected() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/api/register")
        .json(&json!({
            "name": "Ada",
            "email": "ada.example.com",
            "department": "Engineering",
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(
        body["error"]
            .as_str()
            .is_some_and(|e| e.starts_with("Invalid email address"))
    );
}

#[tokio::test]
async fn test_address_refused_by_mail_transport_is_rejected() {
    for email in ["a,b@example.com", "a<b>@example.com"] {
        let ctx = TestContext::new();

        let response = ctx
            .server
            .post("/api/register")
            .json(&json!({ "name": "Ada", "email": email, "department": "Engineering" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(
            response.json::<Value>(),
            json!({ "error": format!("Invalid email address: {email}") })
        );

        // Nothing was registered, so no file or record can follow.
        ctx.upload("photo.png", PNG_BYTES)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        assert!(ctx.stored_files("Engineering").is_empty());
        assert!(ctx.employees.records().is_empty());
        assert!(ctx.mailer.sent().is_empty());
    }
}

#[tokio::test]
async fn test_path_like_department_is_rejected() {
    let ctx = TestContext::new();

    for department in ["../etc", "sales/emea", "R&D", "x\"; DROP TABLE y; --"] {
        ctx.server
            .post("/api/register")
            .json(&json!({
                "name": "Ada",
                "email": "ada@example.com",
                "department": department,
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let ctx = TestContext::new();

    let response = ctx
        .server
        .post("/api/register")
        .bytes(bytes::Bytes::from_static(b"{not json"))
        .content_type("application/json")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert!(response.json::<Value>()["error"].is_string());
}

// ============================================================================
// Department allow-list
// ============================================================================

#[tokio::test]
async fn test_allow_list_rejects_unknown_department() {
    let ctx = TestContext::builder()
        .allow_departments("Engineering, Research")
        .build();

    let response = ctx
        .server
        .post("/api/register")
        .json(&json!({
            "name": "Ada",
            "email": "ada@example.com",
            "department": "Marketing",
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "Unknown department: Marketing" })
    );

    ctx.register("Ada", "ada@example.com", "Research").await;
}

// ============================================================================
// Session persistence
// ============================================================================

#[tokio::test]
async fn test_session_store_failure_returns_server_error() {
    let ctx = TestContext::builder().failing_sessions().build();

    let response = ctx
        .server
        .post("/api/register")
        .json(&json!({
            "name": "Ada",
            "email": "ada@example.com",
            "department": "Engineering",
        }))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.header("content-type"), "application/json");
    assert_eq!(
        response.json::<Value>(),
        json!({ "error": "Failed to save session data" })
    );
}

//! Integration tests for the resource lifecycle over HTTP.
//!
//! Covers create, reassignment through PUT, acknowledge/deny with their
//! authorization rules, the change journal endpoint, tenant isolation and
//! search. Requires `TEST_DATABASE_URL`; skipped otherwise.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    cleanup_all_test_data, create_test_app, json_request, parse_response_body, request_as,
    run_migrations, seed_org, seed_user, test_config, try_test_pool,
};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn test_resource_lifecycle_over_http() {
    let Some(pool) = try_test_pool().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    run_migrations(&pool).await;
    cleanup_all_test_data(&pool).await;

    let org = seed_org(&pool, "Acme").await;
    let alice = seed_user(&pool, org, "Alice", "alice@acme.test").await;
    let bob = seed_user(&pool, org, "Bob", "bob@acme.test").await;

    let app = create_test_app(test_config(), pool.clone());

    // Alice creates a laptop she both holds and administers
    let request = json_request(
        Method::POST,
        "/api/v1/resources",
        json!({
            "name": "ThinkPad T14",
            "serialNum": "TP-0001",
            "currentUserId": alice,
            "deviceAdminId": alice,
            "description": "Dev laptop"
        }),
        alice,
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "unassigned");
    assert_eq!(body["currentUser"]["email"], "alice@acme.test");
    let resource_id = body["id"].as_str().unwrap().to_string();

    // Reassign to Bob through PUT
    let request = json_request(
        Method::PUT,
        &format!("/api/v1/resources/{}", resource_id),
        json!({ "currentUserId": bob }),
        alice,
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "assigned");
    assert_eq!(body["currentUser"]["email"], "bob@acme.test");
    assert_eq!(body["previousUser"]["email"], "alice@acme.test");

    // Alice no longer holds it, so she cannot acknowledge
    let request = request_as(
        Method::POST,
        &format!("/api/v1/resources/{}/acknowledge", resource_id),
        alice,
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Bob acknowledges; doing it twice is a no-op
    for _ in 0..2 {
        let request = request_as(
            Method::POST,
            &format!("/api/v1/resources/{}/acknowledge", resource_id),
            bob,
        );
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = parse_response_body(response).await;
        assert_eq!(body["status"], "acknowledged");
    }

    // Bob then denies having it
    let request = request_as(
        Method::POST,
        &format!("/api/v1/resources/{}/deny", resource_id),
        bob,
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "disputed");

    // The journal has one entry per applied transition, newest first
    let request = request_as(
        Method::GET,
        &format!("/api/v1/resources/{}/history", resource_id),
        bob,
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    let entries = body["data"].as_array().unwrap();
    assert_eq!(entries.len(), 3);

    // Newest entry is the dispute
    assert_eq!(entries[0]["who"], "bob@acme.test");
    assert_eq!(entries[0]["what"][0]["field"], "status");
    assert_eq!(entries[0]["what"][0]["cur"], "R_DISP");

    // Oldest entry is the reassignment, capturing owner and status together
    let reassign_fields: Vec<&str> = entries[2]["what"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["field"].as_str().unwrap())
        .collect();
    assert_eq!(
        reassign_fields,
        vec!["current_user", "previous_user", "status"]
    );
    assert_eq!(entries[2]["who"], "alice@acme.test");

    cleanup_all_test_data(&pool).await;
}

#[tokio::test]
async fn test_foreign_org_resource_reads_as_not_found() {
    let Some(pool) = try_test_pool().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    run_migrations(&pool).await;
    cleanup_all_test_data(&pool).await;

    let acme = seed_org(&pool, "Acme").await;
    let globex = seed_org(&pool, "Globex").await;
    let alice = seed_user(&pool, acme, "Alice", "alice@acme.test").await;
    let carol = seed_user(&pool, globex, "Carol", "carol@globex.test").await;

    let app = create_test_app(test_config(), pool.clone());

    let request = json_request(
        Method::POST,
        "/api/v1/resources",
        json!({
            "name": "Monitor",
            "serialNum": "MN-0001",
            "currentUserId": alice,
            "deviceAdminId": alice
        }),
        alice,
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = parse_response_body(response).await;
    let resource_id = body["id"].as_str().unwrap().to_string();

    // Carol is in another org: the resource does not exist for her
    let request = request_as(
        Method::GET,
        &format!("/api/v1/resources/{}", resource_id),
        carol,
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Nor can she act on it
    let request = request_as(
        Method::POST,
        &format!("/api/v1/resources/{}/acknowledge", resource_id),
        carol,
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    cleanup_all_test_data(&pool).await;
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let Some(pool) = try_test_pool().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    run_migrations(&pool).await;

    let app = create_test_app(test_config(), pool.clone());

    let request = common::anonymous_request(Method::GET, "/api/v1/resources");
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_search_and_autocomplete() {
    let Some(pool) = try_test_pool().await else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    run_migrations(&pool).await;
    cleanup_all_test_data(&pool).await;

    let org = seed_org(&pool, "Acme").await;
    let alice = seed_user(&pool, org, "Alice", "alice@acme.test").await;

    let app = create_test_app(test_config(), pool.clone());

    for (name, serial) in [("ThinkPad T14", "TP-1"), ("ThinkPad X1", "TP-2"), ("Dell U2720", "DL-1")] {
        let request = json_request(
            Method::POST,
            "/api/v1/resources",
            json!({
                "name": name,
                "serialNum": serial,
                "currentUserId": alice,
                "deviceAdminId": alice
            }),
            alice,
        );
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let request = request_as(Method::GET, "/api/v1/resources/search?q=thinkpad", alice);
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    // LIKE metacharacters in the term match literally, not as wildcards
    let request = request_as(Method::GET, "/api/v1/resources/search?q=%25", alice);
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);

    let request = request_as(
        Method::GET,
        "/api/v1/resources/autocomplete?query=Think",
        alice,
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    let suggestions = body["suggestions"].as_array().unwrap();
    assert_eq!(suggestions.len(), 2);

    cleanup_all_test_data(&pool).await;
}

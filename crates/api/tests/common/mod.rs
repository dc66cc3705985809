//! Common test utilities for integration tests.
//!
//! These tests need a real PostgreSQL database. They are gated on the
//! `TEST_DATABASE_URL` environment variable and skip silently when it is
//! not set, so the suite stays green without infrastructure.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    Router,
};
use persistence::db::DatabaseConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use trackzilla_api::{
    app::create_app,
    config::{Config, HistoryConfig, LoggingConfig, NotificationConfig, SecurityConfig, ServerConfig},
};
use uuid::Uuid;

/// Connect to the test database, or None when `TEST_DATABASE_URL` is unset.
pub async fn try_test_pool() -> Option<PgPool> {
    let database_url = std::env::var("TEST_DATABASE_URL").ok()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    Some(pool)
}

/// Run migrations on the test database.
pub async fn run_migrations(pool: &PgPool) {
    let migration_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("persistence/src/migrations");

    let mut entries: Vec<_> = std::fs::read_dir(&migration_dir)
        .expect("Failed to read migrations directory")
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map(|ext| ext == "sql").unwrap_or(false))
        .collect();

    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let sql = std::fs::read_to_string(entry.path()).expect("Failed to read migration file");

        // Migrations may already be applied; ignore errors
        let _ = sqlx::raw_sql(&sql).execute(pool).await;
    }
}

/// Remove every row the tests may have created.
pub async fn cleanup_all_test_data(pool: &PgPool) {
    let _ = sqlx::raw_sql(
        "TRUNCATE TABLE team_members, teams, resources, users, organizations CASCADE",
    )
    .execute(pool)
    .await;
}

/// Configuration for tests: rate limiting and notifications off.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_secs: 30,
        },
        database: DatabaseConfig {
            url: std::env::var("TEST_DATABASE_URL").unwrap_or_default(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 600,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            cors_origins: vec![],
            rate_limit_per_minute: 0,
        },
        history: HistoryConfig::default(),
        notifications: NotificationConfig::default(),
    }
}

/// Build the application router for tests.
pub fn create_test_app(config: Config, pool: PgPool) -> Router {
    create_app(config, pool)
}

/// Seed an organization, returning its ID.
pub async fn seed_org(pool: &PgPool, name: &str) -> Uuid {
    sqlx::query_scalar::<_, Uuid>("INSERT INTO organizations (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("Failed to seed org")
}

/// Seed a user inside an org, returning their ID.
pub async fn seed_user(pool: &PgPool, org_id: Uuid, name: &str, email: &str) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (email, name, org_id) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(email)
    .bind(name)
    .bind(org_id)
    .fetch_one(pool)
    .await
    .expect("Failed to seed user")
}

/// Build a JSON request acting as the given user.
pub fn json_request(method: Method, uri: &str, body: serde_json::Value, user_id: Uuid) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("X-User-Id", user_id.to_string())
        .body(Body::from(body.to_string()))
        .expect("Failed to build request")
}

/// Build a bodyless request acting as the given user.
pub fn request_as(method: Method, uri: &str, user_id: Uuid) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("X-User-Id", user_id.to_string())
        .body(Body::empty())
        .expect("Failed to build request")
}

/// Build a request with no identity header.
pub fn anonymous_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request")
}

/// Read and parse a JSON response body.
pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&bytes).expect("Response body is not valid JSON")
}

//! Test utilities and fixtures for Keygate integration tests

#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use serde_json::Value;

pub use keygate::db::{AppState, init_db, init_log_db, queries};
pub use keygate::error::AppError;
pub use keygate::lifecycle;
pub use keygate::models::*;

pub const TEST_ADMIN_TOKEN: &str = "kg_test_operator_token";

pub const SECONDS_PER_DAY: i64 = 86_400;

/// Create an in-memory test database with schema initialized
pub fn setup_test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
    init_db(&conn).expect("Failed to initialize schema");
    conn
}

/// Create an in-memory test log database with schema initialized
pub fn setup_test_log_db() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to create in-memory log database");
    init_log_db(&conn).expect("Failed to initialize log schema");
    conn
}

/// Create an AppState for testing with in-memory databases.
///
/// Pools are capped at one connection so every request observes the same
/// in-memory database. Tests must drop any connection they check out
/// before calling lifecycle operations or the pool will starve.
pub fn create_test_app_state() -> AppState {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }

    let log_manager = SqliteConnectionManager::memory();
    let log_pool = Pool::builder().max_size(1).build(log_manager).unwrap();
    {
        let conn = log_pool.get().unwrap();
        init_log_db(&conn).unwrap();
    }

    AppState {
        db: pool,
        logs: log_pool,
        key_prefix: "GNP".to_string(),
        admin_tokens: Arc::new(vec![TEST_ADMIN_TOKEN.to_string()]),
    }
}

/// Create an AppState backed by database files under `dir`, for tests that
/// need real cross-connection concurrency.
pub fn create_file_app_state(dir: &std::path::Path) -> AppState {
    let db_path = dir.join("keygate.db");
    let log_path = dir.join("keygate_log.db");

    let pool = keygate::db::create_pool(db_path.to_str().unwrap()).unwrap();
    {
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
    }

    let log_pool = keygate::db::create_pool(log_path.to_str().unwrap()).unwrap();
    {
        let conn = log_pool.get().unwrap();
        init_log_db(&conn).unwrap();
    }

    AppState {
        db: pool,
        logs: log_pool,
        key_prefix: "GNP".to_string(),
        admin_tokens: Arc::new(vec![TEST_ADMIN_TOKEN.to_string()]),
    }
}

pub fn future_timestamp(days: i64) -> i64 {
    queries::now() + days * SECONDS_PER_DAY
}

pub fn past_timestamp(days: i64) -> i64 {
    queries::now() - days * SECONDS_PER_DAY
}

/// Insert a license record directly, bypassing the lifecycle, so tests can
/// construct states creation never produces (already expired, pre-bound).
pub fn insert_test_license(conn: &Connection, license: &License) {
    queries::insert_license(conn, license).expect("Failed to insert test license");
}

/// A baseline unused monthly license; override fields as needed.
pub fn test_license(key: &str, expires_at: i64) -> License {
    License {
        key: key.to_string(),
        plan: Plan::Monthly,
        device_id: None,
        owner_label: None,
        created_by: Some("test".to_string()),
        created_at: queries::now(),
        activated_at: None,
        expires_at,
        active: true,
        used: false,
    }
}

/// Client-facing router over the given state
pub fn public_app(state: AppState) -> Router {
    keygate::handlers::public::router().with_state(state)
}

/// Admin router with the auth gate applied
pub fn admin_app(state: AppState) -> Router {
    keygate::handlers::admin::router(state.clone()).with_state(state)
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn admin_post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("Authorization", format!("Bearer {}", TEST_ADMIN_TOKEN))
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn admin_get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("Authorization", format!("Bearer {}", TEST_ADMIN_TOKEN))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).expect("Response should be valid JSON")
}

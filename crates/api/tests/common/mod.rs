//! Shared helpers for API integration tests.
//!
//! Requests are sent straight to the router with `tower::ServiceExt::oneshot`,
//! no TCP listener involved.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use pagetree_api::config::ServerConfig;
use pagetree_api::router::build_app_router;
use pagetree_api::state::AppState;
use pagetree_core::block_type::BlockTypeRegistry;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        db_max_connections: 5,
    }
}

/// Build the full application router over `pool`, with the default block
/// types and the production middleware stack.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        block_types: Arc::new(BlockTypeRegistry::with_defaults()),
    };
    build_app_router(state, &config)
}

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    user: Option<i64>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user_id) = user {
        builder = builder.header("x-user-id", user_id.to_string());
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_as(app: Router, uri: &str, user: i64) -> Response<Body> {
    send(app, Method::GET, uri, Some(user), None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_as(app: Router, uri: &str, user: i64, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(user), Some(body)).await
}

pub async fn put_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, None, Some(body)).await
}

pub async fn put_json_as(app: Router, uri: &str, user: i64, body: Value) -> Response<Body> {
    send(app, Method::PUT, uri, Some(user), Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None, None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// A small course used across tests:
///
/// ```text
/// intro        (block: "Welcome")
///   one
///   two
/// summary
/// ```
pub fn sample_hierarchy() -> Value {
    serde_json::json!({
        "name": "main",
        "base_url": "/course/",
        "sections": [
            {
                "label": "Introduction",
                "slug": "intro",
                "pageblocks": [{"block_type": "Text Block", "label": "Hello", "body": "Welcome"}],
                "children": [
                    {"label": "Part one", "slug": "one"},
                    {"label": "Part two", "slug": "two"}
                ]
            },
            {"label": "Summary", "slug": "summary"}
        ]
    })
}

/// Import [`sample_hierarchy`] as hierarchy `main`.
pub async fn import_sample(pool: &PgPool) {
    let app = build_test_app(pool.clone());
    let response = post_json(app, "/api/v1/hierarchies", sample_hierarchy()).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
}

/// Id of the section at `path` in hierarchy `main`.
pub async fn section_id(pool: &PgPool, path: &str) -> i64 {
    let app = build_test_app(pool.clone());
    let response = get(app, &format!("/api/v1/hierarchies/main/resolve?path={path}")).await;
    let json = body_json(response).await;
    json["data"]["id"].as_i64().unwrap()
}

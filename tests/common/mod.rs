//! Shared helpers for the router-level integration tests.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use workflow_gateway::api;
use workflow_gateway::app_state::AppState;
use workflow_gateway::config::WorkflowConfig;

/// Builds the full application over the in-memory store.
pub fn build_test_app() -> Router {
    api::app(AppState::in_memory(&WorkflowConfig::default()))
}

/// Sends one request with an optional JSON body.
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    };
    let Ok(request) = request else {
        panic!("request for {uri} should build");
    };
    let Ok(response) = app.clone().oneshot(request).await else {
        panic!("router is infallible");
    };
    response
}

/// Sends a request and returns its status with the parsed JSON body.
pub async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let response = send(app, method, uri, body).await;
    let status = response.status();
    (status, body_json(response).await)
}

/// Reads a response body as JSON. Empty bodies read as `null`.
pub async fn body_json(response: Response<Body>) -> Value {
    let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
        panic!("body should be readable");
    };
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

/// Returns `data.<key>` as a string, or an empty string.
pub fn data_str(body: &Value, key: &str) -> String {
    body["data"][key].as_str().unwrap_or_default().to_string()
}

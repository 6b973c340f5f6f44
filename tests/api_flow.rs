//! Router-level tests of the event type, trigger, event and alert flow.

#![allow(clippy::panic, clippy::indexing_slicing)]

mod common;

use axum::http::{Method, StatusCode};
use serde_json::{Value, json};

use common::{build_test_app, call, data_str, send};

async fn temp_type(app: &axum::Router) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/v1/eventType",
        Some(json!({
            "name": "Temp",
            "mapping": {"reading": "integer", "host": "string"},
            "createdBy": "ops"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    data_str(&body, "eventTypeId")
}

async fn reading_trigger(app: &axum::Router, event_type_id: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/v1/trigger",
        Some(json!({
            "name": "boiling",
            "eventTypeId": event_type_id,
            "condition": {"query": {"match": {"reading": 100}}},
            "createdBy": "ops"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    data_str(&body, "triggerId")
}

async fn post_reading(app: &axum::Router, event_type_id: &str, reading: i64) -> Vec<Value> {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/v1/event",
        Some(json!({
            "eventTypeId": event_type_id,
            "data": {"reading": reading, "host": "h1"},
            "createdBy": "sensor"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["data"]["alertIds"].as_array().cloned().unwrap_or_default()
}

#[tokio::test]
async fn matching_event_raises_one_alert_until_trigger_is_deleted() {
    let app = build_test_app();
    let et = temp_type(&app).await;
    let trigger = reading_trigger(&app, &et).await;

    let alerts = post_reading(&app, &et, 100).await;
    assert_eq!(alerts.len(), 1);
    let alert_id = alerts.first().and_then(Value::as_str).unwrap_or_default();
    let (status, alert) = call(&app, Method::GET, &format!("/api/v1/alert/{alert_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data_str(&alert, "triggerId"), trigger);
    assert_eq!(data_str(&alert, "createdBy"), "ops");

    assert!(post_reading(&app, &et, 50).await.is_empty());

    let (status, _) = call(&app, Method::DELETE, &format!("/api/v1/trigger/{trigger}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(post_reading(&app, &et, 100).await.is_empty());

    let (_, stats) = call(&app, Method::GET, "/admin/stats", None).await;
    assert_eq!(stats["data"]["numEventTypes"], 1);
    assert_eq!(stats["data"]["numEvents"], 3);
    assert_eq!(stats["data"]["numTriggers"], 1);
    assert_eq!(stats["data"]["numAlerts"], 1);
}

#[tokio::test]
async fn triggers_only_see_their_own_event_type() {
    let app = build_test_app();
    let temp = temp_type(&app).await;
    let (_, other) = call(
        &app,
        Method::POST,
        "/api/v1/eventType",
        Some(json!({"name": "Pressure", "mapping": {"reading": "integer"}})),
    )
    .await;
    let pressure = data_str(&other, "eventTypeId");
    reading_trigger(&app, &temp).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/event",
        Some(json!({"eventTypeName": "Pressure", "data": {"reading": 100}})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["event"]["eventTypeId"], Value::String(pressure));
    assert_eq!(body["data"]["alertIds"], json!([]));
}

#[tokio::test]
async fn disabled_trigger_raises_nothing() {
    let app = build_test_app();
    let et = temp_type(&app).await;
    let trigger = reading_trigger(&app, &et).await;

    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/api/v1/trigger/{trigger}"),
        Some(json!({"enabled": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["enabled"], false);
    assert!(post_reading(&app, &et, 100).await.is_empty());

    call(
        &app,
        Method::PUT,
        &format!("/api/v1/trigger/{trigger}"),
        Some(json!({"enabled": true})),
    )
    .await;
    assert_eq!(post_reading(&app, &et, 100).await.len(), 1);
}

#[tokio::test]
async fn scheduled_event_is_stored_but_not_matched() {
    let app = build_test_app();
    let et = temp_type(&app).await;
    reading_trigger(&app, &et).await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/event",
        Some(json!({
            "eventTypeId": et,
            "data": {"reading": 100},
            "cronSchedule": "*/5 * * * *"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["alertIds"], json!([]));
    assert_eq!(body["data"]["event"]["cronSchedule"], "*/5 * * * *");
}

#[tokio::test]
async fn event_type_delete_is_refused_while_referenced() {
    let app = build_test_app();
    let et = temp_type(&app).await;
    let trigger = reading_trigger(&app, &et).await;

    let (status, body) = call(&app, Method::DELETE, &format!("/api/v1/eventType/{et}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["statusCode"], 409);

    call(&app, Method::DELETE, &format!("/api/v1/trigger/{trigger}"), None).await;
    let (status, _) = call(&app, Method::DELETE, &format!("/api/v1/eventType/{et}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, Method::GET, &format!("/api/v1/eventType/{et}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_event_type_name_conflicts() {
    let app = build_test_app();
    temp_type(&app).await;
    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/eventType",
        Some(json!({"name": "Temp", "mapping": {"x": "string"}})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn invalid_inputs_are_rejected() {
    let app = build_test_app();
    let et = temp_type(&app).await;

    let response = send(&app, Method::POST, "/api/v1/eventType", None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/event",
        Some(json!({"eventTypeId": et, "data": {"reading": "hot"}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 1001);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/trigger",
        Some(json!({
            "name": "bad",
            "eventTypeId": et,
            "condition": {"query": {"match": {"pressure": 1}}}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/trigger",
        Some(json!({
            "name": "bad",
            "eventTypeId": et,
            "condition": {"query": {"fuzzy": {"reading": 1}}}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 1002);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/trigger",
        Some(json!({
            "name": "orphan",
            "eventTypeId": "ET999",
            "condition": {"match_all": {}}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listings_paginate_and_filter() {
    let app = build_test_app();
    let et = temp_type(&app).await;
    let trigger = reading_trigger(&app, &et).await;
    for reading in [100, 100, 100, 7] {
        post_reading(&app, &et, reading).await;
    }

    let (status, body) = call(&app, Method::GET, "/api/v1/event?page=2&perPage=3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 4);
    assert_eq!(body["pagination"]["totalPages"], 2);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));

    let (_, body) = call(&app, Method::GET, &format!("/api/v1/alert?triggerId={trigger}"), None).await;
    assert_eq!(body["pagination"]["total"], 3);

    let (_, body) = call(&app, Method::GET, "/api/v1/alert?triggerId=T404", None).await;
    assert_eq!(body["pagination"]["total"], 0);

    let (_, body) = call(&app, Method::GET, &format!("/api/v1/trigger?eventTypeId={et}"), None).await;
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn raw_query_searches_events() {
    let app = build_test_app();
    let et = temp_type(&app).await;
    for reading in [10, 60, 90] {
        post_reading(&app, &et, reading).await;
    }

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/event/query",
        Some(json!({"query": {"range": {"data.reading": {"gte": 50}}}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 2);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/event/query",
        Some(json!({"query": {"nope": {}}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn manual_alert_requires_existing_references() {
    let app = build_test_app();
    let et = temp_type(&app).await;
    let trigger = reading_trigger(&app, &et).await;
    post_reading(&app, &et, 1).await;
    let (_, events) = call(&app, Method::GET, "/api/v1/event", None).await;
    let event_id = events["data"][0]["eventId"].as_str().unwrap_or_default().to_string();

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/v1/alert",
        Some(json!({"triggerId": trigger, "eventId": event_id, "createdBy": "oncall"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(data_str(&body, "createdBy"), "oncall");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/v1/alert",
        Some(json!({"triggerId": "T77", "eventId": event_id})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn system_routes_answer() {
    let app = build_test_app();
    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = call(&app, Method::GET, "/version", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "workflow-gateway");

    let (status, _) = call(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = call(&app, Method::GET, "/api/v1/unknown", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

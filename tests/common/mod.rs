//! Shared fixtures for the integration tests

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use hotfix_viewer::{
    api::{build_router, AppState},
    catalog::{Catalog, StaticRecordSource},
    models::HotfixRecord,
    service::HotfixService,
    usage::{InMemoryUsageLog, UsageLogStore},
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// A small catalog covering every filter dimension
pub fn sample_records() -> Vec<HotfixRecord> {
    vec![
        HotfixRecord::new("ECP-100", "v1", "core")
            .with_description("Fix connection pool leak on shutdown")
            .with_requestor("Alice Smith")
            .with_fixed_by("bob")
            .with_sequence("3"),
        HotfixRecord::new("ECP-200", "v2", "ui")
            .with_description("Dashboard renders empty chart")
            .with_requestor("carol")
            .with_fixed_by("dave")
            .with_latest_ecp("ECP-300")
            .with_sequence("1"),
        HotfixRecord::new("ECP-20", "v1", "ui")
            .with_description("Tooltip overlaps\nlegend")
            .with_requestor("alice")
            .with_latest_ecp("ECP-300")
            .with_sequence("9"),
        HotfixRecord::new("ECP-300", "v2", "core")
            .with_description("Rollup of dashboard fixes")
            .with_specific_function("rollup")
            .with_sequence("x"),
        HotfixRecord::new("ECP-1000", "v10", "db")
            .with_description("Index rebuild DB pool tuning")
            .with_requestor("erin"),
        HotfixRecord::new("ECP-3", "v1", "db").with_description("Schema check"),
    ]
}

pub async fn loaded_catalog(records: Vec<HotfixRecord>) -> Arc<Catalog> {
    let catalog = Arc::new(Catalog::new());
    catalog
        .reload(&StaticRecordSource::new(records))
        .await
        .unwrap();
    catalog
}

/// Router and service over a loaded catalog with an in-memory usage log
pub async fn test_app(records: Vec<HotfixRecord>) -> (Router, Arc<HotfixService>) {
    let usage: Arc<dyn UsageLogStore> = Arc::new(InMemoryUsageLog::new());
    let service = Arc::new(HotfixService::new(
        Arc::new(Catalog::new()),
        Arc::new(StaticRecordSource::new(records)),
        Some(usage),
    ));
    service.reload().await.unwrap();

    let router = build_router(AppState::new(service.clone()));
    (router, service)
}

/// Router whose catalog has never been loaded
pub fn unloaded_app() -> Router {
    let service = Arc::new(HotfixService::new(
        Arc::new(Catalog::new()),
        Arc::new(StaticRecordSource::default()),
        None,
    ));
    build_router(AppState::new(service))
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
}

/// `ecpNo` of every record in a search response's `details`
pub fn ecp_numbers(body: &Value) -> Vec<String> {
    body["details"]
        .as_array()
        .map(|details| {
            details
                .iter()
                .map(|d| d["ecpNo"].as_str().unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default()
}

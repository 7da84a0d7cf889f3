use crate::api::params::{caller_identity, SearchParams};
use crate::api::AppState;
use crate::catalog::GenerationStats;
use crate::error::{AppError, Result};
use crate::models::{HotfixRecord, HotfixSummary, UsageLogEntry};
use crate::service::UnderlyingHotfix;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    let generation = state.service.generation_stats();

    Ok(Json(HealthResponse {
        status: if generation.is_some() { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        catalog_loaded: generation.is_some(),
        generation: generation.map(|g| g.generation),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub catalog_loaded: bool,
    pub generation: Option<u64>,
}

/// Search response: `details` is `null` for count-only requests
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResultMetadata {
    pub count: u64,
    pub details: Option<Vec<HotfixRecord>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnderlyingHfMetadata {
    pub count: usize,
    pub details: Vec<UnderlyingHotfix>,
}

/// Paged search
pub async fn get_pageable_result(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: std::result::Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<SearchResultMetadata>> {
    let Query(pairs) = query?;
    let params = SearchParams::from_pairs(&pairs);
    let (page_no, requested_size) = params.paging()?;
    let page_size = state.query.clamp_page_size(requested_size);
    if page_size != requested_size {
        tracing::debug!(requested_size, page_size, "Clamped page size");
    }

    let mut search_input = params.filter.describe();
    search_input.push(format!("Page No: {}", page_no));
    search_input.push(format!("Page Size: {}", page_size));
    state
        .service
        .record_usage("/getPageableResult", caller_identity(&headers), search_input)
        .await;

    let details = state.service.search_page(&params.filter, page_no, page_size)?;

    Ok(Json(SearchResultMetadata {
        count: details.len() as u64,
        details: Some(details),
    }))
}

/// Unpaged search
pub async fn get_all_results(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: std::result::Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<SearchResultMetadata>> {
    let Query(pairs) = query?;
    let params = SearchParams::from_pairs(&pairs);

    state
        .service
        .record_usage("/getAllResults", caller_identity(&headers), params.filter.describe())
        .await;

    let details = state.service.search_all(&params.filter)?;

    Ok(Json(SearchResultMetadata {
        count: details.len() as u64,
        details: Some(details),
    }))
}

/// Count-only search
pub async fn get_total_count_all_results(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: std::result::Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<SearchResultMetadata>> {
    let Query(pairs) = query?;
    let params = SearchParams::from_pairs(&pairs);

    state
        .service
        .record_usage(
            "/getTotalCountAllResults",
            caller_identity(&headers),
            params.filter.describe(),
        )
        .await;

    let count = state.service.count(&params.filter)?;

    Ok(Json(SearchResultMetadata {
        count,
        details: None,
    }))
}

/// Every known version
pub async fn get_distinct_cramer_versions(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    Ok(Json(state.service.distinct_versions()?))
}

/// Every known module
pub async fn get_distinct_modules(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    Ok(Json(state.service.distinct_modules()?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnderlyingQuery {
    pub latest_ecp: String,
}

/// Hotfixes rolled into `latestEcp`
pub async fn get_underlying_hfs(
    State(state): State<AppState>,
    query: std::result::Result<Query<UnderlyingQuery>, QueryRejection>,
) -> Result<Json<UnderlyingHfMetadata>> {
    let Query(params) = query?;
    let details = state.service.underlying_hotfixes(&params.latest_ecp)?;

    Ok(Json(UnderlyingHfMetadata {
        count: details.len(),
        details,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotfixQuery {
    pub ecp_no: String,
}

/// Exact lookup by hotfix number
pub async fn get_hotfix(
    State(state): State<AppState>,
    query: std::result::Result<Query<HotfixQuery>, QueryRejection>,
) -> Result<Json<HotfixRecord>> {
    let Query(params) = query?;
    state
        .service
        .get_hotfix(&params.ecp_no)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Hotfix {} not found", params.ecp_no)))
}

/// Catalog and usage statistics
pub async fn get_summary(State(state): State<AppState>) -> Result<Json<HotfixSummary>> {
    Ok(Json(state.service.summary().await?))
}

#[derive(Debug, Deserialize)]
pub struct UserDetailsQuery {
    pub host: Option<String>,
}

/// Usage log entries, newest first
pub async fn get_user_details(
    State(state): State<AppState>,
    query: std::result::Result<Query<UserDetailsQuery>, QueryRejection>,
) -> Result<Json<Vec<UsageLogEntry>>> {
    let Query(params) = query?;
    Ok(Json(state.service.usage_entries(params.host.as_deref()).await?))
}

/// Reload the catalog from its configured source
pub async fn reload_catalog(State(state): State<AppState>) -> Result<Json<GenerationStats>> {
    Ok(Json(state.service.reload().await?))
}

/// Prometheus metrics endpoint
///
/// Returns metrics in Prometheus text exposition format
pub async fn metrics() -> (StatusCode, String) {
    let metrics = crate::metrics::gather_metrics();
    (StatusCode::OK, metrics)
}

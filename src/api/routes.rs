use crate::api::{handlers, AppState};
use crate::metrics::track_metrics;
use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

/// Base path of the hotfix endpoints
pub const BASE_PATH: &str = "/HFLogViewer";

/// Build the main API router
pub fn build_router(state: AppState) -> Router {
    let hotfix_routes = Router::new()
        // Search
        .route("/getPageableResult", get(handlers::get_pageable_result))
        .route("/getAllResults", get(handlers::get_all_results))
        .route("/getTotalCountAllResults", get(handlers::get_total_count_all_results))
        // Lookups
        .route("/getDistinctCramerVersions", get(handlers::get_distinct_cramer_versions))
        .route("/getDistinctModules", get(handlers::get_distinct_modules))
        .route("/getUnderlyingHFs", get(handlers::get_underlying_hfs))
        .route("/getHotfix", get(handlers::get_hotfix))
        // Statistics and audit
        .route("/getSummary", get(handlers::get_summary))
        .route("/getUserDetails", get(handlers::get_user_details))
        // Administration
        .route("/reload", post(handlers::reload_catalog));

    let mut router = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health_check))
        .nest(BASE_PATH, hotfix_routes);

    if state.metrics_enabled {
        router = router.route("/metrics", get(handlers::metrics));
    }

    let cors = cors_layer(&state.server.cors_allow_origin);

    router
        // Add state
        .with_state(state)
        // Add middleware
        .layer(middleware::from_fn(track_metrics))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(cors)
}

/// CORS policy for the configured `Access-Control-Allow-Origin` value
fn cors_layer(origin: &str) -> CorsLayer {
    if origin.trim() == "*" {
        return CorsLayer::permissive();
    }

    match HeaderValue::from_str(origin.trim()) {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(e) => {
            tracing::warn!(origin = %origin, error = %e, "Invalid CORS origin, allowing any origin");
            CorsLayer::permissive()
        }
    }
}

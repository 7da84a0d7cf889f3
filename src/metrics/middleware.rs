//! HTTP middleware recording request count, duration and in-flight requests

use super::{HTTP_CONNECTIONS_ACTIVE, HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS};
use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

/// Paths that are scraped or probed too often to be worth recording
const EXCLUDED_PATHS: &[&str] = &["/health", "/metrics"];

/// Path label for requests that matched no route
const UNMATCHED_PATH: &str = "unmatched";

/// Axum middleware function for metrics collection
///
/// # Example
/// ```no_run
/// use axum::{Router, middleware};
/// use hotfix_viewer::metrics::track_metrics;
///
/// let app: Router = Router::new()
///     .layer(middleware::from_fn(track_metrics));
/// ```
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    // Label by route template; unrouted requests share one label
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_PATH.to_string());

    if EXCLUDED_PATHS.contains(&path.as_str()) {
        return next.run(req).await;
    }

    HTTP_CONNECTIONS_ACTIVE.inc();

    let start = Instant::now();
    let response = next.run(req).await;

    HTTP_CONNECTIONS_ACTIVE.dec();

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[&method, &path])
        .observe(duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_track_metrics_records_matched_route() {
        let app = Router::new()
            .route("/HFLogViewer/items/:id", get(|| async { "ok" }))
            .layer(middleware::from_fn(track_metrics));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/HFLogViewer/items/42?x=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let value = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/HFLogViewer/items/:id", "200"])
            .get();
        assert!(value >= 1.0);
    }

    #[tokio::test]
    async fn test_excluded_paths_are_not_recorded() {
        let app = Router::new()
            .route("/health", get(|| async { "OK" }))
            .layer(middleware::from_fn(track_metrics));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let value = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/health", "200"])
            .get();
        assert_eq!(value, 0.0);
    }

    #[tokio::test]
    async fn test_unrouted_requests_share_one_label() {
        let app = Router::new()
            .route("/HFLogViewer/getAllResults", get(|| async { "ok" }))
            .layer(middleware::from_fn(track_metrics));

        for uri in ["/scan/a1", "/scan/b2"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }

        let value = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", UNMATCHED_PATH, "404"])
            .get();
        assert!(value >= 2.0);
        let raw = HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/scan/a1", "404"])
            .get();
        assert_eq!(raw, 0.0);
    }
}

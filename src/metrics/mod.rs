//! Prometheus metrics for the hotfix viewer.
//!
//! Covers HTTP traffic, query execution, catalog reloads and usage logging.
//! All metrics live in one process-wide registry and are exported in text
//! format on `/metrics`.
//!
//! # Example
//! ```no_run
//! use hotfix_viewer::metrics::HTTP_REQUESTS_TOTAL;
//!
//! HTTP_REQUESTS_TOTAL
//!     .with_label_values(&["GET", "/health", "200"])
//!     .inc();
//! ```

pub mod middleware;

pub use middleware::track_metrics;

use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, GaugeVec, Histogram, HistogramOpts, HistogramVec, Opts, Registry,
};

const NAMESPACE: &str = "hotfix_viewer";

lazy_static! {
    /// Global Prometheus registry for all metrics
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();

    // ============================================================================
    // HTTP Metrics
    // ============================================================================

    /// Total number of HTTP requests received
    ///
    /// Labels: method, path, status_code
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests")
            .namespace(NAMESPACE),
        &["method", "path", "status_code"]
    ).expect("Failed to create HTTP_REQUESTS_TOTAL metric");

    /// HTTP request duration in seconds
    ///
    /// Labels: method, path
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create HTTP_REQUEST_DURATION_SECONDS metric");

    /// Number of in-flight HTTP requests
    pub static ref HTTP_CONNECTIONS_ACTIVE: Gauge = Gauge::with_opts(
        Opts::new("http_connections_active", "Number of in-flight HTTP requests")
            .namespace(NAMESPACE)
    ).expect("Failed to create HTTP_CONNECTIONS_ACTIVE metric");

    // ============================================================================
    // Query Metrics
    // ============================================================================

    /// Total number of hotfix queries executed
    ///
    /// Labels: operation (all, page, count), outcome (success, failure)
    pub static ref QUERIES_TOTAL: CounterVec = CounterVec::new(
        Opts::new("queries_total", "Total number of hotfix queries executed")
            .namespace(NAMESPACE),
        &["operation", "outcome"]
    ).expect("Failed to create QUERIES_TOTAL metric");

    /// Query execution duration in seconds
    ///
    /// Labels: operation
    pub static ref QUERY_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "query_duration_seconds",
            "Hotfix query duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
        &["operation"]
    ).expect("Failed to create QUERY_DURATION_SECONDS metric");

    /// Records skipped during evaluation because they failed validation
    pub static ref RECORD_FAULTS_TOTAL: Counter = Counter::with_opts(
        Opts::new("record_faults_total", "Records excluded from results because they could not be evaluated")
            .namespace(NAMESPACE)
    ).expect("Failed to create RECORD_FAULTS_TOTAL metric");

    // ============================================================================
    // Catalog Metrics
    // ============================================================================

    /// Total number of catalog reloads
    ///
    /// Labels: status (success, failure)
    pub static ref CATALOG_RELOADS_TOTAL: CounterVec = CounterVec::new(
        Opts::new("catalog_reloads_total", "Total number of catalog reloads")
            .namespace(NAMESPACE),
        &["status"]
    ).expect("Failed to create CATALOG_RELOADS_TOTAL metric");

    /// Catalog reload duration in seconds
    pub static ref CATALOG_RELOAD_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "catalog_reload_duration_seconds",
            "Catalog reload duration in seconds"
        )
        .namespace(NAMESPACE)
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0])
    ).expect("Failed to create CATALOG_RELOAD_DURATION_SECONDS metric");

    /// Records in the currently published generation
    pub static ref CATALOG_RECORDS: Gauge = Gauge::with_opts(
        Opts::new("catalog_records", "Records in the currently published catalog generation")
            .namespace(NAMESPACE)
    ).expect("Failed to create CATALOG_RECORDS metric");

    // ============================================================================
    // Usage Log Metrics
    // ============================================================================

    /// Total number of usage log writes
    ///
    /// Labels: backend
    pub static ref USAGE_LOG_ENTRIES_TOTAL: CounterVec = CounterVec::new(
        Opts::new("usage_log_entries_total", "Total number of usage log entries written")
            .namespace(NAMESPACE),
        &["backend"]
    ).expect("Failed to create USAGE_LOG_ENTRIES_TOTAL metric");

    /// Usage log writes that failed and were dropped
    ///
    /// Labels: backend
    pub static ref USAGE_LOG_FAILURES_TOTAL: CounterVec = CounterVec::new(
        Opts::new("usage_log_failures_total", "Total number of failed usage log writes")
            .namespace(NAMESPACE),
        &["backend"]
    ).expect("Failed to create USAGE_LOG_FAILURES_TOTAL metric");

    // ============================================================================
    // System Metrics
    // ============================================================================

    /// Build information
    ///
    /// Labels: version
    pub static ref BUILD_INFO: GaugeVec = GaugeVec::new(
        Opts::new("build_info", "Build information")
            .namespace(NAMESPACE),
        &["version"]
    ).expect("Failed to create BUILD_INFO metric");
}

/// Register every metric with [`PROMETHEUS_REGISTRY`].
///
/// Returns an error if a metric is already registered, which only happens when
/// this is called more than once per process.
pub fn init_metrics() -> Result<(), prometheus::Error> {
    // Register HTTP metrics
    PROMETHEUS_REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(HTTP_CONNECTIONS_ACTIVE.clone()))?;

    // Register query metrics
    PROMETHEUS_REGISTRY.register(Box::new(QUERIES_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(QUERY_DURATION_SECONDS.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(RECORD_FAULTS_TOTAL.clone()))?;

    // Register catalog metrics
    PROMETHEUS_REGISTRY.register(Box::new(CATALOG_RELOADS_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(CATALOG_RELOAD_DURATION_SECONDS.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(CATALOG_RECORDS.clone()))?;

    // Register usage log metrics
    PROMETHEUS_REGISTRY.register(Box::new(USAGE_LOG_ENTRIES_TOTAL.clone()))?;
    PROMETHEUS_REGISTRY.register(Box::new(USAGE_LOG_FAILURES_TOTAL.clone()))?;

    PROMETHEUS_REGISTRY.register(Box::new(BUILD_INFO.clone()))?;
    BUILD_INFO
        .with_label_values(&[env!("CARGO_PKG_VERSION")])
        .set(1.0);

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

/// Generate Prometheus text format metrics for the `/metrics` endpoint
pub fn gather_metrics() -> String {
    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Failed to convert metrics to string: {}", e);
        String::from("# Error converting metrics\n")
    })
}

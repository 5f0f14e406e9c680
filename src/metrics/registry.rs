use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Error presentation metrics
    pub static ref ERRORS_PRESENTED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "errors_presented_total",
        "Errors presented to clients",
        &["transport", "fault"]  // transport: rest, graphql; fault: client, server
    )
    .unwrap();

    pub static ref PANICS_RECOVERED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "panics_recovered_total",
        "Panics recovered while serving a request",
        &["transport"]
    )
    .unwrap();

    // Database Metrics
    pub static ref DATABASE_QUERIES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "database_queries_total",
        "Total database queries",
        &["query_type"]  // query_type: select, insert, delete
    )
    .unwrap();

    pub static ref DATABASE_QUERY_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "database_query_duration_seconds",
        "Database query duration in seconds",
        &["query_type"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .unwrap();

    // Background job metrics
    pub static ref JOBS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "jobs_total",
        "Background jobs processed",
        &["job", "outcome"]  // outcome: enqueued, succeeded, failed
    )
    .unwrap();

    pub static ref JOB_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "job_duration_seconds",
        "Background job duration in seconds",
        &["job"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .unwrap();
}

/// Initialize all metrics (called on startup)
pub fn init_metrics() {
    // Force lazy_static initialization
    lazy_static::initialize(&HTTP_REQUESTS_TOTAL);
    lazy_static::initialize(&HTTP_REQUEST_DURATION_SECONDS);
    lazy_static::initialize(&ERRORS_PRESENTED_TOTAL);
    lazy_static::initialize(&PANICS_RECOVERED_TOTAL);
    lazy_static::initialize(&DATABASE_QUERIES_TOTAL);
    lazy_static::initialize(&DATABASE_QUERY_DURATION_SECONDS);
    lazy_static::initialize(&JOBS_TOTAL);
    lazy_static::initialize(&JOB_DURATION_SECONDS);
}

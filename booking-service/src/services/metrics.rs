//! Prometheus metrics for booking-service.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec,
    HistogramVec, TextEncoder,
};

/// HTTP request counter by method, matched route and status.
pub static HTTP_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "booking_http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .expect("Failed to register http_requests_total")
});

/// HTTP request duration histogram by method and matched route.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "booking_http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    )
    .expect("Failed to register http_request_duration")
});

/// Bookings created or moved into a status.
pub static BOOKINGS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "booking_bookings_total",
        "Total number of bookings entering each status",
        &["status"] // inquiry, quoted, confirmed, completed, cancelled
    )
    .expect("Failed to register bookings_total")
});

/// Line item writes by service type and operation.
pub static LINE_ITEM_MUTATIONS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "booking_line_item_mutations_total",
        "Total number of line item writes",
        &["service_type", "operation"] // create, update, delete
    )
    .expect("Failed to register line_item_mutations_total")
});

/// Aggregate recomputations by outcome.
pub static AGGREGATE_RECOMPUTES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "booking_aggregate_recomputes_total",
        "Total number of booking aggregate recomputations",
        &["outcome"] // ok, inconsistent
    )
    .expect("Failed to register aggregate_recomputes_total")
});

/// Booking code allocation attempts that hit a taken code.
pub static CODE_ALLOCATION_RETRIES_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "booking_code_allocation_retries_total",
        "Total number of booking code allocation retries"
    )
    .expect("Failed to register code_allocation_retries_total")
});

/// Error counter for alerting.
pub static ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "booking_errors_total",
        "Total number of errors by code",
        &["code"]
    )
    .expect("Failed to register errors_total")
});

/// Database query duration histogram.
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "booking_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .expect("Failed to register db_query_duration")
});

/// Client payment amount counter by currency.
pub static CLIENT_PAYMENT_AMOUNT_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "booking_client_payment_amount_total",
        "Total client payment amount by currency",
        &["currency"]
    )
    .expect("Failed to register client_payment_amount_total")
});

/// Initialize all metrics (forces lazy initialization).
pub fn init_metrics() {
    Lazy::force(&HTTP_REQUESTS_TOTAL);
    Lazy::force(&HTTP_REQUEST_DURATION);
    Lazy::force(&BOOKINGS_TOTAL);
    Lazy::force(&LINE_ITEM_MUTATIONS_TOTAL);
    Lazy::force(&AGGREGATE_RECOMPUTES_TOTAL);
    Lazy::force(&CODE_ALLOCATION_RETRIES_TOTAL);
    Lazy::force(&ERRORS_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&CLIENT_PAYMENT_AMOUNT_TOTAL);
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}

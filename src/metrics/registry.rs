// Prometheus metrics registry and collectors
// Author: kelexine (https://github.com/kelexine)

use lazy_static::lazy_static;
use prometheus::{
    CounterVec, HistogramVec, IntGauge, Opts, Registry, TextEncoder, Encoder,
    register_counter_vec_with_registry, register_histogram_vec_with_registry,
    register_int_gauge_with_registry,
};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // INGRESS METRICS
    // ============================================================================

    /// Inbound HTTP requests on the FHIR endpoints
    pub static ref INGRESS_REQUESTS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("ingress_requests_total", "Total inbound FHIR requests"),
        &["method", "endpoint", "status_code"],
        REGISTRY
    ).unwrap();

    /// Requests waiting for a worker
    pub static ref QUEUE_DEPTH: IntGauge = register_int_gauge_with_registry!(
        Opts::new("queue_depth", "Requests queued and not yet picked up"),
        REGISTRY
    ).unwrap();

    // ============================================================================
    // EXCHANGE METRICS
    // ============================================================================

    /// Completed exchanges by outcome
    pub static ref EXCHANGES_TOTAL: CounterVec = register_counter_vec_with_registry!(
        Opts::new("exchanges_total", "Total completed exchanges"),
        &["outcome"], // outcome: success, transport_error, application_fault, client_error, internal_error
        REGISTRY
    ).unwrap();

    /// End-to-end pipeline duration
    pub static ref EXCHANGE_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("exchange_duration_seconds", "Pipeline duration in seconds")
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["outcome"],
        REGISTRY
    ).unwrap();

    // ============================================================================
    // SPINE METRICS
    // ============================================================================

    /// Spine calls by status class
    pub static ref BACKEND_CALLS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("spine_calls_total", "Total Spine PDS calls"),
        &["status"], // status: 2xx, 4xx, 5xx, connection_failure, body_failure
        REGISTRY
    ).unwrap();

    /// Spine call duration
    pub static ref BACKEND_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("spine_call_duration_seconds", "Spine PDS call duration")
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["status"],
        REGISTRY
    ).unwrap();

    // ============================================================================
    // AUDIT METRICS
    // ============================================================================

    /// Audit file writes
    pub static ref AUDIT_WRITES: CounterVec = register_counter_vec_with_registry!(
        Opts::new("audit_writes_total", "Total audit record writes"),
        &["direction", "result"], // result: ok, error
        REGISTRY
    ).unwrap();
}

/// Gather all metrics and return as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

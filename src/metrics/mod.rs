// Metrics module for Prometheus observability
// Author: kelexine (https://github.com/kelexine)

mod registry;

pub use registry::{
    gather_metrics,
    INGRESS_REQUESTS,
    QUEUE_DEPTH,
    EXCHANGES_TOTAL,
    EXCHANGE_DURATION,
    BACKEND_CALLS,
    BACKEND_DURATION,
    AUDIT_WRITES,
};

/// Helper to record ingress metrics
pub fn record_ingress(method: &str, endpoint: &str, status_code: u16) {
    INGRESS_REQUESTS
        .with_label_values(&[method, endpoint, &status_code.to_string()])
        .inc();
}

/// Helper to record a finished exchange
pub fn record_exchange(outcome: &str, duration_secs: f64) {
    EXCHANGES_TOTAL.with_label_values(&[outcome]).inc();
    EXCHANGE_DURATION
        .with_label_values(&[outcome])
        .observe(duration_secs);
}

/// Helper to record Spine call metrics
pub fn record_backend_call(status: &str, duration_secs: f64) {
    BACKEND_CALLS.with_label_values(&[status]).inc();
    BACKEND_DURATION
        .with_label_values(&[status])
        .observe(duration_secs);
}

pub fn record_audit_write(direction: &str, ok: bool) {
    let result = if ok { "ok" } else { "error" };
    AUDIT_WRITES.with_label_values(&[direction, result]).inc();
}

pub fn set_queue_depth(depth: usize) {
    QUEUE_DEPTH.set(depth as i64);
}

/// `503` → `"5xx"`
pub fn status_class(status: u16) -> String {
    format!("{}xx", status / 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_class() {
        assert_eq!(status_class(200), "2xx");
        assert_eq!(status_class(503), "5xx");
        assert_eq!(status_class(404), "4xx");
    }
}

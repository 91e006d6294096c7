//! Prometheus metrics for notespace-server.
//!
//! Exposes server metrics in Prometheus format at the `/metrics` endpoint.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder and return a handle for rendering.
///
/// Must be called once at server startup before any metrics are recorded.
pub fn init_metrics() -> PrometheusHandle {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    describe_counter!(
        "notespace_requests_total",
        "Total number of collaboration operations processed"
    );
    describe_histogram!(
        "notespace_request_duration_seconds",
        "Duration of successful collaboration operations in seconds"
    );
    describe_counter!(
        "notespace_errors_total",
        "Total number of failed collaboration operations by error kind"
    );

    handle
}

/// Record a successful operation.
pub fn record_request(operation: &'static str, duration: std::time::Duration) {
    counter!("notespace_requests_total", "operation" => operation, "status" => "ok").increment(1);
    histogram!("notespace_request_duration_seconds", "operation" => operation)
        .record(duration.as_secs_f64());
}

/// Record a failed operation.
pub fn record_error(operation: &'static str, kind: &'static str) {
    counter!("notespace_requests_total", "operation" => operation, "status" => "error")
        .increment(1);
    counter!("notespace_errors_total", "operation" => operation, "kind" => kind).increment(1);
}

/// Times one operation and records it on completion.
pub struct RequestTimer {
    operation: &'static str,
    start: Instant,
}

impl RequestTimer {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }

    pub fn success(self) {
        record_request(self.operation, self.start.elapsed());
    }

    /// Record a failure under the given error kind.
    pub fn error(self, kind: &'static str) {
        record_error(self.operation, kind);
    }
}

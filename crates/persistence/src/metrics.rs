//! Store metrics collection.

use metrics::{counter, histogram};
use std::time::Instant;

/// Record how long a store operation took.
pub fn record_operation_duration(operation: &'static str, duration_secs: f64) {
    histogram!(
        "store_operation_duration_seconds",
        "operation" => operation
    )
    .record(duration_secs);
}

/// Count a failed store operation.
pub fn record_operation_failure(operation: &'static str) {
    counter!("store_operation_failures_total", "operation" => operation).increment(1);
}

/// Times a store operation and records it when finished.
///
/// ```ignore
/// let timer = StoreTimer::new("mutate");
/// let result = backend.write(&snapshot).await;
/// timer.finish(result.is_ok());
/// ```
pub struct StoreTimer {
    operation: &'static str,
    start: Instant,
}

impl StoreTimer {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration, and a failure if `ok` is false.
    pub fn finish(self, ok: bool) {
        record_operation_duration(self.operation, self.start.elapsed().as_secs_f64());
        if !ok {
            record_operation_failure(self.operation);
        }
    }
}

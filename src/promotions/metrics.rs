// Performance metrics for the promotion engine
//
// Tracks call counts, execution times and slow operations per inbound operation,
// plus coupon redemptions and eligibility rejections.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use utoipa::ToSchema;

/// Performance threshold for slow operations (100ms)
const SLOW_OPERATION_THRESHOLD_MS: u64 = 100;

/// Counters for one timed operation
#[derive(Debug, Default)]
struct OperationCounters {
    calls: AtomicU64,
    total_time_us: AtomicU64,
    slow_calls: AtomicU64,
}

impl OperationCounters {
    fn record(&self, name: &str, duration: Duration) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.total_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);

        if duration.as_millis() as u64 > SLOW_OPERATION_THRESHOLD_MS {
            self.slow_calls.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("Slow {} operation: {}ms", name, duration.as_millis());
        }
    }

    fn summary(&self) -> OperationSummary {
        let calls = self.calls.load(Ordering::Relaxed);
        let total_us = self.total_time_us.load(Ordering::Relaxed);

        OperationSummary {
            calls,
            avg_time_ms: if calls == 0 {
                0.0
            } else {
                (total_us as f64 / calls as f64) / 1000.0
            },
            slow_operations: self.slow_calls.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Default)]
struct MetricsInner {
    availability: OperationCounters,
    validation: OperationCounters,
    apply: OperationCounters,
    redemptions: AtomicU64,
    rejections: AtomicU64,
}

/// Performance metrics for the promotion engine
#[derive(Debug, Clone, Default)]
pub struct PromoMetrics {
    inner: Arc<MetricsInner>,
}

impl PromoMetrics {
    /// Create a new PromoMetrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Start timing an availability query
    pub fn start_availability_query(&self) -> OperationTimer {
        OperationTimer::new(OperationType::Availability, self.clone())
    }

    /// Start timing a coupon validation
    pub fn start_coupon_validation(&self) -> OperationTimer {
        OperationTimer::new(OperationType::Validation, self.clone())
    }

    /// Start timing an apply call
    pub fn start_apply(&self) -> OperationTimer {
        OperationTimer::new(OperationType::Apply, self.clone())
    }

    /// Record a committed coupon redemption
    pub fn record_redemption(&self) {
        self.inner.redemptions.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an eligibility rejection returned to a caller
    pub fn record_rejection(&self) {
        self.inner.rejections.fetch_add(1, Ordering::Relaxed);
    }

    fn counters(&self, operation_type: OperationType) -> &OperationCounters {
        match operation_type {
            OperationType::Availability => &self.inner.availability,
            OperationType::Validation => &self.inner.validation,
            OperationType::Apply => &self.inner.apply,
        }
    }

    /// Get metrics summary
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            availability: self.inner.availability.summary(),
            validation: self.inner.validation.summary(),
            apply: self.inner.apply.summary(),
            redemptions: self.inner.redemptions.load(Ordering::Relaxed),
            rejections: self.inner.rejections.load(Ordering::Relaxed),
        }
    }
}

/// Type of operation being timed
#[derive(Debug, Clone, Copy)]
enum OperationType {
    Availability,
    Validation,
    Apply,
}

impl OperationType {
    fn name(&self) -> &'static str {
        match self {
            OperationType::Availability => "availability",
            OperationType::Validation => "validation",
            OperationType::Apply => "apply",
        }
    }
}

/// Timer for tracking operation duration; records on drop
pub struct OperationTimer {
    start: Instant,
    operation_type: OperationType,
    metrics: PromoMetrics,
}

impl OperationTimer {
    fn new(operation_type: OperationType, metrics: PromoMetrics) -> Self {
        Self {
            start: Instant::now(),
            operation_type,
            metrics,
        }
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.metrics
            .counters(self.operation_type)
            .record(self.operation_type.name(), duration);
    }
}

/// Per-operation figures
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OperationSummary {
    pub calls: u64,
    pub avg_time_ms: f64,
    pub slow_operations: u64,
}

/// Summary of performance metrics
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MetricsSummary {
    pub availability: OperationSummary,
    pub validation: OperationSummary,
    pub apply: OperationSummary,
    pub redemptions: u64,
    pub rejections: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_metrics_creation() {
        let summary = PromoMetrics::new().summary();
        assert_eq!(summary.apply.calls, 0);
        assert_eq!(summary.apply.avg_time_ms, 0.0);
        assert_eq!(summary.redemptions, 0);
    }

    #[test]
    fn test_operation_timer() {
        let metrics = PromoMetrics::new();

        {
            let _timer = metrics.start_availability_query();
            thread::sleep(Duration::from_millis(10));
        }

        let summary = metrics.summary();
        assert_eq!(summary.availability.calls, 1);
        assert!(summary.availability.avg_time_ms >= 10.0);
        assert_eq!(summary.validation.calls, 0);
    }

    #[test]
    fn test_slow_operation_detection() {
        let metrics = PromoMetrics::new();

        {
            let _timer = metrics.start_apply();
            thread::sleep(Duration::from_millis(150));
        }

        assert_eq!(metrics.summary().apply.slow_operations, 1);
    }

    #[test]
    fn test_counters_are_shared_between_clones() {
        let metrics = PromoMetrics::new();
        let clone = metrics.clone();

        clone.record_redemption();
        clone.record_rejection();
        clone.record_rejection();

        let summary = metrics.summary();
        assert_eq!(summary.redemptions, 1);
        assert_eq!(summary.rejections, 2);
    }
}

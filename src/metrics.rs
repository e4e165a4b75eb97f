// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the Doris operator.
//!
//! All metrics carry the namespace prefix `doris_kubedoop_dev_` (prometheus-safe
//! version of "doris.kubedoop.dev").
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Reconcile outcomes, durations and requeues
//! - **Resource Metrics** - Objects handed to server-side apply
//! - **Cluster Metrics** - Readiness of each `DorisCluster` and its role-groups
//! - **Error Metrics** - Failures by category
//!
//! # Example
//!
//! ```rust,no_run
//! use doris_operator::metrics::record_reconciliation_success;
//!
//! record_reconciliation_success("DorisCluster", std::time::Duration::from_secs(1));
//! ```

use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

/// Namespace prefix for all operator metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "doris_kubedoop_dev";

/// Global Prometheus metrics registry, exposed on `/metrics`.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconciliations by resource type and status
///
/// Labels:
/// - `resource_type`: Kind of resource (`DorisCluster`)
/// - `status`: Outcome (`success`, `error`)
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of reconciliations by resource type and status",
    );
    let counter = CounterVec::new(opts, &["resource_type", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconciliations in seconds
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of reconciliations in seconds by resource type",
    )
    .buckets(vec![0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = HistogramVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Total number of requeues
///
/// Labels:
/// - `resource_type`: Kind of resource
/// - `reason`: `ready`, `not_ready` or `error`
pub static REQUEUE_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_requeues_total"),
        "Total number of requeue operations by resource type and reason",
    );
    let counter = CounterVec::new(opts, &["resource_type", "reason"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Resource Metrics
// ============================================================================

/// Total number of objects converged through server-side apply, by kind
pub static RESOURCES_APPLIED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_resources_applied_total"),
        "Total number of resources created or applied by kind",
    );
    let counter = CounterVec::new(opts, &["kind"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Whether a cluster is ready (1) or not (0)
///
/// Labels:
/// - `namespace`, `name`: the `DorisCluster`
pub static CLUSTER_READY: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_cluster_ready"),
        "Readiness of each DorisCluster (1 = ready)",
    );
    let gauge = GaugeVec::new(opts, &["namespace", "name"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Desired and ready replicas of each role-group `StatefulSet`
///
/// Labels:
/// - `namespace`: namespace of the `DorisCluster`
/// - `stateful_set`: `{cluster}-{role}-{role_group}`
/// - `state`: `desired` or `ready`
pub static ROLE_GROUP_REPLICAS: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_role_group_replicas"),
        "Desired and ready replicas per role-group StatefulSet",
    );
    let gauge = GaugeVec::new(opts, &["namespace", "stateful_set", "state"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

// ============================================================================
// Error Metrics
// ============================================================================

/// Total number of errors by resource type and error category
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of errors by resource type and category",
    );
    let counter = CounterVec::new(opts, &["resource_type", "error_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Recording helpers
// ============================================================================

/// Record a successful reconciliation
pub fn record_reconciliation_success(resource_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "success"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Record a failed reconciliation
pub fn record_reconciliation_error(resource_type: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[resource_type, "error"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[resource_type])
        .observe(duration.as_secs_f64());
}

/// Record a requeue
///
/// # Arguments
/// * `resource_type` - The kind of resource requeued
/// * `reason` - `ready`, `not_ready` or `error`
pub fn record_reconciliation_requeue(resource_type: &str, reason: &str) {
    REQUEUE_TOTAL
        .with_label_values(&[resource_type, reason])
        .inc();
}

/// Record an object handed to server-side apply
pub fn record_resource_applied(kind: &str) {
    RESOURCES_APPLIED_TOTAL.with_label_values(&[kind]).inc();
}

/// Record the readiness of a cluster
pub fn record_cluster_ready(namespace: &str, name: &str, ready: bool) {
    CLUSTER_READY
        .with_label_values(&[namespace, name])
        .set(if ready { 1.0 } else { 0.0 });
}

/// Record desired and ready replicas of a role-group `StatefulSet`
pub fn record_role_group_replicas(namespace: &str, stateful_set: &str, desired: i32, ready: i32) {
    ROLE_GROUP_REPLICAS
        .with_label_values(&[namespace, stateful_set, "desired"])
        .set(f64::from(desired));
    ROLE_GROUP_REPLICAS
        .with_label_values(&[namespace, stateful_set, "ready"])
        .set(f64::from(ready));
}

/// Record an error
///
/// # Arguments
/// * `resource_type` - The kind of resource where the error occurred
/// * `error_type` - Category of error (e.g. `MissingVectorAggregator`, `api_error`)
pub fn record_error(resource_type: &str, error_type: &str) {
    ERRORS_TOTAL
        .with_label_values(&[resource_type, error_type])
        .inc();
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_reconciliation_success() {
        let resource_type = "TestDorisCluster";
        record_reconciliation_success(resource_type, Duration::from_millis(500));

        let counter = RECONCILIATION_TOTAL.with_label_values(&[resource_type, "success"]);
        assert!(counter.get() > 0.0);

        let histogram = RECONCILIATION_DURATION_SECONDS.with_label_values(&[resource_type]);
        assert!(histogram.get_sample_count() > 0);
    }

    #[test]
    fn test_record_reconciliation_error() {
        let resource_type = "TestDorisClusterError";
        record_reconciliation_error(resource_type, Duration::from_millis(250));

        let counter = RECONCILIATION_TOTAL.with_label_values(&[resource_type, "error"]);
        assert!(counter.get() > 0.0);
    }

    #[test]
    fn test_record_cluster_ready_toggles() {
        record_cluster_ready("metrics-test", "analytics", true);
        assert!(
            (CLUSTER_READY
                .with_label_values(&["metrics-test", "analytics"])
                .get()
                - 1.0)
                .abs()
                < f64::EPSILON
        );

        record_cluster_ready("metrics-test", "analytics", false);
        assert!(
            CLUSTER_READY
                .with_label_values(&["metrics-test", "analytics"])
                .get()
                .abs()
                < f64::EPSILON
        );
    }

    #[test]
    fn test_record_role_group_replicas() {
        record_role_group_replicas("metrics-test", "analytics-be-default", 5, 3);
        let desired = ROLE_GROUP_REPLICAS
            .with_label_values(&["metrics-test", "analytics-be-default", "desired"])
            .get();
        let ready = ROLE_GROUP_REPLICAS
            .with_label_values(&["metrics-test", "analytics-be-default", "ready"])
            .get();
        assert!((desired - 5.0).abs() < f64::EPSILON);
        assert!((ready - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_gather_metrics() {
        record_resource_applied("GatherTestKind");

        let metrics_text = gather_metrics().unwrap();
        assert!(metrics_text.contains("doris_kubedoop_dev"));
        assert!(metrics_text.contains("resources_applied_total"));
    }
}

/// Metrics for plan execution.
#[derive(Debug, Clone, prometheus_metric_storage::MetricStorage)]
pub struct Metrics {
    /// Outcomes of plan items by step kind.
    #[metric(labels("kind", "result"))]
    pub plan_items: prometheus::IntCounterVec,
    /// Outcomes of allowance checks.
    #[metric(labels("result"))]
    pub approvals: prometheus::IntCounterVec,
    /// Terminal results of plan executions.
    #[metric(labels("result"))]
    pub executions: prometheus::IntCounterVec,
    /// Requests sent to the aggregator API.
    #[metric(labels("endpoint", "result"))]
    pub aggregator_requests: prometheus::IntCounterVec,
}

/// Setup the metrics registry.
pub fn init() {
    observe::metrics::setup_registry_reentrant(Some("plan_executor".to_owned()), None);
}

/// Get the metrics instance.
pub fn get() -> &'static Metrics {
    Metrics::instance(observe::metrics::get_storage_registry())
        .expect("unexpected error getting metrics instance")
}

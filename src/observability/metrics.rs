use prometheus::{Counter, Registry, register_counter_with_registry};

/// Worker-level Prometheus counters.
#[derive(Debug, Clone)]
pub struct Metrics {
    pub cache_hits: Counter,
    pub cache_misses: Counter,
    pub articles_fetched: Counter,
    pub backend_requests: Counter,
    pub resolver_runs: Counter,
    pub resolver_failures: Counter,
    pub entities_resolved: Counter,
}

impl Metrics {
    /// Registers every counter against the supplied registry.
    ///
    /// # Errors
    /// Returns a [`prometheus::Error`] when a metric name collides.
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        Ok(Self {
            cache_hits: register_counter_with_registry!(
                "signal_memo_cache_hits_total",
                "Total number of memo store hits",
                registry
            )?,
            cache_misses: register_counter_with_registry!(
                "signal_memo_cache_misses_total",
                "Total number of memo store misses",
                registry
            )?,
            articles_fetched: register_counter_with_registry!(
                "signal_articles_fetched_total",
                "Total number of articles fetched from the content source",
                registry
            )?,
            backend_requests: register_counter_with_registry!(
                "signal_backend_requests_total",
                "Total number of classification backend invocations",
                registry
            )?,
            resolver_runs: register_counter_with_registry!(
                "signal_resolver_runs_total",
                "Total number of ensemble resolver invocations",
                registry
            )?,
            resolver_failures: register_counter_with_registry!(
                "signal_resolver_failures_total",
                "Total number of ensemble resolver failures",
                registry
            )?,
            entities_resolved: register_counter_with_registry!(
                "signal_entities_resolved_total",
                "Total number of canonical entities emitted by the resolver",
                registry
            )?,
        })
    }
}

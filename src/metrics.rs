/// Metrics for the group resolution cache
///
/// Prometheus-compatible counters for:
/// - Rebuild attempts by outcome
/// - Lookups by hit/miss
/// - Size of the current mapping
///
/// Each cache owns its registry so several caches (and tests) can coexist
/// in one process; hosts merge `registry()` into their own exporter.
use crate::error::MapperResult;
use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct CacheMetrics {
    registry: Registry,
    rebuilds_total: IntCounterVec,
    lookups_total: IntCounterVec,
    entries: IntGauge,
}

impl CacheMetrics {
    pub fn new() -> MapperResult<Self> {
        let registry = Registry::new();

        let rebuilds_total = IntCounterVec::new(
            Opts::new(
                "entra_group_cache_rebuilds_total",
                "Group mapping rebuild attempts by outcome",
            ),
            &["outcome"],
        )?;
        let lookups_total = IntCounterVec::new(
            Opts::new(
                "entra_group_cache_lookups_total",
                "Group identifier lookups by result",
            ),
            &["result"],
        )?;
        let entries = IntGauge::new(
            "entra_group_cache_entries",
            "Number of groups in the current mapping",
        )?;

        registry.register(Box::new(rebuilds_total.clone()))?;
        registry.register(Box::new(lookups_total.clone()))?;
        registry.register(Box::new(entries.clone()))?;

        Ok(Self {
            registry,
            rebuilds_total,
            lookups_total,
            entries,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_rebuild(&self, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        self.rebuilds_total.with_label_values(&[outcome]).inc();
    }

    pub fn record_lookup(&self, hit: bool) {
        let result = if hit { "hit" } else { "miss" };
        self.lookups_total.with_label_values(&[result]).inc();
    }

    pub fn set_entries(&self, count: usize) {
        self.entries.set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    pub fn rebuilds(&self, success: bool) -> u64 {
        let outcome = if success { "success" } else { "failure" };
        self.rebuilds_total.with_label_values(&[outcome]).get()
    }

    /// Render in Prometheus text exposition format
    pub fn render(&self) -> MapperResult<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

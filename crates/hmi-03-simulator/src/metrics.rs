//! Gateway health metrics simulation.

use std::sync::Arc;

use chrono::Utc;
use hmi_01_uns_registry::seed::metric_tags;
use hmi_01_uns_registry::PathRegistry;
use parking_lot::Mutex;
use shared_bus::{EventPublisher, HmiEvent};
use shared_types::SystemMetrics;
use tracing::trace;

use crate::random::RandomSource;
use crate::walk::RandomWalk;

/// Walk parameters for each metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricWalks {
    pub cpu_usage: RandomWalk,
    pub memory_usage: RandomWalk,
    pub disk_io: RandomWalk,
    /// Floored to whole KB/s after each step.
    pub throughput: RandomWalk,
    pub operations_per_min: RandomWalk,
    pub error_rate: RandomWalk,
}

impl Default for MetricWalks {
    fn default() -> Self {
        Self {
            cpu_usage: RandomWalk::new(15.0, 85.0, 2.5),
            memory_usage: RandomWalk::new(40.0, 90.0, 1.5),
            disk_io: RandomWalk::new(10.0, 95.0, 4.0),
            throughput: RandomWalk::new(500.0, 2500.0, 100.0),
            operations_per_min: RandomWalk::new(400.0, 1200.0, 25.0),
            error_rate: RandomWalk::new(0.0, 500.0, 5.0),
        }
    }
}

pub struct MetricsSimulator {
    registry: Arc<PathRegistry>,
    publisher: Arc<dyn EventPublisher>,
    rng: Arc<dyn RandomSource>,
    walks: MetricWalks,
    current: Mutex<SystemMetrics>,
}

impl MetricsSimulator {
    pub fn new(
        registry: Arc<PathRegistry>,
        publisher: Arc<dyn EventPublisher>,
        rng: Arc<dyn RandomSource>,
    ) -> Self {
        Self::with_walks(registry, publisher, rng, MetricWalks::default())
    }

    pub fn with_walks(
        registry: Arc<PathRegistry>,
        publisher: Arc<dyn EventPublisher>,
        rng: Arc<dyn RandomSource>,
        walks: MetricWalks,
    ) -> Self {
        Self {
            registry,
            publisher,
            rng,
            walks,
            current: Mutex::new(SystemMetrics::default()),
        }
    }

    /// Latest metrics. Values backed by a metric tag are read from the
    /// registry, so external tag writes show up here.
    pub fn snapshot(&self) -> SystemMetrics {
        let mut metrics = self.current.lock().clone();
        if let Some(v) = self.tag_number(metric_tags::CPU_USAGE) {
            metrics.cpu_usage = v;
        }
        if let Some(v) = self.tag_number(metric_tags::MEMORY_USAGE) {
            metrics.memory_usage = v;
        }
        if let Some(v) = self.tag_number(metric_tags::DISK_IO) {
            metrics.disk_io = v;
        }
        if let Some(v) = self.tag_number(metric_tags::THROUGHPUT) {
            metrics.throughput = v.max(0.0) as u64;
        }
        metrics
    }

    /// Advance every metric one step, write the metric tags and push a
    /// `METRICS_UPDATE`.
    pub async fn tick(&self) -> SystemMetrics {
        let start = self.snapshot();
        let walks = &self.walks;

        let next = SystemMetrics {
            cpu_usage: round1(walks.cpu_usage.step(start.cpu_usage, self.rng.next_unit())),
            memory_usage: round1(
                walks.memory_usage.step(start.memory_usage, self.rng.next_unit()),
            ),
            disk_io: round1(walks.disk_io.step(start.disk_io, self.rng.next_unit())),
            throughput: walks
                .throughput
                .step(start.throughput as f64, self.rng.next_unit())
                .floor() as u64,
            operations_per_min: walks
                .operations_per_min
                .step(start.operations_per_min as f64, self.rng.next_unit())
                .round() as u64,
            error_rate: walks
                .error_rate
                .step(start.error_rate as f64, self.rng.next_unit())
                .round() as u64,
            timestamp: Utc::now(),
        };

        self.registry
            .update_tag_value(metric_tags::CPU_USAGE, format!("{:.1}", next.cpu_usage), None);
        self.registry
            .update_tag_value(metric_tags::MEMORY_USAGE, format!("{:.1}", next.memory_usage), None);
        self.registry
            .update_tag_value(metric_tags::DISK_IO, format!("{:.1}", next.disk_io), None);
        self.registry
            .update_tag_value(metric_tags::THROUGHPUT, next.throughput.to_string(), None);

        *self.current.lock() = next.clone();
        let receivers = self
            .publisher
            .publish(HmiEvent::MetricsUpdate(next.clone()))
            .await;
        trace!(cpu = next.cpu_usage, receivers, "Metrics tick");
        next
    }

    fn tag_number(&self, path: &str) -> Option<f64> {
        self.registry
            .get_tag(path)
            .and_then(|tag| tag.value.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SequenceRandomSource;
    use hmi_01_uns_registry::seed_registry;
    use shared_bus::{EventFilter, InMemoryEventBus};

    fn setup(rng: SequenceRandomSource) -> (MetricsSimulator, Arc<InMemoryEventBus>, Arc<PathRegistry>) {
        let registry = Arc::new(PathRegistry::new());
        seed_registry(&registry).unwrap();
        let bus = Arc::new(InMemoryEventBus::new());
        let sim = MetricsSimulator::new(registry.clone(), bus.clone(), Arc::new(rng));
        (sim, bus, registry)
    }

    #[tokio::test]
    async fn test_neutral_tick_keeps_seed_values() {
        let (sim, _bus, registry) = setup(SequenceRandomSource::neutral());
        let metrics = sim.tick().await;
        assert_eq!(metrics.cpu_usage, 25.3);
        assert_eq!(metrics.memory_usage, 67.8);
        assert_eq!(metrics.throughput, 1200);
        assert_eq!(registry.get_tag(metric_tags::CPU_USAGE).unwrap().value, "25.3");
    }

    #[tokio::test]
    async fn test_tick_moves_by_at_most_delta_and_publishes() {
        let (sim, bus, registry) = setup(SequenceRandomSource::new(vec![0.0]));
        let mut sub = bus.subscribe(EventFilter::all());

        let metrics = sim.tick().await;
        assert_eq!(metrics.cpu_usage, 22.8);
        assert_eq!(metrics.memory_usage, 66.3);
        assert_eq!(metrics.disk_io, 38.1);
        assert_eq!(metrics.throughput, 1100);
        assert_eq!(registry.get_tag(metric_tags::THROUGHPUT).unwrap().value, "1100");

        match sub.recv().await.unwrap() {
            HmiEvent::MetricsUpdate(m) => assert_eq!(m.cpu_usage, 22.8),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_snapshot_follows_external_tag_writes() {
        let (sim, _bus, registry) = setup(SequenceRandomSource::neutral());
        registry.update_tag_value(metric_tags::CPU_USAGE, "70.0", None);
        assert_eq!(sim.snapshot().cpu_usage, 70.0);

        registry.update_tag_value(metric_tags::CPU_USAGE, "garbage", None);
        let fallback = sim.snapshot().cpu_usage;
        assert_eq!(fallback, SystemMetrics::default().cpu_usage);
    }

    #[tokio::test]
    async fn test_values_stay_in_bounds_over_many_ticks() {
        let (sim, _bus, _registry) = setup(SequenceRandomSource::new(vec![0.99, 0.98, 0.97]));
        let walks = MetricWalks::default();
        for _ in 0..200 {
            let m = sim.tick().await;
            assert!(m.cpu_usage <= walks.cpu_usage.max);
            assert!(m.memory_usage <= walks.memory_usage.max);
            assert!(m.throughput as f64 <= walks.throughput.max);
            assert!(m.error_rate as f64 <= walks.error_rate.max);
        }
    }
}

//! Prometheus metrics for monitoring
//!
//! Counters and gauges for the admission pipeline, exposed as
//! Prometheus text on the coordinator's `/metrics` route.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Counter metric (monotonically increasing)
pub struct Counter {
    value: AtomicU64,
    name: String,
    help: String,
}

impl Counter {
    /// Create a new counter
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            value: AtomicU64::new(0),
            name: name.into(),
            help: help.into(),
        }
    }

    /// Increment by 1
    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current value
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Format as Prometheus metric
    pub fn to_prometheus(&self) -> String {
        format!(
            "# HELP {} {}\n# TYPE {} counter\n{} {}\n",
            self.name, self.help, self.name, self.name, self.get()
        )
    }
}

/// Gauge metric, overwritten with the container sizes after each decision
pub struct Gauge {
    value: AtomicI64,
    name: String,
    help: String,
}

impl Gauge {
    /// Create a new gauge
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            value: AtomicI64::new(0),
            name: name.into(),
            help: help.into(),
        }
    }

    /// Set value
    pub fn set(&self, val: i64) {
        self.value.store(val, Ordering::Relaxed);
    }

    /// Get current value
    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Format as Prometheus metric
    pub fn to_prometheus(&self) -> String {
        format!(
            "# HELP {} {}\n# TYPE {} gauge\n{} {}\n",
            self.name, self.help, self.name, self.name, self.get()
        )
    }
}

/// Standard BatchSync metrics
pub mod standard {
    use super::*;
    use std::sync::LazyLock;

    pub static ACQUIRE_REQUESTS: LazyLock<Counter> = LazyLock::new(|| {
        Counter::new(
            "batchsync_acquire_requests_total",
            "Total acquire calls received",
        )
    });

    pub static BATCHES_FORMED: LazyLock<Counter> = LazyLock::new(|| {
        Counter::new("batchsync_batches_formed_total", "Total batches formed")
    });

    pub static PERMITS_RELEASED: LazyLock<Counter> = LazyLock::new(|| {
        Counter::new(
            "batchsync_permits_released_total",
            "Total permits released by batch members",
        )
    });

    pub static WAITING_CLIENTS: LazyLock<Gauge> = LazyLock::new(|| {
        Gauge::new(
            "batchsync_waiting_clients",
            "Clients queued for the next batch",
        )
    });

    pub static BATCH_OCCUPANCY: LazyLock<Gauge> = LazyLock::new(|| {
        Gauge::new(
            "batchsync_batch_occupancy",
            "Members of the active batch still holding a permit",
        )
    });
}

/// Helper to gather all standard metrics
pub fn gather_system_metrics() -> String {
    let mut output = String::new();

    // Counters
    output.push_str(&standard::ACQUIRE_REQUESTS.to_prometheus());
    output.push_str(&standard::BATCHES_FORMED.to_prometheus());
    output.push_str(&standard::PERMITS_RELEASED.to_prometheus());

    // Gauges
    output.push_str(&standard::WAITING_CLIENTS.to_prometheus());
    output.push_str(&standard::BATCH_OCCUPANCY.to_prometheus());

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_only_climbs() {
        let counter = Counter::new("test_counter", "Test counter");
        assert_eq!(counter.get(), 0);

        counter.inc();
        counter.inc();
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn test_gauge_tracks_latest_value() {
        let gauge = Gauge::new("test_gauge", "Test gauge");
        assert_eq!(gauge.get(), 0);

        gauge.set(3);
        gauge.set(0);
        assert_eq!(gauge.get(), 0);
    }

    #[test]
    fn test_prometheus_format() {
        let counter = Counter::new("demo_total", "Demo");
        counter.inc();

        let text = counter.to_prometheus();
        assert!(text.contains("# TYPE demo_total counter"));
        assert!(text.contains("demo_total 1"));
    }
}

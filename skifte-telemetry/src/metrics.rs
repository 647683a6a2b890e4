//! ## skifte-telemetry::metrics
//! **Prometheus registry with run counters**
//!
//! One recorder per process; independent simulation runs share it,
//! which is safe because counters only ever go up.

use prometheus::{Counter, Histogram, HistogramOpts, IntGauge, Registry};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub attack_operations: Counter,
    pub mtd_executed: Counter,
    pub mtd_suspended: Counter,
    pub interrupts: Counter,
    pub mtd_execution_ns: Histogram,
    pub compromised_hosts: IntGauge,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        let registry = Registry::new();
        let attack_operations = Counter::new(
            "skifte_attack_operations_total",
            "Completed or interrupted attack phase operations",
        )
        .unwrap();
        let mtd_executed = Counter::new(
            "skifte_mtd_executed_total",
            "MTD strategy executions that ran to completion",
        )
        .unwrap();
        let mtd_suspended = Counter::new(
            "skifte_mtd_suspended_total",
            "MTD strategies parked because their resource was occupied",
        )
        .unwrap();
        let interrupts = Counter::new(
            "skifte_interrupts_total",
            "Attack phase waits cancelled by an MTD execution",
        )
        .unwrap();
        let mtd_execution_ns = Histogram::with_opts(
            HistogramOpts::new(
                "skifte_mtd_execution_ns",
                "Virtual time spent executing MTD strategies",
            )
            .buckets(vec![
                1e9, 1e10, 3e10, 6e10, 1.2e11, 2.4e11, 6e11,
            ]),
        )
        .unwrap();
        let compromised_hosts = IntGauge::new(
            "skifte_compromised_hosts",
            "Compromised host count at the end of the latest run",
        )
        .unwrap();

        registry
            .register(Box::new(attack_operations.clone()))
            .unwrap();
        registry.register(Box::new(mtd_executed.clone())).unwrap();
        registry.register(Box::new(mtd_suspended.clone())).unwrap();
        registry.register(Box::new(interrupts.clone())).unwrap();
        registry
            .register(Box::new(mtd_execution_ns.clone()))
            .unwrap();
        registry
            .register(Box::new(compromised_hosts.clone()))
            .unwrap();

        Self {
            registry,
            attack_operations,
            mtd_executed,
            mtd_suspended,
            interrupts,
            mtd_execution_ns,
            compromised_hosts,
        }
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = MetricsRecorder::new();
        metrics.attack_operations.inc();
        metrics.attack_operations.inc();
        metrics.interrupts.inc();
        assert_eq!(metrics.attack_operations.get() as u64, 2);
        assert_eq!(metrics.interrupts.get() as u64, 1);
    }

    #[test]
    fn gather_exposes_metric_names() {
        let metrics = MetricsRecorder::new();
        metrics.mtd_executed.inc();
        let text = metrics.gather_metrics().unwrap();
        assert!(text.contains("skifte_mtd_executed_total"));
        assert!(text.contains("skifte_attack_operations_total"));
    }
}

//! ## skifte-telemetry::logging
//! **Structured logging with tracing and OpenTelemetry**
//!
//! ### Expectations:
//! - Negligible overhead against simulation throughput
//! - `RUST_LOG` always wins over configured defaults
//!
//! ### Components:
//! - `metrics/`: Prometheus registry with run counters
//! - `logging/`: span-scoped event logger

use opentelemetry::KeyValue;
use tracing::{info_span, Instrument};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the fmt subscriber with an env-filter defaulting to
    /// `info`.
    pub fn init() {
        Self::init_with_level("info")
    }

    /// Installs the fmt subscriber; `default_level` applies when
    /// `RUST_LOG` is unset.
    pub fn init_with_level(default_level: &str) {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new(default_level)),
            )
            .with_thread_names(true)
            .with_span_events(FmtSpan::ENTER)
            .init()
    }

    /// Emits one structured simulation event inside a dedicated span.
    pub async fn log_event(event_type: &str, metadata: Vec<KeyValue>) {
        let span = info_span!(
            "simulation_event",
            event_type = event_type,
            otel.kind = "INTERNAL"
        );

        async {
            tracing::info!(
                metadata = ?metadata,
                "Simulation event occurred"
            );
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn test_logging() {
        tokio::runtime::Runtime::new()
            .unwrap()
            .block_on(EventLogger::log_event(
                "test",
                vec![KeyValue::new("key", "value")],
            ));
        assert!(logs_contain("Simulation event occurred"));
    }
}

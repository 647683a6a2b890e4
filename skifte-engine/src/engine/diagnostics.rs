use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use skifte_core::SimulationError;

use crate::engine::report::SimulationReport;

/// Collects run diagnostics; on a hash mismatch the offending report
/// is written out for offline triage.
#[derive(Debug, Default)]
pub struct DiagnosticsCollector {
    bug_reports: Vec<String>,
}

impl DiagnosticsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_bug_report(&mut self, report: &str) -> std::io::Result<String> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        let filename = format!("skifte_bug_report_{timestamp}.yaml");
        fs::write(&filename, report)?;
        self.bug_reports.push(filename.clone());
        Ok(filename)
    }

    pub fn bug_reports(&self) -> &[String] {
        &self.bug_reports
    }
}

/// Compares a run's state hash against an expected value, writing a
/// bug report on mismatch.
pub fn validate_state_hash(
    expected: &str,
    report: &SimulationReport,
    diagnostics: &mut DiagnosticsCollector,
) -> Result<(), SimulationError> {
    if report.state_hash == expected {
        tracing::info!("state hash validated");
        return Ok(());
    }

    let summary = format!(
        "State hash mismatch!\nExpected: {}\nActual: {}\nScheme: {}\nSeed: {}\nOutcome: {:?}",
        expected, report.state_hash, report.scheme, report.seed, report.outcome
    );
    match diagnostics.record_bug_report(&summary) {
        Ok(filename) => tracing::error!(file = %filename, "bug report saved"),
        Err(e) => tracing::error!(error = %e, "failed to write bug report"),
    }
    Err(SimulationError::Validation(summary))
}

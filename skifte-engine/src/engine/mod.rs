mod diagnostics;
mod events;
mod report;
mod runtime;

pub use self::{
    diagnostics::{validate_state_hash, DiagnosticsCollector},
    report::{HostSnapshot, KindSummary, MtdSummary, ServiceSnapshot, SimulationOutcome, SimulationReport},
    runtime::SimulationRuntime,
};

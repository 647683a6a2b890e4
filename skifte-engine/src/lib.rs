//! # skifte-engine
//!
//! The simulation runtime: wires the adversary and the MTD scheduler
//! onto one virtual clock and drives the run to a terminal outcome.

pub mod engine;

pub use engine::{
    DiagnosticsCollector, SimulationOutcome, SimulationReport, SimulationRuntime,
};

pub mod prelude {
    pub use crate::engine::{
        DiagnosticsCollector, SimulationOutcome, SimulationReport, SimulationRuntime,
    };
}

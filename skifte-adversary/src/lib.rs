//! ## skifte-adversary
//! **Multi-phase attack state machine**
//!
//! The red side of the simulation: a six-phase attack cycle over the
//! shared network state, driven by the engine's timer queue. Every
//! phase is a timed wait; a pending wait can be interrupted by an MTD
//! execution, which costs the adversary a penalty delay and resets the
//! cycle at a point determined by the interrupting resource type.
//!
//! ### Components:
//! - `phase`: the attack-phase enum and interrupt eligibility
//! - `machine`: the `Adversary` itself (stack, counters, bookkeeping)

mod machine;
mod phase;

pub use machine::{Adversary, AdversaryOutcome, AdversaryParams, PhaseDurations, PhaseTransition};
pub use phase::AttackPhase;

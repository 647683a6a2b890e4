//! # skifte-core
//!
//! Foundation layer for the Skifte MTD evaluation simulator.
//! A deterministic-first discrete-event substrate shared by the adversary
//! and the MTD scheduler.
//!
//! ### Expectations:
//! - Bit-identical runs for a fixed seed
//! - Single-threaded cooperative scheduling, no hidden blocking
//! - Nanosecond-resolution virtual time
//!
//! ### Key Submodules:
//! - `time`: `VirtualClock` using atomic counters
//! - `sched`: deterministic timer queue with cancellable one-shot waits
//! - `net`: host arena, topology graph, and the reachability tracker
//! - `resource`: the three single-slot MTD contention resources
//! - `record`: append-only operation record streams
//! - `variates`: seeded exponential/normal duration sampling

pub mod error;
pub mod net;
pub mod record;
pub mod resource;
pub mod sched;
pub mod time;
pub mod variates;

pub mod prelude {
    pub use crate::error::*;
    pub use crate::net::*;
    pub use crate::record::*;
    pub use crate::resource::*;
    pub use crate::sched::*;
    pub use crate::time::*;
}

pub use error::SimulationError;

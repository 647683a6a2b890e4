//! ## skifte-mtd
//! **Moving-Target-Defense strategies and their scheduler**
//!
//! The blue side of the simulation: strategies that rotate network and
//! host attributes (topology, IPs, ports, services, OS, users) to
//! invalidate attacker reconnaissance, plus the two periodic loops
//! that register and trigger them against the resource pool.
//!
//! ### Components:
//! - `strategy`: the strategy kinds, their reconfiguration operations
//! - `scheme`: registration policies (simultaneous, random, alternating)
//! - `scheduler`: FIFO + suspended queues, selection, statistics

mod scheduler;
mod scheme;
mod strategy;

pub use scheduler::{KindStats, MtdScheduler, MtdStats, SchedulerIntervals};
pub use scheme::MtdScheme;
pub use strategy::{MtdContext, MtdStrategy, MtdStrategyKind};

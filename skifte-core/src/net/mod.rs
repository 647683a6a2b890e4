//! ## skifte-core::net
//! **Host arena, topology graph, and reachability tracking**
//!
//! The network is the sole owner of all host state. Both actors refer
//! to hosts by index only; nothing outside this module holds a
//! reference into the arena.
//!
//! ### Key Submodules:
//! - `host`: per-host model (OS, IP, services, vulnerabilities, users)
//! - `state`: graph, compromise bookkeeping, the reachable set
//! - `builder`: deterministic demo/test topologies

mod builder;
mod host;
mod state;

pub use builder::{chorded_mesh, ring};
pub use host::{Host, HostId, OsKind, Service, UserAccount, Vulnerability};
pub use state::{NetworkState, TopologySpec};

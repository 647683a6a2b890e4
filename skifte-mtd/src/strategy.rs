//! Strategy kinds and their reconfiguration operations. Each kind is a
//! static classification (resource type, priority, execution-time
//! parameters); an instance is created fresh at registration time and
//! consumed exactly once.

use std::collections::HashSet;

use ipnetwork::Ipv4Network;
use rand::rngs::SmallRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use tracing::{debug, warn};

use skifte_core::net::{HostId, NetworkState, OsKind, UserAccount, Vulnerability};
use skifte_core::resource::ResourceType;
use skifte_core::time::secs_to_ns;
use skifte_core::variates;

/// Execution-time floor: a reconfiguration never finishes instantly.
const EXEC_FLOOR_NS: u64 = 1_000_000_000;

/// Parameters shared by all strategy applications.
#[derive(Debug, Clone)]
pub struct MtdContext {
    /// Address space IPs are shuffled within.
    pub address_space: Ipv4Network,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MtdStrategyKind {
    CompleteTopologyShuffle,
    IpShuffle,
    PortShuffle,
    ServiceDiversity,
    OsDiversity,
    UserShuffle,
}

impl MtdStrategyKind {
    pub const ALL: [MtdStrategyKind; 6] = [
        MtdStrategyKind::CompleteTopologyShuffle,
        MtdStrategyKind::IpShuffle,
        MtdStrategyKind::PortShuffle,
        MtdStrategyKind::ServiceDiversity,
        MtdStrategyKind::OsDiversity,
        MtdStrategyKind::UserShuffle,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MtdStrategyKind::CompleteTopologyShuffle => "complete_topology_shuffle",
            MtdStrategyKind::IpShuffle => "ip_shuffle",
            MtdStrategyKind::PortShuffle => "port_shuffle",
            MtdStrategyKind::ServiceDiversity => "service_diversity",
            MtdStrategyKind::OsDiversity => "os_diversity",
            MtdStrategyKind::UserShuffle => "user_shuffle",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Which contention resource an instance must hold to execute, and
    /// which interrupt rule applies to it.
    pub fn resource_type(&self) -> ResourceType {
        match self {
            MtdStrategyKind::CompleteTopologyShuffle | MtdStrategyKind::IpShuffle => {
                ResourceType::Network
            }
            MtdStrategyKind::PortShuffle | MtdStrategyKind::ServiceDiversity => {
                ResourceType::Application
            }
            MtdStrategyKind::OsDiversity | MtdStrategyKind::UserShuffle => ResourceType::Reserve,
        }
    }

    /// Static ordering used when several strategies are eligible at
    /// once; lower wins.
    pub fn priority(&self) -> u8 {
        match self {
            MtdStrategyKind::CompleteTopologyShuffle => 1,
            MtdStrategyKind::IpShuffle => 2,
            MtdStrategyKind::PortShuffle => 3,
            MtdStrategyKind::ServiceDiversity => 4,
            MtdStrategyKind::OsDiversity => 5,
            MtdStrategyKind::UserShuffle => 6,
        }
    }

    pub fn exec_mean_ns(&self) -> u64 {
        match self {
            MtdStrategyKind::CompleteTopologyShuffle => secs_to_ns(120.0),
            MtdStrategyKind::IpShuffle => secs_to_ns(60.0),
            MtdStrategyKind::PortShuffle => secs_to_ns(30.0),
            MtdStrategyKind::ServiceDiversity => secs_to_ns(60.0),
            MtdStrategyKind::OsDiversity => secs_to_ns(90.0),
            MtdStrategyKind::UserShuffle => secs_to_ns(30.0),
        }
    }

    pub fn exec_std_ns(&self) -> u64 {
        self.exec_mean_ns() / 2
    }

    /// Runs the reconfiguration against the network.
    pub fn apply(&self, net: &mut NetworkState, ctx: &MtdContext, rng: &mut SmallRng) {
        debug!(strategy = self.name(), "applying MTD reconfiguration");
        match self {
            MtdStrategyKind::CompleteTopologyShuffle => shuffle_topology(net, rng),
            MtdStrategyKind::IpShuffle => shuffle_ips(net, ctx, rng),
            MtdStrategyKind::PortShuffle => shuffle_ports(net, rng),
            MtdStrategyKind::ServiceDiversity => diversify_services(net, rng),
            MtdStrategyKind::OsDiversity => diversify_os(net, rng),
            MtdStrategyKind::UserShuffle => shuffle_users(net, rng),
        }
    }
}

/// A registered, not-yet-executed strategy. Immutable once created.
#[derive(Debug, Clone)]
pub struct MtdStrategy {
    pub kind: MtdStrategyKind,
    pub exec_mean_ns: u64,
    pub exec_std_ns: u64,
    pub registered_at_ns: u64,
}

impl MtdStrategy {
    pub fn new(kind: MtdStrategyKind, registered_at_ns: u64) -> Self {
        Self {
            kind,
            exec_mean_ns: kind.exec_mean_ns(),
            exec_std_ns: kind.exec_std_ns(),
            registered_at_ns,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn resource_type(&self) -> ResourceType {
        self.kind.resource_type()
    }

    /// Samples the randomized execution time for this instance.
    pub fn sample_execution_ns(&self, rng: &mut SmallRng) -> u64 {
        variates::normal_ns(rng, self.exec_mean_ns, self.exec_std_ns, EXEC_FLOOR_NS)
    }
}

/// Regenerates the edge set: a random spanning path keeps the graph
/// connected, then chords restore the previous edge density.
fn shuffle_topology(net: &mut NetworkState, rng: &mut SmallRng) {
    let n = net.host_count();
    if n < 2 {
        return;
    }
    let target_edges = net.edges().len().max(n - 1);

    let mut order: Vec<HostId> = (0..n).collect();
    order.shuffle(rng);

    let mut edges: Vec<(HostId, HostId)> = order.windows(2).map(|w| (w[0], w[1])).collect();
    let mut seen: HashSet<(HostId, HostId)> = edges
        .iter()
        .map(|&(a, b)| (a.min(b), a.max(b)))
        .collect();

    let mut tries = 0;
    while edges.len() < target_edges && tries < target_edges * 10 {
        tries += 1;
        let a = rng.random_range(0..n);
        let b = rng.random_range(0..n);
        if a == b || !seen.insert((a.min(b), a.max(b))) {
            continue;
        }
        edges.push((a, b));
    }

    if let Err(e) = net.replace_edges(&edges) {
        warn!(error = %e, "topology shuffle rejected, keeping old edges");
    }
}

/// Reassigns every host a distinct address from the configured space.
fn shuffle_ips(net: &mut NetworkState, ctx: &MtdContext, rng: &mut SmallRng) {
    let n = net.host_count() as u32;
    let space = ctx.address_space.size();
    if space <= n {
        warn!(space, hosts = n, "address space too small for ip shuffle");
        return;
    }

    let mut taken: HashSet<u32> = HashSet::with_capacity(n as usize);
    for host in net.hosts_mut() {
        // Skip .0; retry collisions.
        loop {
            let offset = rng.random_range(1..space);
            if !taken.insert(offset) {
                continue;
            }
            if let Some(ip) = ctx.address_space.nth(offset) {
                host.ip = ip;
                break;
            }
        }
    }
}

/// Moves every service to a fresh ephemeral port, unique per host.
fn shuffle_ports(net: &mut NetworkState, rng: &mut SmallRng) {
    for host in net.hosts_mut() {
        let mut used: HashSet<u16> = HashSet::new();
        for service in &mut host.services {
            loop {
                let port = rng.random_range(1024..=u16::MAX);
                if used.insert(port) {
                    service.port = port;
                    break;
                }
            }
        }
    }
}

/// Swaps service builds: new versions, fresh vulnerability surface.
fn diversify_services(net: &mut NetworkState, rng: &mut SmallRng) {
    for host in net.hosts_mut() {
        for service in &mut host.services {
            service.version = format!(
                "{}.{}",
                rng.random_range(1..20u8),
                rng.random_range(0..30u8)
            );
            for vuln in &mut service.vulns {
                *vuln = Vulnerability::new(
                    rng.random_range(0.1..0.9),
                    rng.random_range(0.2..1.0),
                    rng.random_range(0.2..0.8),
                );
            }
        }
    }
}

/// Rotates operating systems, invalidating existing footholds.
fn diversify_os(net: &mut NetworkState, rng: &mut SmallRng) {
    for host in net.hosts_mut() {
        host.os = *OsKind::ALL.choose(rng).unwrap_or(&host.os);
        host.os_version = host
            .os
            .version_pool()
            .choose(rng)
            .copied()
            .unwrap_or("1.0")
            .to_string();
        host.clear_exploits();
    }
}

/// Redistributes accounts across hosts, preserving per-host counts,
/// and re-rolls password reuse.
fn shuffle_users(net: &mut NetworkState, rng: &mut SmallRng) {
    let mut pool: Vec<UserAccount> = net
        .hosts()
        .iter()
        .flat_map(|h| h.users.iter().cloned())
        .collect();
    pool.shuffle(rng);

    for host in net.hosts_mut() {
        for user in &mut host.users {
            if let Some(mut drawn) = pool.pop() {
                drawn.reuses_password = rng.random_bool(0.3);
                *user = drawn;
            }
        }
    }
}

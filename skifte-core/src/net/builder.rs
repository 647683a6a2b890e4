//! Deterministic demo/test topologies. Randomized topology synthesis
//! proper is an external collaborator; these builders exist so the CLI,
//! tests, and benches have a connected network to run against.

use std::net::Ipv4Addr;

use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use rand::Rng;

use crate::net::host::{Host, HostId, OsKind, Service, UserAccount, Vulnerability};
use crate::net::state::TopologySpec;

const SERVICE_CATALOG: &[(&str, &str, u16)] = &[
    ("ssh", "9.4", 22),
    ("http", "1.25", 80),
    ("mqtt", "3.1.1", 1883),
    ("coap", "1.0", 5683),
    ("modbus", "1.1b3", 502),
];

const USER_POOL: &[&str] = &["root", "admin", "operator", "telemetry", "backup", "deploy"];

fn template_host(id: HostId) -> Host {
    let (name, version, port) = SERVICE_CATALOG[id % SERVICE_CATALOG.len()];
    let complexity = 0.2 + 0.1 * (id % 5) as f64;
    let exploitability = 0.45 + 0.05 * (id % 6) as f64;

    Host {
        id,
        os: OsKind::ALL[id % OsKind::ALL.len()],
        os_version: OsKind::ALL[id % OsKind::ALL.len()].version_pool()[0].to_string(),
        ip: Ipv4Addr::new(10, 0, (id / 250) as u8, (id % 250 + 1) as u8),
        services: vec![Service {
            name: name.to_string(),
            version: version.to_string(),
            port,
            vulns: vec![
                Vulnerability::new(complexity, 0.7, exploitability),
                Vulnerability::new((complexity + 0.3).min(1.0), 0.4, 0.3),
            ],
        }],
        users: vec![
            UserAccount {
                name: USER_POOL[id % USER_POOL.len()].to_string(),
                reuses_password: id % 2 == 0,
            },
            UserAccount {
                name: USER_POOL[(id + 1) % USER_POOL.len()].to_string(),
                reuses_password: id % 3 == 0,
            },
        ],
        compromised: false,
    }
}

fn ring_edges(n: usize) -> Vec<(HostId, HostId)> {
    match n {
        0 | 1 => Vec::new(),
        2 => vec![(0, 1)],
        _ => (0..n).map(|i| (i, (i + 1) % n)).collect(),
    }
}

/// An n-node ring with host 0 exposed. Fully deterministic.
pub fn ring(n: usize) -> TopologySpec {
    TopologySpec {
        hosts: (0..n).map(template_host).collect(),
        edges: ring_edges(n),
        exposed: vec![0],
    }
}

/// A ring with `chords` extra random edges and randomized host
/// attributes. Deterministic for a fixed rng state.
pub fn chorded_mesh(n: usize, chords: usize, rng: &mut SmallRng) -> TopologySpec {
    let mut edges = ring_edges(n);
    if n > 3 {
        let mut placed = 0;
        let mut tries = 0;
        while placed < chords && tries < chords * 10 {
            tries += 1;
            let a = rng.random_range(0..n);
            let b = rng.random_range(0..n);
            if a == b || edges.contains(&(a, b)) || edges.contains(&(b, a)) {
                continue;
            }
            edges.push((a, b));
            placed += 1;
        }
    }

    let hosts = (0..n)
        .map(|id| {
            let mut host = template_host(id);
            host.os = *OsKind::ALL.choose(rng).unwrap_or(&OsKind::Linux);
            host.os_version = host
                .os
                .version_pool()
                .choose(rng)
                .copied()
                .unwrap_or("1.0")
                .to_string();
            for service in &mut host.services {
                for vuln in &mut service.vulns {
                    *vuln = Vulnerability::new(
                        rng.random_range(0.1..0.9),
                        rng.random_range(0.2..1.0),
                        rng.random_range(0.2..0.8),
                    );
                }
            }
            for user in &mut host.users {
                user.reuses_password = rng.random_bool(0.5);
            }
            host
        })
        .collect();

    TopologySpec {
        hosts,
        edges,
        exposed: vec![0],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn ring_is_connected() {
        let spec = ring(5);
        assert_eq!(spec.hosts.len(), 5);
        assert_eq!(spec.edges.len(), 5);
        assert_eq!(spec.exposed, vec![0]);
    }

    #[test]
    fn ring_hosts_are_populated() {
        let spec = ring(3);
        for host in &spec.hosts {
            assert!(!host.services.is_empty());
            assert!(!host.users.is_empty());
            assert!(!host.compromised);
        }
    }

    #[test]
    fn chorded_mesh_is_deterministic_per_seed() {
        let a = chorded_mesh(8, 3, &mut SmallRng::seed_from_u64(7));
        let b = chorded_mesh(8, 3, &mut SmallRng::seed_from_u64(7));
        assert_eq!(a.edges, b.edges);
        assert_eq!(
            a.hosts.iter().map(|h| h.ip).collect::<Vec<_>>(),
            b.hosts.iter().map(|h| h.ip).collect::<Vec<_>>()
        );
    }
}

//! Per-host model: operating system, address, services with their
//! vulnerabilities, and assigned user accounts.

use std::collections::BTreeSet;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// Index into the host arena owned by [`super::NetworkState`].
pub type HostId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsKind {
    Linux,
    Windows,
    Freebsd,
    Openbsd,
}

impl OsKind {
    pub const ALL: [OsKind; 4] = [
        OsKind::Linux,
        OsKind::Windows,
        OsKind::Freebsd,
        OsKind::Openbsd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OsKind::Linux => "linux",
            OsKind::Windows => "windows",
            OsKind::Freebsd => "freebsd",
            OsKind::Openbsd => "openbsd",
        }
    }

    /// Plausible version strings for OS diversity rotation.
    pub fn version_pool(&self) -> &'static [&'static str] {
        match self {
            OsKind::Linux => &["5.15", "6.1", "6.6"],
            OsKind::Windows => &["10", "11", "2022"],
            OsKind::Freebsd => &["13.2", "14.0"],
            OsKind::Openbsd => &["7.3", "7.4"],
        }
    }
}

/// A weakness in a service. `exploited` is flipped by the adversary and
/// cleared again when an MTD rotation invalidates the foothold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vulnerability {
    /// Attack complexity in [0, 1]; higher is harder.
    pub complexity: f64,
    /// Impact score in [0, 1].
    pub impact: f64,
    /// Derived CVSS-style score in [0, 10].
    pub cvss: f64,
    /// Exploit success base probability in [0, 1].
    pub exploitability: f64,
    pub exploited: bool,
}

impl Vulnerability {
    pub fn new(complexity: f64, impact: f64, exploitability: f64) -> Self {
        let cvss = (impact * 6.0 + exploitability * 4.0).clamp(0.0, 10.0);
        Self {
            complexity,
            impact,
            cvss,
            exploitability,
            exploited: false,
        }
    }

    /// Per-attempt success probability: exploitability discounted by
    /// attack complexity.
    pub fn exploit_chance(&self) -> f64 {
        (self.exploitability * (1.0 - self.complexity / 2.0)).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub version: String,
    pub port: u16,
    pub vulns: Vec<Vulnerability>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub name: String,
    /// Whether this account reuses a password that may already be held
    /// by the adversary.
    pub reuses_password: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Host {
    pub id: HostId,
    pub os: OsKind,
    pub os_version: String,
    pub ip: Ipv4Addr,
    pub services: Vec<Service>,
    pub users: Vec<UserAccount>,
    pub compromised: bool,
}

impl Host {
    pub fn open_ports(&self) -> Vec<u16> {
        self.services.iter().map(|s| s.port).collect()
    }

    /// Services listening on any of the given ports, in service order.
    pub fn services_on_ports(&self, ports: &[u16]) -> Vec<&Service> {
        self.services
            .iter()
            .filter(|s| ports.contains(&s.port))
            .collect()
    }

    /// Credential-reuse check: does any account on this host reuse a
    /// password the adversary already holds?
    pub fn has_reused_credentials(&self, compromised_users: &BTreeSet<String>) -> bool {
        self.users
            .iter()
            .any(|u| u.reuses_password && compromised_users.contains(&u.name))
    }

    /// Clears all exploited flags, e.g. after an OS or service rotation
    /// invalidates existing footholds.
    pub fn clear_exploits(&mut self) {
        for service in &mut self.services {
            for vuln in &mut service.vulns {
                vuln.exploited = false;
            }
        }
    }
}

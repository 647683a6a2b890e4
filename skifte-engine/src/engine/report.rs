//! Final run output: outcome, snapshots, record streams, statistics,
//! and the deterministic state hash.

use std::collections::BTreeMap;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use skifte_adversary::AdversaryOutcome;
use skifte_core::net::{Host, HostId, OsKind};
use skifte_core::record::OperationRecord;
use skifte_mtd::MtdStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationOutcome {
    FullyCompromised,
    TargetCompromised,
    AttemptsExhausted,
    NoTargetsRemain,
    HorizonReached,
}

impl From<AdversaryOutcome> for SimulationOutcome {
    fn from(outcome: AdversaryOutcome) -> Self {
        match outcome {
            AdversaryOutcome::FullyCompromised => SimulationOutcome::FullyCompromised,
            AdversaryOutcome::TargetCompromised => SimulationOutcome::TargetCompromised,
            AdversaryOutcome::AttemptsExhausted => SimulationOutcome::AttemptsExhausted,
            AdversaryOutcome::NoTargetsRemain => SimulationOutcome::NoTargetsRemain,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    pub name: String,
    pub version: String,
    pub port: u16,
}

/// Per-host view for UI or report consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostSnapshot {
    pub id: HostId,
    pub ip: Ipv4Addr,
    pub os: OsKind,
    pub os_version: String,
    pub compromised: bool,
    pub services: Vec<ServiceSnapshot>,
}

impl From<&Host> for HostSnapshot {
    fn from(host: &Host) -> Self {
        Self {
            id: host.id,
            ip: host.ip,
            os: host.os,
            os_version: host.os_version.clone(),
            compromised: host.compromised,
            services: host
                .services
                .iter()
                .map(|s| ServiceSnapshot {
                    name: s.name.clone(),
                    version: s.version.clone(),
                    port: s.port,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KindSummary {
    pub registered: u64,
    pub executed: u64,
    pub suspended: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MtdSummary {
    pub registered: u64,
    pub executed: u64,
    pub suspended: u64,
    pub per_kind: BTreeMap<String, KindSummary>,
}

impl From<&MtdStats> for MtdSummary {
    fn from(stats: &MtdStats) -> Self {
        Self {
            registered: stats.registered,
            executed: stats.executed,
            suspended: stats.suspended,
            per_kind: stats
                .per_kind()
                .iter()
                .map(|(kind, s)| {
                    (
                        kind.name().to_string(),
                        KindSummary {
                            registered: s.registered,
                            executed: s.executed,
                            suspended: s.suspended,
                        },
                    )
                })
                .collect(),
        }
    }
}

/// Everything a run leaves behind. Serializable for report files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub scheme: String,
    pub seed: u64,
    pub outcome: SimulationOutcome,
    pub elapsed_ns: u64,
    pub compromised_hosts: Vec<HostId>,
    pub reachable: Vec<HostId>,
    pub hosts: Vec<HostSnapshot>,
    pub mtd: MtdSummary,
    pub attack_records: Vec<OperationRecord>,
    pub mtd_records: Vec<OperationRecord>,
    pub state_hash: String,
}

impl SimulationReport {
    /// Attack records cut short by an MTD interruption.
    pub fn interrupted_records(&self) -> impl Iterator<Item = &OperationRecord> {
        self.attack_records.iter().filter(|r| r.was_interrupted())
    }
}

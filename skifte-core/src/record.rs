//! ## skifte-core::record
//! **Append-only operation record streams**
//!
//! Both actors log every completed or interrupted operation here; the
//! evaluation layer consumes the streams as data and feeds nothing
//! back into the simulation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    Attack,
    Mtd,
}

/// One timestamped operation. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    pub name: String,
    pub actor: ActorKind,
    pub start_ns: u64,
    pub finish_ns: u64,
    pub duration_ns: u64,
    /// Resource type that cut the operation short, if any.
    pub interrupted_in: Option<String>,
    /// Name of the strategy that delivered the interrupt, if any.
    pub interrupted_by: Option<String>,
}

impl OperationRecord {
    pub fn completed(name: impl Into<String>, actor: ActorKind, start_ns: u64, finish_ns: u64) -> Self {
        Self {
            name: name.into(),
            actor,
            start_ns,
            finish_ns,
            duration_ns: finish_ns.saturating_sub(start_ns),
            interrupted_in: None,
            interrupted_by: None,
        }
    }

    pub fn interrupted(
        name: impl Into<String>,
        actor: ActorKind,
        start_ns: u64,
        finish_ns: u64,
        interrupted_in: &str,
        interrupted_by: &str,
    ) -> Self {
        Self {
            name: name.into(),
            actor,
            start_ns,
            finish_ns,
            duration_ns: finish_ns.saturating_sub(start_ns),
            interrupted_in: Some(interrupted_in.to_string()),
            interrupted_by: Some(interrupted_by.to_string()),
        }
    }

    pub fn was_interrupted(&self) -> bool {
        self.interrupted_in.is_some()
    }
}

/// Collects the two record streams for one run.
#[derive(Debug, Default)]
pub struct Recorder {
    attack: Vec<OperationRecord>,
    mtd: Vec<OperationRecord>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: OperationRecord) {
        tracing::debug!(
            name = %record.name,
            actor = ?record.actor,
            start_ns = record.start_ns,
            finish_ns = record.finish_ns,
            interrupted = record.was_interrupted(),
            "operation recorded"
        );
        match record.actor {
            ActorKind::Attack => self.attack.push(record),
            ActorKind::Mtd => self.mtd.push(record),
        }
    }

    pub fn attack_records(&self) -> &[OperationRecord] {
        &self.attack
    }

    pub fn mtd_records(&self) -> &[OperationRecord] {
        &self.mtd
    }

    pub fn into_streams(self) -> (Vec<OperationRecord>, Vec<OperationRecord>) {
        (self.attack, self.mtd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_by_actor() {
        let mut rec = Recorder::new();
        rec.push(OperationRecord::completed("scan_host", ActorKind::Attack, 0, 5));
        rec.push(OperationRecord::completed("ip_shuffle", ActorKind::Mtd, 2, 9));

        assert_eq!(rec.attack_records().len(), 1);
        assert_eq!(rec.mtd_records().len(), 1);
        assert_eq!(rec.attack_records()[0].duration_ns, 5);
    }

    #[test]
    fn interrupted_record_carries_tags() {
        let r = OperationRecord::interrupted(
            "exploit_vuln",
            ActorKind::Attack,
            10,
            40,
            "network",
            "ip_shuffle",
        );
        assert!(r.was_interrupted());
        assert_eq!(r.interrupted_in.as_deref(), Some("network"));
        assert_eq!(r.interrupted_by.as_deref(), Some("ip_shuffle"));
        assert_eq!(r.duration_ns, 30);
    }
}

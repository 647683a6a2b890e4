//! Attack phases as a tagged enum; control flow dispatches on the
//! variant, never on strings.

/// The adversary's attack cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttackPhase {
    ScanHost,
    EnumHost,
    ScanPort,
    ExploitVuln,
    BruteForce,
    ScanNeighbor,
}

impl AttackPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttackPhase::ScanHost => "scan_host",
            AttackPhase::EnumHost => "enum_host",
            AttackPhase::ScanPort => "scan_port",
            AttackPhase::ExploitVuln => "exploit_vuln",
            AttackPhase::BruteForce => "brute_force",
            AttackPhase::ScanNeighbor => "scan_neighbor",
        }
    }

    /// Host and neighbor discovery do not depend on stable ports or
    /// services, so application-layer MTD cannot disrupt them.
    pub fn resists_application_interrupt(&self) -> bool {
        matches!(
            self,
            AttackPhase::ScanHost | AttackPhase::EnumHost | AttackPhase::ScanNeighbor
        )
    }
}

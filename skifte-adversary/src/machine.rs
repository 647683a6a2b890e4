//! The adversary: candidate stack, attempt accounting, per-phase
//! completion logic, and the interrupt/reset path.

use std::collections::{BTreeSet, HashMap, VecDeque};

use rand::rngs::SmallRng;
use rand::Rng;
use tracing::{debug, trace};

use skifte_core::net::{Host, HostId, NetworkState};
use skifte_core::resource::ResourceType;
use skifte_core::time::secs_to_ns;
use skifte_core::variates;

use crate::phase::AttackPhase;

/// Fixed or mean wait applied on entry to each phase, plus the penalty
/// paid after an interruption.
#[derive(Debug, Clone)]
pub struct PhaseDurations {
    pub scan_host_ns: u64,
    pub enum_host_ns: u64,
    pub scan_port_ns: u64,
    pub exploit_vuln_mean_ns: u64,
    pub brute_force_ns: u64,
    pub scan_neighbor_ns: u64,
    pub penalty_ns: u64,
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            scan_host_ns: secs_to_ns(5.0),
            enum_host_ns: secs_to_ns(2.0),
            scan_port_ns: secs_to_ns(10.0),
            exploit_vuln_mean_ns: secs_to_ns(30.0),
            brute_force_ns: secs_to_ns(20.0),
            scan_neighbor_ns: secs_to_ns(5.0),
            penalty_ns: secs_to_ns(15.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdversaryParams {
    /// Per-host attempt count at which the host is given up on.
    pub attack_threshold: u32,
    /// Global attempt budget; reaching it ends the run.
    pub attempt_cap: u32,
    /// Optional single target whose compromise ends the run.
    pub target_host: Option<HostId>,
    /// Floor probability for brute forcing once any credentials are held.
    pub brute_force_floor: f64,
    pub durations: PhaseDurations,
}

impl Default for AdversaryParams {
    fn default() -> Self {
        Self {
            attack_threshold: 5,
            attempt_cap: 500,
            target_host: None,
            brute_force_floor: 0.05,
            durations: PhaseDurations::default(),
        }
    }
}

/// Terminal outcome of the adversary process. All of these are clean
/// terminations, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdversaryOutcome {
    FullyCompromised,
    TargetCompromised,
    AttemptsExhausted,
    NoTargetsRemain,
}

/// Result of completing one phase wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseTransition {
    Continue,
    Terminated(AdversaryOutcome),
}

pub struct Adversary {
    params: AdversaryParams,
    phase: AttackPhase,
    curr_host: Option<HostId>,
    pivot: Option<HostId>,
    host_stack: VecDeque<HostId>,
    attempts: HashMap<HostId, u32>,
    total_attempts: u32,
    given_up: BTreeSet<HostId>,
    compromised_users: BTreeSet<String>,
    curr_ports: Vec<u16>,
    /// (service index, vuln index) pairs discovered for the current host.
    curr_vulns: Vec<(usize, usize)>,
    outcome: Option<AdversaryOutcome>,
}

impl Adversary {
    pub fn new(params: AdversaryParams) -> Self {
        Self {
            params,
            phase: AttackPhase::ScanHost,
            curr_host: None,
            pivot: None,
            host_stack: VecDeque::new(),
            attempts: HashMap::new(),
            total_attempts: 0,
            given_up: BTreeSet::new(),
            compromised_users: BTreeSet::new(),
            curr_ports: Vec::new(),
            curr_vulns: Vec::new(),
            outcome: None,
        }
    }

    pub fn phase(&self) -> AttackPhase {
        self.phase
    }

    pub fn curr_host(&self) -> Option<HostId> {
        self.curr_host
    }

    pub fn pivot(&self) -> Option<HostId> {
        self.pivot
    }

    pub fn total_attempts(&self) -> u32 {
        self.total_attempts
    }

    pub fn compromised_users(&self) -> &BTreeSet<String> {
        &self.compromised_users
    }

    pub fn outcome(&self) -> Option<AdversaryOutcome> {
        self.outcome
    }

    pub fn penalty_ns(&self) -> u64 {
        self.params.durations.penalty_ns
    }

    /// Entry point for the current phase: applies entry-time effects
    /// (attempt accounting, vulnerability discovery) and returns the
    /// wait to schedule before the phase's completion logic runs.
    ///
    /// Attempts are counted here, before the wait begins, so an
    /// interruption cannot un-count them.
    pub fn begin_phase(&mut self, net: &NetworkState, rng: &mut SmallRng) -> u64 {
        let d = &self.params.durations;
        match self.phase {
            AttackPhase::ScanHost => d.scan_host_ns,
            AttackPhase::EnumHost => d.enum_host_ns,
            AttackPhase::ScanPort => d.scan_port_ns,
            AttackPhase::ExploitVuln => {
                self.curr_vulns = self.discover_vulns(net);
                self.total_attempts = self
                    .total_attempts
                    .saturating_add(self.curr_vulns.len() as u32);
                variates::exponential_ns(rng, d.exploit_vuln_mean_ns).max(1)
            }
            AttackPhase::BruteForce => d.brute_force_ns,
            AttackPhase::ScanNeighbor => d.scan_neighbor_ns,
        }
    }

    /// Runs the completion logic of the current phase and transitions
    /// to the next one.
    pub fn complete_phase(
        &mut self,
        net: &mut NetworkState,
        rng: &mut SmallRng,
    ) -> PhaseTransition {
        let transition = match self.phase {
            AttackPhase::ScanHost => self.complete_scan_host(net, rng),
            AttackPhase::EnumHost => self.complete_enum_host(net, rng),
            AttackPhase::ScanPort => self.complete_scan_port(net),
            AttackPhase::ExploitVuln => self.complete_exploit_vuln(net, rng),
            AttackPhase::BruteForce => self.complete_brute_force(net, rng),
            AttackPhase::ScanNeighbor => self.complete_scan_neighbor(net),
        };
        if let PhaseTransition::Terminated(outcome) = transition {
            debug!(?outcome, "adversary terminated");
            self.outcome = Some(outcome);
        }
        transition
    }

    /// Abandons the in-flight phase after an MTD interruption. The
    /// reset point depends on the interrupting resource type: a
    /// network-layer change invalidates host discovery entirely, an
    /// application-layer change only invalidates ports and services.
    /// Returns the phase that was interrupted, for the record stream.
    pub fn interrupt(&mut self, by: ResourceType) -> AttackPhase {
        let was = self.phase;
        match by {
            ResourceType::Network => {
                self.curr_host = None;
                self.pivot = None;
                self.curr_ports.clear();
                self.curr_vulns.clear();
                self.host_stack.clear();
                self.phase = AttackPhase::ScanHost;
            }
            ResourceType::Application => {
                self.curr_ports.clear();
                self.curr_vulns.clear();
                self.phase = AttackPhase::ScanPort;
            }
            ResourceType::Reserve => {
                // Reserve strategies never interrupt; keep the phase.
            }
        }
        debug!(
            interrupted = was.as_str(),
            reset_to = self.phase.as_str(),
            "attack phase interrupted"
        );
        was
    }

    fn complete_scan_host(&mut self, net: &NetworkState, rng: &mut SmallRng) -> PhaseTransition {
        let mut interior = Vec::new();
        let mut exposed = Vec::new();
        for id in net.connected_from_exposed() {
            if net.is_compromised(id) || self.given_up.contains(&id) {
                continue;
            }
            if net.is_exposed(id) {
                exposed.push(id);
            } else {
                interior.push(id);
            }
        }
        if interior.is_empty() && exposed.is_empty() {
            return PhaseTransition::Terminated(AdversaryOutcome::NoTargetsRemain);
        }

        let sources: Vec<HostId> = net.exposed().to_vec();
        sort_by_distance(&mut interior, net, &sources, rng);
        sort_by_distance(&mut exposed, net, &sources, rng);

        self.host_stack.clear();
        self.host_stack.extend(interior);
        // Exposed endpoints go to the back of the stack.
        self.host_stack.extend(exposed);
        trace!(stack = ?self.host_stack, "scan_host candidates");

        self.phase = AttackPhase::EnumHost;
        PhaseTransition::Continue
    }

    fn complete_enum_host(&mut self, net: &mut NetworkState, rng: &mut SmallRng) -> PhaseTransition {
        if self.total_attempts >= self.params.attempt_cap {
            self.host_stack.clear();
            return PhaseTransition::Terminated(AdversaryOutcome::AttemptsExhausted);
        }

        self.resort_stack(net, rng);
        let Some(host) = self.host_stack.pop_front() else {
            self.phase = AttackPhase::ScanHost;
            return PhaseTransition::Continue;
        };

        self.curr_host = Some(host);
        self.total_attempts += 1;
        let count = self.attempts.entry(host).or_insert(0);
        *count += 1;
        if *count >= self.params.attack_threshold && self.params.target_host != Some(host) {
            self.given_up.insert(host);
            debug!(host, attempts = *count, "given up on host");
        }

        if net.is_compromised(host) {
            // Already owned: fold it into the books and pick again.
            if let Some(outcome) = self.record_compromise(net, host) {
                return PhaseTransition::Terminated(outcome);
            }
            self.phase = AttackPhase::EnumHost;
        } else {
            self.phase = AttackPhase::ScanPort;
        }
        PhaseTransition::Continue
    }

    fn complete_scan_port(&mut self, net: &mut NetworkState) -> PhaseTransition {
        let Some(host_id) = self.curr_host else {
            self.phase = AttackPhase::ScanHost;
            return PhaseTransition::Continue;
        };
        let Some(host) = net.host(host_id) else {
            self.phase = AttackPhase::ScanHost;
            return PhaseTransition::Continue;
        };

        self.curr_ports = host.open_ports();
        if host.has_reused_credentials(&self.compromised_users) {
            // Credential reuse: no exploit or brute force needed.
            if let Some(outcome) = self.record_compromise(net, host_id) {
                return PhaseTransition::Terminated(outcome);
            }
            self.phase = AttackPhase::ScanNeighbor;
        } else {
            self.phase = AttackPhase::ExploitVuln;
        }
        PhaseTransition::Continue
    }

    fn complete_exploit_vuln(&mut self, net: &mut NetworkState, rng: &mut SmallRng) -> PhaseTransition {
        let Some(host_id) = self.curr_host else {
            self.phase = AttackPhase::ScanHost;
            return PhaseTransition::Continue;
        };

        let mut success = false;
        let candidates = std::mem::take(&mut self.curr_vulns);
        if let Some(host) = net.host_mut(host_id) {
            for (svc, vuln) in candidates {
                let Some(v) = host
                    .services
                    .get_mut(svc)
                    .and_then(|s| s.vulns.get_mut(vuln))
                else {
                    continue;
                };
                if rng.random::<f64>() < v.exploit_chance() {
                    v.exploited = true;
                    success = true;
                }
            }
        }

        if success {
            if let Some(outcome) = self.record_compromise(net, host_id) {
                return PhaseTransition::Terminated(outcome);
            }
            self.phase = AttackPhase::ScanNeighbor;
        } else {
            self.phase = AttackPhase::BruteForce;
        }
        PhaseTransition::Continue
    }

    fn complete_brute_force(&mut self, net: &mut NetworkState, rng: &mut SmallRng) -> PhaseTransition {
        let Some(host_id) = self.curr_host else {
            self.phase = AttackPhase::ScanHost;
            return PhaseTransition::Continue;
        };

        let chance = net
            .host(host_id)
            .map(|host| self.brute_force_chance(host))
            .unwrap_or(0.0);

        if chance > 0.0 && rng.random::<f64>() < chance {
            if let Some(outcome) = self.record_compromise(net, host_id) {
                return PhaseTransition::Terminated(outcome);
            }
            self.phase = AttackPhase::ScanNeighbor;
        } else {
            // Abandon the host for now; it stays a candidate.
            if !self.given_up.contains(&host_id) {
                self.host_stack.push_back(host_id);
            }
            self.curr_host = None;
            self.curr_ports.clear();
            self.phase = AttackPhase::EnumHost;
        }
        PhaseTransition::Continue
    }

    fn complete_scan_neighbor(&mut self, net: &NetworkState) -> PhaseTransition {
        if let Some(host_id) = self.curr_host {
            let mut found: Vec<HostId> = Vec::new();
            for &nb in net.neighbors(host_id) {
                if net.is_compromised(nb)
                    || self.given_up.contains(&nb)
                    || self.host_stack.contains(&nb)
                    || found.contains(&nb)
                {
                    continue;
                }
                found.push(nb);
            }
            // Prepend pivot-first: newly found neighbors get attacked next.
            for nb in found.into_iter().rev() {
                self.host_stack.push_front(nb);
            }
        }
        self.phase = AttackPhase::EnumHost;
        PhaseTransition::Continue
    }

    /// Compromise bookkeeping shared by all success paths. Returns a
    /// terminal outcome when the run is over.
    fn record_compromise(
        &mut self,
        net: &mut NetworkState,
        host_id: HostId,
    ) -> Option<AdversaryOutcome> {
        // mark_compromised is idempotent and refreshes reachability.
        match net.mark_compromised(host_id) {
            Ok(newly) => {
                if newly {
                    debug!(host = host_id, "host compromised");
                }
            }
            Err(_) => return None,
        }
        self.pivot = Some(host_id);
        if let Some(host) = net.host(host_id) {
            for user in &host.users {
                self.compromised_users.insert(user.name.clone());
            }
        }

        if net.fully_compromised() {
            Some(AdversaryOutcome::FullyCompromised)
        } else if self.params.target_host == Some(host_id) {
            Some(AdversaryOutcome::TargetCompromised)
        } else {
            None
        }
    }

    /// Re-sorts the candidate stack by the shortest distance from the
    /// exposed endpoints or from the pivot host, whichever is smaller,
    /// with a random tiebreak.
    fn resort_stack(&mut self, net: &NetworkState, rng: &mut SmallRng) {
        let exposed: Vec<HostId> = net.exposed().to_vec();
        let pivot = self.pivot;
        let mut keyed: Vec<(usize, u32, HostId)> = self
            .host_stack
            .drain(..)
            .map(|h| {
                let from_exposed = net.distance_from(&exposed, h).unwrap_or(usize::MAX);
                let from_pivot = pivot
                    .and_then(|p| net.distance_from(&[p], h))
                    .unwrap_or(usize::MAX);
                (from_exposed.min(from_pivot), rng.random::<u32>(), h)
            })
            .collect();
        keyed.sort_unstable();
        self.host_stack.extend(keyed.into_iter().map(|(_, _, h)| h));
    }

    fn discover_vulns(&self, net: &NetworkState) -> Vec<(usize, usize)> {
        let Some(host_id) = self.curr_host else {
            return Vec::new();
        };
        let Some(host) = net.host(host_id) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for (si, service) in host.services.iter().enumerate() {
            if !self.curr_ports.contains(&service.port) {
                continue;
            }
            for (vi, vuln) in service.vulns.iter().enumerate() {
                if !vuln.exploited {
                    out.push((si, vi));
                }
            }
        }
        out
    }

    fn brute_force_chance(&self, host: &Host) -> f64 {
        if host.users.is_empty() {
            return 0.0;
        }
        let reuse_hits = host
            .users
            .iter()
            .filter(|u| u.reuses_password && self.compromised_users.contains(&u.name))
            .count();
        let base = reuse_hits as f64 / host.users.len() as f64;
        if self.compromised_users.is_empty() {
            base
        } else {
            base.max(self.params.brute_force_floor)
        }
    }
}

fn sort_by_distance(
    hosts: &mut Vec<HostId>,
    net: &NetworkState,
    sources: &[HostId],
    rng: &mut SmallRng,
) {
    let mut keyed: Vec<(usize, u32, HostId)> = hosts
        .drain(..)
        .map(|h| {
            let d = net.distance_from(sources, h).unwrap_or(usize::MAX);
            (d, rng.random::<u32>(), h)
        })
        .collect();
    keyed.sort_unstable();
    hosts.extend(keyed.into_iter().map(|(_, _, h)| h));
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use skifte_core::net::ring;

    fn ring_net(n: usize) -> NetworkState {
        NetworkState::new(ring(n)).unwrap()
    }

    fn step(adv: &mut Adversary, net: &mut NetworkState, rng: &mut SmallRng) -> PhaseTransition {
        adv.begin_phase(net, rng);
        adv.complete_phase(net, rng)
    }

    /// Drives the state machine until it terminates or `max_steps` runs out.
    fn run_to_end(
        adv: &mut Adversary,
        net: &mut NetworkState,
        rng: &mut SmallRng,
        max_steps: usize,
    ) -> Option<AdversaryOutcome> {
        for _ in 0..max_steps {
            if let PhaseTransition::Terminated(outcome) = step(adv, net, rng) {
                return Some(outcome);
            }
        }
        None
    }

    #[test]
    fn uncontested_run_compromises_ring() {
        let mut net = ring_net(5);
        let mut adv = Adversary::new(AdversaryParams {
            attack_threshold: 50,
            attempt_cap: 10_000,
            ..AdversaryParams::default()
        });
        let mut rng = SmallRng::seed_from_u64(11);

        let outcome = run_to_end(&mut adv, &mut net, &mut rng, 100_000);
        assert_eq!(outcome, Some(AdversaryOutcome::FullyCompromised));
        assert_eq!(net.compromised_hosts().len(), 5);
    }

    #[test]
    fn network_interrupt_resets_to_scan_host() {
        let mut net = ring_net(5);
        let mut adv = Adversary::new(AdversaryParams::default());
        let mut rng = SmallRng::seed_from_u64(3);

        // Walk: scan_host -> enum_host -> scan_port.
        while adv.phase() != AttackPhase::ExploitVuln {
            step(&mut adv, &mut net, &mut rng);
        }
        assert!(adv.curr_host().is_some());

        let was = adv.interrupt(ResourceType::Network);
        assert_eq!(was, AttackPhase::ExploitVuln);
        assert_eq!(adv.phase(), AttackPhase::ScanHost);
        assert!(adv.curr_host().is_none());
        assert!(adv.pivot().is_none());
    }

    #[test]
    fn application_interrupt_keeps_current_host() {
        let mut net = ring_net(5);
        let mut adv = Adversary::new(AdversaryParams::default());
        let mut rng = SmallRng::seed_from_u64(3);

        while adv.phase() != AttackPhase::ExploitVuln {
            step(&mut adv, &mut net, &mut rng);
        }
        let curr = adv.curr_host();
        assert!(curr.is_some());

        adv.interrupt(ResourceType::Application);
        assert_eq!(adv.phase(), AttackPhase::ScanPort);
        assert_eq!(adv.curr_host(), curr);
    }

    #[test]
    fn attempt_cap_terminates_run() {
        let mut net = ring_net(5);
        let mut adv = Adversary::new(AdversaryParams {
            attempt_cap: 3,
            ..AdversaryParams::default()
        });
        let mut rng = SmallRng::seed_from_u64(5);

        let outcome = run_to_end(&mut adv, &mut net, &mut rng, 10_000);
        assert_eq!(outcome, Some(AdversaryOutcome::AttemptsExhausted));
    }

    #[test]
    fn threshold_puts_host_on_give_up_list() {
        let mut net = ring_net(2);
        // Make exploits and brute force hopeless so attempts pile up.
        for host in net.hosts_mut() {
            for service in &mut host.services {
                for vuln in &mut service.vulns {
                    vuln.exploitability = 0.0;
                }
            }
            host.users.clear();
        }
        let mut adv = Adversary::new(AdversaryParams {
            attack_threshold: 2,
            attempt_cap: 10_000,
            ..AdversaryParams::default()
        });
        let mut rng = SmallRng::seed_from_u64(9);

        let outcome = run_to_end(&mut adv, &mut net, &mut rng, 10_000);
        // Every host exhausts its threshold, so targets run out.
        assert_eq!(outcome, Some(AdversaryOutcome::NoTargetsRemain));
        assert!(net.compromised_hosts().is_empty());
    }

    #[test]
    fn credential_reuse_skips_exploit() {
        let mut net = ring_net(3);
        // Compromise host 0 first; its users seed the credential store.
        let mut adv = Adversary::new(AdversaryParams::default());
        let mut rng = SmallRng::seed_from_u64(2);
        net.mark_compromised(0).unwrap();
        adv.curr_host = Some(0);
        adv.record_compromise(&mut net, 0);

        // Host 1 shares a reused account with host 0's pool.
        let shared = net.host(0).unwrap().users[0].name.clone();
        net.host_mut(1).unwrap().users[0] = skifte_core::net::UserAccount {
            name: shared,
            reuses_password: true,
        };

        adv.curr_host = Some(1);
        adv.phase = AttackPhase::ScanPort;
        adv.begin_phase(&net, &mut rng);
        adv.complete_phase(&mut net, &mut rng);

        assert!(net.is_compromised(1));
        assert_eq!(adv.phase(), AttackPhase::ScanNeighbor);
    }

    #[test]
    fn scan_neighbor_prepends_new_candidates() {
        let mut net = ring_net(5);
        let mut adv = Adversary::new(AdversaryParams::default());
        net.mark_compromised(0).unwrap();
        adv.curr_host = Some(0);
        adv.host_stack.push_back(3);
        adv.phase = AttackPhase::ScanNeighbor;

        let mut rng = SmallRng::seed_from_u64(1);
        adv.begin_phase(&net, &mut rng);
        adv.complete_phase(&mut net, &mut rng);

        // Neighbors of 0 (1 and 4) land in front of the old candidate.
        assert_eq!(adv.phase(), AttackPhase::EnumHost);
        let stack: Vec<HostId> = adv.host_stack.iter().copied().collect();
        assert_eq!(stack.last(), Some(&3));
        assert!(stack.contains(&1));
        assert!(stack.contains(&4));
    }
}

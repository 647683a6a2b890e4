//! Network state: the host arena, the adjacency graph, and the
//! reachability tracker shared by both actors.

use std::collections::{BTreeSet, VecDeque};

use crate::error::SimulationError;
use crate::net::host::{Host, HostId};

/// Topology input contract: a populated host per node, undirected
/// edges, and the subset of externally reachable endpoints. Supplied
/// once at simulation construction.
#[derive(Debug, Clone)]
pub struct TopologySpec {
    pub hosts: Vec<Host>,
    pub edges: Vec<(HostId, HostId)>,
    pub exposed: Vec<HostId>,
}

/// Sole owner of all network state. Hosts are addressed by index; the
/// reachable set is kept closed under adjacency through compromised
/// hosts.
pub struct NetworkState {
    hosts: Vec<Host>,
    adjacency: Vec<Vec<HostId>>,
    exposed: Vec<HostId>,
    compromised: Vec<HostId>,
    reachable: BTreeSet<HostId>,
}

impl NetworkState {
    pub fn new(spec: TopologySpec) -> Result<Self, SimulationError> {
        let n = spec.hosts.len();
        if n == 0 {
            return Err(SimulationError::Topology("no hosts".into()));
        }
        for (idx, host) in spec.hosts.iter().enumerate() {
            if host.id != idx {
                return Err(SimulationError::Topology(format!(
                    "host id {} at arena slot {}",
                    host.id, idx
                )));
            }
        }
        if spec.exposed.is_empty() {
            return Err(SimulationError::Topology("no exposed endpoints".into()));
        }
        for &e in &spec.exposed {
            if e >= n {
                return Err(SimulationError::UnknownHost(e));
            }
        }

        let mut state = Self {
            hosts: spec.hosts,
            adjacency: vec![Vec::new(); n],
            exposed: spec.exposed,
            compromised: Vec::new(),
            reachable: BTreeSet::new(),
        };
        state.install_edges(&spec.edges)?;
        state.update_reachable_mtd();
        Ok(state)
    }

    fn install_edges(&mut self, edges: &[(HostId, HostId)]) -> Result<(), SimulationError> {
        let n = self.hosts.len();
        for slot in &mut self.adjacency {
            slot.clear();
        }
        for &(a, b) in edges {
            if a >= n {
                return Err(SimulationError::UnknownHost(a));
            }
            if b >= n {
                return Err(SimulationError::UnknownHost(b));
            }
            if a == b {
                return Err(SimulationError::Topology(format!("self-loop on host {a}")));
            }
            if !self.adjacency[a].contains(&b) {
                self.adjacency[a].push(b);
                self.adjacency[b].push(a);
            }
        }
        Ok(())
    }

    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn hosts_mut(&mut self) -> &mut [Host] {
        &mut self.hosts
    }

    pub fn host(&self, id: HostId) -> Option<&Host> {
        self.hosts.get(id)
    }

    pub fn host_mut(&mut self, id: HostId) -> Option<&mut Host> {
        self.hosts.get_mut(id)
    }

    pub fn neighbors(&self, id: HostId) -> &[HostId] {
        self.adjacency.get(id).map_or(&[], Vec::as_slice)
    }

    pub fn exposed(&self) -> &[HostId] {
        &self.exposed
    }

    pub fn is_exposed(&self, id: HostId) -> bool {
        self.exposed.contains(&id)
    }

    pub fn is_compromised(&self, id: HostId) -> bool {
        self.hosts.get(id).is_some_and(|h| h.compromised)
    }

    /// Compromised hosts in compromise order, duplicate-free.
    pub fn compromised_hosts(&self) -> &[HostId] {
        &self.compromised
    }

    pub fn fully_compromised(&self) -> bool {
        self.compromised.len() == self.hosts.len()
    }

    pub fn reachable(&self) -> &BTreeSet<HostId> {
        &self.reachable
    }

    /// Undirected edges, each reported once.
    pub fn edges(&self) -> Vec<(HostId, HostId)> {
        let mut out = Vec::new();
        for (a, nbs) in self.adjacency.iter().enumerate() {
            for &b in nbs {
                if a < b {
                    out.push((a, b));
                }
            }
        }
        out
    }

    /// Marks a host compromised and folds it into the reachable set.
    /// Idempotent: returns `false` without side effects when the host
    /// was already compromised.
    pub fn mark_compromised(&mut self, id: HostId) -> Result<bool, SimulationError> {
        let host = self
            .hosts
            .get_mut(id)
            .ok_or(SimulationError::UnknownHost(id))?;
        if host.compromised {
            return Ok(false);
        }
        host.compromised = true;
        self.compromised.push(id);
        self.update_reachable_compromise(id);
        Ok(true)
    }

    /// Incremental reachability update after `host` was compromised:
    /// BFS from the host through other compromised hosts, merging every
    /// neighbor seen along the way. Idempotent.
    pub fn update_reachable_compromise(&mut self, host: HostId) {
        if host >= self.hosts.len() || !self.reachable.contains(&host) {
            return;
        }
        let mut visited = vec![false; self.hosts.len()];
        let mut queue = VecDeque::new();
        if self.is_compromised(host) {
            visited[host] = true;
            queue.push_back(host);
        }
        while let Some(n) = queue.pop_front() {
            for idx in 0..self.adjacency[n].len() {
                let nb = self.adjacency[n][idx];
                self.reachable.insert(nb);
                if !visited[nb] && self.is_compromised(nb) {
                    visited[nb] = true;
                    queue.push_back(nb);
                }
            }
        }
    }

    /// Wholesale recomputation from the exposed set, used after any
    /// topology-changing MTD since edges may have changed arbitrarily.
    /// Idempotent.
    pub fn update_reachable_mtd(&mut self) {
        self.reachable.clear();
        let mut queue: VecDeque<HostId> = VecDeque::new();
        let mut visited = vec![false; self.hosts.len()];
        for &e in &self.exposed {
            if self.reachable.insert(e) {
                visited[e] = true;
                queue.push_back(e);
            }
        }
        while let Some(n) = queue.pop_front() {
            if !self.is_compromised(n) {
                continue;
            }
            for idx in 0..self.adjacency[n].len() {
                let nb = self.adjacency[n][idx];
                self.reachable.insert(nb);
                if !visited[nb] {
                    visited[nb] = true;
                    queue.push_back(nb);
                }
            }
        }
    }

    /// Shortest hop distance from any of `sources` to `target` over the
    /// full graph. `None` means no path (treated as infinite distance
    /// by callers, never an error).
    pub fn distance_from(&self, sources: &[HostId], target: HostId) -> Option<usize> {
        if target >= self.hosts.len() {
            return None;
        }
        let mut dist = vec![usize::MAX; self.hosts.len()];
        let mut queue = VecDeque::new();
        for &s in sources {
            if s < self.hosts.len() && dist[s] == usize::MAX {
                dist[s] = 0;
                queue.push_back(s);
            }
        }
        while let Some(n) = queue.pop_front() {
            if n == target {
                return Some(dist[n]);
            }
            for &nb in &self.adjacency[n] {
                if dist[nb] == usize::MAX {
                    dist[nb] = dist[n] + 1;
                    queue.push_back(nb);
                }
            }
        }
        None
    }

    /// All hosts graph-connected to an exposed endpoint, in BFS order.
    pub fn connected_from_exposed(&self) -> Vec<HostId> {
        let mut visited = vec![false; self.hosts.len()];
        let mut queue = VecDeque::new();
        let mut out = Vec::new();
        for &e in &self.exposed {
            if !visited[e] {
                visited[e] = true;
                queue.push_back(e);
            }
        }
        while let Some(n) = queue.pop_front() {
            out.push(n);
            for &nb in &self.adjacency[n] {
                if !visited[nb] {
                    visited[nb] = true;
                    queue.push_back(nb);
                }
            }
        }
        out
    }

    /// Replaces the edge set (topology MTD) and rebuilds reachability.
    pub fn replace_edges(&mut self, edges: &[(HostId, HostId)]) -> Result<(), SimulationError> {
        self.install_edges(edges)?;
        self.update_reachable_mtd();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::builder::ring;
    use proptest::prelude::*;

    fn ring_state(n: usize) -> NetworkState {
        NetworkState::new(ring(n)).unwrap()
    }

    #[test]
    fn rejects_empty_topology() {
        let spec = TopologySpec {
            hosts: vec![],
            edges: vec![],
            exposed: vec![],
        };
        assert!(matches!(
            NetworkState::new(spec),
            Err(SimulationError::Topology(_))
        ));
    }

    #[test]
    fn reachable_starts_at_exposed() {
        let net = ring_state(5);
        assert_eq!(net.reachable().len(), net.exposed().len());
        for &e in net.exposed() {
            assert!(net.reachable().contains(&e));
        }
    }

    #[test]
    fn compromise_extends_reachable_to_neighbors() {
        let mut net = ring_state(5);
        let exposed = net.exposed()[0];
        assert!(net.mark_compromised(exposed).unwrap());

        for &nb in net.neighbors(exposed).to_vec().iter() {
            assert!(net.reachable().contains(&nb));
        }
    }

    #[test]
    fn compromise_is_idempotent() {
        let mut net = ring_state(5);
        let target = net.exposed()[0];
        assert!(net.mark_compromised(target).unwrap());
        let snapshot: Vec<_> = net.compromised_hosts().to_vec();
        let reachable = net.reachable().clone();

        assert!(!net.mark_compromised(target).unwrap());
        assert_eq!(net.compromised_hosts(), snapshot.as_slice());
        assert_eq!(net.reachable(), &reachable);
    }

    #[test]
    fn reachability_updates_are_idempotent() {
        let mut net = ring_state(6);
        net.mark_compromised(0).unwrap();
        net.mark_compromised(1).unwrap();

        let before = net.reachable().clone();
        net.update_reachable_compromise(1);
        net.update_reachable_mtd();
        assert_eq!(net.reachable(), &before);
    }

    #[test]
    fn distance_none_when_disconnected() {
        let spec = TopologySpec {
            hosts: ring(4).hosts,
            edges: vec![(0, 1)],
            exposed: vec![0],
        };
        let net = NetworkState::new(spec).unwrap();
        assert_eq!(net.distance_from(&[0], 1), Some(1));
        assert_eq!(net.distance_from(&[0], 3), None);
    }

    #[test]
    fn replace_edges_rebuilds_reachability() {
        let mut net = ring_state(4);
        net.mark_compromised(0).unwrap();
        let reach_before = net.reachable().clone();

        // Isolate host 0 from its old neighbors.
        net.replace_edges(&[(1, 2), (2, 3)]).unwrap();
        assert_ne!(net.reachable(), &reach_before);
        // Exposed endpoints always stay reachable.
        assert!(net.reachable().contains(&0));
    }

    proptest! {
        // Without topology changes, reachable never shrinks as hosts
        // are compromised in arbitrary order (repeats included).
        #[test]
        fn reachable_is_monotonic(order in proptest::collection::vec(0usize..7, 0..20)) {
            let mut net = ring_state(7);
            let mut prev = net.reachable().len();
            for id in order {
                let _ = net.mark_compromised(id);
                let now = net.reachable().len();
                prop_assert!(now >= prev);
                prev = now;
            }
        }

        // Invariant: reachable is a superset of the exposed endpoints.
        #[test]
        fn reachable_contains_exposed(compromise in proptest::collection::vec(0usize..7, 0..10)) {
            let mut net = ring_state(7);
            for id in compromise {
                let _ = net.mark_compromised(id);
            }
            for &e in net.exposed().to_vec().iter() {
                prop_assert!(net.reachable().contains(&e));
            }
        }
    }
}

//! ## skifte-core::resource
//! **Single-slot MTD contention resources**
//!
//! Three mutually exclusive tokens: network-layer, application-layer,
//! and reserve. A strategy must hold the resource matching its type
//! before it may reconfigure the network. Occupancy is checked
//! synchronously at trigger time; execution tasks block only on
//! acquisition, never on release.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Classification of an MTD strategy: selects its contention resource
/// and governs interrupt eligibility against the adversary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Network,
    Application,
    Reserve,
}

impl ResourceType {
    pub const ALL: [ResourceType; 3] = [
        ResourceType::Network,
        ResourceType::Application,
        ResourceType::Reserve,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Network => "network",
            ResourceType::Application => "application",
            ResourceType::Reserve => "reserve",
        }
    }
}

/// Identifies the execution task holding or awaiting a resource.
pub type HolderId = u64;

#[derive(Debug, Default)]
struct Slot {
    holder: Option<HolderId>,
    waiters: VecDeque<HolderId>,
}

/// The three binary semaphores with FIFO wait queues.
#[derive(Debug, Default)]
pub struct ResourcePool {
    network: Slot,
    application: Slot,
    reserve: Slot,
}

impl ResourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, rt: ResourceType) -> &Slot {
        match rt {
            ResourceType::Network => &self.network,
            ResourceType::Application => &self.application,
            ResourceType::Reserve => &self.reserve,
        }
    }

    fn slot_mut(&mut self, rt: ResourceType) -> &mut Slot {
        match rt {
            ResourceType::Network => &mut self.network,
            ResourceType::Application => &mut self.application,
            ResourceType::Reserve => &mut self.reserve,
        }
    }

    /// Synchronous occupancy check used by the trigger loop to decide
    /// execute-vs-suspend. Never blocks.
    #[inline]
    pub fn is_occupied(&self, rt: ResourceType) -> bool {
        self.slot(rt).holder.is_some()
    }

    pub fn holder(&self, rt: ResourceType) -> Option<HolderId> {
        self.slot(rt).holder
    }

    /// Grants the resource immediately if free.
    pub fn try_acquire(&mut self, rt: ResourceType, holder: HolderId) -> bool {
        let slot = self.slot_mut(rt);
        if slot.holder.is_none() {
            slot.holder = Some(holder);
            true
        } else {
            false
        }
    }

    /// Grants immediately if free, otherwise queues the holder FIFO.
    /// Returns `true` when granted now.
    pub fn acquire(&mut self, rt: ResourceType, holder: HolderId) -> bool {
        if self.try_acquire(rt, holder) {
            return true;
        }
        self.slot_mut(rt).waiters.push_back(holder);
        false
    }

    /// Releases the resource and hands it to the next waiter, if any.
    /// Returns the newly granted holder so the caller can resume it.
    pub fn release(&mut self, rt: ResourceType, holder: HolderId) -> Option<HolderId> {
        let slot = self.slot_mut(rt);
        if slot.holder != Some(holder) {
            tracing::warn!(
                resource = rt.as_str(),
                holder,
                "release by non-holder ignored"
            );
            return None;
        }
        slot.holder = slot.waiters.pop_front();
        slot.holder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_is_exclusive() {
        let mut pool = ResourcePool::new();
        assert!(pool.try_acquire(ResourceType::Network, 1));
        assert!(!pool.try_acquire(ResourceType::Network, 2));
        assert!(pool.is_occupied(ResourceType::Network));
        // Other slots are independent.
        assert!(pool.try_acquire(ResourceType::Application, 2));
    }

    #[test]
    fn release_grants_next_waiter_fifo() {
        let mut pool = ResourcePool::new();
        assert!(pool.acquire(ResourceType::Application, 1));
        assert!(!pool.acquire(ResourceType::Application, 2));
        assert!(!pool.acquire(ResourceType::Application, 3));

        assert_eq!(pool.release(ResourceType::Application, 1), Some(2));
        assert_eq!(pool.holder(ResourceType::Application), Some(2));
        assert_eq!(pool.release(ResourceType::Application, 2), Some(3));
        assert_eq!(pool.release(ResourceType::Application, 3), None);
        assert!(!pool.is_occupied(ResourceType::Application));
    }

    #[test]
    fn release_by_non_holder_is_ignored() {
        let mut pool = ResourcePool::new();
        assert!(pool.try_acquire(ResourceType::Reserve, 1));
        assert_eq!(pool.release(ResourceType::Reserve, 99), None);
        assert_eq!(pool.holder(ResourceType::Reserve), Some(1));
    }
}

//! The two periodic MTD loops' bookkeeping: scheme-driven strategy
//! registration into a FIFO queue, and trigger-time selection that
//! prefers suspended work so nothing starves.

use std::collections::{HashMap, VecDeque};

use rand::rngs::SmallRng;
use rand::seq::IndexedRandom;
use tracing::debug;

use skifte_core::variates;

use crate::scheme::MtdScheme;
use crate::strategy::{MtdStrategy, MtdStrategyKind};

/// Interval floor keeps a degenerate sample from busy-looping the run.
const INTERVAL_FLOOR_NS: u64 = 1_000_000;

/// Mean/std pairs for the two loop intervals. Intervals are
/// exponentially distributed; the std bounds the tail (samples are
/// truncated at mean + 2·std).
#[derive(Debug, Clone)]
pub struct SchedulerIntervals {
    pub register_mean_ns: u64,
    pub register_std_ns: u64,
    pub trigger_mean_ns: u64,
    pub trigger_std_ns: u64,
}

#[derive(Debug, Default, Clone)]
pub struct KindStats {
    pub registered: u64,
    pub executed: u64,
    pub suspended: u64,
}

#[derive(Debug, Default, Clone)]
pub struct MtdStats {
    pub registered: u64,
    pub executed: u64,
    pub suspended: u64,
    per_kind: HashMap<MtdStrategyKind, KindStats>,
}

impl MtdStats {
    pub fn per_kind(&self) -> &HashMap<MtdStrategyKind, KindStats> {
        &self.per_kind
    }

    fn kind_mut(&mut self, kind: MtdStrategyKind) -> &mut KindStats {
        self.per_kind.entry(kind).or_default()
    }
}

pub struct MtdScheduler {
    scheme: MtdScheme,
    /// Active roster; for the alternating scheme this doubles as the
    /// rotation order, each pick moving to the back.
    rotation: VecDeque<MtdStrategyKind>,
    queue: VecDeque<MtdStrategy>,
    suspended: VecDeque<MtdStrategy>,
    intervals: SchedulerIntervals,
    stats: MtdStats,
}

impl MtdScheduler {
    pub fn new(
        scheme: MtdScheme,
        roster: Vec<MtdStrategyKind>,
        intervals: SchedulerIntervals,
    ) -> Self {
        Self {
            scheme,
            rotation: roster.into_iter().collect(),
            queue: VecDeque::new(),
            suspended: VecDeque::new(),
            intervals,
            stats: MtdStats::default(),
        }
    }

    pub fn scheme(&self) -> MtdScheme {
        self.scheme
    }

    /// Whether the two loops should run at all.
    pub fn is_enabled(&self) -> bool {
        self.scheme != MtdScheme::None && !self.rotation.is_empty()
    }

    pub fn next_register_delay_ns(&self, rng: &mut SmallRng) -> u64 {
        sample_interval(
            rng,
            self.intervals.register_mean_ns,
            self.intervals.register_std_ns,
        )
    }

    pub fn next_trigger_delay_ns(&self, rng: &mut SmallRng) -> u64 {
        sample_interval(
            rng,
            self.intervals.trigger_mean_ns,
            self.intervals.trigger_std_ns,
        )
    }

    /// One registration tick: selects strategies per the active scheme
    /// and pushes fresh instances onto the FIFO queue.
    pub fn register(&mut self, now_ns: u64, rng: &mut SmallRng) {
        let picks: Vec<MtdStrategyKind> = match self.scheme {
            MtdScheme::Simultaneous => {
                let mut all: Vec<MtdStrategyKind> = self.rotation.iter().copied().collect();
                all.sort_by_key(|k| k.priority());
                all
            }
            MtdScheme::Random => {
                let pool: Vec<MtdStrategyKind> = self.rotation.iter().copied().collect();
                pool.choose(rng).into_iter().copied().collect()
            }
            MtdScheme::Alternating => match self.rotation.pop_front() {
                Some(kind) => {
                    self.rotation.push_back(kind);
                    vec![kind]
                }
                None => Vec::new(),
            },
            MtdScheme::None => Vec::new(),
        };

        for kind in picks {
            debug!(strategy = kind.name(), now_ns, "strategy registered");
            self.stats.registered += 1;
            self.stats.kind_mut(kind).registered += 1;
            self.queue.push_back(MtdStrategy::new(kind, now_ns));
        }
    }

    /// Trigger-time selection: suspended work outranks the main queue.
    /// Returns the strategy and whether it came from the suspended
    /// queue.
    pub fn next_for_trigger(&mut self) -> Option<(MtdStrategy, bool)> {
        if let Some(s) = self.suspended.pop_front() {
            return Some((s, true));
        }
        self.queue.pop_front().map(|s| (s, false))
    }

    /// Parks a strategy whose resource was occupied. It is retried on
    /// the next trigger tick, not on a timer of its own.
    pub fn suspend(&mut self, strategy: MtdStrategy) {
        debug!(strategy = strategy.name(), "strategy suspended");
        self.stats.suspended += 1;
        self.stats.kind_mut(strategy.kind).suspended += 1;
        self.suspended.push_back(strategy);
    }

    pub fn record_executed(&mut self, kind: MtdStrategyKind) {
        self.stats.executed += 1;
        self.stats.kind_mut(kind).executed += 1;
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn suspended_len(&self) -> usize {
        self.suspended.len()
    }

    pub fn stats(&self) -> &MtdStats {
        &self.stats
    }
}

fn sample_interval(rng: &mut SmallRng, mean_ns: u64, std_ns: u64) -> u64 {
    let cap = mean_ns.saturating_add(std_ns.saturating_mul(2)).max(1);
    variates::exponential_ns(rng, mean_ns)
        .clamp(INTERVAL_FLOOR_NS.min(cap), cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use skifte_core::time::secs_to_ns;

    fn intervals() -> SchedulerIntervals {
        SchedulerIntervals {
            register_mean_ns: secs_to_ns(60.0),
            register_std_ns: secs_to_ns(30.0),
            trigger_mean_ns: secs_to_ns(30.0),
            trigger_std_ns: secs_to_ns(15.0),
        }
    }

    fn scheduler(scheme: MtdScheme) -> MtdScheduler {
        MtdScheduler::new(scheme, MtdStrategyKind::ALL.to_vec(), intervals())
    }

    #[test]
    fn simultaneous_registers_all_by_priority() {
        let mut sched = scheduler(MtdScheme::Simultaneous);
        let mut rng = SmallRng::seed_from_u64(1);
        sched.register(0, &mut rng);

        assert_eq!(sched.queued(), MtdStrategyKind::ALL.len());
        let (first, _) = sched.next_for_trigger().unwrap();
        assert_eq!(first.kind, MtdStrategyKind::CompleteTopologyShuffle);
    }

    #[test]
    fn random_registers_exactly_one() {
        let mut sched = scheduler(MtdScheme::Random);
        let mut rng = SmallRng::seed_from_u64(1);
        sched.register(0, &mut rng);
        assert_eq!(sched.queued(), 1);
    }

    #[test]
    fn alternating_rotates_roster() {
        let mut sched = scheduler(MtdScheme::Alternating);
        let mut rng = SmallRng::seed_from_u64(1);

        let mut seen = Vec::new();
        for _ in 0..MtdStrategyKind::ALL.len() {
            sched.register(0, &mut rng);
            let (s, _) = sched.next_for_trigger().unwrap();
            seen.push(s.kind);
        }
        // One full rotation visits every strategy exactly once.
        let mut sorted = seen.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), MtdStrategyKind::ALL.len());

        // The next pick wraps around to the first again.
        sched.register(0, &mut rng);
        let (s, _) = sched.next_for_trigger().unwrap();
        assert_eq!(s.kind, seen[0]);
    }

    #[test]
    fn none_scheme_registers_nothing() {
        let mut sched = scheduler(MtdScheme::None);
        let mut rng = SmallRng::seed_from_u64(1);
        sched.register(0, &mut rng);
        assert_eq!(sched.queued(), 0);
        assert!(!sched.is_enabled());
    }

    #[test]
    fn suspended_queue_outranks_main_queue() {
        let mut sched = scheduler(MtdScheme::Simultaneous);
        let mut rng = SmallRng::seed_from_u64(1);
        sched.register(0, &mut rng);

        let (first, from_suspended) = sched.next_for_trigger().unwrap();
        assert!(!from_suspended);
        sched.suspend(first.clone());

        let (next, from_suspended) = sched.next_for_trigger().unwrap();
        assert!(from_suspended);
        assert_eq!(next.kind, first.kind);
        assert_eq!(sched.stats().suspended, 1);
    }

    #[test]
    fn intervals_stay_within_cap_and_floor() {
        let sched = scheduler(MtdScheme::Random);
        let mut rng = SmallRng::seed_from_u64(1);
        let cap = secs_to_ns(60.0) + 2 * secs_to_ns(30.0);
        for _ in 0..1000 {
            let d = sched.next_register_delay_ns(&mut rng);
            assert!(d >= INTERVAL_FLOOR_NS);
            assert!(d <= cap);
        }
    }
}

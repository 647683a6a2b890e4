//! Attack state machine parameters.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct AdversaryConfig {
    /// Per-host attempt count after which the host is given up on
    /// (unless it is the designated target).
    #[serde(default = "default_threshold")]
    #[validate(range(min = 1))]
    pub attack_threshold: u32,

    /// Global attempt budget; reaching it ends the run cleanly.
    #[serde(default = "default_cap")]
    #[validate(range(min = 1))]
    pub attempt_cap: u32,

    /// Optional single target host; its compromise ends the run.
    #[serde(default)]
    pub target_host: Option<usize>,

    /// Floor probability for brute forcing once credentials are held.
    #[serde(default = "default_brute_floor")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub brute_force_floor: f64,

    /// Per-phase wait durations.
    #[serde(default)]
    #[validate(nested)]
    pub durations: DurationsConfig,
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct DurationsConfig {
    #[validate(range(min = 0.0))]
    pub scan_host_secs: f64,
    #[validate(range(min = 0.0))]
    pub enum_host_secs: f64,
    #[validate(range(min = 0.0))]
    pub scan_port_secs: f64,
    /// Mean of the exponential exploit wait.
    #[validate(range(min = 0.001))]
    pub exploit_vuln_mean_secs: f64,
    #[validate(range(min = 0.0))]
    pub brute_force_secs: f64,
    #[validate(range(min = 0.0))]
    pub scan_neighbor_secs: f64,
    /// Delay paid after an interrupted phase before restarting.
    #[validate(range(min = 0.0))]
    pub penalty_secs: f64,
}

fn default_threshold() -> u32 {
    5
}

fn default_cap() -> u32 {
    500
}

fn default_brute_floor() -> f64 {
    0.05
}

impl Default for AdversaryConfig {
    fn default() -> Self {
        Self {
            attack_threshold: default_threshold(),
            attempt_cap: default_cap(),
            target_host: None,
            brute_force_floor: default_brute_floor(),
            durations: DurationsConfig::default(),
        }
    }
}

impl Default for DurationsConfig {
    fn default() -> Self {
        Self {
            scan_host_secs: 5.0,
            enum_host_secs: 2.0,
            scan_port_secs: 10.0,
            exploit_vuln_mean_secs: 30.0,
            brute_force_secs: 20.0,
            scan_neighbor_secs: 5.0,
            penalty_secs: 15.0,
        }
    }
}

//! Run-level simulation parameters.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct SimulationConfig {
    /// Seed for the run's RNG; two runs with the same seed and
    /// configuration replay identically.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// MTD scheme: simultaneous | random | alternating | none.
    #[serde(default = "default_scheme")]
    #[validate(custom(function = validation::validate_scheme))]
    pub scheme: String,

    /// Optional virtual-time horizon in seconds; absent means "run
    /// until the adversary terminates".
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub horizon_secs: Option<f64>,

    /// Registration loop interval (exponential).
    #[serde(default = "default_registration")]
    #[validate(nested)]
    pub registration: IntervalConfig,

    /// Trigger loop interval (exponential).
    #[serde(default = "default_trigger")]
    #[validate(nested)]
    pub trigger: IntervalConfig,
}

/// Mean/std pair for an exponentially distributed loop interval; the
/// std bounds the sampled tail.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct IntervalConfig {
    #[validate(range(min = 0.001))]
    pub mean_secs: f64,

    #[validate(range(min = 0.0))]
    pub std_secs: f64,
}

fn default_seed() -> u64 {
    42
}

fn default_scheme() -> String {
    "alternating".into()
}

fn default_registration() -> IntervalConfig {
    IntervalConfig {
        mean_secs: 240.0,
        std_secs: 120.0,
    }
}

fn default_trigger() -> IntervalConfig {
    IntervalConfig {
        mean_secs: 120.0,
        std_secs: 60.0,
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            scheme: default_scheme(),
            horizon_secs: None,
            registration: default_registration(),
            trigger: default_trigger(),
        }
    }
}

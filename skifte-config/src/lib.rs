//! # Skifte Configuration System
//!
//! Hierarchical configuration for every Skifte component.
//!
//! ## Features
//! - **Unified Configuration**: single source of truth across crates
//! - **Validation**: runtime validation of all critical parameters
//! - **Environment Awareness**: `SKIFTE_*` variables override files

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod adversary;
mod error;
mod mtd;
mod simulation;
mod telemetry;
mod validation;

pub use adversary::{AdversaryConfig, DurationsConfig};
pub use error::ConfigError;
pub use mtd::MtdConfig;
pub use simulation::{IntervalConfig, SimulationConfig};
pub use telemetry::TelemetryConfig;

/// Top-level configuration container for all Skifte components.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone)]
pub struct SkifteConfig {
    /// Run-level parameters (seed, scheme, horizon, loop intervals).
    #[validate(nested)]
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Attack state machine parameters.
    #[validate(nested)]
    #[serde(default)]
    pub adversary: AdversaryConfig,

    /// MTD roster and address space.
    #[validate(nested)]
    #[serde(default)]
    pub mtd: MtdConfig,

    /// Logging and metrics parameters.
    #[validate(nested)]
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl SkifteConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values
    /// 2. `config/skifte.yaml`, when present
    /// 3. `SKIFTE_*` environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(SkifteConfig::default()));

        if Path::new("config/skifte.yaml").exists() {
            figment = figment.merge(Yaml::file("config/skifte.yaml"));
        }

        figment
            .merge(Env::prefixed("SKIFTE_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }

    /// Load configuration from a specific path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        Figment::from(Serialized::defaults(SkifteConfig::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed("SKIFTE_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_validation() {
        let config = SkifteConfig::default();
        config.validate().expect("default config should validate");
    }

    #[test]
    fn rejects_unknown_scheme() {
        let mut config = SkifteConfig::default();
        config.simulation.scheme = "quantum".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unknown_strategy_name() {
        let mut config = SkifteConfig::default();
        config.mtd.strategies.push("dns_rebind".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn environment_override() {
        std::env::set_var("SKIFTE_SIMULATION__SEED", "1234");
        let config = SkifteConfig::load().unwrap();
        assert_eq!(config.simulation.seed, 1234);
        std::env::remove_var("SKIFTE_SIMULATION__SEED");
    }
}

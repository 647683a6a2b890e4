//! MTD roster and reconfiguration parameters.

use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct MtdConfig {
    /// Active strategy set, by name.
    #[serde(default = "default_strategies")]
    #[validate(custom(function = validation::validate_strategy_names))]
    pub strategies: Vec<String>,

    /// Address space IP shuffles draw from.
    #[serde(default = "default_address_space")]
    pub address_space: Ipv4Network,
}

fn default_strategies() -> Vec<String> {
    [
        "complete_topology_shuffle",
        "ip_shuffle",
        "port_shuffle",
        "service_diversity",
        "os_diversity",
        "user_shuffle",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_address_space() -> Ipv4Network {
    "10.0.0.0/16".parse().expect("static CIDR")
}

impl Default for MtdConfig {
    fn default() -> Self {
        Self {
            strategies: default_strategies(),
            address_space: default_address_space(),
        }
    }
}

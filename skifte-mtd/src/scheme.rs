//! Registration schemes: the policy governing how strategies are
//! selected each time the registration loop wakes up.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MtdScheme {
    /// Register every strategy on each tick, priority-ordered.
    Simultaneous,
    /// Pick one strategy uniformly at random.
    Random,
    /// Round-robin through the roster, moving each pick to the back.
    Alternating,
    /// No MTD at all; the adversary runs uncontested.
    None,
}

impl MtdScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            MtdScheme::Simultaneous => "simultaneous",
            MtdScheme::Random => "random",
            MtdScheme::Alternating => "alternating",
            MtdScheme::None => "none",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "simultaneous" => Some(MtdScheme::Simultaneous),
            "random" => Some(MtdScheme::Random),
            "alternating" => Some(MtdScheme::Alternating),
            "none" => Some(MtdScheme::None),
            _ => Option::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_names() {
        for scheme in [
            MtdScheme::Simultaneous,
            MtdScheme::Random,
            MtdScheme::Alternating,
            MtdScheme::None,
        ] {
            assert_eq!(MtdScheme::from_name(scheme.as_str()), Some(scheme));
        }
        assert_eq!(MtdScheme::from_name("bogus"), Option::None);
    }
}

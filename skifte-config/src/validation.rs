//! Custom validation functions shared across configuration modules.

use validator::ValidationError;

/// Validate the MTD scheme name.
pub fn validate_scheme(scheme: &str) -> Result<(), ValidationError> {
    let re = regex::Regex::new("^(simultaneous|random|alternating|none)$")
        .map_err(|_| ValidationError::new("invalid_regex"))?;
    if re.is_match(scheme) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_scheme"))
    }
}

/// Validate that every configured strategy name is known.
pub fn validate_strategy_names(names: &[String]) -> Result<(), ValidationError> {
    let re = regex::Regex::new(
        "^(complete_topology_shuffle|ip_shuffle|port_shuffle|service_diversity|os_diversity|user_shuffle)$",
    )
    .map_err(|_| ValidationError::new("invalid_regex"))?;
    if names.iter().all(|n| re.is_match(n)) {
        Ok(())
    } else {
        Err(ValidationError::new("unknown_strategy"))
    }
}

/// Validate the default log filter level.
pub fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid = ["trace", "debug", "info", "warn", "error"]
        .contains(&level.to_lowercase().as_str());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_names() {
        assert!(validate_scheme("alternating").is_ok());
        assert!(validate_scheme("none").is_ok());
        assert!(validate_scheme("sometimes").is_err());
    }

    #[test]
    fn strategy_names() {
        assert!(validate_strategy_names(&["ip_shuffle".into()]).is_ok());
        assert!(validate_strategy_names(&["ip_shuffle".into(), "bogus".into()]).is_err());
    }

    #[test]
    fn log_levels() {
        assert!(validate_log_level("info").is_ok());
        assert!(validate_log_level("chatty").is_err());
    }
}

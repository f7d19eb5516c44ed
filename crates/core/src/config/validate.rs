use super::{types::Config, ConfigError};

/// Validate configuration.
///
/// Every bound that guarantees termination or a non-degenerate cache must be
/// at least 1, and relay bases must be absolute http(s) URLs.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let bounds = [
        ("enumeration.page_size", config.enumeration.page_size as u64),
        ("enumeration.max_pages", config.enumeration.max_pages as u64),
        ("enumeration.fallback_limit", config.enumeration.fallback_limit as u64),
        ("cache.capacity", config.cache.capacity as u64),
        ("cache.ttl_secs", config.cache.ttl_secs),
        ("pipeline.max_processed", config.pipeline.max_processed as u64),
    ];
    for (name, value) in bounds {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!(
                "{} must be at least 1",
                name
            )));
        }
    }

    if let Some(relay) = config
        .resolver
        .relays
        .iter()
        .find(|r| !(r.starts_with("http://") || r.starts_with("https://")))
    {
        return Err(ConfigError::ValidationError(format!(
            "resolver.relays entry is not an http(s) URL: {}",
            relay
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_zero_capacity_fails() {
        let mut config = Config::default();
        config.cache.capacity = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("cache.capacity"));
    }

    #[test]
    fn test_validate_zero_max_pages_fails() {
        let mut config = Config::default();
        config.enumeration.max_pages = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("enumeration.max_pages"));
    }

    #[test]
    fn test_validate_relay_scheme() {
        let mut config = Config::default();
        config.resolver.relays = vec!["ftp://relay.example.com/".to_string()];
        assert!(validate_config(&config).is_err());

        config.resolver.relays = vec!["https://relay.example.com/?u=".to_string()];
        assert!(validate_config(&config).is_ok());
    }
}

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Retention and sweep interval are positive
/// - Fetch timeout and size cap are positive
/// - Batch parallelism and size limits are positive
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let checks: [(bool, &str); 7] = [
        (config.server.port == 0, "server.port cannot be 0"),
        (
            config.storage.retention_secs == 0,
            "storage.retention_secs must be greater than 0",
        ),
        (
            config.storage.sweep_interval_secs == 0,
            "storage.sweep_interval_secs must be greater than 0",
        ),
        (
            config.fetch.timeout_secs == 0,
            "fetch.timeout_secs must be greater than 0",
        ),
        (
            config.fetch.max_bytes == 0,
            "fetch.max_bytes must be greater than 0",
        ),
        (
            config.batch.max_parallel_jobs == 0,
            "batch.max_parallel_jobs must be greater than 0",
        ),
        (
            config.batch.max_items == 0,
            "batch.max_items must be greater than 0",
        ),
    ];

    match checks.iter().find(|(failed, _)| *failed) {
        Some((_, message)) => Err(ConfigError::ValidationError(message.to_string())),
        None => Ok(()),
    }
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
    fn test_validate_zero_retention_fails() {
        let mut config = Config::default();
        config.storage.retention_secs = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("retention_secs"));
    }

    #[test]
    fn test_validate_zero_parallelism_fails() {
        let mut config = Config::default();
        config.batch.max_parallel_jobs = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("max_parallel_jobs"));
    }
}

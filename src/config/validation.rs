use crate::config::types::{Config, FetcherConfig, SchedulerConfig, SiteConfig, StorageConfig};
use crate::crawler::{StorageDialect, TaskKind};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scheduler_config(&config.scheduler)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_storage_config(&config.storage)?;
    validate_site_config(&config.site)?;
    Ok(())
}

/// Validates scheduler configuration
fn validate_scheduler_config(config: &SchedulerConfig) -> Result<(), ConfigError> {
    if config.check_interval_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "check_interval_secs must be >= 1, got {}",
            config.check_interval_secs
        )));
    }

    if config.restart_delay_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "restart_delay_secs must be >= 1, got {}",
            config.restart_delay_secs
        )));
    }

    if config.tasks.is_empty() {
        return Err(ConfigError::Validation(
            "tasks must name at least one task type".to_string(),
        ));
    }

    for key in &config.tasks {
        TaskKind::resolve(key)?;
    }

    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.concurrency_limit < 1 || config.concurrency_limit > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency_limit must be between 1 and 100, got {}",
            config.concurrency_limit
        )));
    }

    if let Some(agent) = &config.user_agent {
        if agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user_agent cannot be empty".to_string(),
            ));
        }
    }

    if config.request_timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    let dialect = StorageDialect::resolve(&config.dialect)?;

    if dialect.needs_path() && config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    for name in [&config.hubs_table, &config.articles_table, &config.logs_table] {
        validate_table_name(name)?;
    }

    Ok(())
}

/// Validates site configuration
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let origin = Url::parse(&config.origin)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid origin '{}': {}", config.origin, e)))?;

    if origin.scheme() != "http" && origin.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "origin '{}' must use http or https",
            config.origin
        )));
    }

    if origin.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "origin '{}' has no host",
            config.origin
        )));
    }

    Ok(())
}

/// Validates a table name: a plain SQL identifier
fn validate_table_name(name: &str) -> Result<(), ConfigError> {
    let mut chars = name.chars();

    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if !valid {
        return Err(ConfigError::Validation(format!(
            "table name '{}' must be a plain identifier (letters, digits, underscores)",
            name
        )));
    }

    Ok(())
}

use crate::config::types::{Config, CrawlConfig, ExtractionConfig, RunConfig, SessionConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_session_config(&config.session)?;
    validate_crawl_config(&config.crawl)?;
    validate_extraction_config(&config.extraction)?;
    validate_run_config(&config.run)?;
    Ok(())
}

fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.page_load_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "page_load_timeout_ms must be > 0".to_string(),
        ));
    }

    if let Some(path) = &config.chrome_path {
        if path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "chrome_path cannot be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.main_page_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "main_page_timeout_ms must be > 0".to_string(),
        ));
    }

    if config.secondary_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "secondary_timeout_ms must be > 0".to_string(),
        ));
    }

    for path in &config.contact_paths {
        validate_contact_path(path)?;
    }

    Ok(())
}

/// Contact paths are appended to `scheme://host`, so they must be absolute
fn validate_contact_path(path: &str) -> Result<(), ConfigError> {
    if path.is_empty() {
        return Err(ConfigError::Validation(
            "contact path cannot be empty".to_string(),
        ));
    }

    if !path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "contact path must start with '/', got '{}'",
            path
        )));
    }

    if path.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "contact path cannot contain whitespace, got '{}'",
            path
        )));
    }

    Ok(())
}

fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    if config
        .placeholder_domains
        .iter()
        .chain(config.placeholder_local_parts.iter())
        .any(|token| token.trim().is_empty())
    {
        return Err(ConfigError::Validation(
            "placeholder tokens cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_run_config(config: &RunConfig) -> Result<(), ConfigError> {
    if config.checkpoint_every < 1 {
        return Err(ConfigError::Validation(format!(
            "checkpoint_every must be >= 1, got {}",
            config.checkpoint_every
        )));
    }

    if config.max_consecutive_errors < 1 {
        return Err(ConfigError::Validation(format!(
            "max_consecutive_errors must be >= 1, got {}",
            config.max_consecutive_errors
        )));
    }

    if config.restart_every < 1 {
        return Err(ConfigError::Validation(format!(
            "restart_every must be >= 1, got {}",
            config.restart_every
        )));
    }

    Ok(())
}

use crate::config::types::{
    Config, OutputConfig, ProxyConfig, RequesterConfig, TargetConfig, UserAgentConfig,
    MAX_AVERAGE_WAIT_SECS,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_requester_config(&config.requester)?;
    validate_target_config(&config.target)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_proxy_config(&config.proxy)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates retry, timeout and throttle settings
fn validate_requester_config(config: &RequesterConfig) -> Result<(), ConfigError> {
    if config.failure_threshold < 1 {
        return Err(ConfigError::Validation(format!(
            "failure_threshold must be >= 1, got {}",
            config.failure_threshold
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if !(0.0..=MAX_AVERAGE_WAIT_SECS).contains(&config.average_wait_secs) {
        return Err(ConfigError::Validation(format!(
            "average_wait_secs must be between 0 and {}, got {}",
            MAX_AVERAGE_WAIT_SECS, config.average_wait_secs
        )));
    }

    if config.max_attempts == Some(0) {
        return Err(ConfigError::Validation(
            "max_attempts must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    validate_http_url("call_log_url", &config.call_log_url)?;
    validate_http_url("relative_url_prefix", &config.relative_url_prefix)?;
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Name: non-empty, alphanumeric + hyphens only
    if config.name.is_empty() {
        return Err(ConfigError::Validation(
            "user agent name cannot be empty".to_string(),
        ));
    }

    if !config.name.chars().all(|c| c.is_alphanumeric() || c == '-') {
        return Err(ConfigError::Validation(format!(
            "user agent name must contain only alphanumeric characters and hyphens, got '{}'",
            config.name
        )));
    }

    validate_http_url("contact_url", &config.contact_url)?;
    Ok(())
}

fn validate_proxy_config(config: &ProxyConfig) -> Result<(), ConfigError> {
    validate_http_url("list_url", &config.list_url)?;

    if config.row_selector.trim().is_empty() {
        return Err(ConfigError::Validation(
            "row_selector cannot be empty".to_string(),
        ));
    }

    if let Some(Err(e)) = config.starting_identity() {
        return Err(ConfigError::Validation(format!(
            "Invalid starting_proxy: {}",
            e
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.dispatch_directory.is_empty() {
        return Err(ConfigError::Validation(
            "dispatch_directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Checks that a URL parses and uses an HTTP(S) scheme
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", field, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use HTTP or HTTPS",
            field, value
        )));
    }

    Ok(())
}

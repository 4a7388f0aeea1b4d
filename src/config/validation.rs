use crate::config::types::{ApiConfig, AuthConfig, Config, CrawlerConfig, DownloadConfig, ServerConfig};
use crate::ConfigError;
use std::net::SocketAddr;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_api_config(&config.api)?;
    validate_auth_config(&config.auth)?;
    validate_download_config(&config.download)?;
    validate_server_config(&config.server)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.pool_multiplier < 1 || config.pool_multiplier > 20 {
        return Err(ConfigError::Validation(format!(
            "pool_multiplier must be between 1 and 20, got {}",
            config.pool_multiplier
        )));
    }

    if config.max_items < 1 {
        return Err(ConfigError::Validation(format!(
            "max_items must be >= 1, got {}",
            config.max_items
        )));
    }

    if config.download_concurrency < 1 || config.download_concurrency > 32 {
        return Err(ConfigError::Validation(format!(
            "download_concurrency must be between 1 and 32, got {}",
            config.download_concurrency
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    if config.exclude_tags.iter().any(|t| t.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "exclude_tags cannot contain empty tags".to_string(),
        ));
    }

    Ok(())
}

/// Validates API endpoint configuration
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    validate_http_url("base_url", &config.base_url)?;

    if let Some(oauth_url) = config.oauth_url.as_deref().filter(|u| !u.is_empty()) {
        validate_http_url("oauth_url", oauth_url)?;

        if config.client_id.is_empty() || config.client_secret.is_empty() {
            return Err(ConfigError::Validation(
                "client_id and client_secret are required when oauth_url is set".to_string(),
            ));
        }
    }

    for (name, value) in [
        ("search_target", &config.search_target),
        ("sort", &config.sort),
        ("app_user_agent", &config.app_user_agent),
    ] {
        if value.is_empty() {
            return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
        }
    }

    Ok(())
}

/// Validates credential cache configuration
fn validate_auth_config(config: &AuthConfig) -> Result<(), ConfigError> {
    if config.token_path.is_empty() {
        return Err(ConfigError::Validation(
            "token_path cannot be empty".to_string(),
        ));
    }

    if let Some(login_url) = &config.login_url {
        validate_http_url("login_url", login_url)?;
    }

    Ok(())
}

/// Validates image download configuration
fn validate_download_config(config: &DownloadConfig) -> Result<(), ConfigError> {
    validate_http_url("referer", &config.referer)?;

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP service configuration
fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    config.bind.parse::<SocketAddr>().map_err(|e| {
        ConfigError::Validation(format!("Invalid bind address '{}': {}", config.bind, e))
    })?;

    if config.download_root.is_empty() {
        return Err(ConfigError::Validation(
            "download_root cannot be empty".to_string(),
        ));
    }

    if config.status_capacity < 1 {
        return Err(ConfigError::Validation(format!(
            "status_capacity must be >= 1, got {}",
            config.status_capacity
        )));
    }

    if config.retained_runs < 1 {
        return Err(ConfigError::Validation(
            "retained_runs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Checks that `value` parses as an http(s) URL
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, value, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}

use http::HeaderName;

use super::{AppConfig, ConfigError, UpstreamFamily};

const VALID_LOG_LEVELS: &[&str] = &[
    "DEBUG", "INFO", "WARNING", "WARN", "ERROR", "CRITICAL", "DISABLED",
];

/// Validate the full application config, returning an error if any rule is violated.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] when any configuration invariant is violated.
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    validate_server_config(config)?;
    validate_upstreams(config)?;
    validate_listing(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validation_err(msg: impl Into<String>) -> ConfigError {
    ConfigError::Validation(msg.into())
}

fn validate_server_config(config: &AppConfig) -> Result<(), ConfigError> {
    let server = &config.server;
    if server.http_pool_max_idle_per_host == 0 {
        return Err(validation_err(
            "server.http_pool_max_idle_per_host must be greater than 0",
        ));
    }
    if server.timeout == 0 {
        return Err(validation_err("server.timeout must be greater than 0"));
    }
    if server.runtime_worker_threads == Some(0) {
        return Err(validation_err(
            "server.runtime_worker_threads must be greater than 0 when set",
        ));
    }
    if server.runtime_max_blocking_threads == Some(0) {
        return Err(validation_err(
            "server.runtime_max_blocking_threads must be greater than 0 when set",
        ));
    }
    if server.base_path.contains('?') || server.base_path.contains('#') {
        return Err(validation_err(
            "server.base_path must be a plain path without query or fragment",
        ));
    }
    Ok(())
}

fn validate_upstreams(config: &AppConfig) -> Result<(), ConfigError> {
    for family in UpstreamFamily::ALL {
        let upstream = config.upstreams.get(family);
        let base_url = upstream.base_url.trim();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(validation_err(format!(
                "upstreams.{family}.base_url must start with http:// or https://"
            )));
        }
        if let Err(err) = url::Url::parse(base_url) {
            return Err(validation_err(format!(
                "upstreams.{family}.base_url is not a valid URL: {err}"
            )));
        }
        if let Some(env_name) = upstream.auth_header_env.as_deref() {
            if env_name.trim().is_empty() {
                return Err(validation_err(format!(
                    "upstreams.{family}.auth_header_env cannot be empty when set"
                )));
            }
        }
        if let Some(value) = upstream.auth_header.expose() {
            if http::HeaderValue::from_str(value).is_err() {
                return Err(validation_err(format!(
                    "upstreams.{family}: credential is not a valid header value"
                )));
            }
        }
        for name in &upstream.relay_headers {
            if HeaderName::from_bytes(name.as_bytes()).is_err() {
                return Err(validation_err(format!(
                    "upstreams.{family}.relay_headers contains invalid header name '{name}'"
                )));
            }
        }
    }
    Ok(())
}

fn validate_listing(config: &AppConfig) -> Result<(), ConfigError> {
    if config.listing.default_per_page == 0 {
        return Err(validation_err(
            "listing.default_per_page must be greater than 0",
        ));
    }
    Ok(())
}

fn validate_logging(config: &AppConfig) -> Result<(), ConfigError> {
    let level = config.features.log_level.to_uppercase();
    if !VALID_LOG_LEVELS.contains(&level.as_str()) {
        return Err(validation_err(format!(
            "features.log_level '{}' is invalid. Must be one of: {}",
            config.features.log_level,
            VALID_LOG_LEVELS.join(", ")
        )));
    }
    let format = config.features.log_format.to_lowercase();
    if format != "text" && format != "json" {
        return Err(validation_err(format!(
            "features.log_format '{}' is invalid. Must be one of: text, json",
            config.features.log_format
        )));
    }
    Ok(())
}

pub mod validation;

use serde::{Deserialize, Deserializer};
use std::fmt;

use self::validation::validate_config;

/// Error type for configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// The two upstream API families the gateway talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpstreamFamily {
    /// WordPress REST API (`/wp-json/wp/v2`): posts and categories.
    Content,
    /// WooCommerce REST API (`/wp-json/wc/v3`): products.
    Commerce,
}

impl UpstreamFamily {
    pub const ALL: [UpstreamFamily; 2] = [UpstreamFamily::Content, UpstreamFamily::Commerce];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            UpstreamFamily::Content => "content",
            UpstreamFamily::Commerce => "commerce",
        }
    }

    /// Environment variable holding the `Authorization` value when the config
    /// does not name one explicitly.
    #[must_use]
    pub fn default_auth_env(self) -> &'static str {
        match self {
            UpstreamFamily::Content => "WP_AUTH_HEADER",
            UpstreamFamily::Commerce => "WC_AUTH_HEADER",
        }
    }
}

impl fmt::Display for UpstreamFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upstream `Authorization` header value. Never printed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credential(Option<String>);

impl Credential {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Self(None)
        } else {
            Self(Some(value))
        }
    }

    #[must_use]
    pub fn unset() -> Self {
        Self(None)
    }

    #[must_use]
    pub fn expose(&self) -> Option<&str> {
        self.0.as_deref()
    }

    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("Credential(<redacted>)"),
            None => f.write_str("Credential(<unset>)"),
        }
    }
}

impl<'de> Deserialize<'de> for Credential {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<String>::deserialize(deserializer)?;
        Ok(value.map_or_else(Credential::unset, Credential::new))
    }
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    /// Upstream request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_http_pool_max_idle_per_host")]
    pub http_pool_max_idle_per_host: usize,
    #[serde(default = "default_http_pool_idle_timeout_secs")]
    pub http_pool_idle_timeout_secs: u64,
    #[serde(default)]
    pub runtime_worker_threads: Option<usize>,
    #[serde(default = "default_runtime_max_blocking_threads")]
    pub runtime_max_blocking_threads: Option<usize>,
    /// Path prefix stripped before routing (`/api` by default).
    #[serde(default = "default_base_path")]
    pub base_path: String,
    #[serde(default)]
    pub http_use_env_proxy: bool,
}

fn default_port() -> u16 {
    8788
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_timeout() -> u64 {
    30
}
fn default_http_pool_max_idle_per_host() -> usize {
    16
}
fn default_http_pool_idle_timeout_secs() -> u64 {
    15
}
#[allow(clippy::unnecessary_wraps)]
fn default_runtime_max_blocking_threads() -> Option<usize> {
    Some(8)
}
fn default_base_path() -> String {
    "/api".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            timeout: default_timeout(),
            http_pool_max_idle_per_host: default_http_pool_max_idle_per_host(),
            http_pool_idle_timeout_secs: default_http_pool_idle_timeout_secs(),
            runtime_worker_threads: None,
            runtime_max_blocking_threads: default_runtime_max_blocking_threads(),
            base_path: default_base_path(),
            http_use_env_proxy: false,
        }
    }
}

/// One upstream family: where it lives and how the gateway authenticates to it.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    pub base_url: String,
    /// Environment variable read once at load time for the `Authorization` value.
    #[serde(default)]
    pub auth_header_env: Option<String>,
    /// Inline `Authorization` value; the environment variable wins when set.
    #[serde(default)]
    pub auth_header: Credential,
    /// Upstream response headers copied onto the gateway response when present.
    #[serde(default = "default_relay_headers")]
    pub relay_headers: Vec<String>,
}

fn default_relay_headers() -> Vec<String> {
    vec!["X-WP-TotalPages".to_string(), "X-WP-Total".to_string()]
}

impl UpstreamConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, credential: Credential) -> Self {
        Self {
            base_url: base_url.into(),
            auth_header_env: None,
            auth_header: credential,
            relay_headers: default_relay_headers(),
        }
    }

    fn resolve_credential<F>(&mut self, family: UpstreamFamily, env_lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_name = self
            .auth_header_env
            .as_deref()
            .unwrap_or_else(|| family.default_auth_env());
        if let Some(value) = env_lookup(env_name) {
            let credential = Credential::new(value);
            if credential.is_set() {
                self.auth_header = credential;
            }
        }
    }
}

/// Both upstream families.
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamsConfig {
    pub content: UpstreamConfig,
    pub commerce: UpstreamConfig,
}

impl UpstreamsConfig {
    #[must_use]
    pub fn get(&self, family: UpstreamFamily) -> &UpstreamConfig {
        match family {
            UpstreamFamily::Content => &self.content,
            UpstreamFamily::Commerce => &self.commerce,
        }
    }

    fn get_mut(&mut self, family: UpstreamFamily) -> &mut UpstreamConfig {
        match family {
            UpstreamFamily::Content => &mut self.content,
            UpstreamFamily::Commerce => &mut self.commerce,
        }
    }

    /// Fill each family's credential from the environment.
    pub fn resolve_credentials<F>(&mut self, env_lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for family in UpstreamFamily::ALL {
            self.get_mut(family).resolve_credential(family, &env_lookup);
        }
    }
}

/// Post listing behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct ListingConfig {
    #[serde(default = "default_per_page")]
    pub default_per_page: u32,
}

fn default_per_page() -> u32 {
    12
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            default_per_page: default_per_page(),
        }
    }
}

/// Feature flags and settings.
#[derive(Debug, Clone, Deserialize)]
pub struct FeaturesConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// `text` (default) or `json`.
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_log_level() -> String {
    "INFO".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub upstreams: UpstreamsConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
}

/// Load configuration from a YAML file, resolve credentials from the process
/// environment, and validate it.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when reading the file fails, [`ConfigError::Yaml`]
/// when parsing fails, or [`ConfigError::Validation`] when semantic validation fails.
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents, |name| std::env::var(name).ok())
}

/// Parse and validate configuration text, resolving credentials through `env_lookup`.
///
/// # Errors
///
/// Returns [`ConfigError::Yaml`] when parsing fails or [`ConfigError::Validation`]
/// when semantic validation fails.
pub fn parse_config<F>(contents: &str, env_lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: AppConfig = serde_yaml::from_str(contents)?;
    config.upstreams.resolve_credentials(env_lookup);
    validate_config(&config)?;
    Ok(config)
}

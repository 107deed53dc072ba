//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Pricing configuration.
    #[serde(default)]
    pub pricing: PricingConfig,
    /// Payment provider configuration.
    #[serde(default)]
    pub payment: PaymentConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Pricing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PricingConfig {
    /// Currency quoted prices are denominated in.
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
        }
    }
}

/// Payment provider configuration.
///
/// Missing `api_token`/`profile_id` leaves the provider unconfigured;
/// payment initiation still records a local payment row but returns no
/// checkout URL.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Provider API token.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Provider profile ID.
    #[serde(default)]
    pub profile_id: Option<String>,
    /// Use the provider's sandbox environment.
    #[serde(default)]
    pub sandbox: bool,
    /// URL customers are redirected to after checkout.
    #[serde(default)]
    pub redirect_url: Option<String>,
    /// Seconds between verification polls.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Maximum verification poll attempts before timing out.
    #[serde(default = "default_poll_max_attempts")]
    pub poll_max_attempts: u32,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            profile_id: None,
            sandbox: false,
            redirect_url: None,
            poll_interval_secs: default_poll_interval_secs(),
            poll_max_attempts: default_poll_max_attempts(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

fn default_currency() -> String {
    "GBP".to_string()
}

const fn default_poll_interval_secs() -> u64 {
    5
}

const fn default_poll_max_attempts() -> u32 {
    120
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `ACADEMY_ENV`)
    /// 3. Environment variables with `ACADEMY_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("ACADEMY_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("ACADEMY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("ACADEMY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

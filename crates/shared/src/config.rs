//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Daily closing configuration.
    #[serde(default)]
    pub closing: ClosingConfig,
    /// Maintenance tooling configuration.
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
    /// Fixed reference rows provisioned at install time.
    #[serde(default)]
    pub reference: ReferenceConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Where the opening balance comes from when no earlier cash count exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpeningFallback {
    /// Use the stored balance snapshot (or zero).
    #[default]
    Snapshot,
    /// Recompute from the ledger.
    Ledger,
}

/// Daily closing configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClosingConfig {
    /// Opening balance fallback strategy.
    #[serde(default)]
    pub opening_fallback: OpeningFallback,
}

/// Maintenance tooling configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceConfig {
    /// Environment variable that must be set to `yes` before a batch job mutates data.
    #[serde(default = "default_confirm_env_var")]
    pub confirm_env_var: String,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            confirm_env_var: default_confirm_env_var(),
        }
    }
}

fn default_confirm_env_var() -> String {
    "CASHDESK_CONFIRM_EXECUTE".to_string()
}

/// Reference rows looked up by the services.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceConfig {
    /// Username of the system user recorded on automated movements.
    #[serde(default = "default_system_username")]
    pub system_username: String,
    /// Code of the currency external services operate in.
    #[serde(default = "default_base_currency_code")]
    pub base_currency_code: String,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            system_username: default_system_username(),
            base_currency_code: default_base_currency_code(),
        }
    }
}

fn default_system_username() -> String {
    "system".to_string()
}

fn default_base_currency_code() -> String {
    "USD".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("CASHDESK").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

//! Quote service configuration

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Quote service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Service host
    pub host: String,
    /// Service port
    pub port: u16,
    /// Pricing document (JSON); the built-in catalog is used when unset
    pub catalog_path: Option<PathBuf>,
    /// Currency used when a quote request names none
    pub default_currency: String,
    /// Quote cache settings
    pub cache: CacheSettings,
    /// Exchange-rate overrides keyed by currency code
    pub currency_rates: HashMap<String, Decimal>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8090,
            catalog_path: None,
            default_currency: crewbill_common::BASE_CURRENCY.to_string(),
            cache: CacheSettings::default(),
            currency_rates: HashMap::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `crewbill.toml` and `CREWBILL__*` variables
    pub fn load() -> Result<Self> {
        // Try to load .env file
        let _ = dotenvy::dotenv();

        let settings = config::Config::builder()
            .add_source(config::File::with_name("crewbill").required(false))
            .add_source(
                config::Environment::with_prefix("CREWBILL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut cfg: ServerConfig = settings.try_deserialize()?;

        // Platform-provided PORT takes priority
        cfg.apply_port(std::env::var("PORT").ok().as_deref());
        Ok(cfg)
    }

    fn apply_port(&mut self, port: Option<&str>) {
        if let Some(p) = port.and_then(|p| p.parse::<u16>().ok()) {
            self.port = p;
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Quote cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Maximum cached quotes; 0 disables caching
    pub max_entries: usize,
    /// Time-to-live in seconds
    pub ttl_secs: u64,
    /// Namespace for cache keys
    pub key_prefix: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            ttl_secs: 300,
            key_prefix: "crewbill".to_string(),
        }
    }
}

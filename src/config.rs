//! Configuration management for Regdesk server

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Public site URL, used for payment redirects when the request has no Origin header
    pub public_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    /// When set, logs are also written to a daily-rolling file in this directory
    #[serde(default)]
    pub directory: Option<String>,
}

/// Key-value store backend selection
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Redis,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    /// Price identifier for single-visit tickets
    pub price_single: String,
    /// Price identifier for monthly passes
    pub price_monthly: String,
    pub api_base: String,
    /// Page size used when listing completed sessions
    pub list_limit: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    /// Argon2 PHC hash of the admin password
    pub password_hash: String,
    pub jwt_secret: String,
    pub session_hours: u64,
}

/// Sample values from shipped configuration, never accepted for signing
const PLACEHOLDER_JWT_SECRETS: &[&str] = &["change-this-secret-in-production", "change-me"];

impl AdminConfig {
    /// The JWT secret, unless it is blank or a published placeholder
    pub fn signing_secret(&self) -> Option<&str> {
        let trimmed = self.jwt_secret.trim();
        if trimmed.is_empty() || PLACEHOLDER_JWT_SECRETS.contains(&trimmed) {
            None
        } else {
            Some(self.jwt_secret.as_str())
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EventConfig {
    /// Offset of the venue's wall clock from UTC; periods roll over at local midnight
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    /// Maximum number of days returned by the history listing
    pub max_days: usize,
    pub retention_days: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub store: StoreConfig,
    pub stripe: StripeConfig,
    pub admin: AdminConfig,
    #[serde(default)]
    pub event: EventConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Environment variables with prefix REGDESK_, e.g. REGDESK_SERVER__PORT
            .add_source(
                Environment::with_prefix("REGDESK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("store.url", env::var("REDIS_URL").ok())?
            .set_override_option("stripe.secret_key", env::var("STRIPE_SECRET_KEY").ok())?
            .set_override_option("stripe.price_single", env::var("STRIPE_PRICE_SINGLE").ok())?
            .set_override_option("stripe.price_monthly", env::var("STRIPE_PRICE_MONTHLY").ok())?
            .set_override_option("admin.password_hash", env::var("ADMIN_PASSWORD_HASH").ok())?
            .set_override_option("admin.jwt_secret", env::var("JWT_SECRET").ok())?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            public_url: "http://localhost:3000".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            directory: None,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Redis,
            url: "redis://127.0.0.1:6379".to_string(),
        }
    }
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            price_single: String::new(),
            price_monthly: String::new(),
            api_base: "https://api.stripe.com/v1".to_string(),
            list_limit: 100,
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            password_hash: String::new(),
            jwt_secret: String::new(),
            session_hours: 12,
        }
    }
}

impl Default for EventConfig {
    fn default() -> Self {
        Self { utc_offset_minutes: 0 }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_days: 52,
            retention_days: 365,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            store: StoreConfig::default(),
            stripe: StripeConfig::default(),
            admin: AdminConfig::default(),
            event: EventConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

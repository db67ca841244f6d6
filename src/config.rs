use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{BankError, BankResult};

pub const DEFAULT_CONFIG_PATH: &str = "revobank.toml";
const DEV_SECRET: &str = "development-secret-key";

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Testing,
    Production,
}

impl std::str::FromStr for Environment {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(BankError::Config(format!("Unknown environment '{}'", other))),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BankConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub bank: CatalogConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingConfig {
    /// Falls back to the environment default when unset.
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    pub max_login_attempts: u32,
    pub lockout_minutes: i64,
    pub argon2_memory_kib: u32,
    pub argon2_iterations: u32,
    pub argon2_parallelism: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_transaction_amount: Decimal,
    pub max_single_transaction: Decimal,
    pub daily_outflow_limit: Decimal,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    pub default_categories: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            environment: Environment::Development,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "./data/revobank".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEV_SECRET.to_string(),
            access_token_ttl_secs: 60 * 60,
            refresh_token_ttl_secs: 30 * 24 * 60 * 60,
            max_login_attempts: 5,
            lockout_minutes: 15,
            argon2_memory_kib: 19 * 1024,
            argon2_iterations: 2,
            argon2_parallelism: 1,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_transaction_amount: Decimal::from(1_000_000),
            max_single_transaction: Decimal::from(5_000),
            daily_outflow_limit: Decimal::from(10_000),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            default_categories: ["Housing", "Food", "Transportation", "Utilities", "Entertainment"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
            auth: AuthConfig::default(),
            limits: LimitsConfig::default(),
            bank: CatalogConfig::default(),
        }
    }
}

impl BankConfig {
    /// Loads the file if it exists, applies environment overrides and validates.
    pub fn load_or_default(path: &str) -> BankResult<Self> {
        let mut config = if Path::new(path).exists() {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| BankError::Config(format!("reading {}: {}", path, e)))?;
            let parsed: BankConfig = toml::from_str(&raw)?;
            info!(path, "config loaded");
            parsed
        } else {
            debug!(path, "config file not found, using defaults");
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Settings for in-process tests: throwaway storage and cheap hashing.
    pub fn for_tests() -> Self {
        let mut config = Self::default();
        config.server.environment = Environment::Testing;
        config.auth.jwt_secret = "test-secret-key-with-enough-entropy".to_string();
        config.auth.argon2_memory_kib = 256;
        config.auth.argon2_iterations = 1;
        config
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> BankResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(env) = lookup("REVOBANK_ENV") {
            self.server.environment = env.parse()?;
        }
        if let Some(host) = lookup("REVOBANK_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("REVOBANK_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| BankError::Config(format!("Invalid REVOBANK_PORT '{}'", port)))?;
        }
        if let Some(path) = lookup("REVOBANK_DB_PATH") {
            self.storage.db_path = path;
        }
        if let Some(secret) = lookup("JWT_SECRET_KEY") {
            self.auth.jwt_secret = secret;
        }
        if let Some(level) = lookup("REVOBANK_LOG_LEVEL") {
            self.logging.level = Some(level);
        }
        Ok(())
    }

    pub fn validate(&self) -> BankResult<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(BankError::Config("auth.jwt_secret must not be empty".to_string()));
        }
        if self.server.environment == Environment::Production
            && (self.auth.jwt_secret == DEV_SECRET || self.auth.jwt_secret.len() < 32)
        {
            return Err(BankError::Config(
                "No JWT secret set for production environment (JWT_SECRET_KEY, at least 32 bytes)"
                    .to_string(),
            ));
        }
        if self.auth.access_token_ttl_secs <= 0 || self.auth.refresh_token_ttl_secs <= 0 {
            return Err(BankError::Config("token lifetimes must be positive".to_string()));
        }
        if self.auth.max_login_attempts == 0 {
            return Err(BankError::Config("auth.max_login_attempts must be at least 1".to_string()));
        }
        let limits = &self.limits;
        if limits.max_single_transaction <= Decimal::ZERO
            || limits.daily_outflow_limit <= Decimal::ZERO
            || limits.max_transaction_amount <= Decimal::ZERO
        {
            return Err(BankError::Config("transaction limits must be positive".to_string()));
        }
        Ok(())
    }

    pub fn to_toml(&self) -> BankResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

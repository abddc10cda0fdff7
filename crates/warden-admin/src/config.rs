//! Configuration file management.
//!
//! The file holds tunables only. Key material comes from the environment
//! (see [`Secrets`]) and never appears in the file.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use warden_crypto::aead::{derive_key, Key};
use warden_crypto::password::{self, PasswordParams};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "WARDEN_CONFIG";
/// Environment variable holding the database encryption passphrase.
pub const DB_KEY_ENV: &str = "WARDEN_DB_KEY";
/// Environment variable holding the token signing passphrase.
pub const TOKEN_KEY_ENV: &str = "WARDEN_TOKEN_KEY";

/// Database path that selects a private in-memory store.
pub const IN_MEMORY: &str = ":memory:";

/// Complete admin service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database file, or `:memory:`.
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Read-only connections opened alongside the primary.
    #[serde(default = "default_replicas")]
    pub replicas: usize,
}

/// Password hashing and token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Argon2id memory cost in KiB.
    #[serde(default = "default_m_cost")]
    pub m_cost: u32,
    /// Argon2id iterations.
    #[serde(default = "default_t_cost")]
    pub t_cost: u32,
    /// Argon2id lanes.
    #[serde(default = "default_p_cost")]
    pub p_cost: u32,
    /// Lifetime of issued tokens.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
}

/// Request handling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Upper bound on any single controller or session call.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace" | "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default value functions

fn default_database_path() -> String {
    "warden.db".to_string()
}

fn default_replicas() -> usize {
    2
}

fn default_m_cost() -> u32 {
    password::DEFAULT_M_COST
}

fn default_t_cost() -> u32 {
    password::DEFAULT_T_COST
}

fn default_p_cost() -> u32 {
    password::DEFAULT_P_COST
}

fn default_token_ttl() -> u64 {
    86_400
}

fn default_request_timeout() -> u64 {
    5_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            replicas: default_replicas(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            m_cost: default_m_cost(),
            t_cost: default_t_cost(),
            p_cost: default_p_cost(),
            token_ttl_secs: default_token_ttl(),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl AdminConfig {
    /// Load configuration from `$WARDEN_CONFIG`, else `./warden.toml`.
    ///
    /// Falls back to defaults if the file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: AdminConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    fn config_path() -> PathBuf {
        std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("warden.toml"))
    }

    pub fn in_memory(&self) -> bool {
        self.storage.database_path == IN_MEMORY
    }

    pub fn password_params(&self) -> PasswordParams {
        PasswordParams {
            m_cost: self.security.m_cost,
            t_cost: self.security.t_cost,
            p_cost: self.security.p_cost,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.runtime.request_timeout_ms)
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.security.token_ttl_secs)
    }
}

/// The two process keys: one encrypts user fields, one signs tokens.
#[derive(Clone)]
pub struct Secrets {
    pub db_key: Key,
    pub token_key: Key,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secrets(<redacted>)")
    }
}

impl Secrets {
    /// Derive both keys from passphrases.
    pub fn from_passphrases(db: &str, token: &str) -> warden_crypto::Result<Self> {
        Ok(Self {
            db_key: derive_key(db)?,
            token_key: derive_key(token)?,
        })
    }

    /// Read both passphrases from the environment.
    pub fn from_env() -> anyhow::Result<Self> {
        let db = std::env::var(DB_KEY_ENV)
            .map_err(|_| anyhow::anyhow!("{DB_KEY_ENV} must be set"))?;
        let token = std::env::var(TOKEN_KEY_ENV)
            .map_err(|_| anyhow::anyhow!("{TOKEN_KEY_ENV} must be set"))?;
        if db.is_empty() || token.is_empty() {
            anyhow::bail!("{DB_KEY_ENV} and {TOKEN_KEY_ENV} must not be empty");
        }
        Ok(Self::from_passphrases(&db, &token)?)
    }
}

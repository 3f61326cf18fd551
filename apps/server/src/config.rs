//! # Server Configuration
//!
//! ## Load Order (later overrides earlier)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Default values          ServerConfig::default()                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  2. Config file             --config <path>                            │
//! │                             $SHOPFLOOR_CONFIG                           │
//! │                             <config dir>/shopfloor/shopfloor.toml       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  3. Environment             SHOPFLOOR_PORT, SHOPFLOOR_DB_PATH, ...      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  validate()                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example File
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! max_terminals = 64
//!
//! [database]
//! path = "/var/lib/shopfloor/shopfloor.db"
//! max_connections = 5
//! busy_timeout_ms = 5000
//!
//! [store]
//! name = "Corner Store"
//! handle = "cornerstore"
//! contact = "+91 98765 43210"
//! address = "12 Market Road"
//!
//! [files]
//! barcode_dir = "/var/lib/shopfloor/barcodes"
//! receipt_dir = "/var/spool/shopfloor"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shopfloor_core::receipt::StoreHeader;
use shopfloor_db::DbConfig;
use tracing::{debug, info};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "SHOPFLOOR_CONFIG";

/// Complete server configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub store: StoreSettings,
    pub files: FileSettings,
}

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Most terminals that may hold a cart at once.
    pub max_terminals: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_terminals: 64,
        }
    }
}

/// SQLite settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: PathBuf,
    pub max_connections: u32,
    /// Longest wait for the writer lock. A checkout that cannot get it in
    /// time fails with `TRANSACTION_ABORTED`.
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: PathBuf::from("shopfloor.db"),
            max_connections: 5,
            busy_timeout_ms: 5000,
        }
    }
}

/// Store details printed on receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub name: String,
    pub handle: String,
    pub contact: String,
    pub address: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            name: "Shopfloor Store".to_string(),
            handle: "shopfloor".to_string(),
            contact: String::new(),
            address: String::new(),
        }
    }
}

impl StoreSettings {
    pub fn header(&self) -> StoreHeader {
        StoreHeader {
            name: self.name.clone(),
            handle: self.handle.clone(),
            contact: self.contact.clone(),
            address: self.address.clone(),
        }
    }
}

/// Where generated files go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    pub barcode_dir: PathBuf,
    pub receipt_dir: PathBuf,
}

impl Default for FileSettings {
    fn default() -> Self {
        FileSettings {
            barcode_dir: PathBuf::from("barcodes"),
            receipt_dir: PathBuf::from("receipts"),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// An explicitly named file (argument or `SHOPFLOOR_CONFIG`) must exist;
    /// the per-user default location is optional.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let explicit = config_path.or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Parses one TOML file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Applies `SHOPFLOOR_*` overrides from `lookup`.
    ///
    /// Takes a lookup function instead of reading the process environment
    /// directly so tests can feed their own values.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SHOPFLOOR_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SHOPFLOOR_PORT") {
            self.server.port = parse_var("SHOPFLOOR_PORT", &port)?;
            debug!(port = self.server.port, "Overriding port from environment");
        }
        if let Some(max) = lookup("SHOPFLOOR_MAX_TERMINALS") {
            self.server.max_terminals = parse_var("SHOPFLOOR_MAX_TERMINALS", &max)?;
        }
        if let Some(path) = lookup("SHOPFLOOR_DB_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(max) = lookup("SHOPFLOOR_DB_MAX_CONNECTIONS") {
            self.database.max_connections = parse_var("SHOPFLOOR_DB_MAX_CONNECTIONS", &max)?;
        }
        if let Some(ms) = lookup("SHOPFLOOR_DB_BUSY_TIMEOUT_MS") {
            self.database.busy_timeout_ms = parse_var("SHOPFLOOR_DB_BUSY_TIMEOUT_MS", &ms)?;
        }
        if let Some(name) = lookup("SHOPFLOOR_STORE_NAME") {
            self.store.name = name;
        }
        if let Some(handle) = lookup("SHOPFLOOR_STORE_HANDLE") {
            self.store.handle = handle;
        }
        if let Some(contact) = lookup("SHOPFLOOR_STORE_CONTACT") {
            self.store.contact = contact;
        }
        if let Some(address) = lookup("SHOPFLOOR_STORE_ADDRESS") {
            self.store.address = address;
        }
        if let Some(dir) = lookup("SHOPFLOOR_BARCODE_DIR") {
            self.files.barcode_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("SHOPFLOOR_RECEIPT_DIR") {
            self.files.receipt_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue("server.port must not be 0".into()));
        }
        if self.server.max_terminals == 0 {
            return Err(ConfigError::InvalidValue(
                "server.max_terminals must be greater than 0".into(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "database.max_connections must be greater than 0".into(),
            ));
        }
        if self.store.name.trim().is_empty() {
            return Err(ConfigError::MissingRequired("store.name".into()));
        }
        Ok(())
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Pool settings for [`shopfloor_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path)
            .max_connections(self.database.max_connections)
            .busy_timeout(Duration::from_millis(self.database.busy_timeout_ms))
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "shopfloor", "pos")
            .map(|dirs| dirs.config_dir().join("shopfloor.toml"))
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(format!("{key}={value}")))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.db_config().busy_timeout, Duration::from_millis(5000));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [server]
            port = 9000

            [store]
            name = "Corner Store"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.store.name, "Corner Store");
        assert_eq!(config.store.handle, "shopfloor");
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SHOPFLOOR_PORT", "9100"),
            ("SHOPFLOOR_DB_PATH", "/tmp/till.db"),
            ("SHOPFLOOR_STORE_NAME", "Night Market"),
            ("SHOPFLOOR_RECEIPT_DIR", "/tmp/spool"),
            ("SHOPFLOOR_MAX_TERMINALS", "8"),
        ]
        .into_iter()
        .collect();

        let mut config = ServerConfig::default();
        config
            .apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.database.path, PathBuf::from("/tmp/till.db"));
        assert_eq!(config.store.name, "Night Market");
        assert_eq!(config.files.receipt_dir, PathBuf::from("/tmp/spool"));
        assert_eq!(config.server.max_terminals, 8);
    }

    #[test]
    fn test_bad_env_value_is_rejected() {
        let mut config = ServerConfig::default();
        let err = config
            .apply_overrides(|k| (k == "SHOPFLOOR_PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_validate_rejects() {
        let mut config = ServerConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.server.max_terminals = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.store.name = "  ".into();
        assert!(matches!(config.validate(), Err(ConfigError::MissingRequired(_))));
    }

    #[test]
    fn test_missing_explicit_file() {
        let path = std::env::temp_dir().join("shopfloor-no-such-config.toml");
        let err = ServerConfig::load(Some(path)).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}

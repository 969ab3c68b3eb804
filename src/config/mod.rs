//! Configuration management.
//!
//! [`InventoryConfig`] is assembled from defaults, an optional TOML file and
//! the environment, later sources overriding earlier ones:
//!
//! ```toml
//! listen = "0.0.0.0:8000"
//! store = "sqlite"
//! db_path = "/var/lib/asset-inventory/inventory.db"
//! log_format = "json"
//! debug = false
//! metrics_listen = "127.0.0.1:9090"
//!
//! [universe]
//! namespace = "asset-inventory"
//! version = "0.0.1"
//! ```

use crate::models::{Universe, UniverseVersion};
use crate::observability::LogFormat;
use crate::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const APP_DIR: &str = "asset-inventory";

/// Graph store backing the inventory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreKind {
    /// Process-local store, lost on exit.
    #[default]
    Memory,
    /// SQLite database file.
    Sqlite,
}

impl FromStr for StoreKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(Error::InvalidInput(format!("unknown store kind: {other}"))),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Main configuration for the inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryConfig {
    /// REST listen address.
    pub listen: SocketAddr,
    /// Store backend.
    pub store: StoreKind,
    /// SQLite database path, used when `store` is [`StoreKind::Sqlite`].
    pub db_path: PathBuf,
    /// Universe every write and scoped read targets.
    pub universe: Universe,
    /// Log output format.
    pub log_format: LogFormat,
    /// Debug-level logging.
    pub debug: bool,
    /// Prometheus exporter address; no exporter when absent.
    pub metrics_listen: Option<SocketAddr>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Listen address.
    pub listen: Option<String>,
    /// Store kind.
    pub store: Option<String>,
    /// SQLite path.
    pub db_path: Option<String>,
    /// Log format.
    pub log_format: Option<String>,
    /// Debug logging.
    pub debug: Option<bool>,
    /// Metrics listen address.
    pub metrics_listen: Option<String>,
    /// Universe section.
    pub universe: Option<ConfigFileUniverse>,
}

/// Universe section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileUniverse {
    /// Namespace.
    pub namespace: Option<String>,
    /// Version, `xx.xx.xx`.
    pub version: Option<String>,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8000)),
            store: StoreKind::Memory,
            db_path: default_db_path(),
            universe: Universe::current(),
            log_format: LogFormat::Pretty,
            debug: false,
            metrics_listen: None,
        }
    }
}

impl InventoryConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or holds an
    /// invalid value.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::operation_failed("read_config_file", format!("{}: {e}", path.display()))
        })?;
        Self::from_toml(&contents)
    }

    /// Parses a TOML document over the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be parsed or holds an invalid
    /// value.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents)
            .map_err(|e| Error::operation_failed("parse_config_file", e))?;
        let mut config = Self::default();
        config.apply_file(file)?;
        Ok(config)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/asset-inventory/` on macOS)
    /// 2. XDG config dir (`~/.config/asset-inventory/` for Unix compatibility)
    ///
    /// Returns default configuration if no config file is found.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be loaded.
    pub fn load_default() -> Result<Self> {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Ok(Self::default());
        };

        let platform_config = base_dirs.config_dir().join(APP_DIR).join("config.toml");
        if platform_config.exists() {
            return Self::load_from_file(&platform_config);
        }

        let xdg_config = base_dirs
            .home_dir()
            .join(".config")
            .join(APP_DIR)
            .join("config.toml");
        if xdg_config.exists() {
            return Self::load_from_file(&xdg_config);
        }

        Ok(Self::default())
    }

    /// Loads the file (explicit path or default location), then applies `.env`
    /// and the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if any source holds an invalid value.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_default()?,
        };
        if let Ok(env_file) = dotenvy::dotenv() {
            tracing::debug!(path = %env_file.display(), "Loaded .env file");
        }
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn apply_file(&mut self, file: ConfigFile) -> Result<()> {
        if let Some(listen) = file.listen {
            self.listen = parse_addr("listen", &listen)?;
        }
        if let Some(store) = file.store {
            self.store = store.parse()?;
        }
        if let Some(db_path) = file.db_path {
            self.db_path = PathBuf::from(db_path);
        }
        if let Some(format) = file.log_format {
            self.log_format = format.parse()?;
        }
        if let Some(debug) = file.debug {
            self.debug = debug;
        }
        if let Some(metrics_listen) = file.metrics_listen {
            self.metrics_listen = Some(parse_addr("metrics_listen", &metrics_listen)?);
        }
        if let Some(universe) = file.universe {
            if let Some(namespace) = universe.namespace {
                self.universe.namespace = namespace;
            }
            if let Some(version) = universe.version {
                self.universe.version = version.parse()?;
            }
        }
        Ok(())
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// `PORT` replaces only the port of the listen address;
    /// `INVENTORY_LISTEN` replaces the whole address and wins over `PORT`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a malformed value.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(store) = lookup("INVENTORY_STORE") {
            self.store = store.parse()?;
        }
        if let Some(db_path) = lookup("INVENTORY_DB_PATH") {
            self.db_path = PathBuf::from(db_path);
        }
        if let Some(port) = lookup("PORT") {
            let port: u16 = port
                .parse()
                .map_err(|_| Error::InvalidInput(format!("invalid PORT: {port}")))?;
            self.listen.set_port(port);
        }
        if let Some(listen) = lookup("INVENTORY_LISTEN") {
            self.listen = parse_addr("INVENTORY_LISTEN", &listen)?;
        }
        if let Some(namespace) = lookup("INVENTORY_UNIVERSE_NAMESPACE") {
            self.universe.namespace = namespace;
        }
        if let Some(version) = lookup("INVENTORY_UNIVERSE_VERSION") {
            self.universe.version = version.parse::<UniverseVersion>()?;
        }
        if let Some(format) = lookup("INVENTORY_LOG_FORMAT") {
            self.log_format = format.parse()?;
        }
        if let Some(debug) = lookup("INVENTORY_DEBUG") {
            self.debug = parse_bool(&debug);
        }
        if let Some(metrics_listen) = lookup("INVENTORY_METRICS_LISTEN") {
            self.metrics_listen = Some(parse_addr("INVENTORY_METRICS_LISTEN", &metrics_listen)?);
        }
        Ok(())
    }

    /// Sets the listen address.
    #[must_use]
    pub const fn with_listen(mut self, listen: SocketAddr) -> Self {
        self.listen = listen;
        self
    }
}

fn default_db_path() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from("inventory.db"),
        |dirs| dirs.data_local_dir().join(APP_DIR).join("inventory.db"),
    )
}

fn parse_addr(what: &str, value: &str) -> Result<SocketAddr> {
    value
        .parse()
        .map_err(|_| Error::InvalidInput(format!("invalid {what} address: {value}")))
}

fn parse_bool(value: &str) -> bool {
    let value = value.to_lowercase();
    value == "true" || value == "1" || value == "yes"
}

impl fmt::Display for InventoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "listen={} store={} universe={}",
            self.listen, self.store, self.universe
        )?;
        if self.store == StoreKind::Sqlite {
            write!(f, " db_path={}", self.db_path.display())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = InventoryConfig::default();
        assert_eq!(config.listen.to_string(), "0.0.0.0:8000");
        assert_eq!(config.store, StoreKind::Memory);
        assert_eq!(config.universe, Universe::current());
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.metrics_listen.is_none());
    }

    #[test]
    fn test_from_toml() {
        let config = InventoryConfig::from_toml(
            r#"
            listen = "127.0.0.1:9000"
            store = "sqlite"
            db_path = "/tmp/inv.db"
            log_format = "json"

            [universe]
            version = "1.2.3"
            "#,
        )
        .unwrap();
        assert_eq!(config.listen.port(), 9000);
        assert_eq!(config.store, StoreKind::Sqlite);
        assert_eq!(config.db_path, PathBuf::from("/tmp/inv.db"));
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.universe.namespace, "asset-inventory");
        assert_eq!(config.universe.version.as_int(), 10_203);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "debug = true\n").unwrap();
        assert!(InventoryConfig::load_from_file(&path).unwrap().debug);
        assert!(InventoryConfig::load_from_file(&dir.path().join("absent.toml")).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = InventoryConfig::default();
        config
            .apply_env(env(&[
                ("PORT", "8080"),
                ("INVENTORY_STORE", "SQLite"),
                ("INVENTORY_UNIVERSE_NAMESPACE", "staging"),
                ("INVENTORY_UNIVERSE_VERSION", "0.1.0"),
                ("INVENTORY_DEBUG", "yes"),
            ]))
            .unwrap();
        assert_eq!(config.listen.to_string(), "0.0.0.0:8080");
        assert_eq!(config.store, StoreKind::Sqlite);
        assert_eq!(config.universe.to_string(), "staging@0.1.0");
        assert!(config.debug);
    }

    #[test]
    fn test_listen_wins_over_port() {
        let mut config = InventoryConfig::default();
        config
            .apply_env(env(&[("PORT", "8080"), ("INVENTORY_LISTEN", "127.0.0.1:7000")]))
            .unwrap();
        assert_eq!(config.listen.to_string(), "127.0.0.1:7000");
    }

    #[test_case("INVENTORY_STORE", "postgres" ; "unknown store")]
    #[test_case("INVENTORY_UNIVERSE_VERSION", "1.2" ; "bad version")]
    #[test_case("INVENTORY_LISTEN", "localhost" ; "bad address")]
    #[test_case("PORT", "http" ; "bad port")]
    #[test_case("INVENTORY_LOG_FORMAT", "xml" ; "bad log format")]
    fn test_env_rejects(key: &str, value: &str) {
        let mut config = InventoryConfig::default();
        let err = config.apply_env(env(&[(key, value)])).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_unknown_file_key_rejected() {
        assert!(InventoryConfig::from_toml("colour = \"blue\"").is_err());
    }
}

//! Configuration loading
//!
//! Every setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error. A config file that exists but
//! cannot be parsed is.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Default voting period: one week
pub const DEFAULT_VOTING_PERIOD_SECS: u64 = 7 * 24 * 60 * 60;

/// Default number of same-direction votes that closes a modification early
pub const DEFAULT_UNANIMITY_THRESHOLD: i64 = 3;

/// Default interval between background sweeps
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Default number of modifications per listing page
pub const DEFAULT_PAGE_SIZE: i64 = 25;

/// Default HTTP bind address
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:5780";

pub const ENV_DATABASE: &str = "MODQ_DATABASE";
pub const ENV_BIND: &str = "MODQ_BIND";
pub const ENV_VOTING_PERIOD_SECS: &str = "MODQ_VOTING_PERIOD_SECS";
pub const ENV_UNANIMITY_THRESHOLD: &str = "MODQ_UNANIMITY_THRESHOLD";
pub const ENV_SWEEP_INTERVAL_SECS: &str = "MODQ_SWEEP_INTERVAL_SECS";
pub const ENV_PAGE_SIZE: &str = "MODQ_PAGE_SIZE";

/// Settings consumed by the moderation engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Elapsed time after which an open modification is resolved by majority
    pub voting_period: Duration,
    /// Same-direction vote count that resolves a modification before timeout
    pub unanimity_threshold: i64,
    /// How often the background sweeper looks for expired modifications
    pub sweep_interval: Duration,
    /// Page size for moderation listings
    pub page_size: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            voting_period: Duration::from_secs(DEFAULT_VOTING_PERIOD_SECS),
            unanimity_threshold: DEFAULT_UNANIMITY_THRESHOLD,
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl EngineConfig {
    /// Reject settings the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.voting_period.is_zero() {
            return Err(Error::Config("voting period must be greater than zero".to_string()));
        }
        if self.unanimity_threshold < 1 {
            return Err(Error::Config(format!(
                "unanimity threshold must be at least 1 (got {})",
                self.unanimity_threshold
            )));
        }
        if self.sweep_interval.is_zero() {
            return Err(Error::Config("sweep interval must be greater than zero".to_string()));
        }
        if self.page_size < 1 {
            return Err(Error::Config(format!(
                "page size must be at least 1 (got {})",
                self.page_size
            )));
        }
        Ok(())
    }
}

/// Fully resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_path: PathBuf,
    pub bind_address: String,
    pub engine: EngineConfig,
}

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TomlConfig {
    pub database: Option<PathBuf>,
    pub bind: Option<String>,
    pub voting_period_secs: Option<u64>,
    pub unanimity_threshold: Option<i64>,
    pub sweep_interval_secs: Option<u64>,
    pub page_size: Option<i64>,
}

impl TomlConfig {
    /// Parse a config file that must exist
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Load the explicit config file, or the platform default if present
    ///
    /// An explicitly named file must exist. The platform default is optional.
    pub fn load_optional(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => {
                info!("Loading config file: {}", path.display());
                Self::load(&path)
            }
            Some(path) => {
                info!("No config file at {} - using defaults", path.display());
                Ok(Self::default())
            }
            None => {
                warn!("Could not determine config directory - using defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database: Option<PathBuf>,
    pub bind: Option<String>,
    pub voting_period_secs: Option<u64>,
    pub unanimity_threshold: Option<i64>,
    pub sweep_interval_secs: Option<u64>,
    pub page_size: Option<i64>,
}

/// Resolve the server configuration from CLI overrides, environment and file
pub fn resolve_config(cli: &ConfigOverrides, file: &TomlConfig) -> Result<ServerConfig> {
    let defaults = EngineConfig::default();

    let database_path = cli
        .database
        .clone()
        .or_else(|| std::env::var(ENV_DATABASE).ok().map(PathBuf::from))
        .or_else(|| file.database.clone())
        .unwrap_or_else(default_database_path);

    let bind_address = cli
        .bind
        .clone()
        .or_else(|| std::env::var(ENV_BIND).ok())
        .or_else(|| file.bind.clone())
        .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

    let voting_period_secs = pick(
        cli.voting_period_secs,
        ENV_VOTING_PERIOD_SECS,
        file.voting_period_secs,
        DEFAULT_VOTING_PERIOD_SECS,
    )?;
    let unanimity_threshold = pick(
        cli.unanimity_threshold,
        ENV_UNANIMITY_THRESHOLD,
        file.unanimity_threshold,
        defaults.unanimity_threshold,
    )?;
    let sweep_interval_secs = pick(
        cli.sweep_interval_secs,
        ENV_SWEEP_INTERVAL_SECS,
        file.sweep_interval_secs,
        DEFAULT_SWEEP_INTERVAL_SECS,
    )?;
    let page_size = pick(cli.page_size, ENV_PAGE_SIZE, file.page_size, defaults.page_size)?;

    let engine = EngineConfig {
        voting_period: Duration::from_secs(voting_period_secs),
        unanimity_threshold,
        sweep_interval: Duration::from_secs(sweep_interval_secs),
        page_size,
    };
    engine.validate()?;

    Ok(ServerConfig {
        database_path,
        bind_address,
        engine,
    })
}

/// CLI value, then environment variable, then file value, then default
fn pick<T>(cli: Option<T>, env_var: &str, file: Option<T>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(value) = cli {
        return Ok(value);
    }

    if let Ok(raw) = std::env::var(env_var) {
        return raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{} = {:?}: {}", env_var, raw, e)));
    }

    Ok(file.unwrap_or(default))
}

/// Platform config file location (`~/.config/modq/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("modq").join("config.toml"))
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("modq"))
        .unwrap_or_else(|| PathBuf::from("./modq_data"))
        .join("modq.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_engine_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let config = EngineConfig {
            unanimity_threshold: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_voting_period_rejected() {
        let config = EngineConfig {
            voting_period: Duration::ZERO,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_toml_partial_keys() {
        let config: TomlConfig = toml::from_str("unanimity_threshold = 5\n").unwrap();
        assert_eq!(config.unanimity_threshold, Some(5));
        assert_eq!(config.voting_period_secs, None);
        assert_eq!(config.database, None);
    }

    #[test]
    fn test_default_database_path_file_name() {
        assert!(default_database_path().ends_with("modq/modq.db"));
    }
}

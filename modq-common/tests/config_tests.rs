//! Unit tests for configuration resolution
//!
//! Priority order: command line, environment, config file, compiled default.
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that touch MODQ_* variables are marked with #[serial].

use modq_common::config::{
    resolve_config, ConfigOverrides, TomlConfig, DEFAULT_BIND_ADDRESS, DEFAULT_PAGE_SIZE,
    DEFAULT_UNANIMITY_THRESHOLD, DEFAULT_VOTING_PERIOD_SECS, ENV_DATABASE,
    ENV_UNANIMITY_THRESHOLD, ENV_VOTING_PERIOD_SECS,
};
use modq_common::Error;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

fn clear_env() {
    for var in [
        "MODQ_DATABASE",
        "MODQ_BIND",
        "MODQ_VOTING_PERIOD_SECS",
        "MODQ_UNANIMITY_THRESHOLD",
        "MODQ_SWEEP_INTERVAL_SECS",
        "MODQ_PAGE_SIZE",
    ] {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_when_nothing_configured() {
    clear_env();

    let config = resolve_config(&ConfigOverrides::default(), &TomlConfig::default()).unwrap();

    assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
    assert_eq!(
        config.engine.voting_period,
        Duration::from_secs(DEFAULT_VOTING_PERIOD_SECS)
    );
    assert_eq!(config.engine.unanimity_threshold, DEFAULT_UNANIMITY_THRESHOLD);
    assert_eq!(config.engine.page_size, DEFAULT_PAGE_SIZE);
}

#[test]
#[serial]
fn test_file_overrides_default() {
    clear_env();

    let file = TomlConfig {
        voting_period_secs: Some(3600),
        unanimity_threshold: Some(5),
        ..TomlConfig::default()
    };
    let config = resolve_config(&ConfigOverrides::default(), &file).unwrap();

    assert_eq!(config.engine.voting_period, Duration::from_secs(3600));
    assert_eq!(config.engine.unanimity_threshold, 5);
}

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    env::set_var(ENV_UNANIMITY_THRESHOLD, "7");
    env::set_var(ENV_DATABASE, "/tmp/modq-env-test.db");

    let file = TomlConfig {
        unanimity_threshold: Some(5),
        database: Some(PathBuf::from("/tmp/modq-file-test.db")),
        ..TomlConfig::default()
    };
    let config = resolve_config(&ConfigOverrides::default(), &file).unwrap();

    assert_eq!(config.engine.unanimity_threshold, 7);
    assert_eq!(config.database_path, PathBuf::from("/tmp/modq-env-test.db"));

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env();
    env::set_var(ENV_VOTING_PERIOD_SECS, "100");

    let cli = ConfigOverrides {
        voting_period_secs: Some(200),
        ..ConfigOverrides::default()
    };
    let config = resolve_config(&cli, &TomlConfig::default()).unwrap();

    assert_eq!(config.engine.voting_period, Duration::from_secs(200));

    clear_env();
}

#[test]
#[serial]
fn test_unparseable_env_value_is_config_error() {
    clear_env();
    env::set_var(ENV_UNANIMITY_THRESHOLD, "three");

    let result = resolve_config(&ConfigOverrides::default(), &TomlConfig::default());
    assert!(matches!(result, Err(Error::Config(_))));

    clear_env();
}

#[test]
#[serial]
fn test_invalid_threshold_rejected() {
    clear_env();

    let cli = ConfigOverrides {
        unanimity_threshold: Some(0),
        ..ConfigOverrides::default()
    };
    let result = resolve_config(&cli, &TomlConfig::default());
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_toml_file_loading() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "database = \"/srv/modq/modq.db\"\nvoting_period_secs = 86400\nunanimity_threshold = 4\n",
    )
    .unwrap();

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config.database, Some(PathBuf::from("/srv/modq/modq.db")));
    assert_eq!(config.voting_period_secs, Some(86400));
    assert_eq!(config.unanimity_threshold, Some(4));
}

#[test]
fn test_malformed_toml_is_config_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "unanimity_threshold = [not valid").unwrap();

    assert!(matches!(TomlConfig::load(&path), Err(Error::Config(_))));
}

#[test]
fn test_explicit_missing_file_is_error() {
    let result = TomlConfig::load_optional(Some(std::path::Path::new(
        "/nonexistent/modq/config.toml",
    )));
    assert!(matches!(result, Err(Error::Io(_))));
}

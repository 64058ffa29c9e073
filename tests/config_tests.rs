//! Config loading, TOML parsing, and env var override tests.
//!
//! Loading from the working directory and the environment runs inside
//! `figment::Jail`, which serializes the tests and restores both afterwards.

use marketstore_client::{ClientConfig, LoggingConfig};
use std::fs;
use tempfile::TempDir;

// Default Configuration Tests
#[test]
fn test_config_default_endpoint() {
    let config = ClientConfig::default();
    assert_eq!(config.endpoint, "http://localhost:5993/rpc");
}

#[test]
fn test_config_default_logging() {
    let config = ClientConfig::default();
    assert_eq!(config.logging, LoggingConfig::default());
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, "text");
}

#[test]
fn test_config_default_no_timeout() {
    assert_eq!(ClientConfig::default().http.timeout_ms, 0);
}

// Loading Tests
#[test]
fn test_load_without_files_uses_defaults() {
    figment::Jail::expect_with(|_jail| {
        let config = ClientConfig::load()?;
        assert_eq!(config, ClientConfig::default());
        Ok(())
    });
}

#[test]
fn test_load_merges_local_over_base() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "marketstore.toml",
            r#"
            endpoint = "http://base:5993/rpc"

            [logging]
            level = "debug"
            "#,
        )?;
        jail.create_file(
            "marketstore.local.toml",
            r#"
            endpoint = "http://local:5993/rpc"
            "#,
        )?;

        let config = ClientConfig::load()?;
        assert_eq!(config.endpoint, "http://local:5993/rpc");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "text");
        Ok(())
    });
}

#[test]
fn test_env_overrides_files() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "marketstore.toml",
            r#"
            [http]
            timeout_ms = 1000
            "#,
        )?;
        jail.set_env("MKTS_HTTP__TIMEOUT_MS", "250");
        jail.set_env("MKTS_LOGGING__FORMAT", "json");

        let config = ClientConfig::load()?;
        assert_eq!(config.http.timeout_ms, 250);
        assert_eq!(config.logging.format, "json");
        Ok(())
    });
}

#[test]
fn test_invalid_value_is_error() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "marketstore.toml",
            r#"
            [http]
            timeout_ms = "soon"
            "#,
        )?;
        assert!(ClientConfig::load().is_err());
        Ok(())
    });
}

#[test]
fn test_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("client.toml");
    fs::write(
        &path,
        r#"
        endpoint = "https://data.example.com/rpc"

        [http]
        user_agent = "loader/1.0"
        "#,
    )
    .unwrap();

    figment::Jail::expect_with(|_jail| {
        let config = ClientConfig::from_file(&path)?;
        assert_eq!(config.endpoint, "https://data.example.com/rpc");
        assert_eq!(config.http.user_agent, "loader/1.0");
        assert_eq!(config.http.timeout_ms, 0);
        Ok(())
    });
}

#[test]
fn test_from_missing_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    figment::Jail::expect_with(|_jail| {
        let config = ClientConfig::from_file(dir.path().join("absent.toml"))?;
        assert_eq!(config.endpoint, ClientConfig::default().endpoint);
        Ok(())
    });
}

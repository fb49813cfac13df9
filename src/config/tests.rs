use std::fs;
use std::time::Duration;

use serial_test::serial;
use tempfile::TempDir;

use super::settings::Settings;
use super::{load_config, load_config_from};

#[test]
fn test_default_settings() {
    let settings = Settings::default();
    assert!(!settings.broker.deliver_per_pattern);
    assert_eq!(settings.client.close_timeout_ms, 1000);
    assert_eq!(settings.client.close_timeout(), Duration::from_secs(1));
    assert_eq!(settings.logging.level, "info");
    assert!(!settings.logging.with_target);
}

#[test]
#[serial]
fn load_config_without_sources_yields_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let missing = tmp.path().join("absent");

    let cfg = load_config_from(missing.to_str().unwrap()).expect("load_config failed");
    assert_eq!(cfg.client.close_timeout_ms, 1000);
    assert_eq!(cfg.logging.level, "info");
}

#[test]
#[serial]
fn load_config_from_file_overrides_defaults() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("mcp.toml");
    let toml = r#"
        [broker]
        deliver_per_pattern = true

        [client]
        close_timeout_ms = 250

        [logging]
        level = "debug"
    "#;
    fs::write(&path, toml).expect("write config file");

    let cfg = load_config_from(path.to_str().unwrap()).expect("load_config failed");
    assert!(cfg.broker.deliver_per_pattern);
    assert_eq!(cfg.client.close_timeout_ms, 250);
    assert_eq!(cfg.logging.level, "debug");
    // untouched keys keep their defaults
    assert!(!cfg.logging.with_target);
}

#[test]
#[serial]
fn environment_overrides_file() {
    let tmp = TempDir::new().expect("create tempdir");
    let path = tmp.path().join("mcp.toml");
    fs::write(&path, "[client]\nclose_timeout_ms = 250\n").expect("write config file");

    temp_env::with_vars(
        [
            ("MCP_CLIENT__CLOSE_TIMEOUT_MS", Some("75")),
            ("MCP_LOGGING__LEVEL", Some("trace")),
        ],
        || {
            let cfg = load_config_from(path.to_str().unwrap()).expect("load_config failed");
            assert_eq!(cfg.client.close_timeout_ms, 75);
            assert_eq!(cfg.logging.level, "trace");
        },
    );
}

#[test]
#[serial]
fn default_location_is_optional() {
    temp_env::with_var("MCP_BROKER__DELIVER_PER_PATTERN", Some("true"), || {
        let cfg = load_config().expect("load_config failed");
        assert!(cfg.broker.deliver_per_pattern);
    });
}

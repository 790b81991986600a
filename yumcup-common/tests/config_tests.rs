//! Tests for configuration file resolution and loading
//!
//! Uses serial_test to prevent environment variable races: tests that
//! touch YUMCUP_CONFIG are marked with #[serial].

use serial_test::serial;
use std::env;
use std::io::Write;
use yumcup_common::config::{resolve_config_path, ProviderKind, TomlConfig, CONFIG_ENV_VAR};
use yumcup_common::Error;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
#[serial]
fn explicit_path_wins_over_env() {
    let explicit = write_config("max_candidates = 4");
    let from_env = write_config("max_candidates = 8");
    env::set_var(CONFIG_ENV_VAR, from_env.path());

    let resolved = resolve_config_path(Some(explicit.path())).unwrap();
    assert_eq!(resolved, explicit.path());

    let config = TomlConfig::load(Some(explicit.path())).unwrap();
    assert_eq!(config.max_candidates, 4);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn env_var_used_without_explicit_path() {
    let from_env = write_config(
        r#"
        bind = "0.0.0.0:9000"
        [provider]
        kind = "static"
        static_path = "/tmp/venues.json"
        cache_ttl_secs = 0
        "#,
    );
    env::set_var(CONFIG_ENV_VAR, from_env.path());

    let config = TomlConfig::load(None).unwrap();
    assert_eq!(config.bind, "0.0.0.0:9000");
    assert_eq!(config.provider.kind, ProviderKind::Static);
    assert_eq!(config.provider.cache_ttl_secs, 0);

    env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn missing_explicit_file_is_io_error() {
    env::remove_var(CONFIG_ENV_VAR);
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    let err = TomlConfig::load(Some(&missing)).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
#[serial]
fn invalid_file_is_config_error() {
    let bad = write_config("[provider]\nkind = \"carrier-pigeon\"");
    let err = TomlConfig::load(Some(bad.path())).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

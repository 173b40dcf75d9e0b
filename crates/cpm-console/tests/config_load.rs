#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]
//! Configuration file loading.

use std::io::Write;

use assert_matches::assert_matches;
use cpm_console::{ConsoleConfig, ConsoleError};
use cpm_core::Locale;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn loads_values_from_file() {
    let file = write_config(
        r#"
locale = "cs"
suppression_grace_ms = 250
search_input_id = "filter"
"#,
    );

    let config = ConsoleConfig::load(file.path()).unwrap();
    if std::env::var("CPM_LANG").is_err() {
        assert_eq!(config.locale, Locale::Czech);
    }
    assert_eq!(config.suppression_grace_ms, 250);
    assert_eq!(config.search_input_id, "filter");
    assert_eq!(config.guard_attribute, "hx-confirm");
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let file = write_config("suppression_grace_ms = \"soon\"");
    assert_matches!(
        ConsoleConfig::load(file.path()),
        Err(ConsoleError::ConfigParse(_))
    );
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    assert_matches!(
        ConsoleConfig::load(&path),
        Err(ConsoleError::ConfigRead { path: p, .. }) if p == path
    );
}

#[test]
fn zero_grace_is_rejected() {
    let file = write_config("suppression_grace_ms = 0");
    assert_matches!(
        ConsoleConfig::load(file.path()),
        Err(ConsoleError::InvalidConfig { .. })
    );
}

#[test]
fn env_lookup_overrides_locale() {
    let mut config = ConsoleConfig::default();
    config.apply_overrides(|key| (key == "CPM_LANG").then(|| "cs".to_string()));
    assert_eq!(config.locale, Locale::Czech);

    config.apply_overrides(|_| None);
    assert_eq!(config.locale, Locale::Czech);
}

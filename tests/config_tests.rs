//! Config Tests
//!
//! File loading, typo detection and range validation for `AppConfig`,
//! exercised through the public API.

use std::io::Write;

use t8_client::config::validation::{known_config_keys, suggest_correction, validate_unknown_keys};
use t8_client::config::{AppConfig, ConfigError, ConnectionConfig};
use t8_client::types::FrequencyBand;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write");
    file
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn full_config_file_loads() {
    let file = write_config(
        r#"
[connection]
host = "https://unit.example/rest/"
user = "operator"
password = "secret"
timeout_secs = 30
verify_tls = false

[analysis]
fmin_hz = 5.0
fmax_hz = 2000.0

[storage]
data_dir = "/var/lib/t8"
"#,
    );

    let config = AppConfig::load_from_file(file.path()).expect("load");
    assert_eq!(config.connection.host, "https://unit.example/rest");
    assert_eq!(config.connection.timeout_secs, 30);
    assert!(!config.connection.verify_tls);
    assert_eq!(config.analysis.band(), FrequencyBand::new(5.0, 2000.0));
    assert_eq!(config.storage.data_dir.to_str(), Some("/var/lib/t8"));
    assert!(config.connection.require_credentials().is_ok());
}

#[test]
fn empty_file_yields_defaults() {
    let file = write_config("");
    let config = AppConfig::load_from_file(file.path()).expect("load");
    assert_eq!(config, AppConfig::default());
    assert_eq!(config.connection.timeout_secs, 10);
    assert_eq!(config.analysis.band(), FrequencyBand::up_to_nyquist(0.0));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = AppConfig::load_from_file(&dir.path().join("absent.toml")).expect_err("missing");
    assert!(matches!(err, ConfigError::Io(..)));
}

#[test]
fn malformed_file_reports_its_path() {
    let file = write_config("[connection\nhost = ");
    match AppConfig::load_from_file(file.path()) {
        Err(ConfigError::Parse(path, _)) => assert_eq!(path, file.path()),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn saved_config_reloads_identically() {
    let mut config = AppConfig::default();
    config.connection.host = "https://unit".to_string();
    config.analysis.fmax_hz = Some(500.0);

    let file = write_config(&config.to_toml().expect("serialize"));
    assert_eq!(AppConfig::load_from_file(file.path()).expect("reload"), config);
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn out_of_range_values_are_rejected_together() {
    let file = write_config(
        r#"
[connection]
timeout_secs = 0

[analysis]
fmin_hz = 100.0
fmax_hz = 50.0
"#,
    );
    match AppConfig::load_from_file(file.path()) {
        Err(ConfigError::Validation(errors)) => {
            assert_eq!(errors.len(), 2, "{errors:?}");
            assert!(errors.iter().any(|e| e.contains("timeout_secs")));
            assert!(errors.iter().any(|e| e.contains("fmax_hz")));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn negative_fmin_is_rejected() {
    let mut config = AppConfig::default();
    config.analysis.fmin_hz = -1.0;
    assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
}

#[test]
fn typo_warns_but_still_loads() {
    let toml_str = "[storage]\ndata_dri = \"x\"\n";
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].suggestion.as_deref(), Some("storage.data_dir"));

    let file = write_config(toml_str);
    let config = AppConfig::load_from_file(file.path()).expect("unknown keys are not fatal");
    assert_eq!(config.storage, AppConfig::default().storage);
}

#[test]
fn unrelated_key_gets_no_suggestion() {
    let known = known_config_keys();
    assert_eq!(suggest_correction("completely.unrelated_setting", &known), None);
}

// ============================================================================
// Credentials
// ============================================================================

#[test]
fn missing_credentials_are_all_named() {
    let connection = ConnectionConfig::default();
    match connection.require_credentials() {
        Err(ConfigError::Missing(fields)) => {
            assert_eq!(fields, vec!["T8_HOST", "T8_USER", "T8_PASSWORD"]);
        }
        other => panic!("expected missing credentials, got {other:?}"),
    }
}

#[test]
fn overrides_skip_empty_values() {
    let mut connection = ConnectionConfig::default();
    connection.apply_overrides(Some("https://unit/".to_string()), Some(String::new()), None);
    assert_eq!(connection.host, "https://unit");
    assert!(connection.user.is_empty());
}

#[test]
fn debug_output_hides_password() {
    let mut connection = ConnectionConfig::default();
    connection.password = "hunter2".to_string();
    assert!(!format!("{connection:?}").contains("hunter2"));
}

use std::io::Write;

use tempfile::NamedTempFile;

use crate::config::models::AppConfig;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_from_file_keeps_defaults_for_missing_keys() {
    let file = write_config(
        r#"
[placement]
allow_remote = false
"#,
    );

    let config =
        AppConfig::load_with_env_prefix(file.path().to_str(), "PLACEMENT_TEST_FILE").unwrap();
    assert!(!config.placement.allow_remote);
    assert_eq!(config.placement.local_host, "0.0.0.0");
    assert_eq!(config.remote.agent_port, 8000);
}

#[test]
fn test_load_missing_file_fails() {
    let result = AppConfig::load(Some("/nonexistent/placement.toml"));
    assert!(result.is_err());
}

#[test]
fn test_environment_overrides_file() {
    let file = write_config(
        r#"
[remote]
agent_port = 9000
"#,
    );

    std::env::set_var("PLACEMENT_TEST_ENV_REMOTE__AGENT_PORT", "9100");
    std::env::set_var("PLACEMENT_TEST_ENV_PLACEMENT__ALLOW_REMOTE", "false");

    let config =
        AppConfig::load_with_env_prefix(file.path().to_str(), "PLACEMENT_TEST_ENV").unwrap();

    std::env::remove_var("PLACEMENT_TEST_ENV_REMOTE__AGENT_PORT");
    std::env::remove_var("PLACEMENT_TEST_ENV_PLACEMENT__ALLOW_REMOTE");

    assert_eq!(config.remote.agent_port, 9100);
    assert!(!config.placement.allow_remote);
}

#[test]
fn test_invalid_file_values_fail_validation() {
    let file = write_config(
        r#"
[remote]
request_timeout_seconds = 0
"#,
    );

    let result = AppConfig::load_with_env_prefix(file.path().to_str(), "PLACEMENT_TEST_INVALID");
    assert!(result.is_err());
}

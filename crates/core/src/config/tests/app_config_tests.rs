use crate::config::models::AppConfig;
use crate::logging::{LogLevel, OutputFormat};

#[test]
fn test_default_config() {
    let config = AppConfig::default();
    assert!(config.validate().is_ok());

    assert!(config.placement.allow_remote);
    assert_eq!(config.placement.local_host, "0.0.0.0");
    assert_eq!(config.container.runtime, "docker");
    assert_eq!(config.remote.agent_port, 8000);
    assert_eq!(config.logging.level, LogLevel::Info);
    assert_eq!(config.log_stream.capacity, 1024);
}

#[test]
fn test_config_from_toml() {
    let toml_content = r#"
[placement]
allow_remote = false
local_host = "127.0.0.1"

[container]
runtime = "podman"
extra_run_args = ["--network", "host"]

[remote]
scheme = "https"
agent_port = 9000

[logging]
level = "debug"
format = "json"
"#;

    let config = AppConfig::from_toml(toml_content).unwrap();
    assert!(!config.placement.allow_remote);
    assert_eq!(config.placement.local_host, "127.0.0.1");
    assert_eq!(config.container.runtime, "podman");
    assert_eq!(config.container.extra_run_args, vec!["--network", "host"]);
    assert_eq!(config.container.stop_timeout_seconds, 10);
    assert_eq!(config.remote.agent_url("10.0.0.2"), "https://10.0.0.2:9000");
    assert_eq!(config.remote.agent_url("2001:db8::5"), "https://[2001:db8::5]:9000");
    assert_eq!(config.remote.request_timeout_seconds, 30);
    assert_eq!(config.logging.level, LogLevel::Debug);
    assert_eq!(config.logging.format, OutputFormat::Json);
}

#[test]
fn test_config_toml_round_trip() {
    let config = AppConfig::default();
    let toml = config.to_toml().unwrap();
    let parsed = AppConfig::from_toml(&toml).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = AppConfig::default();
    config.placement.local_host = " ".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.remote.scheme = "ftp".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.log_stream.capacity = 0;
    assert!(config.validate().is_err());

    assert!(AppConfig::from_toml("[container]\nruntime = \"\"\n").is_err());
}

use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::placement::{ContainerConfig, LogStreamConfig, PlacementConfig, RemoteConfig};
use crate::logging::LogConfig;

/// Prefix of environment variable overrides, e.g.
/// `PLACEMENT_PLACEMENT__ALLOW_REMOTE=false`.
pub const ENV_PREFIX: &str = "PLACEMENT";

/// System configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub placement: PlacementConfig,
    pub container: ContainerConfig,
    pub remote: RemoteConfig,
    pub logging: LogConfig,
    pub log_stream: LogStreamConfig,
}

impl AppConfig {
    /// Load configuration from config file and environment variables
    ///
    /// Load order:
    /// 1. Default configuration
    /// 2. Config file (TOML format)
    /// 3. Environment variable overrides (prefix: PLACEMENT_, nested keys split by `__`)
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        Self::load_with_env_prefix(config_path, ENV_PREFIX)
    }

    pub fn load_with_env_prefix(config_path: Option<&str>, env_prefix: &str) -> Result<Self> {
        let defaults = ConfigBuilder::try_from(&AppConfig::default()).context("构建默认配置失败")?;
        let mut builder = ConfigBuilder::builder().add_source(defaults);

        if let Some(path) = config_path {
            if !Path::new(path).exists() {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        } else {
            let default_paths = ["config/placement.toml", "placement.toml"];
            if let Some(path) = default_paths.iter().find(|p| Path::new(p).exists()) {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(toml_str).context("解析TOML配置失败")?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("序列化配置为TOML失败")
    }

    pub fn validate(&self) -> Result<()> {
        self.placement.validate().context("放置策略配置验证失败")?;
        self.container.validate().context("容器配置验证失败")?;
        self.remote.validate().context("远程代理配置验证失败")?;
        self.log_stream.validate().context("日志流配置验证失败")?;
        Ok(())
    }
}

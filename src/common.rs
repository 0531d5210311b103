use std::path::Path;

use anyhow::{Context, Result};
use placement_core::logging::{LogConfig, OutputFormat};
use placement_core::{AppConfig, GroupSpec};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command line settings shared by every run.
#[derive(Debug, Clone, Default)]
pub struct StartupConfig {
    pub config_path: Option<String>,
    pub group_path: String,
    pub no_remote: bool,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub dry_run: bool,
}

/// 初始化日志系统
pub fn init_logging(log: &LogConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log.level.as_str()));

    let registry = tracing_subscriber::registry().with(env_filter);

    match log.format {
        OutputFormat::Json => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .context("初始化JSON日志格式失败")?;
        }
        OutputFormat::Pretty => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .context("初始化Pretty日志格式失败")?;
        }
    }

    Ok(())
}

/// 加载应用配置, then apply command line overrides on top.
pub fn load_config(startup: &StartupConfig) -> Result<AppConfig> {
    let mut config = AppConfig::load(startup.config_path.as_deref()).with_context(|| {
        format!(
            "加载配置文件失败: {}",
            startup.config_path.as_deref().unwrap_or("<default>")
        )
    })?;

    if startup.no_remote {
        config.placement.allow_remote = false;
    }
    if let Some(level) = &startup.log_level {
        config.logging.level = level.parse().context("无效的日志级别")?;
    }
    if let Some(format) = &startup.log_format {
        config.logging.format = format.parse().context("无效的日志格式")?;
    }

    Ok(config)
}

/// Reads a group file, TOML or JSON by extension, and names the group after
/// the file stem.
pub fn read_group_file(path: &str) -> Result<(String, GroupSpec)> {
    let path = Path::new(path);
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("读取执行单元组文件失败: {}", path.display()))?;

    let value: serde_json::Value = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content).context("解析JSON执行单元组失败")?,
        Some("toml") | None => toml::from_str(&content).context("解析TOML执行单元组失败")?,
        Some(other) => anyhow::bail!("不支持的执行单元组文件格式: {other}"),
    };

    let group = GroupSpec::from_value(value)
        .with_context(|| format!("无效的执行单元组: {}", path.display()))?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(placement_resolver::DEFAULT_GROUP_NAME)
        .to_string();

    Ok((name, group))
}

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, Command};
use placement::app::{Application, RunOutcome};
use placement::common::{init_logging, load_config, read_group_file, StartupConfig};
use placement::shutdown::{wait_for_signal, ShutdownManager, ShutdownReason};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let matches = Command::new("placement")
        .version("1.0.0")
        .about("执行单元放置解析器")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径"),
        )
        .arg(
            Arg::new("group")
                .short('g')
                .long("group")
                .value_name("FILE")
                .help("执行单元组文件 (TOML 或 JSON)")
                .required(true),
        )
        .arg(
            Arg::new("no-remote")
                .long("no-remote")
                .help("禁止远程执行, 所有执行单元固定在本机")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("日志级别")
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_name("FORMAT")
                .help("日志格式")
                .value_parser(["json", "pretty"]),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("仅解析并输出放置计划, 不启动任何执行单元")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let startup = StartupConfig {
        config_path: matches.get_one::<String>("config").cloned(),
        group_path: matches
            .get_one::<String>("group")
            .cloned()
            .context("缺少 --group 参数")?,
        no_remote: matches.get_flag("no-remote"),
        log_level: matches.get_one::<String>("log-level").cloned(),
        log_format: matches.get_one::<String>("log-format").cloned(),
        dry_run: matches.get_flag("dry-run"),
    };

    // 加载配置
    let config = load_config(&startup)?;

    // 初始化日志系统
    init_logging(&config.logging)?;

    info!("启动执行单元放置解析器");
    info!("执行单元组文件: {}", startup.group_path);

    let (name, group) = read_group_file(&startup.group_path)?;
    let app = Application::new(config)?;
    let placement = app.plan(&name, group)?;

    if startup.dry_run {
        let plan = serde_json::to_string_pretty(&placement.describe()).context("序列化放置计划失败")?;
        println!("{plan}");
        return Ok(());
    }

    let shutdown_manager = ShutdownManager::new();
    let shutdown_rx = shutdown_manager.subscribe().await;

    let run = app.run(&placement, shutdown_rx);
    tokio::pin!(run);

    let outcome = tokio::select! {
        outcome = &mut run => outcome,
        _ = wait_for_signal() => {
            info!("收到关闭信号，开始优雅关闭...");
            shutdown_manager.shutdown(ShutdownReason::Signal).await;

            // 等待执行单元停止，设置超时
            match tokio::time::timeout(Duration::from_secs(30), &mut run).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!("关闭超时，强制退出");
                    return Ok(());
                }
            }
        }
    };

    match outcome {
        Ok(RunOutcome::Shutdown(reason)) => info!("已优雅关闭 ({reason})"),
        Ok(RunOutcome::Exited(status)) => {
            shutdown_manager.shutdown(ShutdownReason::PlacementExited).await;
            if let placement_core::HandleStatus::Failed { reason } = status {
                error!("执行单元组异常结束: {reason}");
                anyhow::bail!("执行单元组异常结束: {reason}");
            }
            info!("执行单元组已结束");
        }
        Err(e) => {
            error!("应用运行失败: {e:#}");
            return Err(e);
        }
    }

    info!("执行单元放置解析器已退出");
    Ok(())
}

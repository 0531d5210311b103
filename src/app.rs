use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use placement_core::{
    AppConfig, CompositeSink, GroupSpec, HandleStatus, LogPublisher, Runnable, StreamKind,
    StreamSink, TracingSink,
};
use placement_resolver::Resolver;
use placement_worker::Placement;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::shutdown::ShutdownReason;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Shutdown was requested while the placement was running.
    Shutdown(ShutdownReason),
    /// The placement reached a terminal status on its own.
    Exited(HandleStatus),
}

/// 主应用程序
pub struct Application {
    config: AppConfig,
    resolver: Resolver,
    log_stream: LogPublisher,
    poll_interval: Duration,
}

impl Application {
    pub fn new(config: AppConfig) -> Result<Self> {
        let log_stream = LogPublisher::new(StreamKind::Log, config.log_stream.capacity);
        let sink = CompositeSink::new()
            .with_sink(Arc::new(TracingSink))
            .with_sink(Arc::new(StreamSink::new(log_stream.clone())));

        let resolver = Resolver::from_config(&config, Arc::new(sink)).context("创建解析器失败")?;

        Ok(Self {
            config,
            resolver,
            log_stream,
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Stream of diagnostic lines, e.g. host rewrites, for push subscribers.
    pub fn log_stream(&self) -> &LogPublisher {
        &self.log_stream
    }

    /// Resolves `group` under the configured remote policy without starting
    /// anything.
    pub fn plan(&self, name: &str, group: GroupSpec) -> Result<Placement> {
        let allow_remote = self.config.placement.allow_remote;
        let placement = self
            .resolver
            .resolve_named_group(name, group, allow_remote)
            .with_context(|| format!("解析执行单元组失败: {name}"))?;

        info!("执行单元组 {} 解析完成 (allow_remote={})", name, allow_remote);
        Ok(placement)
    }

    /// Starts `placement`, keeps it running until shutdown is requested or it
    /// ends on its own, then stops it.
    pub async fn run(
        &self,
        placement: &Placement,
        mut shutdown_rx: broadcast::Receiver<ShutdownReason>,
    ) -> Result<RunOutcome> {
        placement
            .start()
            .await
            .with_context(|| format!("启动失败: {}", placement.name()))?;
        info!("{} 已启动", placement.name());

        let mut ticker = tokio::time::interval(self.poll_interval);
        let outcome = loop {
            tokio::select! {
                received = shutdown_rx.recv() => {
                    let reason = received.unwrap_or(ShutdownReason::Requested);
                    info!("收到关闭通知 ({}), 停止 {}", reason, placement.name());
                    break RunOutcome::Shutdown(reason);
                }
                _ = ticker.tick() => {
                    match placement.status().await {
                        Ok(status) if status.is_terminal() => {
                            warn!("{} 已自行结束: {}", placement.name(), status);
                            break RunOutcome::Exited(status);
                        }
                        Ok(_) => {}
                        Err(e) => warn!("查询 {} 状态失败: {}", placement.name(), e),
                    }
                }
            }
        };

        placement
            .stop()
            .await
            .with_context(|| format!("停止失败: {}", placement.name()))?;
        info!("{} 已停止", placement.name());

        Ok(outcome)
    }
}

use std::fmt;
use std::sync::Arc;

use tokio::signal;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info};

/// Why the process is shutting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Ctrl-C or SIGTERM.
    Signal,
    /// Asked for from code, e.g. by a test or an embedding caller.
    Requested,
    /// The placement stopped or failed on its own.
    PlacementExited,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Signal => write!(f, "signal"),
            ShutdownReason::Requested => write!(f, "requested"),
            ShutdownReason::PlacementExited => write!(f, "placement exited"),
        }
    }
}

/// 优雅关闭管理器
///
/// Broadcasts a single shutdown notice. Subscribing after the notice was sent
/// yields a receiver that fires immediately, so late subscribers never hang.
#[derive(Clone)]
pub struct ShutdownManager {
    tx: broadcast::Sender<ShutdownReason>,
    reason: Arc<RwLock<Option<ShutdownReason>>>,
}

impl ShutdownManager {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self {
            tx,
            reason: Arc::new(RwLock::new(None)),
        }
    }

    /// 订阅关闭信号
    pub async fn subscribe(&self) -> broadcast::Receiver<ShutdownReason> {
        let reason = self.reason.read().await;
        match *reason {
            Some(reason) => {
                let (tx, rx) = broadcast::channel(1);
                let _ = tx.send(reason);
                rx
            }
            None => self.tx.subscribe(),
        }
    }

    /// 触发关闭. Only the first call has an effect.
    pub async fn shutdown(&self, reason: ShutdownReason) {
        let mut current = self.reason.write().await;
        if let Some(first) = *current {
            debug!("关闭已由 {} 触发, 忽略 {}", first, reason);
            return;
        }

        *current = Some(reason);
        let delivered = self.tx.send(reason).unwrap_or(0);
        info!("触发系统关闭 ({}), 通知 {} 个订阅者", reason, delivered);
    }

    pub async fn reason(&self) -> Option<ShutdownReason> {
        *self.reason.read().await
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}

/// 等待关闭信号
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("安装Ctrl+C信号处理器失败: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("安装SIGTERM信号处理器失败: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("收到Ctrl+C信号");
        },
        _ = terminate => {
            info!("收到SIGTERM信号");
        },
    }
}

use std::process::Stdio;

use async_trait::async_trait;
use placement_core::{HandleStatus, Runnable, UnitSpec};
use placement_errors::{PlacementError, PlacementResult};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

struct LocalState {
    status: HandleStatus,
    child: Option<Child>,
}

/// 本地执行单元
///
/// Runs the unit inside the current process. When the unit's pass-through
/// fields name a `command` (with optional `args`, `env` and `working_dir`),
/// starting the worker spawns that command as a child process owned by this
/// handle; otherwise the unit has no external resource and only tracks its
/// lifecycle state.
pub struct LocalWorker {
    name: String,
    spec: UnitSpec,
    state: Mutex<LocalState>,
}

impl LocalWorker {
    pub fn new(name: String, spec: UnitSpec) -> Self {
        Self {
            name,
            spec,
            state: Mutex::new(LocalState {
                status: HandleStatus::Created,
                child: None,
            }),
        }
    }

    pub fn spec(&self) -> &UnitSpec {
        &self.spec
    }

    /// Whether starting this worker spawns a child process.
    pub fn has_command(&self) -> bool {
        self.spec.field_str("command").is_some()
    }

    fn build_command(&self) -> Option<Command> {
        let program = self.spec.field_str("command")?;

        let mut cmd = Command::new(program);
        cmd.args(self.spec.field_str_list("args"));
        cmd.envs(self.spec.field_str_map("env"));
        if let Some(dir) = self.spec.field_str("working_dir") {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null());
        cmd.kill_on_drop(true);
        Some(cmd)
    }
}

#[async_trait]
impl Runnable for LocalWorker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> PlacementResult<()> {
        let mut state = self.state.lock().await;
        if matches!(state.status, HandleStatus::Starting | HandleStatus::Running) {
            return Err(PlacementError::lifecycle(format!(
                "本地执行单元 {} 已在运行",
                self.name
            )));
        }

        state.status = HandleStatus::Starting;
        if let Some(mut cmd) = self.build_command() {
            match cmd.spawn() {
                Ok(child) => {
                    debug!("Local unit '{}' spawned pid {:?}", self.name, child.id());
                    state.child = Some(child);
                }
                Err(e) => {
                    state.status = HandleStatus::failed(e.to_string());
                    return Err(PlacementError::lifecycle(format!(
                        "启动本地进程失败: {}: {e}",
                        self.name
                    )));
                }
            }
        }

        state.status = HandleStatus::Running;
        info!("Local unit '{}' started", self.name);
        Ok(())
    }

    async fn stop(&self) -> PlacementResult<()> {
        let mut state = self.state.lock().await;
        if !matches!(state.status, HandleStatus::Starting | HandleStatus::Running) {
            return Ok(());
        }

        state.status = HandleStatus::Stopping;
        if let Some(mut child) = state.child.take() {
            if let Ok(None) = child.try_wait() {
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill local unit '{}': {}", self.name, e);
                    state.status = HandleStatus::failed(e.to_string());
                    return Err(e.into());
                }
            }
        }

        state.status = HandleStatus::Stopped;
        info!("Local unit '{}' stopped", self.name);
        Ok(())
    }

    async fn status(&self) -> PlacementResult<HandleStatus> {
        let mut state = self.state.lock().await;

        let exited = match state.child.as_mut() {
            Some(child) => child.try_wait()?,
            None => None,
        };
        if let Some(exit) = exited {
            state.child = None;
            state.status = if exit.success() {
                HandleStatus::Stopped
            } else {
                HandleStatus::failed(format!("进程退出码: {:?}", exit.code()))
            };
            debug!("Local unit '{}' exited: {}", self.name, state.status);
        }

        Ok(state.status.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_in_process_lifecycle() {
        let worker = LocalWorker::new("encoder".to_string(), UnitSpec::local());
        assert!(!worker.has_command());
        assert_eq!(worker.status().await.unwrap(), HandleStatus::Created);

        worker.start().await.unwrap();
        assert!(worker.is_ready().await);
        assert!(worker.start().await.is_err());

        worker.stop().await.unwrap();
        assert_eq!(worker.status().await.unwrap(), HandleStatus::Stopped);
    }

    #[tokio::test]
    async fn test_stop_before_start_is_noop() {
        let worker = LocalWorker::new("idle".to_string(), UnitSpec::local());
        worker.stop().await.unwrap();
        assert_eq!(worker.status().await.unwrap(), HandleStatus::Created);
    }

    #[tokio::test]
    async fn test_missing_command_fails_start() {
        let spec = UnitSpec::local().with_field("command", json!("/nonexistent/placement-unit"));
        let worker = LocalWorker::new("broken".to_string(), spec);

        let err = worker.start().await.unwrap_err();
        assert!(matches!(err, PlacementError::Lifecycle(_)));
        assert!(matches!(
            worker.status().await.unwrap(),
            HandleStatus::Failed { .. }
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_child_process_is_killed_on_stop() {
        let spec = UnitSpec::local()
            .with_field("command", json!("sleep"))
            .with_field("args", json!(["30"]));
        let worker = LocalWorker::new("sleeper".to_string(), spec);

        worker.start().await.unwrap();
        assert_eq!(worker.status().await.unwrap(), HandleStatus::Running);

        worker.stop().await.unwrap();
        assert_eq!(worker.status().await.unwrap(), HandleStatus::Stopped);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_exit_is_reported() {
        let spec = UnitSpec::local()
            .with_field("command", json!("sh"))
            .with_field("args", json!(["-c", "exit 3"]));
        let worker = LocalWorker::new("failing".to_string(), spec);

        worker.start().await.unwrap();

        let mut status = worker.status().await.unwrap();
        for _ in 0..50 {
            if status != HandleStatus::Running {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            status = worker.status().await.unwrap();
        }
        assert!(matches!(status, HandleStatus::Failed { reason } if reason.contains('3')));
    }
}

use std::process::Stdio;

use async_trait::async_trait;
use placement_core::config::ContainerConfig;
use placement_core::{HandleStatus, Runnable, UnitSpec};
use placement_errors::{PlacementError, PlacementResult};
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 容器执行单元
///
/// Wraps the unit in a container runtime invocation. Nothing is executed
/// until `start`; the runtime binary and extra `run` arguments come from
/// [`ContainerConfig`].
pub struct ContainerWorker {
    name: String,
    image: String,
    container_name: String,
    spec: UnitSpec,
    config: ContainerConfig,
    state: Mutex<HandleStatus>,
}

impl ContainerWorker {
    pub fn new(name: String, image: String, spec: UnitSpec, config: ContainerConfig) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        let container_name = format!("{}-{}", sanitize(&name), &suffix[..8]);

        Self {
            name,
            image,
            container_name,
            spec,
            config,
            state: Mutex::new(HandleStatus::Created),
        }
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn container_name(&self) -> &str {
        &self.container_name
    }

    pub fn runtime(&self) -> &str {
        &self.config.runtime
    }

    /// Arguments of the detached `run` invocation.
    pub fn run_args(&self) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "-d".to_string(),
            "--rm".to_string(),
            "--name".to_string(),
            self.container_name.clone(),
        ];
        for (key, value) in self.spec.field_str_map("env") {
            args.push("-e".to_string());
            args.push(format!("{key}={value}"));
        }
        args.extend(self.config.extra_run_args.iter().cloned());
        args.push(self.image.clone());
        args.extend(self.spec.field_str_list("args"));
        args
    }

    pub fn stop_args(&self) -> Vec<String> {
        vec![
            "stop".to_string(),
            "-t".to_string(),
            self.config.stop_timeout_seconds.to_string(),
            self.container_name.clone(),
        ]
    }

    pub fn inspect_args(&self) -> Vec<String> {
        vec![
            "inspect".to_string(),
            "-f".to_string(),
            "{{.State.Running}}".to_string(),
            self.container_name.clone(),
        ]
    }

    async fn invoke(&self, args: Vec<String>) -> PlacementResult<String> {
        debug!("{} {}", self.config.runtime, args.join(" "));

        let output = Command::new(&self.config.runtime)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                PlacementError::container_runtime(format!(
                    "无法调用容器运行时 {}: {e}",
                    self.config.runtime
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(PlacementError::container_runtime(format!(
                "{} {} 失败 ({:?}): {}",
                self.config.runtime,
                args.first().map(String::as_str).unwrap_or_default(),
                output.status.code(),
                stderr
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl Runnable for ContainerWorker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> PlacementResult<()> {
        let mut state = self.state.lock().await;
        if matches!(*state, HandleStatus::Starting | HandleStatus::Running) {
            return Err(PlacementError::lifecycle(format!(
                "容器执行单元 {} 已在运行",
                self.name
            )));
        }

        *state = HandleStatus::Starting;
        match self.invoke(self.run_args()).await {
            Ok(container_id) => {
                *state = HandleStatus::Running;
                info!(
                    "Container unit '{}' started from image {} (container {}, id {})",
                    self.name, self.image, self.container_name, container_id
                );
                Ok(())
            }
            Err(e) => {
                *state = HandleStatus::failed(e.to_string());
                Err(e)
            }
        }
    }

    async fn stop(&self) -> PlacementResult<()> {
        let mut state = self.state.lock().await;
        if !matches!(*state, HandleStatus::Starting | HandleStatus::Running) {
            return Ok(());
        }

        *state = HandleStatus::Stopping;
        if let Err(e) = self.invoke(self.stop_args()).await {
            warn!("Failed to stop container unit '{}': {}", self.name, e);
            *state = HandleStatus::failed(e.to_string());
            return Err(e);
        }

        *state = HandleStatus::Stopped;
        info!("Container unit '{}' stopped", self.name);
        Ok(())
    }

    async fn status(&self) -> PlacementResult<HandleStatus> {
        let mut state = self.state.lock().await;
        if *state != HandleStatus::Running {
            return Ok(state.clone());
        }

        // `--rm` removes an exited container, so a missing one has stopped.
        *state = match self.invoke(self.inspect_args()).await {
            Ok(running) if running == "true" => HandleStatus::Running,
            Ok(_) => HandleStatus::Stopped,
            Err(PlacementError::ContainerRuntime(msg)) if msg.contains("No such") => {
                HandleStatus::Stopped
            }
            Err(e) => return Err(e),
        };
        Ok(state.clone())
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn worker_with(config: ContainerConfig) -> ContainerWorker {
        let spec = UnitSpec::local()
            .with_image("img:v1")
            .with_field("args", json!(["--shards", "2"]))
            .with_field("env", json!({ "MODE": "index" }));
        ContainerWorker::new("indexer/0".to_string(), "img:v1".to_string(), spec, config)
    }

    #[test]
    fn test_container_name_is_sanitized_and_unique() {
        let a = worker_with(ContainerConfig::default());
        let b = worker_with(ContainerConfig::default());

        assert!(a.container_name().starts_with("indexer-0-"));
        assert_eq!(a.container_name().len(), "indexer-0-".len() + 8);
        assert_ne!(a.container_name(), b.container_name());
    }

    #[test]
    fn test_run_args() {
        let config = ContainerConfig {
            extra_run_args: vec!["--network".to_string(), "host".to_string()],
            ..ContainerConfig::default()
        };
        let worker = worker_with(config);

        let name = worker.container_name().to_string();
        assert_eq!(
            worker.run_args(),
            vec![
                "run", "-d", "--rm", "--name", name.as_str(), "-e", "MODE=index", "--network", "host",
                "img:v1", "--shards", "2",
            ]
        );
        assert_eq!(worker.stop_args(), vec!["stop", "-t", "10", name.as_str()]);
        assert_eq!(worker.inspect_args()[3], name);
    }

    #[tokio::test]
    async fn test_construction_does_not_invoke_runtime() {
        let config = ContainerConfig {
            runtime: "/nonexistent/container-runtime".to_string(),
            ..ContainerConfig::default()
        };
        let worker = worker_with(config);

        assert_eq!(worker.status().await.unwrap(), HandleStatus::Created);
        worker.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_runtime_fails_start() {
        let config = ContainerConfig {
            runtime: "/nonexistent/container-runtime".to_string(),
            ..ContainerConfig::default()
        };
        let worker = worker_with(config);

        let err = worker.start().await.unwrap_err();
        assert!(matches!(err, PlacementError::ContainerRuntime(_)));
        assert!(matches!(
            worker.status().await.unwrap(),
            HandleStatus::Failed { .. }
        ));
    }
}

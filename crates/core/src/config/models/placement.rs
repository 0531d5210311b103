use serde::{Deserialize, Serialize};

use crate::models::DEFAULT_LOCAL_HOST;

/// Remote-allowed policy and the local-host sentinel shared by every
/// resolution call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub allow_remote: bool,
    pub local_host: String,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            allow_remote: true,
            local_host: DEFAULT_LOCAL_HOST.to_string(),
        }
    }
}

impl PlacementConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.local_host.trim().is_empty() {
            return Err(anyhow::anyhow!("本地主机标识不能为空"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Container runtime binary, e.g. `docker` or `podman`
    pub runtime: String,
    /// Extra arguments inserted into every `run` invocation before the image
    pub extra_run_args: Vec<String>,
    pub stop_timeout_seconds: u64,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            runtime: "docker".to_string(),
            extra_run_args: Vec::new(),
            stop_timeout_seconds: 10,
        }
    }
}

impl ContainerConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.runtime.trim().is_empty() {
            return Err(anyhow::anyhow!("容器运行时不能为空"));
        }
        Ok(())
    }
}

/// How to reach the agent that runs delegated units on a remote host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub scheme: String,
    pub agent_port: u16,
    pub request_timeout_seconds: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            agent_port: 8000,
            request_timeout_seconds: 30,
        }
    }
}

impl RemoteConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        let valid_schemes = ["http", "https"];
        if !valid_schemes.contains(&self.scheme.as_str()) {
            return Err(anyhow::anyhow!(
                "无效的协议: {}，支持的协议: {:?}",
                self.scheme,
                valid_schemes
            ));
        }
        if self.agent_port == 0 {
            return Err(anyhow::anyhow!("远程代理端口必须大于0"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("请求超时时间必须大于0"));
        }
        Ok(())
    }

    /// Base URL of the agent listening on `host`. IPv6 literals are
    /// bracketed.
    pub fn agent_url(&self, host: &str) -> String {
        if host.contains(':') && !host.starts_with('[') {
            format!("{}://[{}]:{}", self.scheme, host, self.agent_port)
        } else {
            format!("{}://{}:{}", self.scheme, host, self.agent_port)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogStreamConfig {
    pub capacity: usize,
}

impl Default for LogStreamConfig {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

impl LogStreamConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.capacity == 0 {
            return Err(anyhow::anyhow!("日志流缓冲容量必须大于0"));
        }
        Ok(())
    }
}

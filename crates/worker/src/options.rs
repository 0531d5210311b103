use std::time::Duration;

use placement_core::config::{AppConfig, ContainerConfig, RemoteConfig};
use placement_core::DEFAULT_LOCAL_HOST;
use placement_errors::{PlacementError, PlacementResult};

use crate::remote::RemoteAgentClient;

/// Everything handle construction needs besides the unit itself.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    pub local_host: String,
    pub container: ContainerConfig,
    pub remote: RemoteConfig,
    http_client: reqwest::Client,
}

impl WorkerOptions {
    pub fn new(
        local_host: String,
        container: ContainerConfig,
        remote: RemoteConfig,
    ) -> PlacementResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(remote.request_timeout_seconds))
            .build()
            .map_err(|e| PlacementError::config_error(format!("创建HTTP客户端失败: {e}")))?;

        Ok(Self {
            local_host,
            container,
            remote,
            http_client,
        })
    }

    pub fn from_config(config: &AppConfig) -> PlacementResult<Self> {
        Self::new(
            config.placement.local_host.clone(),
            config.container.clone(),
            config.remote.clone(),
        )
    }

    /// Shared client; cloning it shares the connection pool.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    /// Client for the agent on `host`, sharing this option set's pool.
    pub fn agent_client(&self, host: &str) -> RemoteAgentClient {
        RemoteAgentClient::new(self.remote.agent_url(host), self.http_client.clone())
    }
}

impl Default for WorkerOptions {
    fn default() -> Self {
        Self {
            local_host: DEFAULT_LOCAL_HOST.to_string(),
            container: ContainerConfig::default(),
            remote: RemoteConfig::default(),
            http_client: reqwest::Client::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_client_targets_configured_port() {
        let remote = RemoteConfig {
            agent_port: 9100,
            ..RemoteConfig::default()
        };
        let options =
            WorkerOptions::new("127.0.0.1".to_string(), ContainerConfig::default(), remote).unwrap();

        assert_eq!(options.agent_client("10.0.0.2").base_url(), "http://10.0.0.2:9100");
    }

    #[test]
    fn test_agent_client_brackets_ipv6_hosts() {
        let options = WorkerOptions::default();

        for host in ["::1", "2001:db8::5", "[2001:db8::5]"] {
            let url = options.agent_client(host).base_url().to_string();
            let parsed = reqwest::Url::parse(&url).unwrap();
            assert_eq!(parsed.port(), Some(8000), "{url}");
            assert!(parsed.host_str().is_some_and(|h| h.starts_with('[')), "{url}");
        }
        assert_eq!(options.agent_client("::1").base_url(), "http://[::1]:8000");
    }
}

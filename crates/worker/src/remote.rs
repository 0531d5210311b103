use async_trait::async_trait;
use placement_core::{GroupSpec, HandleStatus, Runnable, UnitSpec};
use placement_errors::{PlacementError, PlacementResult};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Kind of resource managed by a remote agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteResource {
    Unit,
    Group,
}

impl RemoteResource {
    fn path(&self) -> &'static str {
        match self {
            RemoteResource::Unit => "units",
            RemoteResource::Group => "groups",
        }
    }
}

#[derive(Debug, Serialize)]
struct StartRequest<'a, T: Serialize> {
    name: &'a str,
    spec: &'a T,
}

#[derive(Debug, Deserialize)]
struct StartResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: HandleStatus,
}

/// HTTP client for the agent that runs delegated work on a remote host.
///
/// The agent exposes `POST /{units|groups}` returning `{"id": ..}`,
/// `DELETE /{units|groups}/{id}` and `GET /{units|groups}/{id}` returning
/// `{"status": ..}`.
#[derive(Debug, Clone)]
pub struct RemoteAgentClient {
    base_url: String,
    http_client: reqwest::Client,
}

impl RemoteAgentClient {
    pub fn new(base_url: String, http_client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn start_unit(&self, name: &str, spec: &UnitSpec) -> PlacementResult<String> {
        self.start(RemoteResource::Unit, name, spec).await
    }

    pub async fn start_group(&self, name: &str, group: &GroupSpec) -> PlacementResult<String> {
        self.start(RemoteResource::Group, name, group).await
    }

    async fn start<T: Serialize + Sync>(
        &self,
        resource: RemoteResource,
        name: &str,
        spec: &T,
    ) -> PlacementResult<String> {
        let url = format!("{}/{}", self.base_url, resource.path());

        let response = self
            .http_client
            .post(&url)
            .json(&StartRequest { name, spec })
            .send()
            .await
            .map_err(|e| {
                error!("Failed to reach remote agent at {}: {}", url, e);
                PlacementError::network(format!("远程代理连接失败 {url}: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PlacementError::lifecycle(format!(
                "远程启动 {name} 失败: HTTP {status} - {body}"
            )));
        }

        let started: StartResponse = response
            .json()
            .await
            .map_err(|e| PlacementError::Serialization(format!("远程代理响应无效: {e}")))?;
        debug!("Remote agent {} accepted '{}' as {}", self.base_url, name, started.id);
        Ok(started.id)
    }

    /// Stops a remote resource. An agent that no longer knows the id counts
    /// as already stopped.
    pub async fn stop(&self, resource: RemoteResource, id: &str) -> PlacementResult<()> {
        let url = format!("{}/{}/{}", self.base_url, resource.path(), id);

        let response = self
            .http_client
            .delete(&url)
            .send()
            .await
            .map_err(|e| PlacementError::network(format!("远程代理连接失败 {url}: {e}")))?;

        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(PlacementError::lifecycle(format!(
            "远程停止 {id} 失败: HTTP {status} - {body}"
        )))
    }

    pub async fn status(&self, resource: RemoteResource, id: &str) -> PlacementResult<HandleStatus> {
        let url = format!("{}/{}/{}", self.base_url, resource.path(), id);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| PlacementError::network(format!("远程代理连接失败 {url}: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(HandleStatus::Stopped);
        }
        if !status.is_success() {
            return Err(PlacementError::lifecycle(format!(
                "远程状态查询 {id} 失败: HTTP {status}"
            )));
        }

        let reply: StatusResponse = response
            .json()
            .await
            .map_err(|e| PlacementError::Serialization(format!("远程代理响应无效: {e}")))?;
        Ok(reply.status)
    }
}

/// Lifecycle state of something started through a remote agent.
#[derive(Debug)]
pub(crate) struct RemoteState {
    pub(crate) status: HandleStatus,
    pub(crate) remote_id: Option<String>,
}

impl RemoteState {
    pub(crate) fn new() -> Mutex<Self> {
        Mutex::new(Self {
            status: HandleStatus::Created,
            remote_id: None,
        })
    }
}

/// 远程执行单元
///
/// Thin proxy bound to one host. No local resource is created; lifecycle
/// calls are forwarded to the agent on that host, which makes its own
/// local-versus-container decision.
pub struct RemoteWorker {
    name: String,
    host: String,
    spec: UnitSpec,
    client: RemoteAgentClient,
    state: Mutex<RemoteState>,
}

impl RemoteWorker {
    /// `spec` is expected to be gated, i.e. to carry its host.
    pub fn new(name: String, spec: UnitSpec, client: RemoteAgentClient) -> Self {
        Self {
            name,
            host: spec.host.clone().unwrap_or_default(),
            spec,
            client,
            state: RemoteState::new(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn agent_url(&self) -> &str {
        self.client.base_url()
    }

    pub async fn remote_id(&self) -> Option<String> {
        self.state.lock().await.remote_id.clone()
    }
}

#[async_trait]
impl Runnable for RemoteWorker {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> PlacementResult<()> {
        let mut state = self.state.lock().await;
        if state.remote_id.is_some() {
            return Err(PlacementError::lifecycle(format!(
                "远程执行单元 {} 已启动",
                self.name
            )));
        }

        state.status = HandleStatus::Starting;
        match self.client.start_unit(&self.name, &self.spec).await {
            Ok(id) => {
                info!("Remote unit '{}' started on {} as {}", self.name, self.host, id);
                state.remote_id = Some(id);
                state.status = HandleStatus::Running;
                Ok(())
            }
            Err(e) => {
                state.status = HandleStatus::failed(e.to_string());
                Err(e)
            }
        }
    }

    async fn stop(&self) -> PlacementResult<()> {
        let mut state = self.state.lock().await;
        let Some(id) = state.remote_id.clone() else {
            return Ok(());
        };

        state.status = HandleStatus::Stopping;
        if let Err(e) = self.client.stop(RemoteResource::Unit, &id).await {
            warn!("Failed to stop remote unit '{}' on {}: {}", self.name, self.host, e);
            state.status = HandleStatus::failed(e.to_string());
            return Err(e);
        }

        state.remote_id = None;
        state.status = HandleStatus::Stopped;
        info!("Remote unit '{}' on {} stopped", self.name, self.host);
        Ok(())
    }

    async fn status(&self) -> PlacementResult<HandleStatus> {
        let mut state = self.state.lock().await;
        let Some(id) = state.remote_id.clone() else {
            return Ok(state.status.clone());
        };

        let status = self.client.status(RemoteResource::Unit, &id).await?;
        state.status = status.clone();
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = RemoteAgentClient::new("http://10.0.0.2:8000/".to_string(), reqwest::Client::new());
        assert_eq!(client.base_url(), "http://10.0.0.2:8000");
    }

    #[tokio::test]
    async fn test_construction_is_offline() {
        let client = RemoteAgentClient::new("http://192.0.2.1:9".to_string(), reqwest::Client::new());
        let worker = RemoteWorker::new(
            "encoder-0".to_string(),
            UnitSpec::on_host("192.0.2.1"),
            client,
        );

        assert_eq!(worker.host(), "192.0.2.1");
        assert_eq!(worker.status().await.unwrap(), HandleStatus::Created);
        assert!(worker.remote_id().await.is_none());
        worker.stop().await.unwrap();
    }
}

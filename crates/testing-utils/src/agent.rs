//! In-process stand-in for the remote agent
//!
//! Serves the agent's HTTP surface (`POST /{units|groups}`,
//! `GET|DELETE /{units|groups}/{id}`) on an ephemeral loopback port and
//! records every request it receives.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// One request seen by the stub agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentRequest {
    pub method: &'static str,
    pub resource: String,
    pub id: Option<String>,
    pub body: Option<Value>,
}

#[derive(Clone, Default)]
struct AgentState {
    requests: Arc<Mutex<Vec<AgentRequest>>>,
    running: Arc<Mutex<HashMap<String, Value>>>,
    fail_starts: bool,
}

impl AgentState {
    fn record(&self, request: AgentRequest) {
        self.requests.lock().unwrap().push(request);
    }
}

/// A running stub agent. The server task is aborted on drop.
pub struct StubAgent {
    addr: SocketAddr,
    state: AgentState,
    task: JoinHandle<()>,
}

impl StubAgent {
    /// Starts an agent that accepts every request.
    pub async fn spawn() -> Self {
        Self::spawn_with(false).await
    }

    /// Starts an agent that rejects every start request with HTTP 500.
    pub async fn spawn_failing() -> Self {
        Self::spawn_with(true).await
    }

    async fn spawn_with(fail_starts: bool) -> Self {
        let state = AgentState {
            fail_starts,
            ..AgentState::default()
        };

        let app = Router::new()
            .route("/{resource}", post(start_resource))
            .route("/{resource}/{id}", get(resource_status).delete(stop_resource))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state, task }
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn requests(&self) -> Vec<AgentRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn requests_for(&self, method: &str, resource: &str) -> Vec<AgentRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.resource == resource)
            .collect()
    }

    /// Number of resources started and not yet stopped.
    pub fn running_count(&self) -> usize {
        self.state.running.lock().unwrap().len()
    }
}

impl Drop for StubAgent {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn start_resource(
    State(state): State<AgentState>,
    Path(resource): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    state.record(AgentRequest {
        method: "POST",
        resource: resource.clone(),
        id: None,
        body: Some(body.clone()),
    });

    if state.fail_starts {
        return (StatusCode::INTERNAL_SERVER_ERROR, "agent refused to start").into_response();
    }

    let mut running = state.running.lock().unwrap();
    let id = format!("{}-{}", resource, state.requests.lock().unwrap().len());
    running.insert(id.clone(), body);
    Json(json!({ "id": id })).into_response()
}

async fn stop_resource(
    State(state): State<AgentState>,
    Path((resource, id)): Path<(String, String)>,
) -> StatusCode {
    state.record(AgentRequest {
        method: "DELETE",
        resource,
        id: Some(id.clone()),
        body: None,
    });

    match state.running.lock().unwrap().remove(&id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

async fn resource_status(
    State(state): State<AgentState>,
    Path((resource, id)): Path<(String, String)>,
) -> Response {
    state.record(AgentRequest {
        method: "GET",
        resource,
        id: Some(id.clone()),
        body: None,
    });

    if state.running.lock().unwrap().contains_key(&id) {
        Json(json!({ "status": { "state": "running" } })).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

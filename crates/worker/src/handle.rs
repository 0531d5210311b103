use std::fmt;

use async_trait::async_trait;
use placement_core::{HandleStatus, Runnable};
use placement_errors::PlacementResult;
use serde::Serialize;

use crate::aggregate::{LocalAggregate, Member, RemoteAggregate};
use crate::container::ContainerWorker;
use crate::local::LocalWorker;
use crate::remote::RemoteWorker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerKind {
    Local,
    Container,
    Remote,
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerKind::Local => write!(f, "local"),
            WorkerKind::Container => write!(f, "container"),
            WorkerKind::Remote => write!(f, "remote"),
        }
    }
}

/// Handle for one unit, tagged by the kind of worker the resolver chose.
pub enum WorkerHandle {
    Local(LocalWorker),
    Container(ContainerWorker),
    Remote(RemoteWorker),
}

impl WorkerHandle {
    pub fn kind(&self) -> WorkerKind {
        match self {
            WorkerHandle::Local(_) => WorkerKind::Local,
            WorkerHandle::Container(_) => WorkerKind::Container,
            WorkerHandle::Remote(_) => WorkerKind::Remote,
        }
    }

    /// Target host for remote workers; `None` for everything run here.
    pub fn host(&self) -> Option<&str> {
        match self {
            WorkerHandle::Remote(worker) => Some(worker.host()),
            _ => None,
        }
    }

    fn inner(&self) -> &dyn Runnable {
        match self {
            WorkerHandle::Local(worker) => worker,
            WorkerHandle::Container(worker) => worker,
            WorkerHandle::Remote(worker) => worker,
        }
    }
}

#[async_trait]
impl Runnable for WorkerHandle {
    fn name(&self) -> &str {
        self.inner().name()
    }

    async fn start(&self) -> PlacementResult<()> {
        self.inner().start().await
    }

    async fn stop(&self) -> PlacementResult<()> {
        self.inner().stop().await
    }

    async fn status(&self) -> PlacementResult<HandleStatus> {
        self.inner().status().await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    Local,
    RemoteCoordinated,
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateKind::Local => write!(f, "local_aggregate"),
            AggregateKind::RemoteCoordinated => write!(f, "remote_coordinated"),
        }
    }
}

/// Handle for a whole group.
pub enum AggregateHandle {
    Local(LocalAggregate),
    RemoteCoordinated(RemoteAggregate),
}

impl AggregateHandle {
    pub fn kind(&self) -> AggregateKind {
        match self {
            AggregateHandle::Local(_) => AggregateKind::Local,
            AggregateHandle::RemoteCoordinated(_) => AggregateKind::RemoteCoordinated,
        }
    }

    fn inner(&self) -> &dyn Runnable {
        match self {
            AggregateHandle::Local(group) => group,
            AggregateHandle::RemoteCoordinated(group) => group,
        }
    }
}

#[async_trait]
impl Runnable for AggregateHandle {
    fn name(&self) -> &str {
        self.inner().name()
    }

    async fn start(&self) -> PlacementResult<()> {
        self.inner().start().await
    }

    async fn stop(&self) -> PlacementResult<()> {
        self.inner().stop().await
    }

    async fn status(&self) -> PlacementResult<HandleStatus> {
        self.inner().status().await
    }
}

/// Result of group resolution: an aggregate, or a single unit when the
/// group entry point was handed one unit.
pub enum Placement {
    Unit(WorkerHandle),
    Group(AggregateHandle),
}

/// One member line of a [`PlacementPlan`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberPlan {
    pub role: String,
    pub name: String,
    pub kind: WorkerKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
}

/// Serializable summary of what a [`Placement`] will run, and where.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacementPlan {
    pub name: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub members: Vec<MemberPlan>,
}

impl Placement {
    pub fn unit(&self) -> Option<&WorkerHandle> {
        match self {
            Placement::Unit(handle) => Some(handle),
            Placement::Group(_) => None,
        }
    }

    pub fn group(&self) -> Option<&AggregateHandle> {
        match self {
            Placement::Group(handle) => Some(handle),
            Placement::Unit(_) => None,
        }
    }

    pub fn describe(&self) -> PlacementPlan {
        match self {
            Placement::Unit(handle) => PlacementPlan {
                name: handle.name().to_string(),
                kind: handle.kind().to_string(),
                host: handle.host().map(str::to_string),
                members: Vec::new(),
            },
            Placement::Group(AggregateHandle::Local(group)) => PlacementPlan {
                name: group.name().to_string(),
                kind: AggregateKind::Local.to_string(),
                host: None,
                members: group.members().iter().map(Member::plan).collect(),
            },
            Placement::Group(AggregateHandle::RemoteCoordinated(group)) => {
                let (kind, host) = match group {
                    RemoteAggregate::Delegated(delegated) => {
                        ("delegated", Some(delegated.host().to_string()))
                    }
                    RemoteAggregate::Heterogeneous(_) => ("heterogeneous", None),
                };
                PlacementPlan {
                    name: group.name().to_string(),
                    kind: format!("{}/{}", AggregateKind::RemoteCoordinated, kind),
                    host,
                    members: group.member_plans(),
                }
            }
        }
    }

    fn inner(&self) -> &dyn Runnable {
        match self {
            Placement::Unit(handle) => handle,
            Placement::Group(handle) => handle,
        }
    }
}

#[async_trait]
impl Runnable for Placement {
    fn name(&self) -> &str {
        self.inner().name()
    }

    async fn start(&self) -> PlacementResult<()> {
        self.inner().start().await
    }

    async fn stop(&self) -> PlacementResult<()> {
        self.inner().stop().await
    }

    async fn status(&self) -> PlacementResult<HandleStatus> {
        self.inner().status().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use placement_core::UnitSpec;

    #[test]
    fn test_kind_display() {
        assert_eq!(WorkerKind::Container.to_string(), "container");
        assert_eq!(AggregateKind::RemoteCoordinated.to_string(), "remote_coordinated");
    }

    #[tokio::test]
    async fn test_unit_placement_delegates() {
        let placement = Placement::Unit(WorkerHandle::Local(LocalWorker::new(
            "encoder".to_string(),
            UnitSpec::local(),
        )));

        assert!(placement.unit().is_some());
        assert!(placement.group().is_none());
        assert_eq!(placement.name(), "encoder");

        placement.start().await.unwrap();
        assert!(placement.is_ready().await);
        placement.stop().await.unwrap();

        let plan = placement.describe();
        assert_eq!(plan.kind, "local");
        assert!(plan.members.is_empty());
    }
}

//! Runnable handles produced by placement: single workers (local, container,
//! remote) and the aggregates that own a resolved group.

pub mod aggregate;
pub mod container;
pub mod handle;
pub mod local;
pub mod options;
pub mod remote;

pub use aggregate::{DelegatedGroup, HeterogeneousGroup, LocalAggregate, Member, RemoteAggregate};
pub use container::ContainerWorker;
pub use handle::{
    AggregateHandle, AggregateKind, MemberPlan, Placement, PlacementPlan, WorkerHandle, WorkerKind,
};
pub use local::LocalWorker;
pub use options::WorkerOptions;
pub use remote::{RemoteAgentClient, RemoteResource, RemoteWorker};

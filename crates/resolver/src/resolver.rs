use std::sync::Arc;

use placement_core::{AppConfig, DiagnosticSink, GroupSpec, Runnable, UnitSpec};
use placement_errors::PlacementResult;
use placement_worker::{
    AggregateHandle, ContainerWorker, DelegatedGroup, HeterogeneousGroup, LocalAggregate,
    LocalWorker, Member, Placement, RemoteAggregate, RemoteWorker, WorkerHandle, WorkerOptions,
};
use tracing::{debug, info};

use crate::policy::PolicyGate;
use crate::topology::Topology;

/// Name given to groups resolved without an explicit one.
pub const DEFAULT_GROUP_NAME: &str = "group";

/// 执行单元解析器
///
/// Turns gated specifications into handles. Resolution is a single pass over
/// already validated input: it performs no I/O, never blocks and keeps no
/// mutable state, so one resolver can serve concurrent callers.
pub struct Resolver {
    gate: PolicyGate,
    options: WorkerOptions,
}

impl Resolver {
    pub fn new(options: WorkerOptions, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            gate: PolicyGate::new(options.local_host.clone(), sink),
            options,
        }
    }

    pub fn from_config(config: &AppConfig, sink: Arc<dyn DiagnosticSink>) -> PlacementResult<Self> {
        Ok(Self::new(WorkerOptions::from_config(config)?, sink))
    }

    pub fn gate(&self) -> &PolicyGate {
        &self.gate
    }

    pub fn local_host(&self) -> &str {
        self.gate.local_host()
    }

    /// Resolves one unit: remote first, then container, then local.
    pub fn resolve_unit(&self, spec: UnitSpec, allow_remote: bool) -> WorkerHandle {
        let spec = self.gate.normalize(spec, allow_remote);
        let name = spec.display_name().to_string();
        self.instantiate(name, spec)
    }

    pub fn resolve_group(&self, group: GroupSpec, allow_remote: bool) -> PlacementResult<Placement> {
        self.resolve_named_group(DEFAULT_GROUP_NAME, group, allow_remote)
    }

    /// Resolves a group into one aggregate named `name`.
    ///
    /// A `GroupSpec::Single` is resolved as a unit and comes back as
    /// [`Placement::Unit`].
    pub fn resolve_named_group(
        &self,
        name: &str,
        group: GroupSpec,
        allow_remote: bool,
    ) -> PlacementResult<Placement> {
        let group = self.gate.normalize_group(group, allow_remote);

        let group = match group {
            GroupSpec::Single(spec) => {
                let unit_name = spec.name.clone().unwrap_or_else(|| name.to_string());
                debug!("执行单元组 {} 为单一规格, 按执行单元解析", name);
                return Ok(Placement::Unit(self.instantiate(unit_name, spec)));
            }
            roles => roles,
        };

        let hosts = group.host_set(self.local_host());
        let topology = Topology::classify(&hosts, self.local_host())?;
        debug!(
            "执行单元组 {} 分类为 {} ({} 个成员)",
            name,
            topology,
            group.unit_count()
        );

        let aggregate = match topology {
            Topology::Local => {
                AggregateHandle::Local(LocalAggregate::new(name.to_string(), self.members(&group)))
            }
            Topology::SingleRemote { host } => {
                let client = self.options.agent_client(&host);
                AggregateHandle::RemoteCoordinated(RemoteAggregate::Delegated(DelegatedGroup::new(
                    name.to_string(),
                    host,
                    group,
                    client,
                )))
            }
            Topology::Mixed { hosts } => {
                let members = self.members(&group);
                AggregateHandle::RemoteCoordinated(RemoteAggregate::Heterogeneous(
                    HeterogeneousGroup::new(name.to_string(), hosts, members),
                ))
            }
        };

        info!("Resolved group '{}' to {} aggregate", name, aggregate.kind());
        Ok(Placement::Group(aggregate))
    }

    fn members(&self, group: &GroupSpec) -> Vec<Member> {
        group
            .indexed_units()
            .map(|(role, index, spec)| {
                let handle = self.instantiate(spec.member_name(role, index), spec.clone());
                Member::new(role, handle)
            })
            .collect()
    }

    /// Picks the worker for an already gated spec.
    fn instantiate(&self, name: String, spec: UnitSpec) -> WorkerHandle {
        let handle = if !spec.is_local(self.local_host()) {
            let client = self.options.agent_client(spec.host_or(self.local_host()));
            WorkerHandle::Remote(RemoteWorker::new(name, spec, client))
        } else if let Some(image) = spec.image().map(str::to_string) {
            WorkerHandle::Container(ContainerWorker::new(
                name,
                image,
                spec,
                self.options.container.clone(),
            ))
        } else {
            WorkerHandle::Local(LocalWorker::new(name, spec))
        };

        info!("Resolved unit '{}' to {} worker", handle.name(), handle.kind());
        handle
    }
}

use async_trait::async_trait;
use futures::future::join_all;
use placement_core::{GroupSpec, HandleStatus, HostSet, Runnable};
use placement_errors::{PlacementError, PlacementResult};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::handle::{MemberPlan, WorkerHandle, WorkerKind};
use crate::remote::{RemoteAgentClient, RemoteResource, RemoteState};

/// A resolved group member and the role it was declared under.
pub struct Member {
    pub role: String,
    pub handle: WorkerHandle,
}

impl Member {
    pub fn new<S: Into<String>>(role: S, handle: WorkerHandle) -> Self {
        Self {
            role: role.into(),
            handle,
        }
    }

    pub(crate) fn plan(&self) -> MemberPlan {
        MemberPlan {
            role: self.role.clone(),
            name: self.handle.name().to_string(),
            kind: self.handle.kind(),
            host: self.handle.host().map(str::to_string),
        }
    }
}

async fn member_status(member: &Member) -> HandleStatus {
    match member.handle.status().await {
        Ok(status) => status,
        Err(e) => HandleStatus::failed(e.to_string()),
    }
}

async fn combined_status(members: &[Member]) -> HandleStatus {
    HandleStatus::combine(join_all(members.iter().map(member_status)).await)
}

/// Stops `members` back to front, carrying on past failures.
async fn stop_in_reverse(members: &[Member]) -> PlacementResult<()> {
    let mut first_error = None;
    for member in members.iter().rev() {
        if let Err(e) = member.handle.stop().await {
            warn!("Failed to stop member '{}': {}", member.handle.name(), e);
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}

/// 本地聚合
///
/// Every member runs on this machine. Members start one after another in
/// role order; a failed start rolls back what was already started.
pub struct LocalAggregate {
    name: String,
    members: Vec<Member>,
}

impl LocalAggregate {
    pub fn new(name: String, members: Vec<Member>) -> Self {
        Self { name, members }
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[async_trait]
impl Runnable for LocalAggregate {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> PlacementResult<()> {
        for (index, member) in self.members.iter().enumerate() {
            if let Err(e) = member.handle.start().await {
                warn!(
                    "Member '{}' of '{}' failed to start, rolling back {} started member(s): {}",
                    member.handle.name(),
                    self.name,
                    index,
                    e
                );
                if let Err(rollback) = stop_in_reverse(&self.members[..index]).await {
                    warn!("Rollback of '{}' incomplete: {}", self.name, rollback);
                }
                return Err(e);
            }
        }
        info!("Local aggregate '{}' started {} member(s)", self.name, self.members.len());
        Ok(())
    }

    async fn stop(&self) -> PlacementResult<()> {
        let result = stop_in_reverse(&self.members).await;
        info!("Local aggregate '{}' stopped", self.name);
        result
    }

    async fn status(&self) -> PlacementResult<HandleStatus> {
        Ok(combined_status(&self.members).await)
    }
}

/// The whole group shipped to the agent on its only host.
pub struct DelegatedGroup {
    name: String,
    host: String,
    group: GroupSpec,
    client: RemoteAgentClient,
    state: Mutex<RemoteState>,
}

impl DelegatedGroup {
    pub fn new(name: String, host: String, group: GroupSpec, client: RemoteAgentClient) -> Self {
        Self {
            name,
            host,
            group,
            client,
            state: RemoteState::new(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn group(&self) -> &GroupSpec {
        &self.group
    }

    pub async fn remote_id(&self) -> Option<String> {
        self.state.lock().await.remote_id.clone()
    }

    fn member_plans(&self) -> Vec<MemberPlan> {
        self.group
            .indexed_units()
            .map(|(role, index, spec)| MemberPlan {
                role: role.to_string(),
                name: spec.member_name(role, index),
                kind: WorkerKind::Remote,
                host: Some(self.host.clone()),
            })
            .collect()
    }
}

#[async_trait]
impl Runnable for DelegatedGroup {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> PlacementResult<()> {
        let mut state = self.state.lock().await;
        if state.remote_id.is_some() {
            return Err(PlacementError::lifecycle(format!(
                "远程执行单元组 {} 已启动",
                self.name
            )));
        }

        state.status = HandleStatus::Starting;
        match self.client.start_group(&self.name, &self.group).await {
            Ok(id) => {
                info!(
                    "Group '{}' delegated to {} as {} ({} unit(s))",
                    self.name,
                    self.host,
                    id,
                    self.group.unit_count()
                );
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
        if let Err(e) = self.client.stop(RemoteResource::Group, &id).await {
            state.status = HandleStatus::failed(e.to_string());
            return Err(e);
        }

        state.remote_id = None;
        state.status = HandleStatus::Stopped;
        info!("Delegated group '{}' on {} stopped", self.name, self.host);
        Ok(())
    }

    async fn status(&self) -> PlacementResult<HandleStatus> {
        let mut state = self.state.lock().await;
        let Some(id) = state.remote_id.clone() else {
            return Ok(state.status.clone());
        };

        let status = self.client.status(RemoteResource::Group, &id).await?;
        state.status = status.clone();
        Ok(status)
    }
}

/// Members spread over several hosts, each resolved on its own.
///
/// Startup proceeds role by role with the replicas of one role started
/// concurrently. Teardown walks the roles in reverse.
pub struct HeterogeneousGroup {
    name: String,
    hosts: HostSet,
    members: Vec<Member>,
}

impl HeterogeneousGroup {
    pub fn new(name: String, hosts: HostSet, members: Vec<Member>) -> Self {
        Self {
            name,
            hosts,
            members,
        }
    }

    pub fn hosts(&self) -> &HostSet {
        &self.hosts
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    fn role_batches(&self) -> impl DoubleEndedIterator<Item = &[Member]> {
        self.members.chunk_by(|a, b| a.role == b.role)
    }

    async fn stop_batches<'a, I>(batches: I) -> PlacementResult<()>
    where
        I: Iterator<Item = &'a [Member]>,
    {
        let mut first_error = None;
        for batch in batches {
            let results = join_all(batch.iter().map(|m| m.handle.stop())).await;
            for (member, result) in batch.iter().zip(results) {
                if let Err(e) = result {
                    warn!("Failed to stop member '{}': {}", member.handle.name(), e);
                    first_error.get_or_insert(e);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

#[async_trait]
impl Runnable for HeterogeneousGroup {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> PlacementResult<()> {
        let batches: Vec<&[Member]> = self.role_batches().collect();

        for (index, batch) in batches.iter().enumerate() {
            debug!(
                "Starting role '{}' of '{}' ({} replica(s))",
                batch[0].role,
                self.name,
                batch.len()
            );
            let results = join_all(batch.iter().map(|m| m.handle.start())).await;
            if let Some(e) = results.into_iter().find_map(Result::err) {
                warn!("Role '{}' of '{}' failed to start: {}", batch[0].role, self.name, e);
                if let Err(rollback) =
                    Self::stop_batches(batches[..=index].iter().rev().copied()).await
                {
                    warn!("Rollback of '{}' incomplete: {}", self.name, rollback);
                }
                return Err(e);
            }
        }

        info!(
            "Group '{}' started {} member(s) across hosts {}",
            self.name,
            self.members.len(),
            self.hosts
        );
        Ok(())
    }

    async fn stop(&self) -> PlacementResult<()> {
        let result = Self::stop_batches(self.role_batches().rev()).await;
        info!("Group '{}' stopped", self.name);
        result
    }

    async fn status(&self) -> PlacementResult<HandleStatus> {
        Ok(combined_status(&self.members).await)
    }
}

/// 远程协调聚合
pub enum RemoteAggregate {
    Delegated(DelegatedGroup),
    Heterogeneous(HeterogeneousGroup),
}

impl RemoteAggregate {
    pub fn is_delegated(&self) -> bool {
        matches!(self, RemoteAggregate::Delegated(_))
    }

    /// The single host of a delegated group.
    pub fn host(&self) -> Option<&str> {
        match self {
            RemoteAggregate::Delegated(group) => Some(group.host()),
            RemoteAggregate::Heterogeneous(_) => None,
        }
    }

    pub fn hosts(&self) -> HostSet {
        match self {
            RemoteAggregate::Delegated(group) => std::iter::once(group.host()).collect(),
            RemoteAggregate::Heterogeneous(group) => group.hosts().clone(),
        }
    }

    /// Locally held member handles; a delegated group holds none.
    pub fn members(&self) -> &[Member] {
        match self {
            RemoteAggregate::Delegated(_) => &[],
            RemoteAggregate::Heterogeneous(group) => group.members(),
        }
    }

    pub(crate) fn member_plans(&self) -> Vec<MemberPlan> {
        match self {
            RemoteAggregate::Delegated(group) => group.member_plans(),
            RemoteAggregate::Heterogeneous(group) => {
                group.members().iter().map(Member::plan).collect()
            }
        }
    }

    fn inner(&self) -> &dyn Runnable {
        match self {
            RemoteAggregate::Delegated(group) => group,
            RemoteAggregate::Heterogeneous(group) => group,
        }
    }
}

#[async_trait]
impl Runnable for RemoteAggregate {
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
    use crate::local::LocalWorker;
    use placement_core::UnitSpec;
    use serde_json::json;

    fn local(role: &str, name: &str) -> Member {
        Member::new(
            role,
            WorkerHandle::Local(LocalWorker::new(name.to_string(), UnitSpec::local())),
        )
    }

    fn broken(role: &str, name: &str) -> Member {
        let spec = UnitSpec::local().with_field("command", json!("/nonexistent/placement-unit"));
        Member::new(role, WorkerHandle::Local(LocalWorker::new(name.to_string(), spec)))
    }

    #[tokio::test]
    async fn test_local_aggregate_lifecycle() {
        let group = LocalAggregate::new(
            "pipeline".to_string(),
            vec![local("encoder", "encoder-0"), local("indexer", "indexer-0")],
        );
        assert_eq!(group.status().await.unwrap(), HandleStatus::Created);

        group.start().await.unwrap();
        assert_eq!(group.status().await.unwrap(), HandleStatus::Running);

        group.stop().await.unwrap();
        assert_eq!(group.status().await.unwrap(), HandleStatus::Stopped);
    }

    #[tokio::test]
    async fn test_local_aggregate_rolls_back_on_failed_start() {
        let group = LocalAggregate::new(
            "pipeline".to_string(),
            vec![
                local("a", "a-0"),
                local("b", "b-0"),
                broken("c", "c-0"),
                local("d", "d-0"),
            ],
        );

        assert!(group.start().await.is_err());

        let members = group.members();
        assert_eq!(members[0].handle.status().await.unwrap(), HandleStatus::Stopped);
        assert_eq!(members[1].handle.status().await.unwrap(), HandleStatus::Stopped);
        assert!(matches!(
            members[2].handle.status().await.unwrap(),
            HandleStatus::Failed { .. }
        ));
        assert_eq!(members[3].handle.status().await.unwrap(), HandleStatus::Created);
    }

    #[tokio::test]
    async fn test_heterogeneous_group_starts_role_by_role() {
        let hosts: HostSet = ["0.0.0.0", "10.0.0.2"].into_iter().collect();
        let group = HeterogeneousGroup::new(
            "mixed".to_string(),
            hosts,
            vec![
                local("encoder", "encoder-0"),
                local("encoder", "encoder-1"),
                local("indexer", "indexer-0"),
            ],
        );

        assert_eq!(group.role_batches().count(), 2);

        group.start().await.unwrap();
        assert_eq!(group.status().await.unwrap(), HandleStatus::Running);
        group.stop().await.unwrap();
        assert_eq!(group.status().await.unwrap(), HandleStatus::Stopped);
    }

    #[tokio::test]
    async fn test_heterogeneous_group_later_roles_untouched_on_failure() {
        let hosts: HostSet = ["0.0.0.0", "10.0.0.2"].into_iter().collect();
        let group = HeterogeneousGroup::new(
            "mixed".to_string(),
            hosts,
            vec![
                local("a", "a-0"),
                broken("b", "b-0"),
                local("b", "b-1"),
                local("c", "c-0"),
            ],
        );

        assert!(group.start().await.is_err());

        let members = group.members();
        assert_eq!(members[0].handle.status().await.unwrap(), HandleStatus::Stopped);
        assert_eq!(members[2].handle.status().await.unwrap(), HandleStatus::Stopped);
        assert_eq!(members[3].handle.status().await.unwrap(), HandleStatus::Created);
    }

    #[test]
    fn test_delegated_group_plans_every_unit() {
        let group = GroupSpec::roles()
            .with_member("encoder", UnitSpec::on_host("10.0.0.2").with_name("enc"))
            .with_member("indexer", UnitSpec::on_host("10.0.0.2"));
        let client = RemoteAgentClient::new("http://10.0.0.2:8000".to_string(), reqwest::Client::new());
        let aggregate = RemoteAggregate::Delegated(DelegatedGroup::new(
            "flow".to_string(),
            "10.0.0.2".to_string(),
            group,
            client,
        ));

        assert!(aggregate.is_delegated());
        assert_eq!(aggregate.host(), Some("10.0.0.2"));
        assert!(aggregate.members().is_empty());

        let plans = aggregate.member_plans();
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].name, "enc");
        assert_eq!(plans[1].name, "indexer-0");
    }
}

use std::sync::Arc;

use placement_core::{DiagnosticSink, GroupSpec, HostRewrite, UnitSpec};
use tracing::debug;

/// 远程执行策略门
///
/// Binds units without a host to the local sentinel, and pins every unit to
/// it when remote execution is not allowed. Every rewrite is reported to the injected sink as a warning and never
/// fails resolution. Re-applying the gate to an already gated spec is a
/// no-op.
#[derive(Clone)]
pub struct PolicyGate {
    local_host: String,
    sink: Arc<dyn DiagnosticSink>,
}

impl PolicyGate {
    pub fn new<S: Into<String>>(local_host: S, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self {
            local_host: local_host.into(),
            sink,
        }
    }

    pub fn local_host(&self) -> &str {
        &self.local_host
    }

    pub fn normalize(&self, mut spec: UnitSpec, allow_remote: bool) -> UnitSpec {
        let label = spec.name.clone();
        self.gate(&mut spec, allow_remote, label);
        spec
    }

    /// Applies the gate to every unit reachable in `group`.
    pub fn normalize_group(&self, mut group: GroupSpec, allow_remote: bool) -> GroupSpec {
        match &mut group {
            GroupSpec::Roles(roles) => {
                for (role, specs) in roles.iter_mut() {
                    for (index, spec) in specs.iter_mut().enumerate() {
                        let label = Some(spec.member_name(role, index));
                        self.gate(spec, allow_remote, label);
                    }
                }
            }
            GroupSpec::Single(spec) => {
                let label = spec.name.clone();
                self.gate(spec, allow_remote, label);
            }
        }
        group
    }

    fn gate(&self, spec: &mut UnitSpec, allow_remote: bool, label: Option<String>) {
        let host = spec.host.get_or_insert_with(|| self.local_host.clone());
        if allow_remote || *host == self.local_host {
            return;
        }

        let original = std::mem::replace(host, self.local_host.clone());
        debug!("远程执行被禁用, 主机 {} 重置为 {}", original, self.local_host);
        self.sink
            .record_warning(&HostRewrite::new(label, original, self.local_host.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use placement_core::DEFAULT_LOCAL_HOST;
    use placement_testing_utils::{GroupSpecBuilder, RecordingSink, UnitSpecBuilder};

    fn gate() -> (PolicyGate, RecordingSink) {
        let sink = RecordingSink::new();
        (PolicyGate::new(DEFAULT_LOCAL_HOST, Arc::new(sink.clone())), sink)
    }

    #[test]
    fn test_remote_host_rewritten_when_disallowed() {
        let (gate, sink) = gate();
        let spec = UnitSpecBuilder::new().with_name("enc").with_host("203.0.113.5").build();

        let gated = gate.normalize(spec, false);

        assert_eq!(gated.host.as_deref(), Some(DEFAULT_LOCAL_HOST));
        let warnings = sink.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].unit.as_deref(), Some("enc"));
        assert_eq!(warnings[0].original_host, "203.0.113.5");
        assert_eq!(warnings[0].rewritten_host, DEFAULT_LOCAL_HOST);
    }

    #[test]
    fn test_remote_host_kept_when_allowed() {
        let (gate, sink) = gate();
        let spec = UnitSpecBuilder::new().with_host("203.0.113.5").build();

        assert_eq!(gate.normalize(spec, true).host.as_deref(), Some("203.0.113.5"));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let (gate, sink) = gate();
        let spec = UnitSpecBuilder::new().with_host("203.0.113.5").with_image("img:v1").build();

        let once = gate.normalize(spec, false);
        let twice = gate.normalize(once.clone(), false);

        assert_eq!(once, twice);
        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn test_group_units_gated_with_member_names() {
        let (gate, sink) = gate();
        let group = GroupSpecBuilder::new()
            .with_replicas("encoder", 2, UnitSpecBuilder::new().with_host("10.0.0.2").build())
            .with_member("indexer", UnitSpecBuilder::new().build())
            .build();

        let gated = gate.normalize_group(group, false);

        assert_eq!(gated.host_set(DEFAULT_LOCAL_HOST).single(), Some(DEFAULT_LOCAL_HOST));
        let labels: Vec<Option<String>> = sink.warnings().into_iter().map(|w| w.unit).collect();
        assert_eq!(
            labels,
            vec![Some("encoder-0".to_string()), Some("encoder-1".to_string())]
        );
    }

    #[test]
    fn test_unset_host_bound_to_custom_local_host() {
        let sink = RecordingSink::new();
        let gate = PolicyGate::new("127.0.0.1", Arc::new(sink.clone()));

        for allow_remote in [true, false] {
            let gated = gate.normalize(UnitSpecBuilder::new().build(), allow_remote);
            assert_eq!(gated.host.as_deref(), Some("127.0.0.1"));
        }
        assert!(sink.is_empty());
    }

    #[test]
    fn test_default_sentinel_is_remote_under_custom_local_host() {
        let sink = RecordingSink::new();
        let gate = PolicyGate::new("127.0.0.1", Arc::new(sink.clone()));

        let spec = UnitSpecBuilder::new().with_host(DEFAULT_LOCAL_HOST).build();
        let gated = gate.normalize(spec, false);

        assert_eq!(gated.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(sink.count(), 1);
    }
}

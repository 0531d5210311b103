//! Test data builders for unit and group specifications
//!
//! Builders start from the same defaults the deserializer applies, so a test
//! only spells out the fields it cares about.

use placement_core::{GroupSpec, UnitSpec};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Builder for [`UnitSpec`]
pub struct UnitSpecBuilder {
    spec: UnitSpec,
}

impl UnitSpecBuilder {
    pub fn new() -> Self {
        Self {
            spec: UnitSpec::local(),
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.spec.name = Some(name.to_string());
        self
    }

    pub fn with_host(mut self, host: &str) -> Self {
        self.spec.host = Some(host.to_string());
        self
    }

    pub fn with_image(mut self, image: &str) -> Self {
        self.spec.container_image = Some(image.to_string());
        self
    }

    /// Makes the unit spawn `program` with `args` when started locally.
    pub fn with_command(mut self, program: &str, args: &[&str]) -> Self {
        self.spec.extra.insert("command".to_string(), json!(program));
        self.spec.extra.insert("args".to_string(), json!(args));
        self
    }

    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        self.spec.extra.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> UnitSpec {
        self.spec
    }
}

impl Default for UnitSpecBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for role-mapped [`GroupSpec`]s
pub struct GroupSpecBuilder {
    roles: BTreeMap<String, Vec<UnitSpec>>,
}

impl GroupSpecBuilder {
    pub fn new() -> Self {
        Self {
            roles: BTreeMap::new(),
        }
    }

    pub fn with_member(mut self, role: &str, spec: UnitSpec) -> Self {
        self.roles.entry(role.to_string()).or_default().push(spec);
        self
    }

    /// Adds `count` copies of `spec` under `role`.
    pub fn with_replicas(mut self, role: &str, count: usize, spec: UnitSpec) -> Self {
        self.roles
            .entry(role.to_string())
            .or_default()
            .extend(std::iter::repeat(spec).take(count));
        self
    }

    /// Adds a role with no members, as a `null` role value parses to.
    pub fn with_empty_role(mut self, role: &str) -> Self {
        self.roles.entry(role.to_string()).or_default();
        self
    }

    pub fn build(self) -> GroupSpec {
        GroupSpec::Roles(self.roles)
    }
}

impl Default for GroupSpecBuilder {
    fn default() -> Self {
        Self::new()
    }
}

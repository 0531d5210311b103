use std::collections::BTreeMap;

use placement_errors::{PlacementError, PlacementResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::host_set::HostSet;
use super::unit_spec::UnitSpec;

/// Role a `Single` unit is filed under wherever a role name is needed.
pub const SINGLE_ROLE: &str = "unit";

/// 执行单元组规格
///
/// Either a mapping from role name to its replicas, or a single unit that was
/// handed to the group entry point. Roles iterate in key order, which is also
/// the order members are started in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum GroupSpec {
    Roles(BTreeMap<String, Vec<UnitSpec>>),
    Single(UnitSpec),
}

impl GroupSpec {
    pub fn roles() -> Self {
        GroupSpec::Roles(BTreeMap::new())
    }

    /// Adds one replica to `role`. A `Single` group is promoted to a role
    /// mapping with its unit under [`SINGLE_ROLE`].
    pub fn with_member<S: Into<String>>(self, role: S, spec: UnitSpec) -> Self {
        let mut roles = match self {
            GroupSpec::Roles(roles) => roles,
            GroupSpec::Single(unit) => BTreeMap::from([(SINGLE_ROLE.to_string(), vec![unit])]),
        };
        roles.entry(role.into()).or_default().push(spec);
        GroupSpec::Roles(roles)
    }

    /// Builds a role mapping from loosely shaped input.
    ///
    /// Per role: an object is a single replica, an array of objects is a
    /// replica list, `null` is an empty role. Anything else is rejected with
    /// the offending role key.
    pub fn from_value(value: Value) -> PlacementResult<Self> {
        let Value::Object(map) = value else {
            return Err(PlacementError::config_error(format!(
                "执行单元组必须是角色映射, 实际为 {}",
                shape_name(&value)
            )));
        };

        let mut roles = BTreeMap::new();
        for (role, members) in map {
            let specs = match members {
                Value::Null => Vec::new(),
                Value::Object(_) => vec![parse_unit(&role, members)?],
                Value::Array(items) => items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(_) => parse_unit(&role, item),
                        other => Err(PlacementError::unsupported_shape(
                            role.clone(),
                            shape_name(&other),
                        )),
                    })
                    .collect::<PlacementResult<Vec<_>>>()?,
                other => {
                    return Err(PlacementError::unsupported_shape(role, shape_name(&other)));
                }
            };
            roles.insert(role, specs);
        }

        Ok(GroupSpec::Roles(roles))
    }

    /// Every unit reachable from the group, each visited exactly once.
    pub fn units(&self) -> Box<dyn Iterator<Item = (&str, &UnitSpec)> + '_> {
        match self {
            GroupSpec::Roles(roles) => Box::new(
                roles
                    .iter()
                    .flat_map(|(role, specs)| specs.iter().map(move |s| (role.as_str(), s))),
            ),
            GroupSpec::Single(spec) => Box::new(std::iter::once((SINGLE_ROLE, spec))),
        }
    }

    /// Every unit with its role and its position within that role.
    pub fn indexed_units(&self) -> Box<dyn Iterator<Item = (&str, usize, &UnitSpec)> + '_> {
        match self {
            GroupSpec::Roles(roles) => Box::new(roles.iter().flat_map(|(role, specs)| {
                specs
                    .iter()
                    .enumerate()
                    .map(move |(index, s)| (role.as_str(), index, s))
            })),
            GroupSpec::Single(spec) => Box::new(std::iter::once((SINGLE_ROLE, 0, spec))),
        }
    }

    pub fn units_mut(&mut self) -> Box<dyn Iterator<Item = &mut UnitSpec> + '_> {
        match self {
            GroupSpec::Roles(roles) => Box::new(roles.values_mut().flat_map(|specs| specs.iter_mut())),
            GroupSpec::Single(spec) => Box::new(std::iter::once(spec)),
        }
    }

    pub fn unit_count(&self) -> usize {
        self.units().count()
    }

    /// Distinct hosts of the group, unset hosts read as `local_host`.
    pub fn host_set(&self, local_host: &str) -> HostSet {
        self.units()
            .map(|(_, spec)| spec.host_or(local_host))
            .collect()
    }
}

impl From<UnitSpec> for GroupSpec {
    fn from(spec: UnitSpec) -> Self {
        GroupSpec::Single(spec)
    }
}

impl TryFrom<Value> for GroupSpec {
    type Error = PlacementError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        GroupSpec::from_value(value)
    }
}

/// Serializes as a role mapping. A `Single` unit is written as the only
/// replica of [`SINGLE_ROLE`], so it reads back as a one-member role group.
impl From<GroupSpec> for Value {
    fn from(group: GroupSpec) -> Self {
        let roles = match group {
            GroupSpec::Roles(roles) => roles,
            GroupSpec::Single(spec) => BTreeMap::from([(SINGLE_ROLE.to_string(), vec![spec])]),
        };
        Value::Object(
            roles
                .into_iter()
                .map(|(role, specs)| {
                    let specs = specs
                        .into_iter()
                        .map(|s| serde_json::to_value(s).unwrap_or(Value::Null))
                        .collect();
                    (role, Value::Array(specs))
                })
                .collect(),
        )
    }
}

fn parse_unit(role: &str, value: Value) -> PlacementResult<UnitSpec> {
    let spec: UnitSpec = serde_json::from_value(value)
        .map_err(|e| PlacementError::invalid_unit(role, e.to_string()))?;
    if spec.host.as_deref().is_some_and(|host| host.trim().is_empty()) {
        return Err(PlacementError::invalid_unit(role, "host不能为空"));
    }
    Ok(spec)
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

use std::fmt;

use placement_core::HostSet;
use placement_errors::{PlacementError, PlacementResult};

/// Where the members of a gated group live, as seen from this process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Topology {
    /// Every member is on the local host.
    Local,
    /// Every member is on the same non-local host.
    SingleRemote { host: String },
    /// Members span two or more hosts, local or not.
    Mixed { hosts: HostSet },
}

impl Topology {
    pub fn classify(hosts: &HostSet, local_host: &str) -> PlacementResult<Self> {
        if hosts.is_empty() {
            return Err(PlacementError::EmptyGroup);
        }

        Ok(match hosts.single() {
            Some(host) if host == local_host => Topology::Local,
            Some(host) => Topology::SingleRemote {
                host: host.to_string(),
            },
            None => Topology::Mixed {
                hosts: hosts.clone(),
            },
        })
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Topology::Local)
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topology::Local => write!(f, "local"),
            Topology::SingleRemote { host } => write!(f, "single-remote({host})"),
            Topology::Mixed { hosts } => write!(f, "mixed{hosts}"),
        }
    }
}

//! Placement resolution: the remote-allowed policy gate, topology
//! classification of a group's hosts, and the unit and group resolvers that
//! turn specifications into runnable handles.

pub mod policy;
pub mod resolver;
pub mod topology;

pub use policy::PolicyGate;
pub use resolver::{Resolver, DEFAULT_GROUP_NAME};
pub use topology::Topology;

//! # 数据模型
//!
//! Immutable inputs of placement (unit and group specifications) and the
//! small value types the resolvers and handles exchange.
//!
//! ## 核心模型
//!
//! - [`UnitSpec`] - one computation unit: host, optional container image and
//!   pass-through fields
//! - [`GroupSpec`] - role name to replicas, or a single unit
//! - [`HostSet`] - distinct hosts of a group, drives topology classification
//! - [`HandleStatus`] - lifecycle state reported by every handle
//! - [`HostRewrite`] - diagnostic emitted by the remote-allowed policy

pub mod diagnostic;
pub mod group_spec;
pub mod host_set;
pub mod status;
pub mod unit_spec;

pub use diagnostic::*;
pub use group_spec::*;
pub use host_set::*;
pub use status::*;
pub use unit_spec::*;

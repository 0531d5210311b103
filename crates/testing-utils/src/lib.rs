//! # Placement Testing Utils
//!
//! Shared testing utilities for the placement workspace: a recording
//! diagnostic sink, spec builders, an in-process stub of the remote agent and
//! polling helpers.
//!
//! ## Usage
//!
//! ```toml
//! [dev-dependencies]
//! placement-testing-utils = { path = "../testing-utils" }
//! ```
//!
//! ```rust
//! use placement_testing_utils::{RecordingSink, UnitSpecBuilder};
//! ```

pub mod agent;
pub mod builders;
pub mod helpers;
pub mod mocks;

pub use agent::*;
pub use builders::*;
pub use helpers::*;
pub use mocks::*;

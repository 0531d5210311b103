//! Core types of the execution-unit placement resolver: specifications,
//! handle lifecycle traits, diagnostics, the log stream and configuration.

pub mod config;
pub mod logging;
pub mod models;
pub mod traits;

pub use config::AppConfig;
pub use logging::{CompositeSink, LogPublisher, LogSubscription, StreamKind, StreamSink, TracingSink};
pub use models::{
    GroupSpec, HandleStatus, HostRewrite, HostSet, UnitSpec, DEFAULT_LOCAL_HOST,
};
pub use placement_errors::{PlacementError, PlacementResult};
pub use traits::{DiagnosticSink, Runnable};

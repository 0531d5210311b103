pub mod log_config;
pub mod log_level;
pub mod sinks;
pub mod stream;

pub use log_config::{LogConfig, OutputFormat};
pub use log_level::LogLevel;
pub use sinks::{CompositeSink, StreamSink, TracingSink};
pub use stream::{LogPublisher, LogSubscription, StreamKind};

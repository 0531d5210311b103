pub mod app_config;
pub mod placement;

pub use app_config::{AppConfig, ENV_PREFIX};
pub use placement::{ContainerConfig, LogStreamConfig, PlacementConfig, RemoteConfig};

//! 配置管理
//!
//! Process configuration for placement: the remote-allowed policy and local
//! sentinel, container runtime settings, remote agent settings, logging and
//! the diagnostic log stream.
//!
//! Values are layered with the `config` crate: built-in defaults, then an
//! optional TOML file, then `PLACEMENT_` environment overrides.
//!
//! ```rust,no_run
//! use placement_core::config::AppConfig;
//!
//! let config = AppConfig::load(Some("config/placement.toml")).unwrap();
//! println!("allow remote: {}", config.placement.allow_remote);
//! ```

pub mod models;

pub use models::*;

#[cfg(test)]
mod tests;

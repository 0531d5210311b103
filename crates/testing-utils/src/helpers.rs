//! Test helper utilities and common testing patterns

use placement_core::{HandleStatus, Runnable};
use std::time::Duration;
use tokio::time::sleep;

/// Test environment setup utilities
pub struct TestEnv;

impl TestEnv {
    /// Wait for a condition to be true with timeout
    pub async fn wait_for<F, Fut>(mut condition: F, timeout: Duration) -> bool
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        let start = std::time::Instant::now();

        while start.elapsed() < timeout {
            if condition().await {
                return true;
            }
            sleep(Duration::from_millis(20)).await;
        }

        false
    }

    /// Polls `handle` until it reports a status matching `predicate`, and
    /// returns the last status seen.
    pub async fn wait_for_status<P>(
        handle: &dyn Runnable,
        predicate: P,
        timeout: Duration,
    ) -> HandleStatus
    where
        P: Fn(&HandleStatus) -> bool,
    {
        let start = std::time::Instant::now();
        loop {
            let status = handle
                .status()
                .await
                .unwrap_or_else(|e| HandleStatus::failed(e.to_string()));
            if predicate(&status) || start.elapsed() >= timeout {
                return status;
            }
            sleep(Duration::from_millis(20)).await;
        }
    }
}

/// Integration test setup helpers
pub struct IntegrationTestSetup;

impl IntegrationTestSetup {
    /// Set up logging for tests (call once per test binary)
    pub fn init_logging() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("debug")
            .try_init();
    }
}

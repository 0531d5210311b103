//! Test doubles for the core traits
//!
//! In-memory implementations that record what they were handed, so tests can
//! assert on side effects without a real log pipeline.

use placement_core::{DiagnosticSink, HostRewrite};
use std::sync::{Arc, Mutex};

/// Diagnostic sink that keeps every warning it receives.
///
/// Cloning shares the recorded warnings, so a test can hand one clone to the
/// code under test and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    warnings: Arc<Mutex<Vec<HostRewrite>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warnings(&self) -> Vec<HostRewrite> {
        self.warnings.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.warnings.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn clear(&self) {
        self.warnings.lock().unwrap().clear();
    }
}

impl DiagnosticSink for RecordingSink {
    fn record_warning(&self, warning: &HostRewrite) {
        self.warnings.lock().unwrap().push(warning.clone());
    }
}

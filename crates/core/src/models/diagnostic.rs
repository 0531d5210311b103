use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Warning recorded when the remote-allowed policy rewrites a unit's host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostRewrite {
    pub unit: Option<String>,
    pub original_host: String,
    pub rewritten_host: String,
    pub recorded_at: DateTime<Utc>,
}

impl HostRewrite {
    pub fn new<S: Into<String>, T: Into<String>>(
        unit: Option<String>,
        original_host: S,
        rewritten_host: T,
    ) -> Self {
        Self {
            unit,
            original_host: original_host.into(),
            rewritten_host: rewritten_host.into(),
            recorded_at: Utc::now(),
        }
    }

    /// One log line describing the rewrite.
    pub fn message(&self) -> String {
        match &self.unit {
            Some(unit) => format!(
                "unit '{}': host reset from {} to {} as remote execution is not allowed",
                unit, self.original_host, self.rewritten_host
            ),
            None => format!(
                "host reset from {} to {} as remote execution is not allowed",
                self.original_host, self.rewritten_host
            ),
        }
    }
}

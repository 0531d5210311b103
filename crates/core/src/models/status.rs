use serde::{Deserialize, Serialize};

/// 运行句柄状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum HandleStatus {
    Created,
    Starting,
    Running,
    Stopping,
    Stopped,
    Failed { reason: String },
}

impl HandleStatus {
    pub fn failed<S: Into<String>>(reason: S) -> Self {
        HandleStatus::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, HandleStatus::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, HandleStatus::Stopped | HandleStatus::Failed { .. })
    }

    /// Folds member statuses into the status of the aggregate that owns them.
    ///
    /// Any failure wins. Otherwise the aggregate is running, stopped or
    /// created when every member agrees. Members that exited cleanly do not
    /// hold back the rest: a mix of running and stopped members is running.
    /// Anything else in between is starting.
    pub fn combine<I: IntoIterator<Item = HandleStatus>>(statuses: I) -> HandleStatus {
        let statuses: Vec<HandleStatus> = statuses.into_iter().collect();

        if let Some(failed) = statuses
            .iter()
            .find(|s| matches!(s, HandleStatus::Failed { .. }))
        {
            return failed.clone();
        }
        if statuses.is_empty() {
            return HandleStatus::Created;
        }
        for uniform in [
            HandleStatus::Running,
            HandleStatus::Stopped,
            HandleStatus::Created,
            HandleStatus::Stopping,
        ] {
            if statuses.iter().all(|s| *s == uniform) {
                return uniform;
            }
        }
        if statuses
            .iter()
            .all(|s| matches!(s, HandleStatus::Running | HandleStatus::Stopped))
        {
            return HandleStatus::Running;
        }
        if statuses.iter().any(|s| *s == HandleStatus::Stopping) {
            return HandleStatus::Stopping;
        }
        HandleStatus::Starting
    }
}

impl std::fmt::Display for HandleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandleStatus::Created => write!(f, "created"),
            HandleStatus::Starting => write!(f, "starting"),
            HandleStatus::Running => write!(f, "running"),
            HandleStatus::Stopping => write!(f, "stopping"),
            HandleStatus::Stopped => write!(f, "stopped"),
            HandleStatus::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("配置错误: {0}")]
    Configuration(String),
    #[error("执行单元组为空: 至少需要提供一个成员")]
    EmptyGroup,
    #[error("不支持的规格结构: 角色 {role} 的值类型为 {found}")]
    UnsupportedShape { role: String, found: String },
    #[error("无效的执行单元规格: 角色 {role} - {message}")]
    InvalidUnit { role: String, message: String },
    #[error("生命周期错误: {0}")]
    Lifecycle(String),
    #[error("容器运行时错误: {0}")]
    ContainerRuntime(String),
    #[error("网络错误: {0}")]
    Network(String),
    #[error("序列化错误: {0}")]
    Serialization(String),
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
    #[error("内部错误: {0}")]
    Internal(String),
}

pub type PlacementResult<T> = Result<T, PlacementError>;

impl PlacementError {
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }
    pub fn unsupported_shape<R: Into<String>, F: Into<String>>(role: R, found: F) -> Self {
        Self::UnsupportedShape {
            role: role.into(),
            found: found.into(),
        }
    }
    pub fn invalid_unit<R: Into<String>, M: Into<String>>(role: R, message: M) -> Self {
        Self::InvalidUnit {
            role: role.into(),
            message: message.into(),
        }
    }
    pub fn lifecycle<S: Into<String>>(msg: S) -> Self {
        Self::Lifecycle(msg.into())
    }
    pub fn container_runtime<S: Into<String>>(msg: S) -> Self {
        Self::ContainerRuntime(msg.into())
    }
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Errors raised while resolving a specification. These are never
    /// recoverable inside the resolver and must be fixed by the caller.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PlacementError::Configuration(_)
                | PlacementError::EmptyGroup
                | PlacementError::UnsupportedShape { .. }
                | PlacementError::InvalidUnit { .. }
        )
    }
    pub fn is_fatal(&self) -> bool {
        self.is_configuration() || matches!(self, PlacementError::Internal(_))
    }
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PlacementError::Network(_) | PlacementError::ContainerRuntime(_)
        )
    }
    /// Offending role key, when the error is tied to one.
    pub fn role(&self) -> Option<&str> {
        match self {
            PlacementError::UnsupportedShape { role, .. }
            | PlacementError::InvalidUnit { role, .. } => Some(role),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PlacementError {
    fn from(err: serde_json::Error) -> Self {
        PlacementError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for PlacementError {
    fn from(err: anyhow::Error) -> Self {
        PlacementError::Internal(err.to_string())
    }
}

//! 运行单元生命周期接口
//!
//! Every handle the resolvers hand back, whether a single worker or an
//! aggregate of workers, implements [`Runnable`]. Callers drive all of them
//! through the same `start` / `stop` / `status` surface.
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use placement_core::traits::Runnable;
//!
//! async fn run_to_ready(handle: &dyn Runnable) -> PlacementResult<()> {
//!     handle.start().await?;
//!     while !handle.is_ready().await {
//!         tokio::time::sleep(std::time::Duration::from_millis(100)).await;
//!     }
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use placement_errors::PlacementResult;

use crate::models::HandleStatus;

/// 运行单元核心接口
///
/// # 实现要求
///
/// - 构造句柄不得阻塞或执行 I/O，就绪状态由 `status` 在之后观察
/// - 对从未启动的句柄调用 `stop` 必须是空操作
/// - 聚合句柄独占其成员，`stop` 负责释放全部成员
#[async_trait]
pub trait Runnable: Send + Sync {
    /// Display name of the unit or aggregate.
    fn name(&self) -> &str;

    async fn start(&self) -> PlacementResult<()>;

    async fn stop(&self) -> PlacementResult<()>;

    async fn status(&self) -> PlacementResult<HandleStatus>;

    /// Readiness query. Query failures count as not ready.
    async fn is_ready(&self) -> bool {
        matches!(self.status().await, Ok(HandleStatus::Running))
    }
}

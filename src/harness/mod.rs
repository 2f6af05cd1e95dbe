//! harness 模块 - 对象存储生命周期测试
//!
//! - [`create_payload_file`]: 生成超过分片阈值的本地负载文件
//! - [`LifecycleOrchestrator`]: 驱动 存储桶 → 上传 → 下载 → 校验 → 清理 的状态机
//! - [`verify_local_artifact`]: 校验下载产物
//! - [`CleanupScheduler`]: 按获取的相反顺序释放资源

mod cleanup;
mod error;
mod orchestrator;
mod payload;
mod types;
mod verifier;

use std::future::Future;
use std::time::Duration;

pub use cleanup::CleanupScheduler;
pub use error::{HarnessError, VerificationError};
pub use orchestrator::{LifecycleOrchestrator, LifecycleReport};
pub use payload::{create_payload_file, PayloadInfo, PAYLOAD_LINE};
pub use types::{
    BucketStatus, LifecycleMode, LifecycleResult, LifecycleState, RemoteCleanup, Resource,
    ResourceHandle, ResourceKind, UploadTarget,
};
pub use verifier::{file_digest, verify_local_artifact, verify_same_content, ArtifactInfo};

/// 在超时内等待 `fut`，超时返回 `None`；未设置超时则一直等待
pub(crate) async fn within<F: Future>(timeout: Option<Duration>, fut: F) -> Option<F::Output> {
    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, fut).await.ok(),
        None => Some(fut.await),
    }
}

use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;

use crate::harness::{within, LifecycleResult, Resource, ResourceHandle};
use crate::oss::ObjectStore;

/// 资源清理调度器
///
/// 按获取顺序登记资源，按相反顺序释放。每个句柄只尝试释放一次，
/// 释放失败记为警告，不影响剩余句柄。调度器被丢弃时仍未释放的本地文件和空目录会同步删除。
pub struct CleanupScheduler {
    store: Arc<dyn ObjectStore>,
    handles: Vec<ResourceHandle>,
    timeout: Option<Duration>,
}

impl CleanupScheduler {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            handles: Vec::new(),
            timeout: None,
        }
    }

    /// 每次远端删除的超时
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn schedule(&mut self, handle: ResourceHandle) {
        tracing::debug!(resource = %handle, acquired = handle.acquired, "scheduled for cleanup");
        self.handles.push(handle);
    }

    /// 尚未释放的句柄，按登记顺序
    pub fn pending(&self) -> &[ResourceHandle] {
        &self.handles
    }

    /// 只释放远端资源（对象先于存储桶），本地句柄留给 [`run_all`](Self::run_all)
    pub async fn release_remote(&mut self) -> Vec<LifecycleResult> {
        let (remote, local): (Vec<_>, Vec<_>) = std::mem::take(&mut self.handles)
            .into_iter()
            .partition(|handle| handle.resource.is_remote());
        self.handles = local;

        self.release_in_reverse(remote).await
    }

    /// 释放所有剩余句柄，后登记的先释放
    pub async fn run_all(&mut self) -> Vec<LifecycleResult> {
        let handles = std::mem::take(&mut self.handles);
        self.release_in_reverse(handles).await
    }

    async fn release_in_reverse(&self, handles: Vec<ResourceHandle>) -> Vec<LifecycleResult> {
        let mut results = Vec::with_capacity(handles.len());
        for handle in handles.into_iter().rev() {
            results.push(self.release(&handle).await);
        }
        results
    }

    async fn release(&self, handle: &ResourceHandle) -> LifecycleResult {
        let step = step_name(handle);

        if !handle.acquired {
            tracing::info!(resource = %handle, "retained, not released");
            return LifecycleResult::ok(step);
        }

        let outcome = match &handle.resource {
            Resource::LocalFile(path) => match tokio::fs::remove_file(path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::debug!(path = %path.display(), "local file already absent");
                    Ok(())
                }
                Err(e) => Err(e.to_string()),
            },
            Resource::LocalDir(path) => match tokio::fs::remove_dir(path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(e.to_string()),
            },
            Resource::RemoteObject { bucket, key } => {
                match within(self.timeout, self.store.delete_object(bucket, key)).await {
                    Some(result) => result.map_err(|e| e.to_string()),
                    None => Err(format!("timed out after {:?}", self.timeout.unwrap_or_default())),
                }
            }
            Resource::RemoteBucket(bucket) => {
                match within(self.timeout, self.store.delete_bucket(bucket)).await {
                    Some(result) => result.map_err(|e| e.to_string()),
                    None => Err(format!("timed out after {:?}", self.timeout.unwrap_or_default())),
                }
            }
        };

        match outcome {
            Ok(()) => {
                tracing::info!(resource = %handle, "released");
                LifecycleResult::ok(step)
            }
            Err(detail) => {
                tracing::warn!(resource = %handle, error = %detail, "could not release");
                LifecycleResult::warning(step, detail)
            }
        }
    }
}

impl Drop for CleanupScheduler {
    fn drop(&mut self) {
        for handle in self.handles.drain(..).rev() {
            if !handle.acquired {
                continue;
            }
            match &handle.resource {
                Resource::LocalFile(path) => {
                    if let Err(e) = std::fs::remove_file(path) {
                        if e.kind() != ErrorKind::NotFound {
                            tracing::warn!(path = %path.display(), error = %e, "could not remove local file on drop");
                        }
                    }
                }
                Resource::LocalDir(path) => {
                    if let Err(e) = std::fs::remove_dir(path) {
                        if e.kind() != ErrorKind::NotFound {
                            tracing::warn!(path = %path.display(), error = %e, "could not remove local directory on drop");
                        }
                    }
                }
                _ => tracing::warn!(resource = %handle, "remote resource was never released"),
            }
        }
    }
}

/// 释放步骤名，例如 `remove_object b/k`；保留的句柄为 `keep_bucket b`
pub(crate) fn step_name(handle: &ResourceHandle) -> String {
    let verb = if handle.acquired { "remove" } else { "keep" };
    let noun = match handle.resource {
        Resource::LocalFile(_) => "local_file",
        Resource::LocalDir(_) => "local_dir",
        Resource::RemoteObject { .. } => "object",
        Resource::RemoteBucket(_) => "bucket",
    };
    format!("{}_{} {}", verb, noun, handle.identifier())
}

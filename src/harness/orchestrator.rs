//! 生命周期编排
//!
//! 顺序执行：生成负载 → 确保存储桶 → 上传 → 下载 → 校验 → 远端清理 → 本地清理。
//! 前五步任何一步失败都是致命错误，状态进入 `Failed` 并跳过剩余步骤；
//! 清理步骤无论成败都会执行，其失败只记为警告。

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::cfg::HarnessConfig;
use crate::harness::cleanup::step_name;
use crate::harness::{
    create_payload_file, verify_local_artifact, verify_same_content, within, ArtifactInfo,
    BucketStatus, CleanupScheduler, HarnessError, LifecycleMode, LifecycleResult, LifecycleState,
    PayloadInfo, RemoteCleanup, Resource, ResourceHandle, UploadTarget,
};
use crate::oss::{
    CreateBucketOptions, GetFileOptions, ObjectInfo, ObjectStore, PutFileOptions,
};

/// 一次运行的汇总
#[derive(Debug)]
pub struct LifecycleReport {
    pub state: LifecycleState,
    /// 按执行顺序排列的步骤结果
    pub results: Vec<LifecycleResult>,
    /// 上传得到的对象信息
    pub object: Option<ObjectInfo>,
    /// Full 模式下的远端清理结果
    pub remote: Option<RemoteCleanup>,
    /// 终止运行的致命错误
    pub error: Option<HarnessError>,
}

impl LifecycleReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.state == LifecycleState::Done
    }

    /// 可恢复的失败，不影响运行结果
    pub fn warnings(&self) -> impl Iterator<Item = &LifecycleResult> {
        self.results.iter().filter(|r| r.is_warning())
    }

    pub fn into_result(mut self) -> Result<LifecycleReport, HarnessError> {
        match self.error.take() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}

/// 生命周期编排器
///
/// 持有存储客户端和清理调度器，每个成功产生的资源都会登记到调度器，
/// 保证在任何退出路径上按相反顺序释放。
pub struct LifecycleOrchestrator {
    store: Arc<dyn ObjectStore>,
    config: HarnessConfig,
    state: LifecycleState,
    results: Vec<LifecycleResult>,
    cleanup: CleanupScheduler,
    object: Option<ObjectInfo>,
}

impl LifecycleOrchestrator {
    pub fn new(store: Arc<dyn ObjectStore>, config: HarnessConfig) -> Self {
        let cleanup = CleanupScheduler::new(store.clone()).with_timeout(config.operation_timeout);
        Self {
            store,
            config,
            state: LifecycleState::Init,
            results: Vec::new(),
            cleanup,
            object: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn results(&self) -> &[LifecycleResult] {
        &self.results
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// 已登记但尚未释放的资源
    pub fn pending_cleanup(&self) -> &[ResourceHandle] {
        self.cleanup.pending()
    }

    /// 执行完整流程，清理总会执行
    pub async fn run(mut self) -> LifecycleReport {
        tracing::info!(
            bucket = %self.config.bucket,
            key = %self.config.object,
            mode = ?self.config.mode,
            "lifecycle run started"
        );

        let outcome = self.run_steps().await;

        let remote = match self.config.mode {
            LifecycleMode::Full => Some(self.cleanup_remote().await),
            LifecycleMode::UploadOnly => None,
        };
        self.cleanup_local().await;

        let error = match outcome {
            Ok(()) => {
                self.transition(LifecycleState::Done);
                None
            }
            Err(err) => Some(err),
        };

        let warnings = self.results.iter().filter(|r| r.is_warning()).count();
        match &error {
            None => tracing::info!(warnings, "lifecycle run finished"),
            Some(err) => tracing::error!(step = err.step(), warnings, error = %err, "lifecycle run failed"),
        }

        LifecycleReport {
            state: self.state,
            results: std::mem::take(&mut self.results),
            object: self.object.take(),
            remote,
            error,
        }
    }

    async fn run_steps(&mut self) -> Result<(), HarnessError> {
        let target = self.config.upload_target();

        self.create_payload(&target.local_path).await?;
        self.ensure_bucket(&target.bucket_name).await?;
        self.upload(&target).await?;

        if self.config.mode == LifecycleMode::Full && self.config.verify_download {
            let dest = self.config.download_path.clone();
            self.download(&target, &dest).await?;
            self.verify(&target, &dest).await?;
        }

        Ok(())
    }

    /// 生成负载文件并登记本地清理
    pub async fn create_payload(&mut self, path: &Path) -> Result<PayloadInfo, HarnessError> {
        let missing = missing_dirs(path);
        let result = create_payload_file(path, self.config.min_payload_size)
            .await
            .map_err(|source| HarnessError::Payload {
                path: path.to_path_buf(),
                source,
            });

        self.schedule_created_dirs(missing);
        // 写到一半失败的文件也要删除
        if result.is_ok() || path.exists() {
            self.schedule_once(ResourceHandle::local_file(path));
        }

        self.record("create_payload", result)
    }

    /// 确保存储桶存在
    ///
    /// 不存在时创建；创建返回“已属于自己”视为已存在，其他失败都是致命错误。
    pub async fn ensure_bucket(&mut self, name: &str) -> Result<BucketStatus, HarnessError> {
        let result = self.check_or_create_bucket(name).await;

        if let Ok(status) = &result {
            match status {
                BucketStatus::Created => tracing::info!(bucket = name, "bucket created"),
                BucketStatus::AlreadyExisted => tracing::info!(bucket = name, "bucket already exists"),
            }

            if self.config.mode == LifecycleMode::Full {
                let resource = Resource::RemoteBucket(name.to_string());
                let handle = if *status == BucketStatus::AlreadyExisted
                    && !self.config.remove_existing_bucket
                {
                    ResourceHandle::retained(resource)
                } else {
                    ResourceHandle::acquired(resource)
                };
                self.schedule_once(handle);
            }
            self.transition(LifecycleState::BucketEnsured);
        }

        self.record("ensure_bucket", result)
    }

    async fn check_or_create_bucket(&self, name: &str) -> Result<BucketStatus, HarnessError> {
        let timeout = self.config.operation_timeout;

        let exists = deadline(timeout, "ensure_bucket", self.store.bucket_exists(name))
            .await?
            .map_err(|source| HarnessError::BucketCheck {
                bucket: name.to_string(),
                source,
            })?;
        if exists {
            return Ok(BucketStatus::AlreadyExisted);
        }

        let options = CreateBucketOptions {
            region: self.config.region.clone(),
        };
        match deadline(timeout, "ensure_bucket", self.store.create_bucket(name, options)).await? {
            Ok(()) => Ok(BucketStatus::Created),
            Err(e) if e.is_already_owned() => Ok(BucketStatus::AlreadyExisted),
            Err(source) => Err(HarnessError::BucketCreate {
                bucket: name.to_string(),
                source,
            }),
        }
    }

    /// 上传本地文件，分片由存储实现决定
    pub async fn upload(&mut self, target: &UploadTarget) -> Result<ObjectInfo, HarnessError> {
        let result = self.put_target(target).await;

        // 超时或响应丢失时服务端可能已经写入对象，失败也要登记；删除不存在的对象不报错
        if self.config.mode == LifecycleMode::Full {
            self.schedule_once(ResourceHandle::acquired(Resource::RemoteObject {
                bucket: target.bucket_name.clone(),
                key: target.object_name.clone(),
            }));
        }

        if let Ok(info) = &result {
            tracing::info!(
                bucket = %target.bucket_name,
                key = %target.object_name,
                size = info.size,
                etag = %info.etag,
                "object uploaded"
            );
            self.object = Some(info.clone());
            self.transition(LifecycleState::Uploaded);
        }

        self.record("upload", result)
    }

    async fn put_target(&self, target: &UploadTarget) -> Result<ObjectInfo, HarnessError> {
        let timeout = self.config.operation_timeout;
        let upload_error = |source| HarnessError::Upload {
            bucket: target.bucket_name.clone(),
            key: target.object_name.clone(),
            source,
        };

        let options = PutFileOptions {
            content_type: Some(target.content_type.clone()),
            multipart_threshold: self.config.multipart_threshold,
            part_size: self.config.part_size,
            ..Default::default()
        };
        let mut info = deadline(
            timeout,
            "upload",
            self.store.put_file(
                &target.bucket_name,
                &target.object_name,
                &target.local_path,
                options,
            ),
        )
        .await?
        .map_err(upload_error)?;

        // 部分 S3 兼容服务不在上传响应里返回 ETag
        if info.etag.is_empty() {
            let meta = deadline(
                timeout,
                "upload",
                self.store
                    .head_object(&target.bucket_name, &target.object_name),
            )
            .await?
            .map_err(upload_error)?;
            if let Some(etag) = meta.and_then(|m| m.etag) {
                info.etag = etag;
            }
        }

        Ok(info)
    }

    /// 下载对象到 `dest`，已存在的文件会被覆盖
    pub async fn download(&mut self, target: &UploadTarget, dest: &Path) -> Result<u64, HarnessError> {
        let options = GetFileOptions { overwrite: true };
        let missing = missing_dirs(dest);
        let result = deadline(
            self.config.operation_timeout,
            "download",
            self.store
                .get_file(&target.bucket_name, &target.object_name, dest, options),
        )
        .await
        .and_then(|r| {
            r.map_err(|source| HarnessError::Download {
                bucket: target.bucket_name.clone(),
                key: target.object_name.clone(),
                source,
            })
        });

        self.schedule_created_dirs(missing);
        if result.is_ok() || dest.exists() {
            self.schedule_once(ResourceHandle::local_file(dest));
        }

        if let Ok(size) = &result {
            tracing::info!(
                key = %target.object_name,
                path = %dest.display(),
                size,
                "object downloaded"
            );
            self.transition(LifecycleState::Downloaded);
        }

        self.record("download", result)
    }

    /// 校验下载产物，开启 `verify_content` 时同时比较摘要
    pub async fn verify(&mut self, target: &UploadTarget, dest: &Path) -> Result<ArtifactInfo, HarnessError> {
        let result = self.check_artifact(target, dest).await;

        if let Ok(artifact) = &result {
            tracing::info!(path = %artifact.path.display(), size = artifact.size, "download verified");
            self.transition(LifecycleState::Verified);
        }

        self.record("verify", result)
    }

    async fn check_artifact(&self, target: &UploadTarget, dest: &Path) -> Result<ArtifactInfo, HarnessError> {
        let artifact = verify_local_artifact(dest).await?;
        if self.config.verify_content {
            let digest = verify_same_content(&target.local_path, dest).await?;
            tracing::debug!(sha256 = %digest, "content matches");
        }
        Ok(artifact)
    }

    /// 删除对象和存储桶，两个删除互不影响
    pub async fn cleanup_remote(&mut self) -> RemoteCleanup {
        let results = self.cleanup.release_remote().await;

        let removed = |prefix: &str| {
            results
                .iter()
                .any(|r| r.succeeded && r.step_name.starts_with(prefix))
        };
        let outcome = RemoteCleanup {
            object_removed: removed("remove_object "),
            bucket_removed: removed("remove_bucket "),
        };

        self.results.extend(results);
        self.transition(LifecycleState::RemoteCleaned);
        outcome
    }

    /// 删除剩余的本地文件
    pub async fn cleanup_local(&mut self) {
        let results = self.cleanup.run_all().await;
        self.results.extend(results);
        self.transition(LifecycleState::LocalCleaned);
    }

    fn schedule_once(&mut self, handle: ResourceHandle) {
        let step = step_name(&handle);
        let duplicate = self
            .cleanup
            .pending()
            .iter()
            .any(|pending| pending.resource == handle.resource);
        if duplicate {
            tracing::debug!(step = %step, "already scheduled");
            return;
        }
        self.cleanup.schedule(handle);
    }

    /// 登记本次运行新建的父目录，外层在前，释放时先删内层
    fn schedule_created_dirs(&mut self, dirs: Vec<PathBuf>) {
        for dir in dirs.into_iter().filter(|dir| dir.is_dir()) {
            self.schedule_once(ResourceHandle::local_dir(dir));
        }
    }

    fn transition(&mut self, next: LifecycleState) {
        if self.state.is_terminal() {
            return;
        }
        tracing::debug!(from = %self.state, to = %next, "state transition");
        self.state = next;
    }

    fn record<T>(&mut self, step: &str, result: Result<T, HarnessError>) -> Result<T, HarnessError> {
        match &result {
            Ok(_) => self.results.push(LifecycleResult::ok(step)),
            Err(err) => {
                tracing::error!(step, error = %err, "fatal step failure");
                self.results.push(LifecycleResult::fatal(step, err.to_string()));
                self.transition(LifecycleState::Failed);
            }
        }
        result
    }
}

/// `path` 尚不存在的祖先目录，由外到内
fn missing_dirs(path: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = path
        .ancestors()
        .skip(1)
        .take_while(|dir| !dir.as_os_str().is_empty() && !dir.exists())
        .map(Path::to_path_buf)
        .collect();
    dirs.reverse();
    dirs
}

async fn deadline<F: Future>(
    timeout: Option<Duration>,
    step: &'static str,
    fut: F,
) -> Result<F::Output, HarnessError> {
    within(timeout, fut).await.ok_or_else(|| HarnessError::Timeout {
        step,
        timeout: timeout.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::StoreConfig;
    use crate::oss::{MemoryObjectStore, MemoryObjectStoreConfig, ObjectStoreError, StoreOperation};
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> HarnessConfig {
        HarnessConfig {
            store: StoreConfig::MemoryObjectStore(MemoryObjectStoreConfig::default()),
            bucket: "test-bucket".to_string(),
            object: "file.txt".to_string(),
            upload_path: dir.path().join("upload-temp.txt"),
            download_path: dir.path().join("downloaded-file.txt"),
            min_payload_size: 64 * 1024,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_run_full_lifecycle() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryObjectStore::new());
        let config = test_config(&temp_dir);

        let report = LifecycleOrchestrator::new(store.clone(), config.clone())
            .run()
            .await;

        assert!(report.is_success(), "{:?}", report.error);
        assert_eq!(report.state, LifecycleState::Done);
        assert_eq!(report.warnings().count(), 0);
        assert_eq!(
            report.remote,
            Some(RemoteCleanup {
                object_removed: true,
                bucket_removed: true,
            })
        );
        let object = report.object.unwrap();
        assert!(object.size > 64 * 1024);
        assert!(!object.etag.is_empty());

        let steps: Vec<&str> = report.results.iter().map(|r| r.step_name.as_str()).collect();
        assert_eq!(&steps[..5], &["create_payload", "ensure_bucket", "upload", "download", "verify"]);

        assert!(store.buckets().await.is_empty());
        assert!(!config.upload_path.exists());
        assert!(!config.download_path.exists());
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let target = config.upload_target();
        let dest = config.download_path.clone();
        let mut orchestrator = LifecycleOrchestrator::new(Arc::new(MemoryObjectStore::new()), config);

        assert_eq!(orchestrator.state(), LifecycleState::Init);
        orchestrator.create_payload(&target.local_path).await.unwrap();
        orchestrator.ensure_bucket(&target.bucket_name).await.unwrap();
        assert_eq!(orchestrator.state(), LifecycleState::BucketEnsured);
        orchestrator.upload(&target).await.unwrap();
        assert_eq!(orchestrator.state(), LifecycleState::Uploaded);
        orchestrator.download(&target, &dest).await.unwrap();
        assert_eq!(orchestrator.state(), LifecycleState::Downloaded);
        orchestrator.verify(&target, &dest).await.unwrap();
        assert_eq!(orchestrator.state(), LifecycleState::Verified);
        orchestrator.cleanup_remote().await;
        assert_eq!(orchestrator.state(), LifecycleState::RemoteCleaned);
        orchestrator.cleanup_local().await;
        assert_eq!(orchestrator.state(), LifecycleState::LocalCleaned);
    }

    #[tokio::test]
    async fn test_ensure_bucket_twice_schedules_once() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryObjectStore::new());
        let mut orchestrator = LifecycleOrchestrator::new(store.clone(), test_config(&temp_dir));

        assert_eq!(
            orchestrator.ensure_bucket("test-bucket").await.unwrap(),
            BucketStatus::Created
        );
        assert_eq!(
            orchestrator.ensure_bucket("test-bucket").await.unwrap(),
            BucketStatus::AlreadyExisted
        );
        assert_eq!(store.buckets().await, vec!["test-bucket".to_string()]);
        assert_eq!(orchestrator.pending_cleanup().len(), 1);

        let remote = orchestrator.cleanup_remote().await;
        assert!(remote.bucket_removed);
        assert!(store.buckets().await.is_empty());
    }

    #[tokio::test]
    async fn test_existing_bucket_can_be_retained() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryObjectStore::from(MemoryObjectStoreConfig {
            buckets: vec!["test-bucket".to_string()],
            ..Default::default()
        }));
        let config = HarnessConfig {
            remove_existing_bucket: false,
            ..test_config(&temp_dir)
        };

        let report = LifecycleOrchestrator::new(store.clone(), config).run().await;

        assert!(report.is_success());
        let remote = report.remote.unwrap();
        assert!(remote.object_removed);
        assert!(!remote.bucket_removed);
        assert!(report.results.iter().any(|r| r.step_name == "keep_bucket test-bucket"));
        assert_eq!(store.buckets().await, vec!["test-bucket".to_string()]);
        assert!(store.head_object("test-bucket", "file.txt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_bucket_check_failure_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryObjectStore::new());
        store.fail_on(StoreOperation::BucketExists);
        let config = test_config(&temp_dir);

        let report = LifecycleOrchestrator::new(store, config.clone()).run().await;

        assert_eq!(report.state, LifecycleState::Failed);
        assert!(matches!(report.error, Some(HarnessError::BucketCheck { .. })));
        let fatal: Vec<_> = report.results.iter().filter(|r| r.fatal).collect();
        assert_eq!(fatal.len(), 1);
        assert_eq!(fatal[0].step_name, "ensure_bucket");
        // 负载文件仍被清理
        assert!(!config.upload_path.exists());
    }

    #[tokio::test]
    async fn test_create_bucket_owned_by_other_is_fatal() {
        struct ForeignBucketStore(MemoryObjectStore);

        #[async_trait::async_trait]
        impl ObjectStore for ForeignBucketStore {
            async fn bucket_exists(&self, _bucket: &str) -> Result<bool, ObjectStoreError> {
                Ok(false)
            }
            async fn create_bucket(
                &self,
                bucket: &str,
                _options: CreateBucketOptions,
            ) -> Result<(), ObjectStoreError> {
                Err(ObjectStoreError::BucketAlreadyExists(bucket.to_string()))
            }
            async fn delete_bucket(&self, bucket: &str) -> Result<(), ObjectStoreError> {
                self.0.delete_bucket(bucket).await
            }
            async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError> {
                self.0.delete_object(bucket, key).await
            }
            async fn head_object(
                &self,
                bucket: &str,
                key: &str,
            ) -> Result<Option<crate::oss::ObjectMeta>, ObjectStoreError> {
                self.0.head_object(bucket, key).await
            }
            async fn put_stream(
                &self,
                bucket: &str,
                key: &str,
                reader: Box<dyn tokio::io::AsyncRead + Send + Unpin>,
                size: u64,
                options: crate::oss::PutStreamOptions,
            ) -> Result<ObjectInfo, ObjectStoreError> {
                self.0.put_stream(bucket, key, reader, size, options).await
            }
            async fn get_stream(
                &self,
                bucket: &str,
                key: &str,
                writer: Box<dyn tokio::io::AsyncWrite + Send + Unpin>,
            ) -> Result<u64, ObjectStoreError> {
                self.0.get_stream(bucket, key, writer).await
            }
        }

        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(ForeignBucketStore(MemoryObjectStore::new()));
        let mut orchestrator = LifecycleOrchestrator::new(store, test_config(&temp_dir));

        let err = orchestrator.ensure_bucket("test-bucket").await.unwrap_err();
        assert!(matches!(err, HarnessError::BucketCreate { .. }));
        assert_eq!(orchestrator.state(), LifecycleState::Failed);
        assert!(orchestrator.pending_cleanup().is_empty());
    }

    #[tokio::test]
    async fn test_upload_failure_skips_download() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryObjectStore::new());
        store.fail_on(StoreOperation::PutObject);

        let report = LifecycleOrchestrator::new(store.clone(), test_config(&temp_dir))
            .run()
            .await;

        assert!(matches!(report.error, Some(HarnessError::Upload { .. })));
        assert!(report.object.is_none());
        assert!(!report.results.iter().any(|r| r.step_name == "download"));
        // 存储桶在失败前已创建，仍会删除
        assert_eq!(report.remote.map(|r| r.bucket_removed), Some(true));
        assert!(store.buckets().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_state_is_sticky() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryObjectStore::new());
        store.fail_on(StoreOperation::GetObject);

        let report = LifecycleOrchestrator::new(store, test_config(&temp_dir))
            .run()
            .await;

        assert_eq!(report.state, LifecycleState::Failed);
        assert!(!report.is_success());
        assert!(report.into_result().is_err());
    }

    #[tokio::test]
    async fn test_operation_timeout() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryObjectStore::new().with_latency(Duration::from_millis(200)));
        let config = HarnessConfig {
            operation_timeout: Some(Duration::from_millis(20)),
            ..test_config(&temp_dir)
        };

        let report = LifecycleOrchestrator::new(store, config).run().await;

        match report.error {
            Some(HarnessError::Timeout { step, timeout }) => {
                assert_eq!(step, "ensure_bucket");
                assert_eq!(timeout, Duration::from_millis(20));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upload_timeout_after_store_still_removes_object() {
        // 服务端已经写入对象，但响应晚于超时
        struct SlowAckStore(MemoryObjectStore);

        #[async_trait::async_trait]
        impl ObjectStore for SlowAckStore {
            async fn bucket_exists(&self, bucket: &str) -> Result<bool, ObjectStoreError> {
                self.0.bucket_exists(bucket).await
            }
            async fn create_bucket(
                &self,
                bucket: &str,
                options: CreateBucketOptions,
            ) -> Result<(), ObjectStoreError> {
                self.0.create_bucket(bucket, options).await
            }
            async fn delete_bucket(&self, bucket: &str) -> Result<(), ObjectStoreError> {
                self.0.delete_bucket(bucket).await
            }
            async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError> {
                self.0.delete_object(bucket, key).await
            }
            async fn head_object(
                &self,
                bucket: &str,
                key: &str,
            ) -> Result<Option<crate::oss::ObjectMeta>, ObjectStoreError> {
                self.0.head_object(bucket, key).await
            }
            async fn put_stream(
                &self,
                bucket: &str,
                key: &str,
                reader: Box<dyn tokio::io::AsyncRead + Send + Unpin>,
                size: u64,
                options: crate::oss::PutStreamOptions,
            ) -> Result<ObjectInfo, ObjectStoreError> {
                let info = self.0.put_stream(bucket, key, reader, size, options).await?;
                tokio::time::sleep(Duration::from_millis(300)).await;
                Ok(info)
            }
            async fn get_stream(
                &self,
                bucket: &str,
                key: &str,
                writer: Box<dyn tokio::io::AsyncWrite + Send + Unpin>,
            ) -> Result<u64, ObjectStoreError> {
                self.0.get_stream(bucket, key, writer).await
            }
        }

        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(SlowAckStore(MemoryObjectStore::new()));
        let config = HarnessConfig {
            operation_timeout: Some(Duration::from_millis(50)),
            ..test_config(&temp_dir)
        };

        let report = LifecycleOrchestrator::new(store.clone(), config.clone())
            .run()
            .await;

        assert!(matches!(
            report.error,
            Some(HarnessError::Timeout { step: "upload", .. })
        ));
        assert_eq!(report.warnings().count(), 0, "{:?}", report.results);
        assert_eq!(
            report.remote,
            Some(RemoteCleanup {
                object_removed: true,
                bucket_removed: true,
            })
        );
        assert!(store.0.buckets().await.is_empty());
        assert!(!config.upload_path.exists());
    }

    #[tokio::test]
    async fn test_nested_paths_remove_created_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(MemoryObjectStore::new());
        let config = HarnessConfig {
            upload_path: temp_dir.path().join("a").join("b").join("upload-temp.txt"),
            download_path: temp_dir.path().join("c").join("downloaded-file.txt"),
            ..test_config(&temp_dir)
        };

        let report = LifecycleOrchestrator::new(store, config).run().await;

        assert!(report.is_success(), "{:?}", report.error);
        assert_eq!(report.warnings().count(), 0, "{:?}", report.results);
        let steps: Vec<&str> = report.results.iter().map(|r| r.step_name.as_str()).collect();
        let dir_step = |path: PathBuf| format!("remove_local_dir {}", path.display());
        assert!(steps.contains(&dir_step(temp_dir.path().join("a").join("b")).as_str()), "{:?}", steps);
        assert!(steps.contains(&dir_step(temp_dir.path().join("c")).as_str()), "{:?}", steps);
        assert!(!temp_dir.path().join("a").exists());
        assert!(!temp_dir.path().join("c").exists());
        assert!(temp_dir.path().exists());
    }

    #[test]
    fn test_missing_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        assert!(missing_dirs(&root.join("file.txt")).is_empty());
        assert!(missing_dirs(Path::new("file.txt")).is_empty());
        assert_eq!(
            missing_dirs(&root.join("x").join("y").join("file.txt")),
            vec![root.join("x"), root.join("x").join("y")]
        );
    }
}

//! 内存 ObjectStore
//!
//! 不依赖网络的 [`ObjectStore`] 实现，行为尽量贴近 S3：
//! 删除非空存储桶失败、删除不存在的对象成功、分片上传的 ETag 形如 `<md5>-<N>`。
//! 通过 [`MemoryObjectStore::fail_on`] 可以让指定操作失败，用于验证错误分级和清理顺序。

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::RwLock;

use crate::cfg::HumanDur;
use crate::oss::{
    CreateBucketOptions, ObjectInfo, ObjectMeta, ObjectStore, ObjectStoreError,
    PutStreamOptions, StoreOperation,
};

const PROVIDER: &str = "memory";

/// MemoryObjectStore 配置
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MemoryObjectStoreConfig {
    /// 预先存在的存储桶
    pub buckets: Vec<String>,

    /// 始终失败的操作
    pub fail_on: Vec<StoreOperation>,

    /// 每次操作前的模拟延迟
    #[serde_as(as = "Option<HumanDur>")]
    pub latency: Option<Duration>,
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    etag: String,
    content_type: Option<String>,
    last_modified: DateTime<Utc>,
}

type Bucket = BTreeMap<String, StoredObject>;

/// 内存 ObjectStore 实现
#[derive(Default)]
pub struct MemoryObjectStore {
    buckets: RwLock<HashMap<String, Bucket>>,
    failures: Mutex<HashSet<StoreOperation>>,
    latency: Option<Duration>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// 让之后所有 `operation` 调用失败
    pub fn fail_on(&self, operation: StoreOperation) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(operation);
    }

    pub fn clear_failures(&self) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// 当前所有存储桶名称（已排序）
    pub async fn buckets(&self) -> Vec<String> {
        let mut names: Vec<String> = self.buckets.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// 读取对象内容
    pub async fn object_bytes(&self, bucket: &str, key: &str) -> Option<Bytes> {
        self.buckets
            .read()
            .await
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|object| object.data.clone())
    }

    async fn enter(&self, operation: StoreOperation) -> Result<(), ObjectStoreError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let injected = self
            .failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&operation);
        if injected {
            return Err(ObjectStoreError::provider(
                PROVIDER,
                format!("injected failure: {}", operation),
            ));
        }

        Ok(())
    }
}

impl From<MemoryObjectStoreConfig> for MemoryObjectStore {
    fn from(config: MemoryObjectStoreConfig) -> Self {
        let buckets = config
            .buckets
            .into_iter()
            .map(|name| (name, Bucket::new()))
            .collect();

        Self {
            buckets: RwLock::new(buckets),
            failures: Mutex::new(config.fail_on.into_iter().collect()),
            latency: config.latency,
        }
    }
}

/// 计算 S3 风格的 ETag：单次上传为内容的 MD5，分片上传为各分片 MD5 拼接后的 MD5 加分片数
pub fn compute_etag(data: &[u8], multipart_threshold: u64, part_size: usize) -> String {
    if (data.len() as u64) < multipart_threshold || part_size == 0 {
        return hex::encode(Md5::digest(data));
    }

    let mut combined = Md5::new();
    let mut parts = 0;
    for chunk in data.chunks(part_size) {
        combined.update(Md5::digest(chunk));
        parts += 1;
    }

    format!("{}-{}", hex::encode(combined.finalize()), parts)
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ObjectStoreError> {
        self.enter(StoreOperation::BucketExists).await?;
        Ok(self.buckets.read().await.contains_key(bucket))
    }

    async fn create_bucket(
        &self,
        bucket: &str,
        _options: CreateBucketOptions,
    ) -> Result<(), ObjectStoreError> {
        self.enter(StoreOperation::CreateBucket).await?;

        if bucket.is_empty() {
            return Err(ObjectStoreError::InvalidInput("存储桶名称为空".to_string()));
        }

        let mut buckets = self.buckets.write().await;
        if buckets.contains_key(bucket) {
            return Err(ObjectStoreError::BucketAlreadyOwnedByYou(bucket.to_string()));
        }
        buckets.insert(bucket.to_string(), Bucket::new());

        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), ObjectStoreError> {
        self.enter(StoreOperation::DeleteBucket).await?;

        let mut buckets = self.buckets.write().await;
        match buckets.get(bucket) {
            None => Err(ObjectStoreError::BucketNotFound(bucket.to_string())),
            Some(objects) if !objects.is_empty() => {
                Err(ObjectStoreError::BucketNotEmpty(bucket.to_string()))
            }
            Some(_) => {
                buckets.remove(bucket);
                Ok(())
            }
        }
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError> {
        self.enter(StoreOperation::DeleteObject).await?;

        let mut buckets = self.buckets.write().await;
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| ObjectStoreError::BucketNotFound(bucket.to_string()))?;
        objects.remove(key);

        Ok(())
    }

    async fn head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<ObjectMeta>, ObjectStoreError> {
        self.enter(StoreOperation::HeadObject).await?;

        let buckets = self.buckets.read().await;
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| ObjectStoreError::BucketNotFound(bucket.to_string()))?;

        Ok(objects.get(key).map(|object| ObjectMeta {
            key: key.to_string(),
            size: object.data.len() as u64,
            last_modified: object.last_modified,
            etag: Some(object.etag.clone()),
            content_type: object.content_type.clone(),
        }))
    }

    async fn put_stream(
        &self,
        bucket: &str,
        key: &str,
        mut reader: Box<dyn AsyncRead + Send + Unpin>,
        size: u64,
        options: PutStreamOptions,
    ) -> Result<ObjectInfo, ObjectStoreError> {
        self.enter(StoreOperation::PutObject).await?;

        if !self.buckets.read().await.contains_key(bucket) {
            return Err(ObjectStoreError::BucketNotFound(bucket.to_string()));
        }

        let mut buffer = Vec::with_capacity(size as usize);
        reader.read_to_end(&mut buffer).await?;

        let etag = compute_etag(&buffer, options.multipart_threshold, options.part_size);
        let object = StoredObject {
            data: Bytes::from(buffer),
            etag: etag.clone(),
            content_type: options.content_type,
            last_modified: Utc::now(),
        };
        let size = object.data.len() as u64;

        let mut buckets = self.buckets.write().await;
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| ObjectStoreError::BucketNotFound(bucket.to_string()))?;
        objects.insert(key.to_string(), object);

        Ok(ObjectInfo { size, etag })
    }

    async fn get_stream(
        &self,
        bucket: &str,
        key: &str,
        mut writer: Box<dyn AsyncWrite + Send + Unpin>,
    ) -> Result<u64, ObjectStoreError> {
        self.enter(StoreOperation::GetObject).await?;

        let data = {
            let buckets = self.buckets.read().await;
            let objects = buckets
                .get(bucket)
                .ok_or_else(|| ObjectStoreError::BucketNotFound(bucket.to_string()))?;
            objects
                .get(key)
                .map(|object| object.data.clone())
                .ok_or_else(|| ObjectStoreError::NotFound {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                })?
        };

        writer.write_all(&data).await?;
        writer.flush().await?;

        Ok(data.len() as u64)
    }
}

use async_trait::async_trait;
use std::path::Path;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::oss::{
    CreateBucketOptions, GetFileOptions, ObjectInfo, ObjectMeta, ObjectStoreError,
    PutFileOptions, PutStreamOptions,
};

/// 对象存储统一接口
///
/// 与具体厂商无关的能力集合，生命周期编排只依赖这个 trait，
/// 测试中使用 [`MemoryObjectStore`](crate::oss::MemoryObjectStore) 替代真实服务。
#[async_trait]
pub trait ObjectStore: Send + Sync {
    // === 存储桶 ===

    /// 存储桶是否存在
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ObjectStoreError>;

    /// 创建存储桶
    ///
    /// 存储桶已存在时返回 `BucketAlreadyOwnedByYou` 或 `BucketAlreadyExists`
    async fn create_bucket(
        &self,
        bucket: &str,
        options: CreateBucketOptions,
    ) -> Result<(), ObjectStoreError>;

    /// 删除存储桶
    async fn delete_bucket(&self, bucket: &str) -> Result<(), ObjectStoreError>;

    // === 对象 ===

    /// 删除对象
    async fn delete_object(&self, bucket: &str, key: &str) -> Result<(), ObjectStoreError>;

    /// 获取对象元数据
    ///
    /// 返回 `Ok(Some(ObjectMeta))` 如果对象存在
    /// 返回 `Ok(None)` 如果对象不存在
    async fn head_object(
        &self,
        bucket: &str,
        key: &str,
    ) -> Result<Option<ObjectMeta>, ObjectStoreError>;

    // === 流式接口 ===

    /// 流式上传，大于分片阈值时由实现决定如何分片
    async fn put_stream(
        &self,
        bucket: &str,
        key: &str,
        reader: Box<dyn AsyncRead + Send + Unpin>,
        size: u64,
        options: PutStreamOptions,
    ) -> Result<ObjectInfo, ObjectStoreError>;

    /// 流式下载，返回写入的字节数
    async fn get_stream(
        &self,
        bucket: &str,
        key: &str,
        writer: Box<dyn AsyncWrite + Send + Unpin>,
    ) -> Result<u64, ObjectStoreError>;

    // === 文件操作（默认实现） ===

    /// 上传本地文件
    async fn put_file(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
        options: PutFileOptions,
    ) -> Result<ObjectInfo, ObjectStoreError> {
        let metadata = tokio::fs::metadata(local_path).await?;
        let file_size = metadata.len();

        let file = tokio::fs::File::open(local_path).await?;
        self.put_stream(bucket, key, Box::new(file), file_size, options.into())
            .await
    }

    /// 下载对象到本地文件
    async fn get_file(
        &self,
        bucket: &str,
        key: &str,
        local_path: &Path,
        options: GetFileOptions,
    ) -> Result<u64, ObjectStoreError> {
        // 检查文件是否存在
        if !options.overwrite && local_path.exists() {
            return Err(ObjectStoreError::FileExists {
                path: local_path.display().to_string(),
            });
        }

        // 确保父目录存在
        if let Some(parent) = local_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let file = tokio::fs::File::create(local_path).await?;
        self.get_stream(bucket, key, Box::new(file)).await
    }
}

use anyhow::{anyhow, Result};
use garde::Validate;
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cfg::duration::{serde_as, HumanDur};
use crate::harness::{LifecycleMode, UploadTarget};
use crate::oss::{
    AwsS3ObjectStore, AwsS3ObjectStoreConfig, MemoryObjectStore, MemoryObjectStoreConfig,
    ObjectStore, ObjectStoreError,
};

/// 默认的最小负载大小，保证超过分片上传阈值
pub const DEFAULT_MIN_PAYLOAD_SIZE: u64 = 5 * 1024 * 1024;

/// 存储实现配置，序列化形式为 `{ type: "...", options: {...} }`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", content = "options")]
pub enum StoreConfig {
    AwsS3ObjectStore(AwsS3ObjectStoreConfig),
    MemoryObjectStore(MemoryObjectStoreConfig),
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::AwsS3ObjectStore(AwsS3ObjectStoreConfig::default())
    }
}

/// 根据配置创建 ObjectStore
pub async fn create_object_store(
    config: &StoreConfig,
) -> Result<Arc<dyn ObjectStore>, ObjectStoreError> {
    match config {
        StoreConfig::AwsS3ObjectStore(options) => {
            let store = AwsS3ObjectStore::new(options.clone()).await?;
            Ok(Arc::new(store))
        }
        StoreConfig::MemoryObjectStore(options) => {
            Ok(Arc::new(MemoryObjectStore::from(options.clone())))
        }
    }
}

/// 生命周期测试配置
///
/// 默认值对应本地 MinIO：`127.0.0.1:9000`，`minioadmin/minioadmin`，HTTP。
#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize, SmartDefault, Validate)]
#[serde(default)]
pub struct HarnessConfig {
    /// 存储实现
    #[garde(skip)]
    pub store: StoreConfig,

    #[garde(length(min = 3, max = 63))]
    #[default = "lifecycle-test-bucket"]
    pub bucket: String,

    #[garde(length(min = 1))]
    #[default = "lifecycle-test-file.txt"]
    pub object: String,

    #[garde(length(min = 1))]
    #[default = "application/octet-stream"]
    pub content_type: String,

    /// 创建存储桶时使用的区域，为空时使用存储配置中的区域
    #[garde(skip)]
    pub region: Option<String>,

    /// 本地上传文件
    #[garde(skip)]
    #[default(PathBuf::from("upload-temp.txt"))]
    pub upload_path: PathBuf,

    /// 下载目标文件
    #[garde(skip)]
    #[default(PathBuf::from("downloaded-file.txt"))]
    pub download_path: PathBuf,

    /// 负载文件的最小字节数
    #[garde(skip)]
    #[default(DEFAULT_MIN_PAYLOAD_SIZE)]
    pub min_payload_size: u64,

    /// 使用分片上传的阈值
    #[garde(skip)]
    #[default = 5242880]
    pub multipart_threshold: u64,

    /// 分片大小
    #[garde(range(min = 5242880))]
    #[default = 5242880]
    pub part_size: usize,

    #[garde(skip)]
    pub mode: LifecycleMode,

    /// 是否下载并校验对象（仅 Full 模式）
    #[garde(skip)]
    #[default = true]
    pub verify_download: bool,

    /// 是否比较下载文件与原文件的摘要
    #[garde(skip)]
    #[default = true]
    pub verify_content: bool,

    /// 存储桶在运行前已存在时是否仍在清理阶段删除
    #[garde(skip)]
    #[default = true]
    pub remove_existing_bucket: bool,

    /// 单次网络调用的超时
    #[garde(skip)]
    #[serde_as(as = "Option<HumanDur>")]
    pub operation_timeout: Option<Duration>,
}

impl HarnessConfig {
    /// 从 JSON5 字符串创建
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(json5::from_str(content)?)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 导出为 YAML 字符串
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// garde 校验之外，上传和下载路径不能相同
    pub fn check(&self) -> Result<()> {
        self.validate().map_err(|e| anyhow!("invalid config: {}", e))?;

        if self.upload_path == self.download_path {
            return Err(anyhow!(
                "invalid config: upload_path and download_path are both {}",
                self.upload_path.display()
            ));
        }

        Ok(())
    }

    pub fn upload_target(&self) -> UploadTarget {
        UploadTarget {
            bucket_name: self.bucket.clone(),
            object_name: self.object.clone(),
            local_path: self.upload_path.clone(),
            content_type: self.content_type.clone(),
        }
    }
}

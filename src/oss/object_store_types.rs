use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smart_default::SmartDefault;
use std::collections::HashMap;
use std::fmt;

/// S3 允许的最小分片大小（最后一片除外）
pub const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

/// 对象元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub etag: Option<String>,
    pub content_type: Option<String>,
}

/// 上传结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub size: u64,
    /// 去掉引号后的 ETag
    pub etag: String,
}

/// 分片信息
#[derive(Debug, Clone)]
pub struct PartInfo {
    pub part_number: u32,
    pub etag: String,
    pub size: u64,
}

/// 创建存储桶选项
#[derive(Debug, Clone, SmartDefault)]
pub struct CreateBucketOptions {
    /// 为空时使用客户端所在区域
    pub region: Option<String>,
}

/// 流式上传选项
#[derive(Debug, Clone, SmartDefault)]
pub struct PutStreamOptions {
    pub content_type: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
    /// 使用分片上传的阈值（默认 5MB）
    #[default = 5242880]
    pub multipart_threshold: u64,
    /// 分片大小（默认 5MB）
    #[default = 5242880]
    pub part_size: usize,
}

/// 文件上传选项
#[derive(Debug, Clone, SmartDefault)]
pub struct PutFileOptions {
    pub content_type: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
    /// 使用分片上传的阈值（默认 5MB）
    #[default = 5242880]
    pub multipart_threshold: u64,
    /// 分片大小（默认 5MB）
    #[default = 5242880]
    pub part_size: usize,
}

impl From<PutFileOptions> for PutStreamOptions {
    fn from(options: PutFileOptions) -> Self {
        Self {
            content_type: options.content_type,
            metadata: options.metadata,
            multipart_threshold: options.multipart_threshold,
            part_size: options.part_size,
        }
    }
}

/// 文件下载选项
#[derive(Debug, Clone, SmartDefault)]
pub struct GetFileOptions {
    /// 是否覆盖已存在的文件
    #[default = false]
    pub overwrite: bool,
}

/// 存储操作，用于日志和故障注入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreOperation {
    BucketExists,
    CreateBucket,
    PutObject,
    GetObject,
    HeadObject,
    DeleteObject,
    DeleteBucket,
}

impl StoreOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOperation::BucketExists => "bucket_exists",
            StoreOperation::CreateBucket => "create_bucket",
            StoreOperation::PutObject => "put_object",
            StoreOperation::GetObject => "get_object",
            StoreOperation::HeadObject => "head_object",
            StoreOperation::DeleteObject => "delete_object",
            StoreOperation::DeleteBucket => "delete_bucket",
        }
    }
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 去掉服务端返回 ETag 两侧的引号
pub fn trim_etag(etag: &str) -> String {
    etag.trim_matches('"').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_file_options_default() {
        let options = PutFileOptions::default();
        assert_eq!(options.multipart_threshold, 5 * 1024 * 1024);
        assert_eq!(options.part_size, MIN_PART_SIZE);
        assert!(options.content_type.is_none());
    }

    #[test]
    fn test_put_file_options_into_stream_options() {
        let options = PutFileOptions {
            content_type: Some("application/octet-stream".to_string()),
            part_size: 8 * 1024 * 1024,
            ..Default::default()
        };
        let stream: PutStreamOptions = options.into();
        assert_eq!(stream.content_type.as_deref(), Some("application/octet-stream"));
        assert_eq!(stream.part_size, 8 * 1024 * 1024);
    }

    #[test]
    fn test_trim_etag() {
        assert_eq!(trim_etag("\"abc-2\""), "abc-2");
        assert_eq!(trim_etag("abc"), "abc");
    }
}

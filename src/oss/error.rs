use thiserror::Error;

/// 对象存储统一错误类型
#[derive(Error, Debug)]
pub enum ObjectStoreError {
    #[error("对象不存在: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("存储桶不存在: {0}")]
    BucketNotFound(String),

    #[error("存储桶已存在且归当前用户所有: {0}")]
    BucketAlreadyOwnedByYou(String),

    #[error("存储桶已被其他用户占用: {0}")]
    BucketAlreadyExists(String),

    #[error("存储桶非空: {0}")]
    BucketNotEmpty(String),

    #[error("网络错误: {0}")]
    Network(String),

    #[error("无效参数: {0}")]
    InvalidInput(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("厂商错误 [{provider}]: {message}")]
    Provider {
        provider: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("文件已存在: {path}")]
    FileExists { path: String },

    #[error("分片上传失败: {message}")]
    MultipartUpload { message: String },
}

impl ObjectStoreError {
    /// 从厂商 SDK 错误转换
    pub fn from_provider<E>(err: E, provider: &str, context: &str) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        ObjectStoreError::Provider {
            provider: provider.to_string(),
            message: context.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// 不带底层错误的厂商错误，内存实现的故障注入也使用它
    pub fn provider(provider: &str, message: impl Into<String>) -> Self {
        ObjectStoreError::Provider {
            provider: provider.to_string(),
            message: message.into(),
            source: None,
        }
    }

    /// 存储桶已存在且属于调用方，`ensure_bucket` 视为成功
    pub fn is_already_owned(&self) -> bool {
        matches!(self, ObjectStoreError::BucketAlreadyOwnedByYou(_))
    }
}

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::oss::ObjectStoreError;

/// 本地产物校验错误
#[derive(Error, Debug)]
pub enum VerificationError {
    /// 文件不存在（包括父目录不存在）
    #[error("文件不存在: {}", .path.display())]
    Missing { path: PathBuf },

    /// 其他元数据读取错误，例如路径中的某一级不是目录
    #[error("读取文件元数据失败 {}: {source}", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("文件为空: {}", .path.display())]
    Empty { path: PathBuf },

    #[error("读取文件内容失败 {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("内容不一致 {}: 期望 sha256 {expected}，实际 {actual}", .path.display())]
    ContentMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
}

impl VerificationError {
    /// 诊断用的短标签
    pub fn label(&self) -> &'static str {
        match self {
            VerificationError::Missing { .. } => "missing",
            VerificationError::Stat { .. } => "stat-error",
            VerificationError::Empty { .. } => "empty",
            VerificationError::Read { .. } => "read-error",
            VerificationError::ContentMismatch { .. } => "content-mismatch",
        }
    }
}

/// 生命周期致命错误，出现后立即停止后续步骤，只执行清理
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("创建负载文件失败 {}: {source}", .path.display())]
    Payload {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("检查存储桶失败 {bucket}: {source}")]
    BucketCheck {
        bucket: String,
        #[source]
        source: ObjectStoreError,
    },

    #[error("创建存储桶失败 {bucket}: {source}")]
    BucketCreate {
        bucket: String,
        #[source]
        source: ObjectStoreError,
    },

    #[error("上传失败 {bucket}/{key}: {source}")]
    Upload {
        bucket: String,
        key: String,
        #[source]
        source: ObjectStoreError,
    },

    #[error("下载失败 {bucket}/{key}: {source}")]
    Download {
        bucket: String,
        key: String,
        #[source]
        source: ObjectStoreError,
    },

    #[error("校验失败: {0}")]
    Verification(#[from] VerificationError),

    #[error("步骤 {step} 超时 ({timeout:?})")]
    Timeout { step: &'static str, timeout: Duration },
}

impl HarnessError {
    /// 出错的步骤名
    pub fn step(&self) -> &'static str {
        match self {
            HarnessError::Payload { .. } => "create_payload",
            HarnessError::BucketCheck { .. } | HarnessError::BucketCreate { .. } => {
                "ensure_bucket"
            }
            HarnessError::Upload { .. } => "upload",
            HarnessError::Download { .. } => "download",
            HarnessError::Verification(_) => "verify",
            HarnessError::Timeout { step, .. } => *step,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_names() {
        let err = HarnessError::BucketCreate {
            bucket: "b".to_string(),
            source: ObjectStoreError::BucketAlreadyExists("b".to_string()),
        };
        assert_eq!(err.step(), "ensure_bucket");

        let err: HarnessError = VerificationError::Missing {
            path: PathBuf::from("x"),
        }
        .into();
        assert_eq!(err.step(), "verify");

        let err = HarnessError::Timeout {
            step: "upload",
            timeout: Duration::from_secs(1),
        };
        assert_eq!(err.step(), "upload");
    }

    #[test]
    fn test_verification_labels_are_distinct() {
        let missing = VerificationError::Missing {
            path: PathBuf::from("a"),
        };
        let stat = VerificationError::Stat {
            path: PathBuf::from("a"),
            source: std::io::Error::other("denied"),
        };
        assert_eq!(missing.label(), "missing");
        assert_eq!(stat.label(), "stat-error");
        assert_ne!(missing.to_string(), stat.to_string());
    }
}

use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

use crate::harness::VerificationError;

/// 通过校验的本地产物
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactInfo {
    pub path: PathBuf,
    pub size: u64,
}

/// 检查本地产物存在且非空
///
/// 文件或其父目录不存在时返回 `Missing`，其他元数据错误返回 `Stat`。
pub async fn verify_local_artifact(path: &Path) -> Result<ArtifactInfo, VerificationError> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(VerificationError::Missing {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(VerificationError::Stat {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    if !metadata.is_file() {
        return Err(VerificationError::Stat {
            path: path.to_path_buf(),
            source: std::io::Error::new(ErrorKind::InvalidInput, "not a regular file"),
        });
    }

    if metadata.len() == 0 {
        return Err(VerificationError::Empty {
            path: path.to_path_buf(),
        });
    }

    Ok(ArtifactInfo {
        path: path.to_path_buf(),
        size: metadata.len(),
    })
}

/// 计算文件的 SHA-256，十六进制小写
pub async fn file_digest(path: &Path) -> std::io::Result<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 64 * 1024];

    loop {
        let n = file.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// 比较两个文件内容是否一致，返回共同的摘要
pub async fn verify_same_content(
    original: &Path,
    downloaded: &Path,
) -> Result<String, VerificationError> {
    let expected = file_digest(original)
        .await
        .map_err(|source| VerificationError::Read {
            path: original.to_path_buf(),
            source,
        })?;
    let actual = file_digest(downloaded)
        .await
        .map_err(|source| VerificationError::Read {
            path: downloaded.to_path_buf(),
            source,
        })?;

    if expected != actual {
        return Err(VerificationError::ContentMismatch {
            path: downloaded.to_path_buf(),
            expected,
            actual,
        });
    }

    Ok(actual)
}

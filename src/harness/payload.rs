use std::path::{Path, PathBuf};
use tokio::io::{AsyncWriteExt, BufWriter};

/// 负载文件中重复写入的固定行
pub const PAYLOAD_LINE: &str = "This is a test file for the object storage lifecycle test.\n";

/// 已生成的负载文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadInfo {
    pub path: PathBuf,
    pub size: u64,
    pub lines: u64,
}

/// 生成大小超过 `min_size` 的负载文件，已存在则覆盖
///
/// 行数为 `min_size / 行长 + 1`，因此文件大小总是严格大于 `min_size`，
/// 保证触发上传端的分片阈值。
pub async fn create_payload_file(path: &Path, min_size: u64) -> std::io::Result<PayloadInfo> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let line = PAYLOAD_LINE.as_bytes();
    let lines = min_size / line.len() as u64 + 1;

    let file = tokio::fs::File::create(path).await?;
    let mut writer = BufWriter::with_capacity(256 * 1024, file);
    for _ in 0..lines {
        writer.write_all(line).await?;
    }
    writer.flush().await?;

    writer.into_inner().sync_all().await?;

    let size = tokio::fs::metadata(path).await?.len();
    tracing::info!(path = %path.display(), size, lines, "payload file created");

    Ok(PayloadInfo {
        path: path.to_path_buf(),
        size,
        lines,
    })
}

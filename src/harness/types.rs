use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// 上传目标，整个运行期间不变
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub bucket_name: String,
    pub object_name: String,
    pub local_path: PathBuf,
    pub content_type: String,
}

/// 运行模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleMode {
    /// 上传、下载、校验并清理远端资源
    #[default]
    Full,
    /// 只上传，远端存储桶和对象保留
    UploadOnly,
}

/// 生命周期状态
///
/// `Init → BucketEnsured → Uploaded → Downloaded → Verified → RemoteCleaned → LocalCleaned → Done`，
/// 任意非终止状态遇到致命错误进入 `Failed`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Init,
    BucketEnsured,
    Uploaded,
    Downloaded,
    Verified,
    RemoteCleaned,
    LocalCleaned,
    Done,
    Failed,
}

impl LifecycleState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Done | LifecycleState::Failed)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Init => "init",
            LifecycleState::BucketEnsured => "bucket_ensured",
            LifecycleState::Uploaded => "uploaded",
            LifecycleState::Downloaded => "downloaded",
            LifecycleState::Verified => "verified",
            LifecycleState::RemoteCleaned => "remote_cleaned",
            LifecycleState::LocalCleaned => "local_cleaned",
            LifecycleState::Done => "done",
            LifecycleState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// 单个步骤的结果，创建后不再修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleResult {
    pub step_name: String,
    pub succeeded: bool,
    pub error_detail: Option<String>,
    /// 失败是否终止了运行
    pub fatal: bool,
}

impl LifecycleResult {
    pub fn ok(step_name: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            succeeded: true,
            error_detail: None,
            fatal: false,
        }
    }

    pub fn warning(step_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            succeeded: false,
            error_detail: Some(detail.into()),
            fatal: false,
        }
    }

    pub fn fatal(step_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            succeeded: false,
            error_detail: Some(detail.into()),
            fatal: true,
        }
    }

    pub fn is_warning(&self) -> bool {
        !self.succeeded && !self.fatal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    LocalFile,
    LocalDir,
    RemoteObject,
    RemoteBucket,
}

/// 运行中产生、需要释放的资源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    LocalFile(PathBuf),
    /// 运行中创建的本地目录，只在为空时删除
    LocalDir(PathBuf),
    RemoteObject { bucket: String, key: String },
    RemoteBucket(String),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::LocalFile(_) => ResourceKind::LocalFile,
            Resource::LocalDir(_) => ResourceKind::LocalDir,
            Resource::RemoteObject { .. } => ResourceKind::RemoteObject,
            Resource::RemoteBucket(_) => ResourceKind::RemoteBucket,
        }
    }

    pub fn identifier(&self) -> String {
        match self {
            Resource::LocalFile(path) | Resource::LocalDir(path) => path.display().to_string(),
            Resource::RemoteObject { bucket, key } => format!("{}/{}", bucket, key),
            Resource::RemoteBucket(bucket) => bucket.clone(),
        }
    }

    pub fn is_remote(&self) -> bool {
        !matches!(self, Resource::LocalFile(_) | Resource::LocalDir(_))
    }
}

/// 资源句柄
///
/// `acquired == false` 的句柄只记录、不释放，例如保留运行前已存在的存储桶。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHandle {
    pub resource: Resource,
    pub acquired: bool,
}

impl ResourceHandle {
    pub fn acquired(resource: Resource) -> Self {
        Self {
            resource,
            acquired: true,
        }
    }

    pub fn retained(resource: Resource) -> Self {
        Self {
            resource,
            acquired: false,
        }
    }

    pub fn local_file(path: impl Into<PathBuf>) -> Self {
        Self::acquired(Resource::LocalFile(path.into()))
    }

    pub fn local_dir(path: impl Into<PathBuf>) -> Self {
        Self::acquired(Resource::LocalDir(path.into()))
    }

    pub fn kind(&self) -> ResourceKind {
        self.resource.kind()
    }

    pub fn identifier(&self) -> String {
        self.resource.identifier()
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.resource {
            Resource::LocalFile(path) => write!(f, "local file '{}'", path.display()),
            Resource::LocalDir(path) => write!(f, "local directory '{}'", path.display()),
            Resource::RemoteObject { bucket, key } => write!(f, "object '{}/{}'", bucket, key),
            Resource::RemoteBucket(bucket) => write!(f, "bucket '{}'", bucket),
        }
    }
}

/// `ensure_bucket` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketStatus {
    Created,
    AlreadyExisted,
}

/// 远端清理结果，两个删除互不影响
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoteCleanup {
    pub object_removed: bool,
    pub bucket_removed: bool,
}

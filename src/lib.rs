//! oss-harness - 对象存储生命周期测试工具
//!
//! 针对 S3 兼容服务（MinIO、AWS S3 等）执行一次完整的对象生命周期：
//! 生成负载文件、确保存储桶、分片上传、下载、校验，最后按相反顺序清理远端和本地资源。
//!
//! ## 模块
//!
//! - **oss**: 对象存储抽象（`ObjectStore`），AWS S3 实现和内存实现
//! - **harness**: 负载生成、生命周期状态机、产物校验、资源清理
//! - **cfg**: 运行配置和时长格式
//!
//! ## 错误分级
//!
//! - 致命错误：负载写入、存储桶检查/创建、上传、下载、校验失败，立即停止后续步骤
//! - 警告：对象、存储桶、本地文件删除失败，只记录日志，不影响运行结果

pub mod cfg;
pub mod harness;
pub mod oss;

// 重新导出主要的公共 API
pub use cfg::{create_object_store, HarnessConfig, StoreConfig};

pub use harness::{
    HarnessError, LifecycleMode, LifecycleOrchestrator, LifecycleReport, LifecycleResult,
    LifecycleState, VerificationError,
};

pub use oss::{ObjectInfo, ObjectMeta, ObjectStore, ObjectStoreError};
pub use oss::{AwsS3ObjectStore, AwsS3ObjectStoreConfig};
pub use oss::{MemoryObjectStore, MemoryObjectStoreConfig};

//! cfg 模块 - 运行配置
//!
//! 生命周期测试的全部参数都来自 [`HarnessConfig`]，不再使用编译期常量。

pub mod duration;
mod harness_config;

pub use duration::{format_duration, parse_duration, HumanDur};
pub use harness_config::{create_object_store, HarnessConfig, StoreConfig, DEFAULT_MIN_PAYLOAD_SIZE};

//! IoTProv Common - 跨模块共享的数据模型与工具
//!
//! 该模块提供 IoTProv 项目中所有组件共享的数据结构、错误处理和命名规则。
//! 包括设备身份、密钥与证书、策略文档等数据模型以及统一的错误处理机制。

pub mod models;
pub mod error;
pub mod naming;

/// 重新导出常用类型，方便使用
pub use error::{AlreadyExistsReason, Error, RegistryError, Result};
pub use models::credentials::*;
pub use models::identity::*;
pub use models::policy::*;

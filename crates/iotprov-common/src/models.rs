//! 数据模型模块
//!
//! 该模块定义了 IoTProv 项目中使用的核心数据模型，包括设备身份、
//! 密钥与证书、策略文档等，并提供序列化/反序列化功能。

pub mod identity;
pub mod credentials;
pub mod policy;

//! 错误处理模块
//!
//! 该模块提供 IoTProv 项目的统一错误处理机制。远端注册中心的错误单独建模为
//! [`RegistryError`]，其中"不存在"和"已存在"是预期分支，由调用方显式匹配，
//! 而不是当作异常处理。

use std::fmt;
use std::io;
use thiserror::Error;

/// 注册中心报告"资源已存在"时使用的判定子串
const DIFFERENT_TAGS_MARKER: &str = "with different tags";

/// "已存在"冲突的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlreadyExistsReason {
    /// 同名 thing 已存在，但标签或属性不同（可恢复）
    DifferentTags,
    /// 其他原因（不可恢复）
    Other(String),
}

impl AlreadyExistsReason {
    /// 从注册中心返回的错误消息中识别冲突原因
    ///
    /// 只在适配器拿不到结构化错误码时使用。
    pub fn from_message(message: &str) -> Self {
        if message.contains(DIFFERENT_TAGS_MARKER) {
            AlreadyExistsReason::DifferentTags
        } else {
            AlreadyExistsReason::Other(message.to_string())
        }
    }
}

impl fmt::Display for AlreadyExistsReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlreadyExistsReason::DifferentTags => write!(f, "资源已存在且标签不同"),
            AlreadyExistsReason::Other(message) => write!(f, "{}", message),
        }
    }
}

/// 远端注册中心错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// 资源不存在
    #[error("资源不存在: {0}")]
    NotFound(String),

    /// 资源已存在
    #[error("资源已存在: {reason}")]
    AlreadyExists {
        /// 冲突原因
        reason: AlreadyExistsReason,
    },

    /// 传输层或其他错误，原样向上传递
    #[error("注册中心调用失败: {0}")]
    Transport(String),
}

impl RegistryError {
    /// 构造一个"已存在"错误，原因由消息推断
    pub fn already_exists(message: &str) -> Self {
        RegistryError::AlreadyExists {
            reason: AlreadyExistsReason::from_message(message),
        }
    }

    /// 是否为"不存在"
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound(_))
    }
}

/// IoTProv 统一错误类型
#[derive(Error, Debug)]
pub enum Error {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 注册中心错误
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// 无法安全协调的远端状态，终止当前身份的置备流程
    #[error("不支持的操作: {0}")]
    UnsupportedOperation(String),

    /// 名称或参数校验失败
    #[error("校验失败: {0}")]
    Validation(String),

    /// 序列化/反序列化错误
    #[error("序列化/反序列化错误: {0}")]
    Serialization(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] io::Error),

    /// JSON 错误
    #[error("JSON 错误: {0}")]
    Json(#[from] serde_json::Error),
}

/// IoTProv 结果类型别名
pub type Result<T> = std::result::Result<T, Error>;

/// 从字符串创建错误
pub trait IntoError<T> {
    /// 将当前类型转换为错误
    fn into_error(self, kind: fn(String) -> Error) -> Result<T>;
}

impl<T> IntoError<T> for String {
    fn into_error(self, kind: fn(String) -> Error) -> Result<T> {
        Err(kind(self))
    }
}

impl<T> IntoError<T> for &str {
    fn into_error(self, kind: fn(String) -> Error) -> Result<T> {
        Err(kind(self.to_string()))
    }
}

//! 设备身份模型
//!
//! 该模块定义注册中心中的 thing 身份记录以及角色别名描述。
//! thing 名称是外部稳定键，ARN 由注册中心分配。

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, IntoError, Result};

/// 注册中心允许的 thing 名称格式
static THING_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9:_-]{1,128}$").expect("thing 名称正则无效"));

/// thing 名称
///
/// 在发起任何远端调用之前完成格式校验。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ThingName(String);

impl ThingName {
    /// 校验并创建 thing 名称
    pub fn new(name: &str) -> Result<Self> {
        if !THING_NAME_PATTERN.is_match(name) {
            return format!("无效的 thing 名称: {:?}", name).into_error(Error::Validation);
        }
        Ok(Self(name.to_string()))
    }

    /// 名称字符串
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ThingName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ThingName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<ThingName> for String {
    fn from(name: ThingName) -> Self {
        name.0
    }
}

/// thing 身份
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThingIdentity {
    /// thing 名称
    pub name: ThingName,
    /// 注册中心分配的 ARN
    pub arn: String,
}

/// 角色别名描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAliasDescriptor {
    /// 别名
    pub role_alias: String,
    /// 别名 ARN
    pub role_alias_arn: String,
}

//! 访问策略模型
//!
//! 该模块定义注册中心的访问控制策略文档。策略以名称作为幂等键，
//! 文档内容只在创建时提交，之后不做比对。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// 策略文档版本
pub const POLICY_DOCUMENT_VERSION: &str = "2012-10-17";

/// 策略效果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    /// 允许
    Allow,
    /// 拒绝
    Deny,
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Allow => write!(f, "Allow"),
            Effect::Deny => write!(f, "Deny"),
        }
    }
}

impl FromStr for Effect {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "allow" => Ok(Effect::Allow),
            "deny" => Ok(Effect::Deny),
            _ => Err(Error::Validation(format!("无效的策略效果: {}", s))),
        }
    }
}

/// 策略语句
///
/// 小写别名用于兼容会把键名转成小写的配置加载器。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    /// 效果
    #[serde(alias = "effect")]
    pub effect: Effect,
    /// 动作列表，如 `iot:Connect`
    #[serde(alias = "action")]
    pub action: Vec<String>,
    /// 资源列表
    #[serde(alias = "resource")]
    pub resource: Vec<String>,
}

impl PolicyStatement {
    /// 创建允许语句
    pub fn allow(actions: &[&str], resources: &[&str]) -> Self {
        Self {
            effect: Effect::Allow,
            action: actions.iter().map(|a| a.to_string()).collect(),
            resource: resources.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// 创建拒绝语句
    pub fn deny(actions: &[&str], resources: &[&str]) -> Self {
        Self {
            effect: Effect::Deny,
            ..Self::allow(actions, resources)
        }
    }
}

/// 策略文档
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    /// 文档版本
    #[serde(alias = "version")]
    pub version: String,
    /// 语句列表
    #[serde(alias = "statement")]
    pub statement: Vec<PolicyStatement>,
}

impl Default for PolicyDocument {
    fn default() -> Self {
        Self {
            version: POLICY_DOCUMENT_VERSION.to_string(),
            statement: Vec::new(),
        }
    }
}

impl PolicyDocument {
    /// 核心设备的默认策略：允许全部 iot 与 greengrass 操作
    pub fn core_default() -> Self {
        Self::default().with_statement(PolicyStatement::allow(&["iot:*", "greengrass:*"], &["*"]))
    }

    /// 普通设备的默认策略：连接、收发消息及访问自身影子
    pub fn device_default() -> Self {
        Self::default().with_statement(PolicyStatement::allow(
            &[
                "iot:Connect",
                "iot:Publish",
                "iot:Subscribe",
                "iot:Receive",
                "iot:GetThingShadow",
                "iot:UpdateThingShadow",
                "greengrass:Discover",
            ],
            &["*"],
        ))
    }

    /// 追加一条语句
    pub fn with_statement(mut self, statement: PolicyStatement) -> Self {
        self.statement.push(statement);
        self
    }

    /// 渲染为 JSON 文本
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// 命名策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    /// 策略名称（幂等键）
    pub name: String,
    /// 策略文档（JSON）
    pub document: String,
}

impl Policy {
    /// 由名称和结构化文档创建策略
    pub fn new(name: &str, document: &PolicyDocument) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::Validation("策略名称不能为空".to_string()));
        }

        Ok(Self {
            name: name.to_string(),
            document: document.to_json()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_default_document() {
        let json = PolicyDocument::core_default().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["Version"], POLICY_DOCUMENT_VERSION);
        assert_eq!(value["Statement"][0]["Effect"], "Allow");
        assert_eq!(value["Statement"][0]["Action"][1], "greengrass:*");
        assert_eq!(value["Statement"][0]["Resource"][0], "*");
    }

    #[test]
    fn test_lowercase_keys_are_accepted() {
        let document: PolicyDocument = serde_json::from_str(
            r#"{"version":"2012-10-17","statement":[{"effect":"Allow","action":["iot:*"],"resource":["*"]}]}"#,
        )
        .unwrap();
        assert_eq!(document.statement[0].effect, Effect::Allow);
    }

    #[test]
    fn test_effect_parsing() {
        assert_eq!("allow".parse::<Effect>().unwrap(), Effect::Allow);
        assert_eq!("DENY".parse::<Effect>().unwrap(), Effect::Deny);
        assert!("log".parse::<Effect>().is_err());
    }

    #[test]
    fn test_deny_statement() {
        let statement = PolicyStatement::deny(&["iot:DeleteThing"], &["*"]);
        assert_eq!(statement.effect, Effect::Deny);
        assert_eq!(statement.action, vec!["iot:DeleteThing".to_string()]);
    }

    #[test]
    fn test_policy_requires_name() {
        assert!(Policy::new("", &PolicyDocument::core_default()).is_err());
        let policy = Policy::new("group1_Core_Policy", &PolicyDocument::core_default()).unwrap();
        assert!(policy.document.contains("iot:*"));
    }
}

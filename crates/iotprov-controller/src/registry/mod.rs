//! 注册中心接口模块
//!
//! 该模块定义置备引擎所消费的远端注册中心 RPC。线路协议不在本 crate 中实现，
//! 具体的传输适配器实现 [`IotRegistry`] 即可接入；重试和超时由传输层负责。
//!
//! "不存在"和"已存在"通过 [`RegistryError`] 的变体表达，调用方据此选择分支。

mod memory;

pub use memory::{CallStats, MemoryRegistry};

use async_trait::async_trait;
use iotprov_common::{KeysAndCertificate, RegistryError, RoleAliasDescriptor};
use std::fmt;

/// 注册中心端点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointType {
    /// 数据平面（ATS 签名）
    DataAts,
    /// 凭证提供方
    CredentialProvider,
}

impl EndpointType {
    /// 注册中心使用的端点类型标识
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointType::DataAts => "iot:Data-ATS",
            EndpointType::CredentialProvider => "iot:CredentialProvider",
        }
    }
}

impl fmt::Display for EndpointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 远端 IoT 注册中心
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IotRegistry: Send + Sync {
    /// 创建 thing，返回 ARN
    async fn create_thing(&self, thing_name: &str) -> Result<String, RegistryError>;

    /// 查询 thing 的 ARN
    async fn describe_thing(&self, thing_name: &str) -> Result<String, RegistryError>;

    /// 签发新的密钥对与证书
    async fn create_keys_and_certificate(
        &self,
        set_as_active: bool,
    ) -> Result<KeysAndCertificate, RegistryError>;

    /// 查询证书是否存在
    async fn describe_certificate(&self, certificate_id: &str) -> Result<(), RegistryError>;

    /// 创建策略
    async fn create_policy(&self, policy_name: &str, policy_document: &str) -> Result<(), RegistryError>;

    /// 查询策略
    async fn get_policy(&self, policy_name: &str) -> Result<(), RegistryError>;

    /// 将策略附加到目标（证书 ARN）
    async fn attach_policy(&self, policy_name: &str, target: &str) -> Result<(), RegistryError>;

    /// 将主体（证书 ARN）附加到 thing
    async fn attach_thing_principal(&self, thing_name: &str, principal: &str) -> Result<(), RegistryError>;

    /// 列出 thing 已附加的主体，保持注册中心返回的顺序
    async fn list_thing_principals(&self, thing_name: &str) -> Result<Vec<String>, RegistryError>;

    /// 查询端点地址，未指定类型时返回默认数据平面端点
    async fn describe_endpoint(
        &self,
        endpoint_type: Option<EndpointType>,
    ) -> Result<String, RegistryError>;

    /// 创建角色别名
    async fn create_role_alias(
        &self,
        role_arn: &str,
        role_alias: &str,
    ) -> Result<RoleAliasDescriptor, RegistryError>;

    /// 删除角色别名
    async fn delete_role_alias(&self, role_alias: &str) -> Result<(), RegistryError>;
}

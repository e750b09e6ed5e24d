//! 置备流程
//!
//! 为单个身份依次执行：创建或获取 thing、创建或加载证书、确保策略存在、
//! 附加策略与证书、可选地绑定角色别名，最后解析端点。任何一步失败都会终止
//! 当前身份的流程，调用方不应带着不完整的凭证继续。

use iotprov_common::{
    naming, KeysAndCertificate, Policy, PolicyDocument, Result, RoleAliasDescriptor, ThingIdentity,
    ThingName,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ProvisionerConfig;
use crate::credentials::{CredentialSource, CredentialStore, CredentialVault};
use crate::identity::{EndpointResolver, ThingRegistry};
use crate::policy::PolicyManager;
use crate::registry::IotRegistry;
use crate::role_alias::RoleAliasManager;

/// 角色绑定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleBinding {
    /// 服务角色 ARN
    pub service_role_arn: String,
    /// 角色别名
    pub alias: String,
}

/// 置备请求
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    /// 组 ID
    pub group_id: String,
    /// 子名称（核心设备为 `core`）
    pub sub_name: String,
    /// thing 名称
    pub thing_name: ThingName,
    /// 要附加到证书的策略
    pub policy: Policy,
    /// 可选的角色绑定
    pub role_binding: Option<RoleBinding>,
}

impl ProvisionRequest {
    /// 核心设备的置备请求
    pub fn core(group_id: &str, policy_document: &PolicyDocument) -> Result<Self> {
        Ok(Self {
            group_id: group_id.to_string(),
            sub_name: naming::CORE_SUB_NAME.to_string(),
            thing_name: ThingName::new(&naming::core_thing_name(group_id))?,
            policy: Policy::new(&naming::core_policy_name(group_id), policy_document)?,
            role_binding: None,
        })
    }

    /// 普通设备的置备请求，`ggd_name` 即 thing 名称
    pub fn device(group_id: &str, ggd_name: &str, policy_document: &PolicyDocument) -> Result<Self> {
        let device_name = naming::trim_device_prefix(ggd_name);
        Ok(Self {
            group_id: group_id.to_string(),
            sub_name: ggd_name.to_string(),
            thing_name: ThingName::new(ggd_name)?,
            policy: Policy::new(&naming::device_policy_name(device_name), policy_document)?,
            role_binding: None,
        })
    }

    /// 附加角色绑定
    pub fn with_role_binding(mut self, service_role_arn: &str, alias: &str) -> Self {
        self.role_binding = Some(RoleBinding {
            service_role_arn: service_role_arn.to_string(),
            alias: alias.to_string(),
        });
        self
    }
}

/// 置备结果
#[derive(Debug, Clone)]
pub struct ProvisionedIdentity {
    /// thing 身份
    pub thing: ThingIdentity,
    /// 密钥与证书
    pub keys: KeysAndCertificate,
    /// 凭证来源
    pub credential_source: CredentialSource,
    /// 核心设备证书已更换，已分发的引导配置需要重新生成
    pub bootstrap_invalidated: bool,
    /// 数据平面端点
    pub endpoint: String,
    /// 角色别名
    pub role_alias: Option<RoleAliasDescriptor>,
    /// 凭证提供方端点（仅在绑定角色别名时解析）
    pub credential_provider_endpoint: Option<String>,
}

/// 置备器
pub struct Provisioner {
    things: ThingRegistry,
    vault: CredentialVault,
    policies: PolicyManager,
    role_aliases: RoleAliasManager,
    endpoints: EndpointResolver,
}

impl Provisioner {
    /// 创建新的置备器，所有组件共享同一个注册中心句柄
    pub fn new(registry: Arc<dyn IotRegistry>, store: CredentialStore) -> Self {
        Self {
            things: ThingRegistry::new(registry.clone()),
            vault: CredentialVault::new(registry.clone(), store),
            policies: PolicyManager::new(registry.clone()),
            role_aliases: RoleAliasManager::new(registry.clone()),
            endpoints: EndpointResolver::new(registry),
        }
    }

    /// thing 注册客户端
    pub fn things(&self) -> &ThingRegistry {
        &self.things
    }

    /// 凭证保管器
    pub fn vault(&self) -> &CredentialVault {
        &self.vault
    }

    /// 策略管理器
    pub fn policies(&self) -> &PolicyManager {
        &self.policies
    }

    /// 角色别名管理器
    pub fn role_aliases(&self) -> &RoleAliasManager {
        &self.role_aliases
    }

    /// 端点解析器
    pub fn endpoints(&self) -> &EndpointResolver {
        &self.endpoints
    }

    /// 按配置构造核心设备的置备请求
    pub fn core_request(&self, config: &ProvisionerConfig, group_id: &str) -> Result<ProvisionRequest> {
        let request = ProvisionRequest::core(group_id, &config.core_policy())?;
        Ok(match &config.role_alias {
            Some(role) => request.with_role_binding(&role.service_role_arn, &role.alias),
            None => request,
        })
    }

    /// 执行单个身份的置备流程
    pub async fn provision(&self, request: &ProvisionRequest) -> Result<ProvisionedIdentity> {
        info!(
            group = %request.group_id,
            sub_name = %request.sub_name,
            "开始置备 thing {}", request.thing_name
        );

        let thing = self.things.create_or_get_thing(&request.thing_name).await?;

        let credentials = self
            .vault
            .create_or_load_keys_and_certificate(&request.group_id, &request.sub_name)
            .await?;

        self.policies.ensure(&request.policy).await?;
        self.policies
            .attach_policy_to_certificate(&request.policy.name, &credentials.keys.certificate_arn)
            .await?;
        self.policies
            .attach_certificate_to_thing(thing.name.as_str(), &credentials.keys.certificate_arn)
            .await?;

        let (role_alias, credential_provider_endpoint) = match &request.role_binding {
            Some(binding) => {
                let descriptor = self
                    .role_aliases
                    .ensure_role_alias(&binding.service_role_arn, &binding.alias)
                    .await?;
                let endpoint = self.endpoints.get_credential_provider_endpoint().await?;
                (Some(descriptor), Some(endpoint))
            }
            None => (None, None),
        };

        let endpoint = self.endpoints.get_endpoint().await?;

        if credentials.bootstrap_invalidated {
            warn!(
                group = %request.group_id,
                certificate_arn = %credentials.keys.certificate_arn,
                "核心证书已更换，需要重新分发引导配置"
            );
        }
        info!("thing {} 置备完成", thing.name);

        Ok(ProvisionedIdentity {
            thing,
            keys: credentials.keys,
            credential_source: credentials.source,
            bootstrap_invalidated: credentials.bootstrap_invalidated,
            endpoint,
            role_alias,
            credential_provider_endpoint,
        })
    }
}

//! 策略管理器
//!
//! 策略以名称为幂等键：同名策略存在即跳过创建，不比较文档内容。
//! 附加操作不检查已有的附加关系，是否重复附加由调用方决定。

use iotprov_common::{Policy, RegistryError, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::registry::IotRegistry;

/// 确保策略存在的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyOutcome {
    /// 新建
    Created,
    /// 已存在，未做任何修改
    AlreadyPresent,
}

/// 策略管理器
pub struct PolicyManager {
    /// 注册中心
    registry: Arc<dyn IotRegistry>,
}

impl PolicyManager {
    /// 创建新的策略管理器
    pub fn new(registry: Arc<dyn IotRegistry>) -> Self {
        Self { registry }
    }

    /// 策略是否存在
    pub async fn policy_exists(&self, name: &str) -> Result<bool> {
        match self.registry.get_policy(name).await {
            Ok(()) => Ok(true),
            Err(RegistryError::NotFound(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// 确保策略存在
    pub async fn ensure_policy(&self, name: &str, document: &str) -> Result<PolicyOutcome> {
        if self.policy_exists(name).await? {
            debug!("策略 {} 已存在，跳过创建", name);
            return Ok(PolicyOutcome::AlreadyPresent);
        }

        self.registry.create_policy(name, document).await?;
        info!("策略 {} 已创建", name);
        Ok(PolicyOutcome::Created)
    }

    /// 确保命名策略存在
    pub async fn ensure(&self, policy: &Policy) -> Result<PolicyOutcome> {
        self.ensure_policy(&policy.name, &policy.document).await
    }

    /// 将策略附加到证书
    pub async fn attach_policy_to_certificate(&self, policy_name: &str, certificate_arn: &str) -> Result<()> {
        self.registry.attach_policy(policy_name, certificate_arn).await?;
        debug!("策略 {} 已附加到证书 {}", policy_name, certificate_arn);
        Ok(())
    }

    /// 将证书附加到 thing
    pub async fn attach_certificate_to_thing(&self, thing_name: &str, certificate_arn: &str) -> Result<()> {
        self.registry
            .attach_thing_principal(thing_name, certificate_arn)
            .await?;
        debug!("证书 {} 已附加到 thing {}", certificate_arn, thing_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{MemoryRegistry, MockIotRegistry};
    use iotprov_common::{Error, PolicyDocument};

    #[tokio::test]
    async fn test_ensure_policy_twice_creates_once() {
        let registry = Arc::new(MemoryRegistry::default());
        let manager = PolicyManager::new(registry.clone());

        let first = manager.ensure_policy("p", "{}").await.unwrap();
        let second = manager.ensure_policy("p", "{\"changed\":true}").await.unwrap();

        assert_eq!(first, PolicyOutcome::Created);
        assert_eq!(second, PolicyOutcome::AlreadyPresent);
        assert_eq!(registry.calls().await.create_policy, 1);
        assert_eq!(registry.policy_document("p").await.as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn test_existing_policy_is_not_created() {
        let mut registry = MockIotRegistry::new();
        registry.expect_get_policy().times(1).returning(|_| Ok(()));
        registry.expect_create_policy().times(0);

        let manager = PolicyManager::new(Arc::new(registry));
        let policy = Policy::new("group1_Core_Policy", &PolicyDocument::core_default()).unwrap();
        assert_eq!(manager.ensure(&policy).await.unwrap(), PolicyOutcome::AlreadyPresent);
    }

    #[tokio::test]
    async fn test_get_policy_failure_is_propagated() {
        let mut registry = MockIotRegistry::new();
        registry
            .expect_get_policy()
            .returning(|_| Err(RegistryError::Transport("denied".to_string())));
        registry.expect_create_policy().times(0);

        let manager = PolicyManager::new(Arc::new(registry));
        let err = manager.ensure_policy("p", "{}").await.unwrap_err();
        assert!(matches!(err, Error::Registry(RegistryError::Transport(_))));
    }

    #[tokio::test]
    async fn test_attach_calls_are_unconditional() {
        let mut registry = MockIotRegistry::new();
        registry.expect_attach_policy().times(2).returning(|_, _| Ok(()));
        registry
            .expect_attach_thing_principal()
            .times(2)
            .returning(|_, _| Ok(()));

        let manager = PolicyManager::new(Arc::new(registry));
        for _ in 0..2 {
            manager.attach_policy_to_certificate("p", "arn:cert/1").await.unwrap();
            manager.attach_certificate_to_thing("thing", "arn:cert/1").await.unwrap();
        }
    }
}

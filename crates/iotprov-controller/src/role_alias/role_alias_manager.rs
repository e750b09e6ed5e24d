//! 角色别名管理器
//!
//! 别名已存在时先删除再重建一次，而不是原地更新。删除与重建之间别名短暂不存在；
//! 重建时再次遇到"已存在"视为并发写入，直接返回错误。

use iotprov_common::{RegistryError, Result, RoleAliasDescriptor};
use std::sync::Arc;
use tracing::{info, warn};

use crate::registry::IotRegistry;

/// 角色别名管理器
pub struct RoleAliasManager {
    /// 注册中心
    registry: Arc<dyn IotRegistry>,
}

impl RoleAliasManager {
    /// 创建新的角色别名管理器
    pub fn new(registry: Arc<dyn IotRegistry>) -> Self {
        Self { registry }
    }

    /// 创建或替换绑定到 `service_role_arn` 的角色别名
    pub async fn ensure_role_alias(
        &self,
        service_role_arn: &str,
        alias_name: &str,
    ) -> Result<RoleAliasDescriptor> {
        match self.registry.create_role_alias(service_role_arn, alias_name).await {
            Ok(descriptor) => {
                info!("角色别名 {} 已创建，绑定角色 {}", alias_name, service_role_arn);
                return Ok(descriptor);
            }
            Err(RegistryError::AlreadyExists { .. }) => {
                warn!("角色别名 {} 已存在，删除后重建", alias_name);
                self.registry.delete_role_alias(alias_name).await?;
            }
            Err(e) => return Err(e.into()),
        }

        let descriptor = self
            .registry
            .create_role_alias(service_role_arn, alias_name)
            .await?;
        info!("角色别名 {} 已重建，绑定角色 {}", alias_name, service_role_arn);
        Ok(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{MemoryRegistry, MockIotRegistry};
    use iotprov_common::Error;

    const R1: &str = "arn:aws:iam::123456789012:role/R1";
    const R2: &str = "arn:aws:iam::123456789012:role/R2";

    #[tokio::test]
    async fn test_existing_alias_is_replaced() {
        let registry = Arc::new(MemoryRegistry::default());
        registry.create_role_alias(R1, "A").await.unwrap();

        let manager = RoleAliasManager::new(registry.clone());
        let before = registry.calls().await;
        let descriptor = manager.ensure_role_alias(R2, "A").await.unwrap();
        let after = registry.calls().await;

        assert_eq!(descriptor.role_alias, "A");
        assert_eq!(after.delete_role_alias - before.delete_role_alias, 1);
        // 第一次创建失败，删除后再成功创建一次
        assert_eq!(after.create_role_alias - before.create_role_alias, 2);
        assert_eq!(registry.role_alias_target("A").await.as_deref(), Some(R2));
    }

    #[tokio::test]
    async fn test_new_alias_is_created_without_delete() {
        let mut registry = MockIotRegistry::new();
        registry.expect_create_role_alias().times(1).returning(|_, alias| {
            Ok(RoleAliasDescriptor {
                role_alias: alias.to_string(),
                role_alias_arn: format!("arn:rolealias/{}", alias),
            })
        });
        registry.expect_delete_role_alias().times(0);

        let manager = RoleAliasManager::new(Arc::new(registry));
        let descriptor = manager.ensure_role_alias(R1, "A").await.unwrap();
        assert_eq!(descriptor.role_alias_arn, "arn:rolealias/A");
    }

    #[tokio::test]
    async fn test_second_conflict_is_fatal() {
        let mut registry = MockIotRegistry::new();
        registry
            .expect_create_role_alias()
            .times(2)
            .returning(|_, _| Err(RegistryError::already_exists("role alias exists")));
        registry.expect_delete_role_alias().times(1).returning(|_| Ok(()));

        let manager = RoleAliasManager::new(Arc::new(registry));
        let err = manager.ensure_role_alias(R1, "A").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Registry(RegistryError::AlreadyExists { .. })
        ));
    }

    #[tokio::test]
    async fn test_other_failure_skips_delete() {
        let mut registry = MockIotRegistry::new();
        registry
            .expect_create_role_alias()
            .times(1)
            .returning(|_, _| Err(RegistryError::Transport("role not assumable".to_string())));
        registry.expect_delete_role_alias().times(0);

        let manager = RoleAliasManager::new(Arc::new(registry));
        assert!(manager.ensure_role_alias(R1, "A").await.is_err());
    }
}

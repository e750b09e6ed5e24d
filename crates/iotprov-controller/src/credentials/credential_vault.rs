//! 凭证保管模块
//!
//! 创建或复用设备的密钥对与证书。本地缓存只是建议性的：缓存中的证书必须
//! 仍然存在于注册中心才会被复用，否则重新签发并覆盖缓存。
//!
//! 核心设备的证书一旦重新签发，已分发的引导配置中记录的证书 ARN 就会失效，
//! 结果中的 `bootstrap_invalidated` 用于把这一点显式告知调用方。

use iotprov_common::{naming, CredentialRecord, Error, KeysAndCertificate, RegistryError, Result};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::credential_store::{CredentialStore, DeviceFiles};
use crate::registry::IotRegistry;

/// 凭证来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// 复用本地缓存
    Cached,
    /// 新签发；`replaced_stale` 表示取代了一个在注册中心已不存在的缓存证书
    Issued { replaced_stale: bool },
}

/// 创建或加载凭证的结果
#[derive(Debug, Clone)]
pub struct ProvisionedCredentials {
    /// 密钥与证书
    pub keys: KeysAndCertificate,
    /// 来源
    pub source: CredentialSource,
    /// 核心设备证书已更换，需要重新分发引导配置
    pub bootstrap_invalidated: bool,
    /// 新签发时写出的设备文件
    pub device_files: Option<DeviceFiles>,
}

impl ProvisionedCredentials {
    /// 是否为新签发
    pub fn is_new(&self) -> bool {
        matches!(self.source, CredentialSource::Issued { .. })
    }
}

/// 凭证保管器
pub struct CredentialVault {
    /// 注册中心
    registry: Arc<dyn IotRegistry>,
    /// 本地凭证存储
    store: CredentialStore,
}

impl CredentialVault {
    /// 创建新的凭证保管器
    pub fn new(registry: Arc<dyn IotRegistry>, store: CredentialStore) -> Self {
        Self { registry, store }
    }

    /// 本地凭证存储
    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// 证书是否仍存在于注册中心
    ///
    /// "不存在"是预期的否定结果；其他错误原样返回。
    pub async fn certificate_exists(&self, certificate_id: &str) -> Result<bool> {
        match self.registry.describe_certificate(certificate_id).await {
            Ok(()) => Ok(true),
            Err(RegistryError::NotFound(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// 创建或加载 `(group_id, sub_name)` 的密钥与证书
    pub async fn create_or_load_keys_and_certificate(
        &self,
        group_id: &str,
        sub_name: &str,
    ) -> Result<ProvisionedCredentials> {
        self.store.ensure_group_dir(group_id).await?;

        let mut replaced_stale = false;
        if let Some(record) = self.store.load(group_id, sub_name).await? {
            info!("尝试复用已有密钥 ({}/{})", group_id, sub_name);

            if self.certificate_exists(&record.keys.certificate_id).await? {
                info!(certificate_id = %record.keys.certificate_id, "复用已有密钥");
                return Ok(ProvisionedCredentials {
                    keys: record.keys,
                    source: CredentialSource::Cached,
                    bootstrap_invalidated: false,
                    device_files: None,
                });
            }

            warn!(
                certificate_id = %record.keys.certificate_id,
                "已有证书不在注册中心中，可能已被删除"
            );
            replaced_stale = true;
        }

        let device_name = naming::device_file_name(group_id, sub_name);
        if device_name.is_empty() {
            return Err(Error::Validation(format!("子名称 {:?} 去掉前缀后为空", sub_name)));
        }

        let is_core = naming::is_core(sub_name);
        if is_core {
            warn!(
                group = group_id,
                "未找到可用密钥，正在为核心设备创建新密钥。如果该组已有部署，核心证书 ARN 将改变，需要重新运行引导脚本"
            );
        } else {
            info!("未找到可用密钥，正在创建新密钥 ({}/{})", group_id, sub_name);
        }

        let keys = self.registry.create_keys_and_certificate(true).await?;
        debug!(certificate_id = %keys.certificate_id, "证书已签发并激活");

        // 设备文件落盘之后才写缓存条目，缓存命中即意味着设备文件已完整写出
        let device_files = self.store.write_device_files(device_name, &keys).await?;
        info!("设备私钥已写入 [{}]", device_files.private_key_path.display());
        info!("设备证书已写入 [{}]", device_files.certificate_path.display());

        self.store
            .save(group_id, sub_name, &CredentialRecord::new(keys.clone()))
            .await?;

        Ok(ProvisionedCredentials {
            keys,
            source: CredentialSource::Issued { replaced_stale },
            bootstrap_invalidated: is_core,
            device_files: Some(device_files),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{MemoryRegistry, MockIotRegistry};
    use iotprov_common::KeyPair;

    fn issued(certificate_id: &str) -> KeysAndCertificate {
        KeysAndCertificate {
            certificate_id: certificate_id.to_string(),
            certificate_arn: format!("arn:aws:iot:us-east-1:123456789012:cert/{}", certificate_id),
            certificate_pem: format!("CERT-{}", certificate_id),
            key_pair: KeyPair {
                public_key: format!("PUB-{}", certificate_id),
                private_key: format!("PRIV-{}", certificate_id),
            },
        }
    }

    #[tokio::test]
    async fn test_fresh_core_issues_and_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = MockIotRegistry::new();
        registry.expect_describe_certificate().times(0);
        registry
            .expect_create_keys_and_certificate()
            .times(1)
            .returning(|active| {
                assert!(active);
                Ok(issued("new"))
            });

        let vault = CredentialVault::new(Arc::new(registry), CredentialStore::new(dir.path()));
        let result = vault
            .create_or_load_keys_and_certificate("group1", "core")
            .await
            .unwrap();

        assert_eq!(result.source, CredentialSource::Issued { replaced_stale: false });
        assert!(result.bootstrap_invalidated);
        assert!(dir
            .path()
            .join("credentials/group1/core.createKeysAndCertificate.serialized")
            .exists());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("build/group1.pem.key")).unwrap(),
            "PRIV-new"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("build/group1.pem.crt")).unwrap(),
            "CERT-new"
        );
    }

    #[tokio::test]
    async fn test_valid_cache_skips_create() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());
        store
            .save("group1", "ggd_sensor", &CredentialRecord::new(issued("cached")))
            .await
            .unwrap();

        let mut registry = MockIotRegistry::new();
        registry
            .expect_describe_certificate()
            .times(1)
            .returning(|_| Ok(()));
        registry.expect_create_keys_and_certificate().times(0);

        let vault = CredentialVault::new(Arc::new(registry), store);
        let result = vault
            .create_or_load_keys_and_certificate("group1", "ggd_sensor")
            .await
            .unwrap();

        assert_eq!(result.source, CredentialSource::Cached);
        assert_eq!(result.keys.certificate_id, "cached");
        assert!(!result.bootstrap_invalidated);
        assert!(result.device_files.is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_stale_cache_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());
        store
            .save("group1", "ggd_sensor", &CredentialRecord::new(issued("stale")))
            .await
            .unwrap();

        let mut registry = MockIotRegistry::new();
        registry
            .expect_describe_certificate()
            .times(1)
            .returning(|id| Err(RegistryError::NotFound(id.to_string())));
        registry
            .expect_create_keys_and_certificate()
            .times(1)
            .returning(|_| Ok(issued("fresh")));

        let vault = CredentialVault::new(Arc::new(registry), store.clone());
        let result = vault
            .create_or_load_keys_and_certificate("group1", "ggd_sensor")
            .await
            .unwrap();

        assert_eq!(result.source, CredentialSource::Issued { replaced_stale: true });
        assert!(!result.bootstrap_invalidated);
        let cached = store.load("group1", "ggd_sensor").await.unwrap().unwrap();
        assert_eq!(cached.keys.certificate_id, "fresh");
        assert!(dir.path().join("build/sensor.pem.key").exists());
    }

    #[tokio::test]
    async fn test_lookup_failure_does_not_reissue() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());
        store
            .save("group1", "core", &CredentialRecord::new(issued("cached")))
            .await
            .unwrap();

        let mut registry = MockIotRegistry::new();
        registry
            .expect_describe_certificate()
            .returning(|_| Err(RegistryError::Transport("throttled".to_string())));
        registry.expect_create_keys_and_certificate().times(0);

        let vault = CredentialVault::new(Arc::new(registry), store);
        let err = vault
            .create_or_load_keys_and_certificate("group1", "core")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Registry(RegistryError::Transport(_))));
    }

    #[tokio::test]
    async fn test_corrupt_cache_stops_the_flow() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());
        store.ensure_group_dir("group1").await.unwrap();
        std::fs::write(store.entry_path("group1", "core").unwrap(), b"garbage").unwrap();

        let mut registry = MockIotRegistry::new();
        registry.expect_create_keys_and_certificate().times(0);

        let vault = CredentialVault::new(Arc::new(registry), store);
        let err = vault
            .create_or_load_keys_and_certificate("group1", "core")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[tokio::test]
    async fn test_failed_device_file_write_leaves_no_cache_entry() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path());
        // build 被普通文件占用，设备文件无法写出
        std::fs::write(dir.path().join("build"), b"").unwrap();

        let registry = Arc::new(MemoryRegistry::default());
        let vault = CredentialVault::new(registry.clone(), store.clone());

        assert!(vault
            .create_or_load_keys_and_certificate("group1", "core")
            .await
            .is_err());
        assert!(!store.exists("group1", "core").await.unwrap());

        std::fs::remove_file(dir.path().join("build")).unwrap();
        let retried = vault
            .create_or_load_keys_and_certificate("group1", "core")
            .await
            .unwrap();

        assert!(retried.is_new());
        assert!(retried.bootstrap_invalidated);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("build/group1.pem.key")).unwrap(),
            retried.keys.key_pair.private_key
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("build/group1.pem.crt")).unwrap(),
            retried.keys.certificate_pem
        );
        let cached = store.load("group1", "core").await.unwrap().unwrap();
        assert_eq!(cached.keys.certificate_id, retried.keys.certificate_id);
        assert_eq!(registry.calls().await.create_keys_and_certificate, 2);
    }

    #[tokio::test]
    async fn test_empty_device_name_is_rejected_before_issue() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = MockIotRegistry::new();
        registry.expect_create_keys_and_certificate().times(0);

        let vault = CredentialVault::new(Arc::new(registry), CredentialStore::new(dir.path()));
        let err = vault
            .create_or_load_keys_and_certificate("group1", "ggd_")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}

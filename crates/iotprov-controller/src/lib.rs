//! IoTProv 置备控制器
//!
//! 该模块实现设备身份与凭证的幂等置备：thing 生命周期、带本地缓存的密钥与证书
//! 生命周期、策略生命周期以及角色别名生命周期。每个创建步骤都可以针对已有部分
//! 状态的注册中心安全地重复执行。

pub mod config;
pub mod credentials;
pub mod identity;
pub mod policy;
pub mod provisioner;
pub mod registry;
pub mod role_alias;
pub mod telemetry;

pub use provisioner::{ProvisionRequest, ProvisionedIdentity, Provisioner, RoleBinding};

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::config::ProvisionerConfig;
use crate::credentials::CredentialStore;
use crate::registry::IotRegistry;

/// 按配置初始化置备器
pub async fn init(config: &ProvisionerConfig, registry: Arc<dyn IotRegistry>) -> Result<Provisioner> {
    telemetry::init_logging(&config.log_level);
    info!("初始化 IoTProv 置备器，工作目录: {}", config.work_dir.display());

    tokio::fs::create_dir_all(&config.work_dir)
        .await
        .with_context(|| format!("无法创建工作目录: {}", config.work_dir.display()))?;

    let provisioner = Provisioner::new(registry, CredentialStore::new(config.work_dir.clone()));
    info!("IoTProv 置备器初始化完成");
    Ok(provisioner)
}

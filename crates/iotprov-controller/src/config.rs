//! 配置管理模块
//!
//! 该模块负责加载置备引擎的配置文件，支持 YAML/JSON 格式。

use anyhow::{anyhow, Context, Result};
use config::{Config, File, FileFormat};
use iotprov_common::PolicyDocument;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// 置备引擎配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionerConfig {
    /// 工作目录，`credentials/` 与 `build/` 位于其下
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 角色别名配置
    #[serde(default)]
    pub role_alias: Option<RoleAliasConfig>,
    /// 覆盖核心设备的默认策略文档
    #[serde(default)]
    pub core_policy_document: Option<PolicyDocument>,
}

/// 角色别名配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAliasConfig {
    /// 服务角色 ARN
    pub service_role_arn: String,
    /// 别名
    pub alias: String,
}

fn default_work_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ProvisionerConfig {
    /// 核心设备使用的策略文档
    pub fn core_policy(&self) -> PolicyDocument {
        self.core_policy_document
            .clone()
            .unwrap_or_else(PolicyDocument::core_default)
    }
}

/// 配置管理器
pub struct ConfigManager {
    /// 配置文件路径
    config_path: PathBuf,
    /// 当前配置
    config: ProvisionerConfig,
}

impl ConfigManager {
    /// 创建新的配置管理器
    pub fn new(config_path: &str) -> Result<Self> {
        let config_path = PathBuf::from(config_path);

        // 加载配置文件
        let config = Self::load_config(&config_path)
            .context(format!("无法加载配置文件: {:?}", config_path))?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// 加载配置文件
    fn load_config(config_path: &Path) -> Result<ProvisionerConfig> {
        let config_file = config_path.to_str().ok_or_else(|| anyhow!("配置路径无效"))?;

        // 确定配置文件格式
        let format = match config_path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => return Err(anyhow!("不支持的配置文件格式，仅支持 YAML 或 JSON")),
        };

        let config = Config::builder()
            .add_source(File::new(config_file, format))
            .build()
            .context("构建配置失败")?;

        let provisioner_config = config
            .try_deserialize::<ProvisionerConfig>()
            .context("配置格式错误")?;

        debug!("从 {} 加载配置成功", config_file);
        Ok(provisioner_config)
    }

    /// 配置文件路径
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// 获取完整配置
    pub fn get_config(&self) -> &ProvisionerConfig {
        &self.config
    }
}

/// 创建默认配置
pub fn create_default_config() -> ProvisionerConfig {
    ProvisionerConfig {
        work_dir: default_work_dir(),
        log_level: default_log_level(),
        role_alias: None,
        core_policy_document: None,
    }
}

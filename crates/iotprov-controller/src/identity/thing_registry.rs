//! thing 注册模块
//!
//! 按名称创建或复用注册中心中的 thing 记录。

use iotprov_common::{AlreadyExistsReason, Error, RegistryError, Result, ThingIdentity, ThingName};
use std::sync::Arc;
use tracing::{debug, info};

use crate::registry::IotRegistry;

/// 创建 thing 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateThingOutcome {
    /// 新建，或以相同属性幂等地返回已有记录
    Created(String),
    /// 同名 thing 已存在但属性不同，已按名称查回 ARN
    ExistsWithConflict(String),
}

impl CreateThingOutcome {
    /// thing 的 ARN
    pub fn arn(&self) -> &str {
        match self {
            CreateThingOutcome::Created(arn) | CreateThingOutcome::ExistsWithConflict(arn) => arn,
        }
    }
}

/// thing 注册客户端
pub struct ThingRegistry {
    /// 注册中心
    registry: Arc<dyn IotRegistry>,
}

impl ThingRegistry {
    /// 创建新的 thing 注册客户端
    pub fn new(registry: Arc<dyn IotRegistry>) -> Self {
        Self { registry }
    }

    /// 创建 thing
    ///
    /// 标签冲突回退为按名称查询；其他"已存在"原因无法安全协调，
    /// 返回 [`Error::UnsupportedOperation`]。
    pub async fn create_thing(&self, name: &ThingName) -> Result<CreateThingOutcome> {
        match self.registry.create_thing(name.as_str()).await {
            Ok(arn) => {
                debug!(thing = %name, "thing 已创建: {}", arn);
                Ok(CreateThingOutcome::Created(arn))
            }
            Err(RegistryError::AlreadyExists {
                reason: AlreadyExistsReason::DifferentTags,
            }) => {
                info!(
                    "thing [{}] 已存在，但标签或属性不同（例如不可变属性），改为按名称查询",
                    name
                );
                let arn = self.registry.describe_thing(name.as_str()).await?;
                Ok(CreateThingOutcome::ExistsWithConflict(arn))
            }
            Err(RegistryError::AlreadyExists { reason }) => Err(Error::UnsupportedOperation(
                format!("thing [{}] 已存在且无法协调: {}", name, reason),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// 创建或获取 thing
    pub async fn create_or_get_thing(&self, name: &ThingName) -> Result<ThingIdentity> {
        let outcome = self.create_thing(name).await?;
        Ok(ThingIdentity {
            name: name.clone(),
            arn: outcome.arn().to_string(),
        })
    }

    /// 查询 thing 的 ARN，不存在时返回 `None`
    pub async fn get_thing_arn(&self, name: &str) -> Result<Option<String>> {
        match self.registry.describe_thing(name).await {
            Ok(arn) => Ok(Some(arn)),
            Err(RegistryError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询 thing 附加的第一个主体，没有主体时返回 `None`
    pub async fn get_thing_principal(&self, name: &str) -> Result<Option<String>> {
        let principals = self.registry.list_thing_principals(name).await?;
        Ok(principals.into_iter().next())
    }
}

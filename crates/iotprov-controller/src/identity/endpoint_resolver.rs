//! 端点解析模块
//!
//! 解析注册中心的数据平面端点和凭证提供方端点，并在解析器的生命周期内缓存结果。
//! 首个写入缓存的调用方胜出，并发的后来者丢弃自己的结果；端点查询没有副作用，
//! 因此竞争只会多一次远端调用。

use iotprov_common::Result;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{debug, info};

use crate::registry::{EndpointType, IotRegistry};

/// 端点解析器
pub struct EndpointResolver {
    /// 注册中心
    registry: Arc<dyn IotRegistry>,
    /// 默认数据平面端点
    data_endpoint: OnceCell<String>,
    /// 凭证提供方端点
    credential_provider_endpoint: OnceCell<String>,
}

impl EndpointResolver {
    /// 创建新的端点解析器
    pub fn new(registry: Arc<dyn IotRegistry>) -> Self {
        Self {
            registry,
            data_endpoint: OnceCell::new(),
            credential_provider_endpoint: OnceCell::new(),
        }
    }

    /// 默认数据平面端点
    pub async fn get_endpoint(&self) -> Result<String> {
        self.resolve(&self.data_endpoint, None).await
    }

    /// 凭证提供方端点
    pub async fn get_credential_provider_endpoint(&self) -> Result<String> {
        self.resolve(
            &self.credential_provider_endpoint,
            Some(EndpointType::CredentialProvider),
        )
        .await
    }

    async fn resolve(
        &self,
        cell: &OnceCell<String>,
        endpoint_type: Option<EndpointType>,
    ) -> Result<String> {
        if let Some(address) = cell.get() {
            return Ok(address.clone());
        }

        let address = self.registry.describe_endpoint(endpoint_type).await?;
        match cell.try_insert(address) {
            Ok(address) => {
                info!(
                    endpoint_type = endpoint_type.map_or("default", |t| t.as_str()),
                    "解析到端点: {}", address
                );
                Ok(address.clone())
            }
            Err((winner, discarded)) => {
                debug!("并发解析的端点 {} 被丢弃，使用 {}", discarded, winner);
                Ok(winner.clone())
            }
        }
    }
}

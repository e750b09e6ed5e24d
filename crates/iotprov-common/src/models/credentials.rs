//! 密钥与证书模型
//!
//! 证书一经签发即不可变，只会被创建、激活或被新证书取代。
//! 私钥只存在于本地文件和签发时的响应中，注册中心不会再次返回私钥。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// 当前本地缓存格式版本
pub const CREDENTIAL_SCHEMA_VERSION: u32 = 1;

/// 设备密钥对（PEM 格式）
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    /// 公钥
    pub public_key: String,
    /// 私钥
    pub private_key: String,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// 注册中心签发的密钥与证书
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeysAndCertificate {
    /// 证书 ID
    pub certificate_id: String,
    /// 证书 ARN
    pub certificate_arn: String,
    /// 证书（PEM 格式）
    pub certificate_pem: String,
    /// 密钥对
    pub key_pair: KeyPair,
}

fn legacy_schema_version() -> u32 {
    1
}

/// 本地缓存记录
///
/// 缓存只是建议性的，记录所引用的证书在注册中心仍然存在时才可信。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    /// 缓存格式版本，缺省视为 1
    #[serde(default = "legacy_schema_version")]
    pub schema_version: u32,
    /// 写入时间
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    /// 密钥与证书
    #[serde(flatten)]
    pub keys: KeysAndCertificate,
}

impl CredentialRecord {
    /// 以当前版本和时间包装新签发的证书
    pub fn new(keys: KeysAndCertificate) -> Self {
        Self {
            schema_version: CREDENTIAL_SCHEMA_VERSION,
            saved_at: Some(Utc::now()),
            keys,
        }
    }

    /// 序列化为缓存文件内容
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// 从缓存文件内容反序列化
    ///
    /// 版本高于当前实现的记录无法安全解读，返回序列化错误。
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let record: CredentialRecord = serde_json::from_slice(bytes)
            .map_err(|e| Error::Serialization(format!("无法解析凭证缓存: {}", e)))?;

        if record.schema_version > CREDENTIAL_SCHEMA_VERSION {
            return Err(Error::Serialization(format!(
                "凭证缓存版本 {} 高于支持的版本 {}",
                record.schema_version, CREDENTIAL_SCHEMA_VERSION
            )));
        }

        Ok(record)
    }
}

//! 本地凭证存储
//!
//! 在工作目录下按 `(groupId, subName)` 寻址保存序列化的凭证记录，
//! 并把设备私钥和证书写入 `build/` 目录。目录布局需与历次运行保持一致：
//!
//! - `credentials/<groupId>/<subName>.createKeysAndCertificate.serialized`
//! - `build/<deviceName>.pem.key`
//! - `build/<deviceName>.pem.crt`

use iotprov_common::{CredentialRecord, Error, KeysAndCertificate, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

/// 凭证缓存目录
pub const CREDENTIALS_DIR: &str = "credentials";

/// 设备文件输出目录
pub const BUILD_DIR: &str = "build";

/// 缓存文件后缀
const CACHE_SUFFIX: &str = ".createKeysAndCertificate.serialized";

/// 写出的设备文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFiles {
    /// 私钥文件
    pub private_key_path: PathBuf,
    /// 证书文件
    pub certificate_path: PathBuf,
}

/// 本地凭证存储
#[derive(Debug, Clone)]
pub struct CredentialStore {
    /// 工作目录
    root: PathBuf,
}

/// 路径片段不能为空，也不能跳出所在目录
fn validate_component(kind: &str, value: &str) -> Result<()> {
    if value.is_empty() || value == "." || value == ".." || value.contains(&['/', '\\'][..]) {
        return Err(Error::Validation(format!("无效的{}: {:?}", kind, value)));
    }
    Ok(())
}

impl CredentialStore {
    /// 以指定工作目录创建凭证存储
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 工作目录
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 组的凭证缓存目录
    pub fn credentials_dir(&self, group_id: &str) -> Result<PathBuf> {
        validate_component("组 ID", group_id)?;
        Ok(self.root.join(CREDENTIALS_DIR).join(group_id))
    }

    /// 缓存条目路径
    pub fn entry_path(&self, group_id: &str, sub_name: &str) -> Result<PathBuf> {
        validate_component("子名称", sub_name)?;
        Ok(self
            .credentials_dir(group_id)?
            .join(format!("{}{}", sub_name, CACHE_SUFFIX)))
    }

    /// 确保组的缓存目录存在
    pub async fn ensure_group_dir(&self, group_id: &str) -> Result<PathBuf> {
        let dir = self.credentials_dir(group_id)?;
        fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// 缓存条目是否存在
    pub async fn exists(&self, group_id: &str, sub_name: &str) -> Result<bool> {
        let path = self.entry_path(group_id, sub_name)?;
        Ok(fs::try_exists(&path).await?)
    }

    /// 读取缓存条目，不存在时返回 `None`
    pub async fn load(&self, group_id: &str, sub_name: &str) -> Result<Option<CredentialRecord>> {
        let path = self.entry_path(group_id, sub_name)?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record = CredentialRecord::from_bytes(&bytes)?;
        debug!("从 {} 读取凭证缓存", path.display());
        Ok(Some(record))
    }

    /// 写入（或覆盖）缓存条目
    pub async fn save(&self, group_id: &str, sub_name: &str, record: &CredentialRecord) -> Result<PathBuf> {
        self.ensure_group_dir(group_id).await?;
        let path = self.entry_path(group_id, sub_name)?;
        write_private(&path, &record.to_bytes()?).await?;
        debug!("凭证缓存已写入 {}", path.display());
        Ok(path)
    }

    /// 写出设备私钥与证书
    pub async fn write_device_files(&self, device_name: &str, keys: &KeysAndCertificate) -> Result<DeviceFiles> {
        validate_component("设备名称", device_name)?;
        let build_dir = self.root.join(BUILD_DIR);
        fs::create_dir_all(&build_dir).await?;

        let files = DeviceFiles {
            private_key_path: build_dir.join(format!("{}.pem.key", device_name)),
            certificate_path: build_dir.join(format!("{}.pem.crt", device_name)),
        };

        write_private(&files.private_key_path, keys.key_pair.private_key.as_bytes()).await?;
        fs::write(&files.certificate_path, keys.certificate_pem.as_bytes()).await?;

        Ok(files)
    }
}

/// 写入仅属主可读写的文件
///
/// 先写同目录下的临时文件并落盘，再改名覆盖目标。中途失败时目标保持原样，
/// 覆盖后的文件总是新建的，权限不受旧文件影响。
async fn write_private(path: &Path, contents: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::Validation(format!("无效的文件路径: {}", path.display())))?;
    let mut tmp_name = OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(format!(".{}.tmp", Uuid::new_v4().simple()));
    let tmp_path = path.with_file_name(tmp_name);

    if let Err(e) = write_synced(&tmp_path, contents).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e);
    }
    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e.into());
    }
    Ok(())
}

async fn write_synced(path: &Path, contents: &[u8]) -> Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(contents).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}

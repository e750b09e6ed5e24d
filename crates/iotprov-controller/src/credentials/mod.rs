//! 凭证管理模块
//!
//! 该模块负责设备密钥对与证书的签发、复用，以及本地缓存和设备文件的读写。

mod credential_store;
mod credential_vault;

pub use credential_store::{CredentialStore, DeviceFiles, BUILD_DIR, CREDENTIALS_DIR};
pub use credential_vault::{CredentialSource, CredentialVault, ProvisionedCredentials};

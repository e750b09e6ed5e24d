//! 角色别名模块
//!
//! 该模块以"删除后重建"的方式维护绑定到服务角色的角色别名，
//! 供设备通过凭证提供方端点换取临时凭证。

mod role_alias_manager;

pub use role_alias_manager::RoleAliasManager;

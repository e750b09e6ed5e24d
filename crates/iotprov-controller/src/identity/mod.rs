//! 身份管理模块
//!
//! 该模块负责注册中心中 thing 身份的创建与查询，以及注册中心端点的解析。

mod endpoint_resolver;
mod thing_registry;

pub use endpoint_resolver::EndpointResolver;
pub use thing_registry::{CreateThingOutcome, ThingRegistry};

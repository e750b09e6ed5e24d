//! 策略管理模块
//!
//! 该模块负责访问策略的幂等创建，以及证书与策略、thing 之间的附加关系。

mod policy_manager;

pub use policy_manager::{PolicyManager, PolicyOutcome};

//! 日志初始化

use tracing_subscriber::EnvFilter;

/// 安装全局 fmt 日志订阅者
///
/// `RUST_LOG` 优先于传入的级别。重复调用不会报错，保留最先安装的订阅者。
pub fn init_logging(level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_is_noop() {
        init_logging("debug");
        assert!(!init_logging("info"));
        tracing::info!("日志订阅者仍可用");
    }
}

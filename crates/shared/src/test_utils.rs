//! 测试工具模块
//!
//! 提供集成测试和基准测试共用的辅助函数。

use std::sync::Once;

use crate::config::EngineConfig;

static TRACING: Once = Once::new();

/// 为测试安装 tracing 订阅者（只安装一次，输出交给测试框架捕获）
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// 开启评估追踪的引擎配置
pub fn traced_engine_config() -> EngineConfig {
    EngineConfig {
        trace_enabled: true,
        ..Default::default()
    }
}

/// 限制解析深度的引擎配置
pub fn shallow_engine_config(max_resolution_depth: usize) -> EngineConfig {
    EngineConfig {
        max_resolution_depth,
        ..Default::default()
    }
}

//! 共享库
//!
//! 规则引擎及其宿主共用的配置加载、日志初始化和测试辅助代码。

pub mod config;
pub mod observability;
pub mod test_utils;

//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;

use crate::observability::ObservabilityConfig;

/// 变量解析链的默认最大深度
pub const DEFAULT_MAX_RESOLUTION_DEPTH: usize = 64;

/// 规则引擎配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// 单次变量解析允许经过的最大变量数（防止过深的默认值链）
    pub max_resolution_depth: usize,
    /// 是否在规则集执行结果中记录评估追踪
    pub trace_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_resolution_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
            trace_enabled: false,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub engine: EngineConfig,
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: "ruler".to_string(),
            environment: "development".to_string(),
            engine: EngineConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. config/{service_name}.toml（服务特定配置）
    /// 4. 环境变量（RULER_ 前缀，双下划线分隔层级，如 RULER_ENGINE__TRACE_ENABLED -> engine.trace_enabled）
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("RULER_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env.clone())?
            .add_source(File::from(Path::new(&config_dir).join("default.toml")).required(false))
            .add_source(
                File::from(Path::new(&config_dir).join(format!("{}.toml", env))).required(false),
            )
            .add_source(
                File::from(Path::new(&config_dir).join(format!("{}.toml", service_name)))
                    .required(false),
            )
            .add_source(
                Environment::with_prefix("RULER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// 从 TOML 文本加载配置（未出现的字段使用默认值）
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.engine.max_resolution_depth, DEFAULT_MAX_RESOLUTION_DEPTH);
        assert!(!config.engine.trace_enabled);
        assert_eq!(config.observability.log_level, "info");
        assert!(!config.is_production());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = AppConfig::from_toml(
            r#"
            environment = "production"

            [engine]
            trace_enabled = true
            "#,
        )
        .unwrap();

        assert!(config.is_production());
        assert!(config.engine.trace_enabled);
        // 未配置的字段回落到默认值
        assert_eq!(config.engine.max_resolution_depth, DEFAULT_MAX_RESOLUTION_DEPTH);
        assert_eq!(config.service_name, "ruler");
    }

    #[test]
    fn test_from_toml_observability() {
        let config = AppConfig::from_toml(
            r#"
            [observability]
            log_level = "debug"
            json_logs = true
            "#,
        )
        .unwrap();

        assert_eq!(config.observability.log_level, "debug");
        assert!(config.observability.json_logs);
    }

    #[test]
    fn test_from_toml_rejects_bad_type() {
        let result = AppConfig::from_toml(
            r#"
            [engine]
            max_resolution_depth = "deep"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_without_files_uses_defaults() {
        // SAFETY: 测试中仅设置一个不存在的配置目录
        unsafe {
            std::env::set_var("CONFIG_DIR", "/nonexistent-ruler-config");
        }
        let config = AppConfig::load("ruler-test").unwrap();
        assert_eq!(config.service_name, "ruler-test");
        unsafe {
            std::env::remove_var("CONFIG_DIR");
        }
    }
}

//! 规则引擎错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("变量未定义: {0}")]
    UndefinedVariable(String),

    #[error("类型不匹配: 期望 {expected}, 实际 {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("操作数数量无效: {operator} 需要 {expected} 个操作数, 实际 {actual} 个")]
    InvalidOperandCount {
        operator: String,
        expected: String,
        actual: usize,
    },

    #[error("不支持的操作: {0}")]
    InvalidOperation(String),

    #[error("无效的参数: {0}")]
    InvalidArgument(String),

    #[error("变量循环引用: {0}")]
    CyclicReference(String),

    #[error("变量解析深度超过上限 {0}")]
    ResolutionDepthExceeded(usize),

    #[error("算术错误: {0}")]
    Arithmetic(String),

    #[error("无效的正则表达式 '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("JSON 序列化错误: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RuleError>;

impl RuleError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::UndefinedVariable(_) => "UNDEFINED_VARIABLE",
            Self::TypeMismatch { .. } => "TYPE_MISMATCH",
            Self::InvalidOperandCount { .. } => "INVALID_OPERAND_COUNT",
            Self::InvalidOperation(_) => "INVALID_OPERATION",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::CyclicReference(_) => "CYCLIC_REFERENCE",
            Self::ResolutionDepthExceeded(_) => "RESOLUTION_DEPTH_EXCEEDED",
            Self::Arithmetic(_) => "ARITHMETIC_ERROR",
            Self::InvalidPattern { .. } => "INVALID_PATTERN",
            Self::JsonError(_) => "JSON_ERROR",
        }
    }
}

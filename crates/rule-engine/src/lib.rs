//! 可嵌入的规则引擎
//!
//! 宿主一次性声明变量、比较/逻辑操作符和复合命题，运行时针对给定上下文求值：
//! - 变量延迟解析：上下文条目优先，其次默认值（可为另一个操作数）
//! - 显式的宽松相等、严格同一与排序语义
//! - AND/OR 短路求值
//! - 规则命中时调用宿主动作，规则集按声明顺序共享上下文

pub mod context;
pub mod error;
pub mod operand;
pub mod operators;
pub mod rule;
pub mod value;
pub mod variable;

pub use context::{Context, Entry};
pub use error::{Result, RuleError};
pub use operand::{Argument, Operand};
pub use operators::{
    Comparison, ComparisonOperator, Expression, LogicalGroup, LogicalOperator, Proposition,
    ValueOperator,
};
pub use rule::{Action, EvaluationResult, Rule, RuleSet};
pub use value::{Datum, Number, Value};
pub use variable::Variable;

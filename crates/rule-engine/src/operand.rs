//! 变量操作数
//!
//! 任何在给定上下文中可解析为 `Value` 的节点：终端值、变量或值运算符。

use crate::context::Context;
use crate::error::{Result, RuleError};
use crate::operators::Expression;
use crate::value::{Datum, Value};
use crate::variable::Variable;
use std::sync::Arc;
use tracing::trace;

/// 可解析为终端值的操作数
#[derive(Debug, Clone)]
pub enum Operand {
    Value(Value),
    Variable(Variable),
    Operator(Arc<Expression>),
}

impl Operand {
    /// 在上下文中解析为终端值
    pub fn prepare_value(&self, context: &Context) -> Result<Value> {
        let mut resolver = Resolver::new(context.max_resolution_depth());
        self.resolve(context, &mut resolver)
    }

    pub(crate) fn resolve(&self, context: &Context, resolver: &mut Resolver) -> Result<Value> {
        match self {
            Self::Value(value) => Ok(value.clone()),
            Self::Variable(variable) => variable.resolve(context, resolver),
            Self::Operator(expression) => expression.resolve(context, resolver),
        }
    }
}

impl Default for Operand {
    fn default() -> Self {
        Self::Value(Value::null())
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Variable> for Operand {
    fn from(variable: Variable) -> Self {
        Self::Variable(variable)
    }
}

impl From<&Variable> for Operand {
    fn from(variable: &Variable) -> Self {
        Self::Variable(variable.clone())
    }
}

impl From<Expression> for Operand {
    fn from(expression: Expression) -> Self {
        Self::Operator(Arc::new(expression))
    }
}

impl From<Arc<Expression>> for Operand {
    fn from(expression: Arc<Expression>) -> Self {
        Self::Operator(expression)
    }
}

/// 流式构造时传入的参数：原始数据或已有的操作数
///
/// 原始数据会被包装成与接收者同类的匿名变量，操作数原样使用。
#[derive(Debug, Clone)]
pub enum Argument {
    Raw(Datum),
    Operand(Operand),
}

impl Argument {
    /// 原始数据直接包装为终端值
    pub fn into_operand(self) -> Operand {
        match self {
            Self::Raw(datum) => Operand::Value(Value::new(datum)),
            Self::Operand(operand) => operand,
        }
    }
}

macro_rules! impl_argument_from_raw {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Argument {
                fn from(raw: $ty) -> Self {
                    Self::Raw(Datum::from(raw))
                }
            }
        )*
    };
}

impl_argument_from_raw!(bool, i32, i64, u32, u64, f64, &str, String, Datum, Vec<Datum>);

impl From<Operand> for Argument {
    fn from(operand: Operand) -> Self {
        Self::Operand(operand)
    }
}

impl From<Value> for Argument {
    fn from(value: Value) -> Self {
        Self::Operand(Operand::Value(value))
    }
}

impl From<Variable> for Argument {
    fn from(variable: Variable) -> Self {
        Self::Operand(Operand::Variable(variable))
    }
}

impl From<&Variable> for Argument {
    fn from(variable: &Variable) -> Self {
        Self::Operand(Operand::Variable(variable.clone()))
    }
}

impl From<Expression> for Argument {
    fn from(expression: Expression) -> Self {
        Self::Operand(Operand::from(expression))
    }
}

/// 单次解析的状态：当前正在解析的变量链
///
/// 链上出现重复变量即为循环引用；链长超过上限即终止解析。
/// 链持有变量的克隆，解析期间变量不会被释放，标识不会被复用。
#[derive(Debug)]
pub(crate) struct Resolver {
    chain: Vec<Variable>,
    max_depth: usize,
}

impl Resolver {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            chain: Vec::new(),
            max_depth,
        }
    }

    pub(crate) fn enter(&mut self, variable: &Variable) -> Result<()> {
        if self.chain.iter().any(|entered| entered.ptr_eq(variable)) {
            trace!(variable = %variable.path(), depth = self.chain.len(), "检测到循环引用");
            return Err(RuleError::CyclicReference(variable.path()));
        }
        if self.chain.len() >= self.max_depth {
            return Err(RuleError::ResolutionDepthExceeded(self.max_depth));
        }
        self.chain.push(variable.clone());
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.chain.pop();
    }
}

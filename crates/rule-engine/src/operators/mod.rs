//! 操作符
//!
//! - 比较操作符：对两个操作数求值后应用 `Value` 的谓词
//! - 逻辑操作符：组合多个命题，AND/OR 短路求值
//! - 值运算符：算术和集合运算，结果可作为其他操作符的操作数

mod comparison;
mod expression;
mod logical;

pub use comparison::{Comparison, ComparisonOperator};
pub use expression::{Expression, ValueOperator};
pub use logical::{LogicalGroup, LogicalOperator};

use crate::context::Context;
use crate::error::Result;
use std::sync::Arc;

/// 命题：在上下文中求值为布尔结果的节点
#[cfg_attr(test, mockall::automock)]
pub trait Proposition: Send + Sync {
    fn evaluate(&self, context: &Context) -> Result<bool>;
}

impl<P: Proposition + ?Sized> Proposition for Arc<P> {
    fn evaluate(&self, context: &Context) -> Result<bool> {
        (**self).evaluate(context)
    }
}

impl<P: Proposition + ?Sized> Proposition for Box<P> {
    fn evaluate(&self, context: &Context) -> Result<bool> {
        (**self).evaluate(context)
    }
}

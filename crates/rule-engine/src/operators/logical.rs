//! 逻辑操作符
//!
//! AND/OR 从左到右短路求值；XOR 需要所有操作数的奇偶性，因此总是全部求值。

use super::Proposition;
use crate::context::Context;
use crate::error::{Result, RuleError};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// 逻辑操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
    Not,
    Xor,
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
            Self::Not => write!(f, "NOT"),
            Self::Xor => write!(f, "XOR"),
        }
    }
}

/// 逻辑组节点
#[derive(Clone)]
pub struct LogicalGroup {
    operator: LogicalOperator,
    operands: Vec<Arc<dyn Proposition>>,
}

impl LogicalGroup {
    /// 构造逻辑组，NOT 必须恰好一个操作数
    pub fn new(operator: LogicalOperator, operands: Vec<Arc<dyn Proposition>>) -> Result<Self> {
        if operator == LogicalOperator::Not && operands.len() != 1 {
            return Err(RuleError::InvalidOperandCount {
                operator: operator.to_string(),
                expected: "1".to_string(),
                actual: operands.len(),
            });
        }

        Ok(Self { operator, operands })
    }

    pub fn and(operands: Vec<Arc<dyn Proposition>>) -> Self {
        Self {
            operator: LogicalOperator::And,
            operands,
        }
    }

    pub fn or(operands: Vec<Arc<dyn Proposition>>) -> Self {
        Self {
            operator: LogicalOperator::Or,
            operands,
        }
    }

    pub fn xor(operands: Vec<Arc<dyn Proposition>>) -> Self {
        Self {
            operator: LogicalOperator::Xor,
            operands,
        }
    }

    pub fn not(operands: Vec<Arc<dyn Proposition>>) -> Result<Self> {
        Self::new(LogicalOperator::Not, operands)
    }

    /// 单个命题取反
    pub fn negate(operand: impl Proposition + 'static) -> Self {
        Self {
            operator: LogicalOperator::Not,
            operands: vec![Arc::new(operand)],
        }
    }

    pub fn operator(&self) -> LogicalOperator {
        self.operator
    }

    pub fn operands(&self) -> &[Arc<dyn Proposition>] {
        &self.operands
    }
}

impl Proposition for LogicalGroup {
    fn evaluate(&self, context: &Context) -> Result<bool> {
        match self.operator {
            LogicalOperator::And => {
                // AND: 遇到 false 立即返回
                for (i, operand) in self.operands.iter().enumerate() {
                    if !operand.evaluate(context)? {
                        trace!(operand = i, total = self.operands.len(), "AND 短路");
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            LogicalOperator::Or => {
                // OR: 遇到 true 立即返回
                for (i, operand) in self.operands.iter().enumerate() {
                    if operand.evaluate(context)? {
                        trace!(operand = i, total = self.operands.len(), "OR 短路");
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            LogicalOperator::Not => match self.operands.first() {
                Some(operand) => Ok(!operand.evaluate(context)?),
                None => Err(RuleError::InvalidOperandCount {
                    operator: self.operator.to_string(),
                    expected: "1".to_string(),
                    actual: 0,
                }),
            },
            LogicalOperator::Xor => {
                let mut parity = false;
                for operand in &self.operands {
                    parity ^= operand.evaluate(context)?;
                }
                Ok(parity)
            }
        }
    }
}

impl fmt::Debug for LogicalGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogicalGroup")
            .field("operator", &self.operator)
            .field("operands", &self.operands.len())
            .finish()
    }
}

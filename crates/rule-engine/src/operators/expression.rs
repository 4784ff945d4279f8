//! 值运算符
//!
//! 算术与集合运算，求值结果是终端值，可嵌套在比较操作符中使用。

use crate::context::Context;
use crate::error::{Result, RuleError};
use crate::operand::{Operand, Resolver};
use crate::value::{Datum, Number, Value, loose_eq};
use std::cmp::Ordering;
use std::fmt;

/// 值运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueOperator {
    // 算术（二元）
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Modulo,

    // 算术（一元）
    Negation,

    // 集合聚合（一元）
    Min,
    Max,

    // 集合运算（至少一个操作数）
    Union,
    Intersect,
}

impl ValueOperator {
    fn check_arity(self, actual: usize) -> Result<()> {
        let (valid, expected) = match self {
            Self::Addition
            | Self::Subtraction
            | Self::Multiplication
            | Self::Division
            | Self::Modulo => (actual == 2, "2"),
            Self::Negation | Self::Min | Self::Max => (actual == 1, "1"),
            Self::Union | Self::Intersect => (actual >= 1, "at least 1"),
        };

        if valid {
            Ok(())
        } else {
            Err(RuleError::InvalidOperandCount {
                operator: self.to_string(),
                expected: expected.to_string(),
                actual,
            })
        }
    }
}

impl fmt::Display for ValueOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Addition => "addition",
            Self::Subtraction => "subtraction",
            Self::Multiplication => "multiplication",
            Self::Division => "division",
            Self::Modulo => "modulo",
            Self::Negation => "negation",
            Self::Min => "min",
            Self::Max => "max",
            Self::Union => "union",
            Self::Intersect => "intersect",
        };
        write!(f, "{}", s)
    }
}

/// 值运算节点
#[derive(Debug, Clone)]
pub struct Expression {
    operator: ValueOperator,
    operands: Vec<Operand>,
}

impl Expression {
    pub fn new(operator: ValueOperator, operands: Vec<Operand>) -> Result<Self> {
        operator.check_arity(operands.len())?;
        Ok(Self { operator, operands })
    }

    fn binary(operator: ValueOperator, left: impl Into<Operand>, right: impl Into<Operand>) -> Self {
        Self {
            operator,
            operands: vec![left.into(), right.into()],
        }
    }

    fn unary(operator: ValueOperator, operand: impl Into<Operand>) -> Self {
        Self {
            operator,
            operands: vec![operand.into()],
        }
    }

    pub fn addition(left: impl Into<Operand>, right: impl Into<Operand>) -> Self {
        Self::binary(ValueOperator::Addition, left, right)
    }

    pub fn subtraction(left: impl Into<Operand>, right: impl Into<Operand>) -> Self {
        Self::binary(ValueOperator::Subtraction, left, right)
    }

    pub fn multiplication(left: impl Into<Operand>, right: impl Into<Operand>) -> Self {
        Self::binary(ValueOperator::Multiplication, left, right)
    }

    pub fn division(left: impl Into<Operand>, right: impl Into<Operand>) -> Self {
        Self::binary(ValueOperator::Division, left, right)
    }

    pub fn modulo(left: impl Into<Operand>, right: impl Into<Operand>) -> Self {
        Self::binary(ValueOperator::Modulo, left, right)
    }

    pub fn negation(operand: impl Into<Operand>) -> Self {
        Self::unary(ValueOperator::Negation, operand)
    }

    pub fn min(operand: impl Into<Operand>) -> Self {
        Self::unary(ValueOperator::Min, operand)
    }

    pub fn max(operand: impl Into<Operand>) -> Self {
        Self::unary(ValueOperator::Max, operand)
    }

    pub fn operator(&self) -> ValueOperator {
        self.operator
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    /// 在上下文中求值
    pub fn prepare_value(&self, context: &Context) -> Result<Value> {
        let mut resolver = Resolver::new(context.max_resolution_depth());
        self.resolve(context, &mut resolver)
    }

    pub(crate) fn resolve(&self, context: &Context, resolver: &mut Resolver) -> Result<Value> {
        let values = self
            .operands
            .iter()
            .map(|operand| operand.resolve(context, resolver))
            .collect::<Result<Vec<_>>>()?;

        match self.operator {
            ValueOperator::Addition
            | ValueOperator::Subtraction
            | ValueOperator::Multiplication
            | ValueOperator::Division
            | ValueOperator::Modulo => {
                let a = Self::number(&values[0])?;
                let b = Self::number(&values[1])?;
                Self::arithmetic(self.operator, a, b).map(|n| Value::new(n.into_datum()))
            }
            ValueOperator::Negation => {
                let number = Self::number(&values[0])?;
                let negated = match number.as_integer() {
                    Some(i) => Number::from_integer(-i).unwrap_or(Number::Float(-number.as_f64())),
                    None => Number::Float(-number.as_f64()),
                };
                Ok(Value::new(negated.into_datum()))
            }
            ValueOperator::Min => Self::extreme(&values[0], Ordering::Less),
            ValueOperator::Max => Self::extreme(&values[0], Ordering::Greater),
            ValueOperator::Union => Ok(Self::union(&values)),
            ValueOperator::Intersect => Ok(Self::intersect(&values)),
        }
    }

    fn number(value: &Value) -> Result<Number> {
        value.as_number().ok_or_else(|| RuleError::TypeMismatch {
            expected: "number".to_string(),
            actual: value.type_name().to_string(),
        })
    }

    /// 整数运算溢出或不能整除时退化为浮点运算
    fn arithmetic(operator: ValueOperator, a: Number, b: Number) -> Result<Number> {
        if matches!(operator, ValueOperator::Division | ValueOperator::Modulo) && b.as_f64() == 0.0
        {
            return Err(RuleError::Arithmetic(format!("{} 除数为零", operator)));
        }

        if let (Some(x), Some(y)) = (a.as_integer(), b.as_integer()) {
            let exact = match operator {
                ValueOperator::Addition => x.checked_add(y),
                ValueOperator::Subtraction => x.checked_sub(y),
                ValueOperator::Multiplication => x.checked_mul(y),
                ValueOperator::Division => x.checked_rem(y).filter(|r| *r == 0).and(x.checked_div(y)),
                ValueOperator::Modulo => x.checked_rem(y),
                _ => None,
            };
            if let Some(result) = exact.and_then(Number::from_integer) {
                return Ok(result);
            }
        }

        let (x, y) = (a.as_f64(), b.as_f64());
        let result = match operator {
            ValueOperator::Addition => x + y,
            ValueOperator::Subtraction => x - y,
            ValueOperator::Multiplication => x * y,
            ValueOperator::Division => x / y,
            ValueOperator::Modulo => x % y,
            _ => {
                return Err(RuleError::InvalidOperation(format!(
                    "{} 不是二元算术运算符",
                    operator
                )));
            }
        };

        if result.is_finite() {
            Ok(Number::Float(result))
        } else {
            Err(RuleError::Arithmetic(format!("{} 结果溢出", operator)))
        }
    }

    /// 集合中的最小/最大元素，空集合返回 null
    fn extreme(value: &Value, wanted: Ordering) -> Result<Value> {
        let mut best: Option<Value> = None;
        for item in value.as_set() {
            let candidate = Value::new(item.clone());
            best = match best {
                Some(current) if candidate.compare(&current)? != wanted => Some(current),
                _ => Some(candidate),
            };
        }
        Ok(best.unwrap_or_default())
    }

    /// 所有集合的并集，按首次出现的顺序去重（严格同一）
    fn union(values: &[Value]) -> Value {
        let mut items: Vec<Datum> = Vec::new();
        for value in values {
            for item in value.as_set() {
                if !items.contains(item) {
                    items.push(item.clone());
                }
            }
        }
        Value::new(Datum::Array(items))
    }

    /// 第一个集合中同时（宽松相等地）出现在其余所有集合里的元素
    fn intersect(values: &[Value]) -> Value {
        let Some((first, rest)) = values.split_first() else {
            return Value::new(Datum::Array(Vec::new()));
        };

        let mut items: Vec<Datum> = Vec::new();
        for item in first.as_set() {
            let shared = rest
                .iter()
                .all(|other| other.as_set().iter().any(|o| loose_eq(o, item)));
            if shared && !items.contains(item) {
                items.push(item.clone());
            }
        }
        Value::new(Datum::Array(items))
    }
}

//! 比较操作符

use super::Proposition;
use crate::context::Context;
use crate::error::{Result, RuleError};
use crate::operand::Operand;
use crate::value::Value;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;

/// 比较操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    // 排序比较
    GreaterThan,
    GreaterThanOrEqualTo,
    LessThan,
    LessThanOrEqualTo,

    // 相等比较
    EqualTo,
    NotEqualTo,
    SameAs,
    NotSameAs,

    // 集合包含
    ContainsSubset,
    DoesNotContainSubset,

    // 字符串操作
    StartsWith,
    EndsWith,
    StringContains,
    Matches,
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::GreaterThan => "greater_than",
            Self::GreaterThanOrEqualTo => "greater_than_or_equal_to",
            Self::LessThan => "less_than",
            Self::LessThanOrEqualTo => "less_than_or_equal_to",
            Self::EqualTo => "equal_to",
            Self::NotEqualTo => "not_equal_to",
            Self::SameAs => "same_as",
            Self::NotSameAs => "not_same_as",
            Self::ContainsSubset => "contains_subset",
            Self::DoesNotContainSubset => "does_not_contain_subset",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::StringContains => "string_contains",
            Self::Matches => "matches",
        };
        write!(f, "{}", s)
    }
}

/// 二元比较节点
#[derive(Debug, Clone)]
pub struct Comparison {
    operator: ComparisonOperator,
    left: Operand,
    right: Operand,
}

impl Comparison {
    pub fn new(
        operator: ComparisonOperator,
        left: impl Into<Operand>,
        right: impl Into<Operand>,
    ) -> Self {
        Self {
            operator,
            left: left.into(),
            right: right.into(),
        }
    }

    /// 从操作数列表构造，必须恰好两个操作数
    pub fn from_operands(operator: ComparisonOperator, operands: Vec<Operand>) -> Result<Self> {
        let actual = operands.len();
        let [left, right]: [Operand; 2] =
            operands
                .try_into()
                .map_err(|_| RuleError::InvalidOperandCount {
                    operator: operator.to_string(),
                    expected: "2".to_string(),
                    actual,
                })?;
        Ok(Self::new(operator, left, right))
    }

    pub fn operator(&self) -> ComparisonOperator {
        self.operator
    }

    pub fn left(&self) -> &Operand {
        &self.left
    }

    pub fn right(&self) -> &Operand {
        &self.right
    }

    /// 对已解析的两个值应用谓词
    pub fn apply(operator: ComparisonOperator, left: &Value, right: &Value) -> Result<bool> {
        use ComparisonOperator::*;

        let matched = match operator {
            GreaterThan => left.compare(right)? == Ordering::Greater,
            GreaterThanOrEqualTo => left.compare(right)? != Ordering::Less,
            LessThan => left.compare(right)? == Ordering::Less,
            LessThanOrEqualTo => left.compare(right)? != Ordering::Greater,
            EqualTo => left.equals(right),
            NotEqualTo => !left.equals(right),
            SameAs => left.identical_to(right),
            NotSameAs => !left.identical_to(right),
            ContainsSubset => left.contains_subset(right),
            DoesNotContainSubset => !left.contains_subset(right),
            StartsWith => Self::strings(left, right).is_some_and(|(s, p)| s.starts_with(p)),
            EndsWith => Self::strings(left, right).is_some_and(|(s, p)| s.ends_with(p)),
            StringContains => Self::strings(left, right).is_some_and(|(s, p)| s.contains(p)),
            Matches => match Self::strings(left, right) {
                Some((s, pattern)) => Self::regex_match(s, pattern)?,
                None => false,
            },
        };

        Ok(matched)
    }

    /// 两侧都是字符串时返回字符串对
    fn strings<'a>(left: &'a Value, right: &'a Value) -> Option<(&'a str, &'a str)> {
        Some((left.as_str()?, right.as_str()?))
    }

    fn regex_match(s: &str, pattern: &str) -> Result<bool> {
        let regex = Regex::new(pattern).map_err(|e| RuleError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(regex.is_match(s))
    }
}

impl Proposition for Comparison {
    fn evaluate(&self, context: &Context) -> Result<bool> {
        let left = self.left.prepare_value(context)?;
        let right = self.right.prepare_value(context)?;
        Self::apply(self.operator, &left, &right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Datum;
    use crate::variable::Variable;
    use serde_json::json;

    fn values(left: Datum, right: Datum) -> Comparison {
        Comparison::new(
            ComparisonOperator::EqualTo,
            Value::new(left),
            Value::new(right),
        )
    }

    fn eval(operator: ComparisonOperator, left: Datum, right: Datum) -> Result<bool> {
        Comparison::new(operator, Value::new(left), Value::new(right)).evaluate(&Context::new())
    }

    #[test]
    fn test_greater_than_numeric_coercive() {
        assert!(eval(ComparisonOperator::GreaterThan, json!(5), json!("3")).unwrap());
        assert!(!eval(ComparisonOperator::GreaterThan, json!(3), json!(3)).unwrap());
        assert!(eval(ComparisonOperator::GreaterThanOrEqualTo, json!(3), json!(3.0)).unwrap());
        assert!(eval(ComparisonOperator::LessThan, json!("a"), json!("b")).unwrap());
        assert!(eval(ComparisonOperator::LessThanOrEqualTo, json!(2), json!(2)).unwrap());
    }

    #[test]
    fn test_ordering_type_mismatch() {
        let err = eval(ComparisonOperator::GreaterThan, json!([1]), json!(0)).unwrap_err();
        assert_eq!(err.code(), "TYPE_MISMATCH");
    }

    #[test]
    fn test_equal_vs_same() {
        assert!(eval(ComparisonOperator::EqualTo, json!("1"), json!(1)).unwrap());
        assert!(!eval(ComparisonOperator::SameAs, json!("1"), json!(1)).unwrap());
        assert!(eval(ComparisonOperator::SameAs, json!("1"), json!("1")).unwrap());
        assert!(eval(ComparisonOperator::NotSameAs, json!("1"), json!(1)).unwrap());
        assert!(!eval(ComparisonOperator::NotEqualTo, json!("1"), json!(1)).unwrap());
    }

    #[test]
    fn test_subset() {
        assert!(eval(ComparisonOperator::ContainsSubset, json!([1, 2, 3]), json!([])).unwrap());
        assert!(eval(ComparisonOperator::ContainsSubset, json!([1, 2, 3]), json!([3, "1"])).unwrap());
        assert!(
            eval(ComparisonOperator::DoesNotContainSubset, json!([1, 2]), json!([4])).unwrap()
        );
    }

    #[test]
    fn test_string_operators() {
        assert!(eval(ComparisonOperator::StartsWith, json!("hello world"), json!("hello")).unwrap());
        assert!(eval(ComparisonOperator::EndsWith, json!("hello world"), json!("world")).unwrap());
        assert!(eval(ComparisonOperator::StringContains, json!("hello world"), json!("o w")).unwrap());
        assert!(!eval(ComparisonOperator::StartsWith, json!(12), json!("1")).unwrap());
        assert!(eval(
            ComparisonOperator::Matches,
            json!("user@example.com"),
            json!(r"^[\w.-]+@[\w.-]+\.\w+$")
        )
        .unwrap());
    }

    #[test]
    fn test_invalid_pattern() {
        let err = eval(ComparisonOperator::Matches, json!("x"), json!("[invalid")).unwrap_err();
        assert!(matches!(err, RuleError::InvalidPattern { .. }));
    }

    #[test]
    fn test_from_operands_arity() {
        let ok = Comparison::from_operands(
            ComparisonOperator::EqualTo,
            vec![Value::new(json!(1)).into(), Value::new(json!(1)).into()],
        )
        .unwrap();
        assert!(ok.evaluate(&Context::new()).unwrap());

        let err = Comparison::from_operands(
            ComparisonOperator::EqualTo,
            vec![Value::new(json!(1)).into()],
        )
        .unwrap_err();
        assert!(matches!(err, RuleError::InvalidOperandCount { actual: 1, .. }));
    }

    #[test]
    fn test_reevaluation_with_different_contexts() {
        let comparison = Comparison::new(
            ComparisonOperator::GreaterThanOrEqualTo,
            Variable::named("age"),
            Value::new(json!(18)),
        );

        let mut adult = Context::new();
        adult.set("age", 25);
        let mut child = Context::new();
        child.set("age", 10);

        assert!(comparison.evaluate(&adult).unwrap());
        assert!(!comparison.evaluate(&child).unwrap());
        assert!(comparison.evaluate(&adult).unwrap());
    }

    #[test]
    fn test_accessors() {
        let comparison = values(json!(1), json!(2));
        assert_eq!(comparison.operator(), ComparisonOperator::EqualTo);
        assert!(matches!(comparison.left(), Operand::Value(_)));
        assert!(matches!(comparison.right(), Operand::Value(_)));
        assert_eq!(comparison.operator().to_string(), "equal_to");
    }
}

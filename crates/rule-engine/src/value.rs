//! 终端值
//!
//! `Value` 包装一个不可变的原始数据（JSON 数据模型），并定义相等、同一、排序与子集包含语义。
//!
//! 宽松相等的强制转换表：
//!
//! | 左 \ 右 | 规则 |
//! |---|---|
//! | null, null | true |
//! | null, bool | 右侧为 false |
//! | null, 其他 | 右侧为空：`0`、`""`、`[]`、`{}` |
//! | bool, 任意 | 左侧等于右侧的真值（假值：null、false、0、""、"0"、空数组、空对象） |
//! | number, number | 数值相等（整数精确比较，否则按 f64） |
//! | number, string | 字符串为数值串且数值相等 |
//! | string, string | 均为数值串时按数值比较，否则逐字节比较 |
//! | array, array | 长度相同且逐元素宽松相等 |
//! | object, object | 键集合相同且逐键宽松相等 |
//! | 其他组合 | false |

use crate::error::{Result, RuleError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// 原始数据
pub type Datum = serde_json::Value;

/// 不可变终端值
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Value(Datum);

impl Value {
    pub fn new(datum: impl Into<Datum>) -> Self {
        Self(datum.into())
    }

    pub fn null() -> Self {
        Self(Datum::Null)
    }

    /// 原始数据
    pub fn datum(&self) -> &Datum {
        &self.0
    }

    pub fn into_datum(self) -> Datum {
        self.0
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// 宽松相等
    pub fn equals(&self, other: &Value) -> bool {
        loose_eq(&self.0, &other.0)
    }

    /// 严格同一：类型与值都必须一致，整数与浮点数视为不同类型
    pub fn identical_to(&self, other: &Value) -> bool {
        self.0 == other.0
    }

    /// 排序比较
    ///
    /// 数值（含数值串）按数值排序，两个字符串按字节序排序，其余组合返回 `TypeMismatch`。
    pub fn compare(&self, other: &Value) -> Result<Ordering> {
        if let (Some(a), Some(b)) = (numeric(&self.0), numeric(&other.0)) {
            return Ok(a.compare(&b));
        }

        if let (Datum::String(a), Datum::String(b)) = (&self.0, &other.0) {
            return Ok(a.as_bytes().cmp(b.as_bytes()));
        }

        Err(RuleError::TypeMismatch {
            expected: "orderable (number or string)".to_string(),
            actual: format!("{} and {}", type_name(&self.0), type_name(&other.0)),
        })
    }

    /// 子集包含：候选集合的每个元素都（宽松相等地）出现在本集合中
    pub fn contains_subset(&self, candidate: &Value) -> bool {
        let haystack = self.as_set();
        candidate
            .as_set()
            .iter()
            .all(|needle| haystack.iter().any(|item| loose_eq(item, needle)))
    }

    /// 集合视图：null 为空集，数组取元素，对象取值，标量视为单元素集合
    pub fn as_set(&self) -> Vec<&Datum> {
        match &self.0 {
            Datum::Null => Vec::new(),
            Datum::Array(items) => items.iter().collect(),
            Datum::Object(map) => map.values().collect(),
            scalar => vec![scalar],
        }
    }

    /// 真值
    pub fn is_truthy(&self) -> bool {
        truthy(&self.0)
    }

    /// 数值视图（数字或数值串）
    pub fn as_number(&self) -> Option<Number> {
        numeric(&self.0)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    pub fn type_name(&self) -> &'static str {
        type_name(&self.0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Datum> for Value {
    fn from(datum: Datum) -> Self {
        Self(datum)
    }
}

/// 强制转换后的数值：整数保持精确，其余使用 f64
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    /// 超出 i64 范围的无符号整数
    UInt(u64),
    Float(f64),
}

/// 2^127，超出该范围的浮点数不能精确转换为 i128
const I128_BOUND: f64 = i128::MAX as f64;

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::UInt(u) => u as f64,
            Self::Float(f) => f,
        }
    }

    /// 整数视图，浮点数返回 None
    pub fn as_integer(self) -> Option<i128> {
        match self {
            Self::Int(i) => Some(i128::from(i)),
            Self::UInt(u) => Some(i128::from(u)),
            Self::Float(_) => None,
        }
    }

    /// 从整数构造，超出 i64/u64 范围时返回 None
    pub fn from_integer(value: i128) -> Option<Self> {
        i64::try_from(value)
            .map(Self::Int)
            .or_else(|_| u64::try_from(value).map(Self::UInt))
            .ok()
    }

    /// 整数之间精确比较，整数与浮点数比较时不经过 f64 转换
    pub fn compare(&self, other: &Number) -> Ordering {
        match (self.as_integer(), other.as_integer()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(a), None) => compare_integer_float(a, other.as_f64()),
            (None, Some(b)) => compare_integer_float(b, self.as_f64()).reverse(),
            (None, None) => {
                let (a, b) = (self.as_f64(), other.as_f64());
                a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b))
            }
        }
    }

    pub fn into_datum(self) -> Datum {
        match self {
            Self::Int(i) => Datum::from(i),
            Self::UInt(u) => Datum::from(u),
            Self::Float(f) => Datum::from(f),
        }
    }
}

fn compare_integer_float(integer: i128, float: f64) -> Ordering {
    if float.is_nan() {
        return (integer as f64).total_cmp(&float);
    }
    if float >= I128_BOUND {
        return Ordering::Less;
    }
    if float < -I128_BOUND {
        return Ordering::Greater;
    }

    let whole = float.trunc();
    match integer.cmp(&(whole as i128)) {
        Ordering::Equal if float > whole => Ordering::Less,
        Ordering::Equal if float < whole => Ordering::Greater,
        ordering => ordering,
    }
}

/// 宽松相等，实现模块文档中的转换表
pub(crate) fn loose_eq(a: &Datum, b: &Datum) -> bool {
    match (a, b) {
        (Datum::Null, Datum::Null) => true,
        (Datum::Null, other) | (other, Datum::Null) => is_empty(other),
        (Datum::Bool(x), other) | (other, Datum::Bool(x)) => *x == truthy(other),
        (Datum::Number(_), Datum::Number(_))
        | (Datum::Number(_), Datum::String(_))
        | (Datum::String(_), Datum::Number(_)) => match (numeric(a), numeric(b)) {
            (Some(x), Some(y)) => x.compare(&y) == Ordering::Equal,
            _ => false,
        },
        (Datum::String(x), Datum::String(y)) => match (numeric(a), numeric(b)) {
            (Some(m), Some(n)) => m.compare(&n) == Ordering::Equal,
            _ => x == y,
        },
        (Datum::Array(x), Datum::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(m, n)| loose_eq(m, n))
        }
        (Datum::Object(x), Datum::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(key, m)| y.get(key).is_some_and(|n| loose_eq(m, n)))
        }
        _ => false,
    }
}

/// null 与非 bool 值比较时，只有“空”值才相等；"0" 虽为假值但不为空
fn is_empty(datum: &Datum) -> bool {
    match datum {
        Datum::Null => true,
        Datum::Number(_) => numeric(datum).is_some_and(|n| n.as_f64() == 0.0),
        Datum::String(s) => s.is_empty(),
        Datum::Array(items) => items.is_empty(),
        Datum::Object(map) => map.is_empty(),
        Datum::Bool(b) => !b,
    }
}

fn truthy(datum: &Datum) -> bool {
    match datum {
        Datum::Null => false,
        Datum::Bool(b) => *b,
        Datum::Number(_) => numeric(datum).is_some_and(|n| n.as_f64() != 0.0),
        Datum::String(s) => !(s.is_empty() || s == "0"),
        Datum::Array(items) => !items.is_empty(),
        Datum::Object(map) => !map.is_empty(),
    }
}

/// 数字或数值串的数值；数值串允许首尾空白，必须是有限值
pub(crate) fn numeric(datum: &Datum) -> Option<Number> {
    match datum {
        Datum::Number(n) => n
            .as_i64()
            .map(Number::Int)
            .or_else(|| n.as_u64().map(Number::UInt))
            .or_else(|| n.as_f64().map(Number::Float)),
        Datum::String(s) => parse_numeric(s),
        _ => None,
    }
}

fn parse_numeric(s: &str) -> Option<Number> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::Int(i));
    }
    if let Ok(u) = s.parse::<u64>() {
        return Some(Number::UInt(u));
    }
    // f64 解析会接受 "inf"/"NaN"，这里只接受普通十进制写法
    if !s
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return None;
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(Number::Float)
}

pub(crate) fn type_name(datum: &Datum) -> &'static str {
    match datum {
        Datum::Null => "null",
        Datum::Bool(_) => "boolean",
        Datum::Number(_) => "number",
        Datum::String(_) => "string",
        Datum::Array(_) => "array",
        Datum::Object(_) => "object",
    }
}

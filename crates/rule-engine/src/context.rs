//! 评估上下文
//!
//! 宿主与引擎之间唯一的数据交换点：按插入顺序保存的 名称 → 条目 映射。
//! 条目可以是原始数据（普通条目），也可以是变量（属性式条目，读取时解析）。

use crate::error::{Result, RuleError};
use crate::operand::Resolver;
use crate::value::{Datum, Value};
use crate::variable::Variable;
use indexmap::IndexMap;
use ruler_shared::config::{DEFAULT_MAX_RESOLUTION_DEPTH, EngineConfig};

/// 上下文条目
#[derive(Debug, Clone)]
pub enum Entry {
    /// 普通条目，不可移除
    Datum(Datum),
    /// 属性式条目，读取时在同一上下文中解析
    Variable(Variable),
}

impl Entry {
    pub fn is_property(&self) -> bool {
        matches!(self, Self::Variable(_))
    }
}

macro_rules! impl_entry_from_raw {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Entry {
                fn from(raw: $ty) -> Self {
                    Self::Datum(Datum::from(raw))
                }
            }
        )*
    };
}

impl_entry_from_raw!(bool, i32, i64, u32, u64, f64, &str, String, Datum, Vec<Datum>);

impl From<Value> for Entry {
    fn from(value: Value) -> Self {
        Self::Datum(value.into_datum())
    }
}

impl From<Variable> for Entry {
    fn from(variable: Variable) -> Self {
        Self::Variable(variable)
    }
}

/// 评估上下文
#[derive(Debug, Clone)]
pub struct Context {
    entries: IndexMap<String, Entry>,
    max_resolution_depth: usize,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
            max_resolution_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
        }
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// 应用引擎配置中的解析深度上限
    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.max_resolution_depth = config.max_resolution_depth;
        self
    }

    pub fn with_max_resolution_depth(mut self, max_resolution_depth: usize) -> Self {
        self.max_resolution_depth = max_resolution_depth;
        self
    }

    /// 从 JSON 对象创建，每个顶层键成为一个普通条目
    pub fn from_value(data: Datum) -> Result<Self> {
        match data {
            Datum::Object(map) => {
                let mut context = Self::new();
                for (name, datum) in map {
                    context.set(name, datum);
                }
                Ok(context)
            }
            other => Err(RuleError::InvalidArgument(format!(
                "上下文必须是 JSON 对象, 实际为 {}",
                crate::value::type_name(&other)
            ))),
        }
    }

    /// 从 JSON 字符串创建
    pub fn from_json(json: &str) -> Result<Self> {
        let data: Datum = serde_json::from_str(json)?;
        Self::from_value(data)
    }

    pub fn max_resolution_depth(&self) -> usize {
        self.max_resolution_depth
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    /// 写入条目，返回被替换的旧条目；替换不改变原有位置
    pub fn set(&mut self, name: impl Into<String>, entry: impl Into<Entry>) -> Option<Entry> {
        self.entries.insert(name.into(), entry.into())
    }

    /// 普通条目存在即为 true；属性式条目需解析为非 null 值
    pub fn exists(&self, name: &str) -> Result<bool> {
        match self.entries.get(name) {
            None => Ok(false),
            Some(Entry::Datum(_)) => Ok(true),
            Some(Entry::Variable(variable)) => Ok(!variable.prepare_value(self)?.is_null()),
        }
    }

    /// 移除属性式条目；普通条目不可移除
    pub fn remove(&mut self, name: &str) -> Result<Option<Entry>> {
        match self.entries.get(name) {
            None => Ok(None),
            Some(Entry::Datum(_)) => Err(RuleError::InvalidOperation(format!(
                "普通条目 '{}' 不可移除",
                name
            ))),
            Some(Entry::Variable(_)) => Ok(self.entries.shift_remove(name)),
        }
    }

    /// 将条目解析为终端值
    pub fn value_of(&self, name: &str) -> Result<Option<Value>> {
        let mut resolver = Resolver::new(self.max_resolution_depth);
        self.resolve_entry(name, &mut resolver)
    }

    pub(crate) fn resolve_entry(&self, name: &str, resolver: &mut Resolver) -> Result<Option<Value>> {
        match self.entries.get(name) {
            None => Ok(None),
            Some(Entry::Datum(datum)) => Ok(Some(Value::new(datum.clone()))),
            Some(Entry::Variable(variable)) => variable.resolve(self, resolver).map(Some),
        }
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按插入顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

//! 命题变量
//!
//! 变量是命题和比较操作符中的占位符。评估时它们被替换为终端值，
//! 来源依次为：上下文中的同名条目、作为操作数的默认值、原始默认值。
//!
//! 变量按引用标识：克隆得到的是同一个变量，同名的两个变量互不相同。

use crate::context::Context;
use crate::error::{Result, RuleError};
use crate::operand::{Argument, Operand, Resolver};
use crate::operators::{Comparison, ComparisonOperator};
use crate::value::{Datum, Value};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// 变量声明：名称、默认值和已声明的嵌套属性
struct Slot {
    name: Option<String>,
    default: RwLock<Operand>,
    properties: RwLock<BTreeMap<String, Arc<Slot>>>,
}

impl Slot {
    fn new(name: Option<String>, default: Operand) -> Arc<Self> {
        Arc::new(Self {
            name,
            default: RwLock::new(default),
            properties: RwLock::new(BTreeMap::new()),
        })
    }
}

/// 命题变量
///
/// 嵌套属性（如 `user.address.city`）同样是变量，它的值从父变量解析出的值中按键查找。
#[derive(Clone)]
pub struct Variable {
    slot: Arc<Slot>,
    parent: Option<Arc<Variable>>,
}

impl Variable {
    pub fn new(name: Option<String>, default: impl Into<Argument>) -> Self {
        Self {
            slot: Slot::new(name, default.into().into_operand()),
            parent: None,
        }
    }

    /// 默认值为 null 的具名变量
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(Some(name.into()), Datum::Null)
    }

    pub fn with_default(name: impl Into<String>, default: impl Into<Argument>) -> Self {
        Self::new(Some(name.into()), default)
    }

    /// 匿名变量，总是解析为默认值
    pub fn anonymous(default: impl Into<Argument>) -> Self {
        Self::new(None, default)
    }

    pub fn name(&self) -> Option<&str> {
        self.slot.name.as_deref()
    }

    /// 点号连接的完整路径，匿名变量显示为 `<anonymous>`
    pub fn path(&self) -> String {
        let own = self.name().unwrap_or("<anonymous>");
        match &self.parent {
            Some(parent) => format!("{}.{}", parent.path(), own),
            None => own.to_string(),
        }
    }

    pub fn default_operand(&self) -> Operand {
        self.slot.default.read().clone()
    }

    pub fn set_default(&self, default: impl Into<Argument>) {
        *self.slot.default.write() = default.into().into_operand();
    }

    /// 是否为同一个变量
    pub fn ptr_eq(&self, other: &Variable) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }

    /// 在上下文中解析为终端值
    pub fn prepare_value(&self, context: &Context) -> Result<Value> {
        let mut resolver = Resolver::new(context.max_resolution_depth());
        self.resolve(context, &mut resolver)
    }

    pub(crate) fn resolve(&self, context: &Context, resolver: &mut Resolver) -> Result<Value> {
        resolver.enter(self)?;
        let resolved = self.resolve_entered(context, resolver);
        resolver.leave();
        resolved
    }

    fn resolve_entered(&self, context: &Context, resolver: &mut Resolver) -> Result<Value> {
        match (&self.parent, self.name()) {
            (Some(parent), Some(name)) => {
                let container = parent.resolve(context, resolver)?;
                // 父值中为 null 的键与缺失的键一样回落到默认值
                if let Some(found) = lookup(container.datum(), name).filter(|d| !d.is_null()) {
                    trace!(variable = %self.path(), "从父变量解析属性");
                    return Ok(Value::new(found.clone()));
                }
            }
            (None, Some(name)) => {
                if let Some(value) = context.resolve_entry(name, resolver)? {
                    if !value.is_null() {
                        trace!(variable = name, "从上下文解析变量");
                        return Ok(value);
                    }
                }
            }
            (_, None) => {}
        }

        // 先克隆默认值再解析，避免递归期间持有锁
        let default = self.default_operand();
        default.resolve(context, resolver)
    }

    /// 同类的匿名兄弟变量，用于流式构造右操作数
    pub fn sibling(&self, default: impl Into<Argument>) -> Variable {
        Self {
            slot: Slot::new(None, default.into().into_operand()),
            parent: self.parent.clone(),
        }
    }

    /// 将流式参数转换为右操作数：原始数据包装为兄弟变量，操作数原样使用
    pub fn coerce(&self, argument: impl Into<Argument>) -> Operand {
        match argument.into() {
            Argument::Raw(datum) => Operand::Variable(self.sibling(datum)),
            Argument::Operand(operand) => operand,
        }
    }

    // ==================== 嵌套属性 ====================

    /// 声明（或取回已声明的）嵌套属性
    pub fn property(&self, name: impl Into<String>) -> Variable {
        let name = name.into();
        let slot = self
            .slot
            .properties
            .write()
            .entry(name.clone())
            .or_insert_with(|| Slot::new(Some(name), Operand::default()))
            .clone();
        self.child(slot)
    }

    /// 声明嵌套属性并设置默认值（已声明时覆盖默认值）
    pub fn property_with_default(
        &self,
        name: impl Into<String>,
        default: impl Into<Argument>,
    ) -> Variable {
        let property = self.property(name);
        property.set_default(default);
        property
    }

    /// 取回已声明的嵌套属性
    pub fn get_property(&self, name: &str) -> Result<Variable> {
        let slot = self
            .slot
            .properties
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| RuleError::UndefinedVariable(format!("{}.{}", self.path(), name)))?;
        Ok(self.child(slot))
    }

    /// 已声明属性的默认值是否非 null
    pub fn exists(&self, name: &str) -> Result<bool> {
        let property = self.declared(name)?;
        let exists = match &*property.default.read() {
            Operand::Value(value) => !value.is_null(),
            Operand::Variable(_) | Operand::Operator(_) => true,
        };
        Ok(exists)
    }

    /// 将已声明属性的默认值清为 null，属性声明本身保留
    pub fn unset(&self, name: &str) -> Result<()> {
        let property = self.declared(name)?;
        *property.default.write() = Operand::default();
        Ok(())
    }

    /// 已声明的属性名
    pub fn property_names(&self) -> Vec<String> {
        self.slot.properties.read().keys().cloned().collect()
    }

    fn declared(&self, name: &str) -> Result<Arc<Slot>> {
        self.slot.properties.read().get(name).cloned().ok_or_else(|| {
            RuleError::InvalidArgument(format!("变量 {} 未声明属性 {}", self.path(), name))
        })
    }

    fn child(&self, slot: Arc<Slot>) -> Variable {
        Self {
            slot,
            parent: Some(Arc::new(self.clone())),
        }
    }

    // ==================== 流式比较 ====================

    fn compare_with(&self, operator: ComparisonOperator, argument: impl Into<Argument>) -> Comparison {
        Comparison::new(operator, self, self.coerce(argument))
    }

    pub fn greater_than(&self, argument: impl Into<Argument>) -> Comparison {
        self.compare_with(ComparisonOperator::GreaterThan, argument)
    }

    pub fn greater_than_or_equal_to(&self, argument: impl Into<Argument>) -> Comparison {
        self.compare_with(ComparisonOperator::GreaterThanOrEqualTo, argument)
    }

    pub fn less_than(&self, argument: impl Into<Argument>) -> Comparison {
        self.compare_with(ComparisonOperator::LessThan, argument)
    }

    pub fn less_than_or_equal_to(&self, argument: impl Into<Argument>) -> Comparison {
        self.compare_with(ComparisonOperator::LessThanOrEqualTo, argument)
    }

    pub fn equal_to(&self, argument: impl Into<Argument>) -> Comparison {
        self.compare_with(ComparisonOperator::EqualTo, argument)
    }

    pub fn not_equal_to(&self, argument: impl Into<Argument>) -> Comparison {
        self.compare_with(ComparisonOperator::NotEqualTo, argument)
    }

    pub fn same_as(&self, argument: impl Into<Argument>) -> Comparison {
        self.compare_with(ComparisonOperator::SameAs, argument)
    }

    pub fn not_same_as(&self, argument: impl Into<Argument>) -> Comparison {
        self.compare_with(ComparisonOperator::NotSameAs, argument)
    }

    pub fn contains_subset(&self, argument: impl Into<Argument>) -> Comparison {
        self.compare_with(ComparisonOperator::ContainsSubset, argument)
    }

    pub fn does_not_contain_subset(&self, argument: impl Into<Argument>) -> Comparison {
        self.compare_with(ComparisonOperator::DoesNotContainSubset, argument)
    }

    pub fn starts_with(&self, argument: impl Into<Argument>) -> Comparison {
        self.compare_with(ComparisonOperator::StartsWith, argument)
    }

    pub fn ends_with(&self, argument: impl Into<Argument>) -> Comparison {
        self.compare_with(ComparisonOperator::EndsWith, argument)
    }

    pub fn string_contains(&self, argument: impl Into<Argument>) -> Comparison {
        self.compare_with(ComparisonOperator::StringContains, argument)
    }

    pub fn matches(&self, argument: impl Into<Argument>) -> Comparison {
        self.compare_with(ComparisonOperator::Matches, argument)
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("path", &self.path())
            .finish_non_exhaustive()
    }
}

/// 在容器值中按属性名查找：对象按键，数组按非负整数下标
fn lookup<'a>(container: &'a Datum, name: &str) -> Option<&'a Datum> {
    match container {
        Datum::Object(map) => map.get(name),
        Datum::Array(items) => name.parse::<usize>().ok().and_then(|index| items.get(index)),
        _ => None,
    }
}

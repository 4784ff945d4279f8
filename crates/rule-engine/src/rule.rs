//! 规则与规则集
//!
//! 规则把一个命题和可选的宿主动作配对；规则集按声明顺序在同一个上下文上执行规则，
//! 前面规则的动作对上下文的修改对后面的规则可见。

use crate::context::Context;
use crate::error::Result;
use crate::operators::Proposition;
use ruler_shared::config::EngineConfig;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// 宿主动作，命题为真时以上下文调用
pub type Action = Arc<dyn Fn(&mut Context) + Send + Sync>;

/// 规则定义
#[derive(Clone)]
pub struct Rule {
    id: String,
    name: Option<String>,
    condition: Arc<dyn Proposition>,
    action: Option<Action>,
}

impl Rule {
    pub fn new(condition: impl Proposition + 'static) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: None,
            condition: Arc::new(condition),
            action: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_action(mut self, action: impl Fn(&mut Context) + Send + Sync + 'static) -> Self {
        self.action = Some(Arc::new(action));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// 日志中使用的标识：优先名称，否则 ID
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    pub fn condition(&self) -> &Arc<dyn Proposition> {
        &self.condition
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    /// 评估命题，为真时调用动作；无论动作是否执行都返回命题结果
    pub fn execute(&self, context: &mut Context) -> Result<bool> {
        let matched = self.condition.evaluate(context)?;
        debug!(rule = %self.label(), matched, "规则评估完成");

        if matched {
            if let Some(action) = &self.action {
                debug!(rule = %self.label(), "执行规则动作");
                action(context);
            }
        }

        Ok(matched)
    }
}

/// 作为命题使用时只评估条件，不触发动作
impl Proposition for Rule {
    fn evaluate(&self, context: &Context) -> Result<bool> {
        self.condition.evaluate(context)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("has_action", &self.action.is_some())
            .finish()
    }
}

/// 规则集执行结果
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluationResult {
    /// 按声明顺序的每条规则结果
    pub verdicts: Vec<bool>,
    /// 命中的规则标识
    pub matched_rules: Vec<String>,
    pub evaluation_trace: Vec<String>,
    pub evaluation_time_us: u64,
}

impl EvaluationResult {
    pub fn any_matched(&self) -> bool {
        !self.matched_rules.is_empty()
    }
}

/// 有序规则集
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    /// 是否记录详细评估追踪
    trace_enabled: bool,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            trace_enabled: false,
        }
    }

    /// 启用评估追踪
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.trace_enabled = config.trace_enabled;
        self
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 按声明顺序执行所有规则，第一个错误终止执行并返回
    #[instrument(skip_all, fields(rules = self.rules.len()))]
    pub fn execute(&self, context: &mut Context) -> Result<EvaluationResult> {
        let start = Instant::now();
        let mut result = EvaluationResult::default();

        for (i, rule) in self.rules.iter().enumerate() {
            let matched = rule.execute(context).inspect_err(|e| {
                warn!(rule = %rule.label(), index = i, error = %e, "规则执行失败");
            })?;

            if self.trace_enabled {
                result.evaluation_trace.push(format!(
                    "rules[{}] {} => {}{}",
                    i,
                    rule.label(),
                    if matched { "MATCHED" } else { "NOT_MATCHED" },
                    if matched && rule.has_action() { " (action)" } else { "" }
                ));
            }

            if matched {
                result.matched_rules.push(rule.label().to_string());
            }
            result.verdicts.push(matched);
        }

        result.evaluation_time_us = start.elapsed().as_micros() as u64;
        debug!(
            matched = result.matched_rules.len(),
            elapsed_us = result.evaluation_time_us,
            "规则集执行完成"
        );

        Ok(result)
    }
}

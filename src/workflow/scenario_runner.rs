//! 场景解释器 - 流程层
//!
//! 核心职责：按触发器名找到场景，逐步逐个动作地交给注册表执行
//!
//! 执行规则：
//! 1. 未知触发器直接返回，不报错
//! 2. 从计数器 `<触发器名>` 指定的步骤开始（缺省为 0），按顺序执行
//! 3. `goto` 命中时放弃当前步骤剩余动作，跳到目标步骤；目标越界即结束

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::models::scenario::ScenarioTable;
use crate::workflow::action_registry::{ActionRegistry, ActionScope, Flow};

/// 单次执行最多进入的步骤数，防止 goto 死循环
pub const MAX_STEP_VISITS: usize = 256;

/// 一次执行的记录
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub trigger: String,
    /// 按执行顺序进入的步骤
    pub steps: Vec<usize>,
    /// 按执行顺序执行的动作
    pub actions: Vec<String>,
}

impl RunReport {
    fn new(trigger: &str) -> Self {
        Self {
            trigger: trigger.to_string(),
            ..Default::default()
        }
    }

    /// 触发器不存在或没有执行任何步骤
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn ran(&self, action: &str) -> bool {
        self.actions.iter().any(|a| a == action)
    }
}

/// 场景解释器
///
/// - 只负责控制流，所有副作用都交给 [`ActionRegistry`]
/// - 场景表只读，可被多个组件共享
#[derive(Debug, Clone)]
pub struct ScenarioInterpreter {
    table: Arc<ScenarioTable>,
    verbose_logging: bool,
}

impl ScenarioInterpreter {
    pub fn new(table: Arc<ScenarioTable>) -> Self {
        Self {
            table,
            verbose_logging: false,
        }
    }

    pub fn with_verbose_logging(mut self, verbose: bool) -> Self {
        self.verbose_logging = verbose;
        self
    }

    pub fn table(&self) -> &ScenarioTable {
        &self.table
    }

    pub fn run(
        &self,
        trigger: &str,
        registry: &mut ActionRegistry,
        scope: &mut ActionScope<'_>,
    ) -> Result<RunReport> {
        let mut report = RunReport::new(trigger);

        let Some(steps) = self.table.steps(trigger) else {
            debug!("{} 触发器 '{}' 没有场景，跳过", scope.ctx, trigger);
            return Ok(report);
        };

        let start = usize::try_from(scope.ctx.counter(trigger)).unwrap_or(0);
        if start >= steps.len() {
            debug!(
                "{} 触发器 '{}' 的起始步骤 {} 超出范围 (共 {} 步)",
                scope.ctx,
                trigger,
                start,
                steps.len()
            );
            return Ok(report);
        }

        if self.verbose_logging {
            info!("{} ▶ {} (从第 {} 步开始)", scope.ctx, trigger, start);
        }

        let mut current = start;
        while current < steps.len() {
            if report.steps.len() >= MAX_STEP_VISITS {
                warn!(
                    "{} ⚠️ 触发器 '{}' 超过 {} 次步骤跳转，停止执行",
                    scope.ctx, trigger, MAX_STEP_VISITS
                );
                break;
            }
            report.steps.push(current);

            let mut next = current + 1;
            for action in &steps[current] {
                report.actions.push(action.to_string());
                if self.verbose_logging {
                    info!("{}   · {}", scope.ctx, action);
                }
                if let Flow::Jump(target) = registry.invoke(action, scope)? {
                    next = target;
                    break;
                }
            }
            current = next;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory_quiz::MemoryQuiz;
    use crate::infrastructure::quiz_adapter::QuizAdapter;
    use crate::models::document::QuestionSpec;
    use crate::models::scenario::RawScenarioTable;
    use crate::workflow::widget_ctx::WidgetContext;

    fn interpreter(toml_text: &str) -> ScenarioInterpreter {
        let raw: RawScenarioTable = toml::from_str(toml_text).unwrap();
        ScenarioInterpreter::new(Arc::new(ScenarioTable::compile(&raw, true).unwrap()))
    }

    fn quiz() -> MemoryQuiz {
        MemoryQuiz::new(
            "pquiz",
            &[QuestionSpec {
                id: "q1".into(),
                right: "a".into(),
                user: None,
                engine: None,
            }],
        )
    }

    #[test]
    fn test_unknown_trigger_is_noop() {
        let interpreter = interpreter(r#"validate = ["validate"]"#);
        let mut registry = ActionRegistry::new();
        let mut ctx = WidgetContext::new("q1", 1, None);
        let before = ctx.counters().into_iter().map(|(k, v)| (k.to_string(), v)).collect::<Vec<_>>();
        let mut quiz = quiz();

        let report = {
            let mut scope = ActionScope {
                ctx: &mut ctx,
                quiz: &mut quiz,
            };
            interpreter.run("verify", &mut registry, &mut scope).unwrap()
        };

        assert!(report.is_empty());
        assert!(quiz.calls().is_empty());
        let after = ctx.counters().into_iter().map(|(k, v)| (k.to_string(), v)).collect::<Vec<_>>();
        assert_eq!(before, after);
    }

    #[test]
    fn test_step_cursor_starts_at_trigger_counter() {
        let interpreter = interpreter(r#"validate = [["show(A)"], ["show(B)"]]"#);
        let mut registry = ActionRegistry::new();
        let mut ctx = WidgetContext::new("q1", 1, None);
        ctx.set_counter("validate", 1);
        let mut quiz = quiz();

        let mut scope = ActionScope {
            ctx: &mut ctx,
            quiz: &mut quiz,
        };
        let report = interpreter.run("validate", &mut registry, &mut scope).unwrap();
        assert_eq!(report.steps, vec![1]);
        assert_eq!(report.actions, vec!["show(B)"]);
    }

    #[test]
    fn test_goto_loop_is_bounded() {
        let interpreter = interpreter(r#"validate = [["set(x,0)", "goto(x,0,0)"]]"#);
        let mut registry = ActionRegistry::new();
        let mut ctx = WidgetContext::new("q1", 1, None);
        let mut quiz = quiz();

        let mut scope = ActionScope {
            ctx: &mut ctx,
            quiz: &mut quiz,
        };
        let report = interpreter.run("validate", &mut registry, &mut scope).unwrap();
        assert_eq!(report.steps.len(), MAX_STEP_VISITS);
    }

    #[test]
    fn test_goto_past_end_stops() {
        let interpreter = interpreter(
            r#"validate = [["goto(maxRetry,0,5)", "show(Never)"], ["show(Never)"]]"#,
        );
        let mut registry = ActionRegistry::new();
        let mut ctx = WidgetContext::new("q1", 1, None);
        let mut quiz = quiz().with_hidden(["Never"]);

        let mut scope = ActionScope {
            ctx: &mut ctx,
            quiz: &mut quiz,
        };
        let report = interpreter.run("validate", &mut registry, &mut scope).unwrap();
        assert_eq!(report.steps, vec![0]);
        assert!(!quiz.is_visible("Never"));
    }

    #[test]
    fn test_adapter_failure_propagates() {
        struct Broken;
        impl QuizAdapter for Broken {
            fn set_visible(&mut self, _: &str, _: bool) -> Result<()> {
                anyhow::bail!("页面已关闭")
            }
            fn set_state(&mut self, _: crate::models::state::WidgetState) -> Result<()> {
                Ok(())
            }
            fn validate(&mut self) -> Result<()> {
                Ok(())
            }
            fn disable(&mut self) -> Result<()> {
                Ok(())
            }
            fn retry(&mut self) -> Result<()> {
                Ok(())
            }
            fn redo(&mut self) -> Result<()> {
                Ok(())
            }
            fn show_user_answer(&mut self) -> Result<()> {
                Ok(())
            }
            fn show_right_answer(&mut self) -> Result<()> {
                Ok(())
            }
            fn show_answer_text(&mut self) -> Result<()> {
                Ok(())
            }
            fn color(&mut self, _: crate::models::state::ColorMode) -> Result<()> {
                Ok(())
            }
            fn compute_score(&self) -> Result<crate::models::score::Score> {
                Ok(Default::default())
            }
            fn display_score(&mut self, _: Option<&str>) -> Result<()> {
                Ok(())
            }
            fn show_message(&mut self, _: &str, _: f64) -> Result<()> {
                Ok(())
            }
            fn hide_messages(&mut self) -> Result<()> {
                Ok(())
            }
        }

        let interpreter = interpreter(r#"retry = ["set(a,1)", "hide(Retry)", "set(b,1)"]"#);
        let mut registry = ActionRegistry::new();
        let mut ctx = WidgetContext::new("q1", 1, None);
        let mut quiz = Broken;
        let mut scope = ActionScope {
            ctx: &mut ctx,
            quiz: &mut quiz,
        };

        let err = interpreter.run("retry", &mut registry, &mut scope).unwrap_err();
        assert!(err.to_string().contains("页面已关闭"));
        assert_eq!(ctx.counter("a"), 1);
        assert_eq!(ctx.counter("b"), 0);
    }
}

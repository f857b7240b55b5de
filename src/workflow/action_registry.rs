//! 动作注册表 - 流程层
//!
//! 内置动作直接落到测验适配器；其余动作名在这里查宿主注册的处理函数。

use anyhow::Result;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::infrastructure::lms_bridge::LmsBridge;
use crate::infrastructure::quiz_adapter::QuizAdapter;
use crate::models::action::{is_builtin, Action};
use crate::models::scenario::ScenarioTable;
use crate::services::scorm_reporter::ScormReporter;
use crate::workflow::widget_ctx::WidgetContext;

/// 动作执行时可访问的资源
pub struct ActionScope<'a> {
    pub ctx: &'a mut WidgetContext,
    pub quiz: &'a mut dyn QuizAdapter,
}

/// 自定义动作处理函数
pub type ActionHandler = Box<dyn FnMut(&mut ActionScope<'_>, &[String]) -> Result<()>>;

/// 动作执行后的走向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// 放弃当前步骤剩余动作，跳到指定步骤
    Jump(usize),
}

/// SCORM 上报动作名：`scorm` 上报，`scorm(finish)` 上报并结束会话
pub const SCORM_ACTION: &str = "scorm";

/// 动作注册表
#[derive(Default)]
pub struct ActionRegistry {
    handlers: HashMap<String, ActionHandler>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册自定义动作
    ///
    /// 内置动作在解析阶段就已确定，同名注册不会生效。
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: FnMut(&mut ActionScope<'_>, &[String]) -> Result<()> + 'static,
    {
        let name = name.into();
        if is_builtin(&name) {
            warn!("⚠️ '{}' 是内置动作，忽略自定义注册", name);
            return;
        }
        debug!("注册自定义动作: {}", name);
        self.handlers.insert(name, Box::new(handler));
    }

    /// 注册 SCORM 上报动作
    pub fn register_scorm<B>(&mut self, mut reporter: ScormReporter<B>)
    where
        B: LmsBridge + 'static,
    {
        self.register(SCORM_ACTION, move |scope, args| {
            let finish = args.first().is_some_and(|a| a == "finish");
            let score = scope.quiz.compute_score()?;
            reporter.report(&score, finish)
        });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// 严格模式：场景表里出现的自定义动作必须都已注册
    pub fn check_table(&self, table: &ScenarioTable) -> Result<()> {
        for (trigger, name) in table.custom_actions() {
            if !self.contains(name) {
                return Err(AppError::unknown_action(trigger, name).into());
            }
        }
        Ok(())
    }

    /// 按名称调用自定义动作，返回是否找到处理函数
    ///
    /// 未注册的动作不报错，只记录警告。
    pub fn invoke_named(
        &mut self,
        name: &str,
        args: &[String],
        scope: &mut ActionScope<'_>,
    ) -> Result<bool> {
        match self.handlers.get_mut(name) {
            Some(handler) => {
                debug!("{} 自定义动作: {}({})", scope.ctx, name, args.join(","));
                handler(scope, args)?;
                Ok(true)
            }
            None => {
                warn!("{} ⚠️ 未定义的动作 '{}'，已忽略", scope.ctx, name);
                Ok(false)
            }
        }
    }

    /// 执行一个动作
    pub fn invoke(&mut self, action: &Action, scope: &mut ActionScope<'_>) -> Result<Flow> {
        match action {
            Action::Show(targets) => {
                for target in targets {
                    scope.quiz.set_visible(target, true)?;
                }
            }
            Action::Hide(targets) => {
                for target in targets {
                    scope.quiz.set_visible(target, false)?;
                }
            }
            Action::State(state) => scope.quiz.set_state(*state)?,
            Action::Validate => {
                scope.quiz.validate()?;
                let score = scope.quiz.compute_score()?;
                scope.ctx.record_score(score);
                scope.ctx.refresh_countdown();
            }
            Action::Disable => scope.quiz.disable()?,
            Action::Retry => {
                scope.quiz.retry()?;
                scope.ctx.consume_retry();
            }
            Action::Redo => {
                scope.quiz.redo()?;
                scope.ctx.reset();
            }
            Action::UserAnswer => scope.quiz.show_user_answer()?,
            Action::RightAnswer => scope.quiz.show_right_answer()?,
            Action::AnswerText => scope.quiz.show_answer_text()?,
            Action::Score => {
                let score = scope.quiz.compute_score()?;
                scope.ctx.record_score(score);
                let text = score.render(scope.ctx.base_score());
                scope.quiz.display_score(text.as_deref())?;
            }
            Action::Color(mode) => scope.quiz.color(*mode)?,
            Action::ShowMessage(mode) => {
                let score = match scope.ctx.last_score() {
                    Some(score) => score,
                    None => scope.quiz.compute_score()?,
                };
                scope.quiz.show_message(mode, score.percent())?;
            }
            Action::StopTimer => scope.ctx.timer_mut().stop(),
            Action::ResumeTimer => {
                if !scope.ctx.timer_mut().resume() {
                    debug!("{} 计时器无法恢复", scope.ctx);
                }
            }
            Action::Goto {
                condition,
                from,
                to,
            } => {
                if scope.ctx.condition(condition) == *from {
                    debug!("{} goto: {} == {} → 第 {} 步", scope.ctx, condition, from, to);
                    return Ok(Flow::Jump(*to));
                }
            }
            Action::Set { label, value } => scope.ctx.set_counter(label.as_str(), *value),
            Action::SetIf {
                condition,
                label,
                nok,
                ok,
            } => {
                let chosen = if scope.ctx.condition(condition) != 0 {
                    ok
                } else {
                    nok
                };
                if let Some(value) = chosen {
                    scope.ctx.set_counter(label.as_str(), *value);
                }
            }
            Action::Custom { name, args } => {
                self.invoke_named(name, args, scope)?;
            }
        }

        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::lms_bridge::{MemoryLms, ScormVersion};
    use crate::infrastructure::memory_quiz::MemoryQuiz;
    use crate::models::document::QuestionSpec;
    use crate::workflow::widget_ctx::MAX_RETRY;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};

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

    fn run(registry: &mut ActionRegistry, ctx: &mut WidgetContext, quiz: &mut MemoryQuiz, text: &str) -> Flow {
        let action = Action::parse(text).unwrap();
        let mut scope = ActionScope { ctx, quiz };
        registry.invoke(&action, &mut scope).unwrap()
    }

    #[test]
    fn test_show_is_idempotent() {
        let mut registry = ActionRegistry::new();
        let mut ctx = WidgetContext::new("q1", 0, None);
        let mut quiz = quiz().with_hidden(["Retry"]);

        run(&mut registry, &mut ctx, &mut quiz, "show(Retry)");
        run(&mut registry, &mut ctx, &mut quiz, "show(Retry)");
        assert!(quiz.is_visible("Retry"));
    }

    #[test]
    fn test_goto_and_setif() {
        let mut registry = ActionRegistry::new();
        let mut ctx = WidgetContext::new("q1", 0, None);
        let mut quiz = quiz();

        assert_eq!(ctx.counter(MAX_RETRY), 1);
        assert_eq!(
            run(&mut registry, &mut ctx, &mut quiz, "goto(maxRetry,1,2)"),
            Flow::Jump(2)
        );
        assert_eq!(
            run(&mut registry, &mut ctx, &mut quiz, "goto(maxRetry,0,2)"),
            Flow::Continue
        );

        run(&mut registry, &mut ctx, &mut quiz, "setif(maxRetry,validate,1,2)");
        assert_eq!(ctx.counter("validate"), 2);
        run(&mut registry, &mut ctx, &mut quiz, "setif(nothing,validate,none,5)");
        assert_eq!(ctx.counter("validate"), 2);
    }

    #[test]
    fn test_score_renders_with_base() {
        let mut registry = ActionRegistry::new();
        let mut ctx = WidgetContext::new("q1", 0, None).with_base_score(Some(20));
        let mut quiz = quiz();
        quiz.answer("q1", "a");

        run(&mut registry, &mut ctx, &mut quiz, "score");
        assert_eq!(quiz.score_text(), Some("20 / 20"));
        assert_eq!(ctx.last_score().map(|s| s.total), Some(1));
    }

    #[test]
    fn test_custom_and_unknown_actions() {
        let mut registry = ActionRegistry::new();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        registry.register("ping", move |_scope, args| {
            assert_eq!(args, ["x"]);
            counter.set(counter.get() + 1);
            Ok(())
        });
        registry.register("show", |_scope, _args| Ok(()));
        assert!(!registry.contains("show"));

        let mut ctx = WidgetContext::new("q1", 0, None);
        let mut quiz = quiz();
        run(&mut registry, &mut ctx, &mut quiz, "ping(x)");
        run(&mut registry, &mut ctx, &mut quiz, "pong");
        assert_eq!(hits.get(), 1);
        assert!(quiz.calls().is_empty());
    }

    #[test]
    fn test_scorm_action() {
        let lms = Arc::new(Mutex::new(MemoryLms::new(ScormVersion::Scorm12)));
        let mut registry = ActionRegistry::new();
        registry.register_scorm(ScormReporter::new(Arc::clone(&lms)));

        let mut ctx = WidgetContext::new("q1", 0, None);
        let mut quiz = quiz();
        quiz.answer("q1", "a");
        run(&mut registry, &mut ctx, &mut quiz, "scorm(finish)");

        let lms = lms.lock().unwrap();
        assert_eq!(lms.value("cmi.core.score.raw"), Some("1"));
        assert!(lms.is_terminated());
    }

    #[test]
    fn test_check_table_in_strict_mode() {
        let table = ScenarioTable::new().with_scenario(
            "validate",
            vec![vec![Action::parse("scorm").unwrap()]],
        );
        let mut registry = ActionRegistry::new();
        assert!(registry.check_table(&table).is_err());

        registry.register_scorm(ScormReporter::new(MemoryLms::new(ScormVersion::Scorm2004)));
        assert!(registry.check_table(&table).is_ok());
    }
}

//! 测验动作栏 - 流程层
//!
//! 把按钮、计时器和上下文存储接到场景解释器上：
//! 1. 按钮 → 触发器 → 场景
//! 2. 每秒 tick → 倒计时结束时触发 `onEndCountdown`
//! 3. 每次按钮操作后保存历史，重新打开时回放

use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::infrastructure::quiz_adapter::QuizAdapter;
use crate::models::document::ScenarioDocument;
use crate::models::scenario::ScenarioTable;
use crate::models::trigger::{Button, ON_END_COUNTDOWN, ON_MODIFIED};
use crate::services::context_store::{context_id, ActionHistory, ContextStore, ContextTtl};
use crate::services::readiness::{wait_until, PollPolicy};
use crate::services::timer::{TickOutcome, TimerMode};
use crate::workflow::action_registry::{ActionRegistry, ActionScope};
use crate::workflow::scenario_runner::{RunReport, ScenarioInterpreter};
use crate::workflow::widget_ctx::WidgetContext;

/// 测验动作栏
pub struct QuizWidget<Q> {
    ctx: WidgetContext,
    quiz: Q,
    interpreter: ScenarioInterpreter,
    registry: ActionRegistry,
    store: Option<Arc<dyn ContextStore>>,
    ttl: ContextTtl,
    context_key: Option<String>,
    history: ActionHistory,
    replaying: bool,
}

impl<Q: QuizAdapter> QuizWidget<Q> {
    /// 创建动作栏，没有重试机会、没有倒计时
    pub fn new(quiz_id: impl Into<String>, table: Arc<ScenarioTable>, quiz: Q) -> Self {
        Self::with_context(WidgetContext::new(quiz_id, -1, None), table, quiz)
    }

    pub fn with_context(ctx: WidgetContext, table: Arc<ScenarioTable>, quiz: Q) -> Self {
        Self {
            ctx,
            quiz,
            interpreter: ScenarioInterpreter::new(table),
            registry: ActionRegistry::new(),
            store: None,
            ttl: ContextTtl::Disabled,
            context_key: None,
            history: ActionHistory::default(),
            replaying: false,
        }
    }

    /// 按场景配置创建
    pub fn from_document(doc: &ScenarioDocument, quiz: Q, strict: bool) -> Result<Self> {
        let table = ScenarioTable::compile(&doc.scenario, strict)?;
        let ctx = WidgetContext::new(doc.id.as_str(), doc.nb_retry, doc.countdown)
            .with_base_score(doc.base_score)
            .with_engine(doc.single_engine().map(str::to_string));

        let mut widget = Self::with_context(ctx, Arc::new(table), quiz);
        widget.ttl = ContextTtl::from_config(doc.context_ttl);
        widget.context_key = doc.context_key.clone();
        widget.history = ActionHistory::new(doc.context_key.clone());
        Ok(widget)
    }

    /// 接入上下文存储
    pub fn with_store(mut self, store: Arc<dyn ContextStore>, ttl: ContextTtl) -> Self {
        self.store = Some(store);
        self.ttl = ttl;
        self
    }

    /// 只接入存储，有效期沿用配置
    pub fn attach_store(mut self, store: Arc<dyn ContextStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_verbose_logging(mut self, verbose: bool) -> Self {
        self.interpreter = self.interpreter.with_verbose_logging(verbose);
        self
    }

    pub fn ctx(&self) -> &WidgetContext {
        &self.ctx
    }

    pub fn ctx_mut(&mut self) -> &mut WidgetContext {
        &mut self.ctx
    }

    pub fn quiz(&self) -> &Q {
        &self.quiz
    }

    pub fn quiz_mut(&mut self) -> &mut Q {
        &mut self.quiz
    }

    pub fn registry_mut(&mut self) -> &mut ActionRegistry {
        &mut self.registry
    }

    pub fn history(&self) -> &ActionHistory {
        &self.history
    }

    pub fn table(&self) -> &ScenarioTable {
        self.interpreter.table()
    }

    /// 严格模式检查：场景表里的自定义动作必须都已注册
    pub fn validate_actions(&self) -> Result<()> {
        self.registry.check_table(self.interpreter.table())
    }

    /// 执行触发器对应的场景
    pub fn run_trigger(&mut self, trigger: &str) -> Result<RunReport> {
        let mut scope = ActionScope {
            ctx: &mut self.ctx,
            quiz: &mut self.quiz,
        };
        self.interpreter.run(trigger, &mut self.registry, &mut scope)
    }

    /// 按下按钮
    ///
    /// 场景表里没有对应触发器时什么也不做。
    pub fn press(&mut self, button: Button) -> Result<RunReport> {
        let trigger = button.trigger();
        if !self.interpreter.table().contains(trigger) {
            debug!("{} 按钮 {} 没有对应场景", self.ctx, button);
            return Ok(RunReport::default());
        }

        if button == Button::Submit {
            self.ctx.timer_mut().stop();
            self.ctx.refresh_countdown();
        }

        let report = self.run_trigger(trigger)?;
        debug!(
            "{} {} → 执行了 {} 个动作",
            self.ctx,
            button,
            report.actions.len()
        );

        if !self.replaying {
            self.remember(trigger, &report);
        }
        Ok(report)
    }

    /// 作答内容变化
    pub fn on_modified(&mut self) -> Result<RunReport> {
        self.run_trigger(ON_MODIFIED)
    }

    pub fn start_timer(&mut self) {
        self.ctx.timer_mut().start();
    }

    /// 每秒调用一次；倒计时结束时执行 `onEndCountdown`
    pub fn tick(&mut self) -> Result<Option<RunReport>> {
        match self.ctx.timer_mut().tick() {
            TickOutcome::Idle => Ok(None),
            TickOutcome::Running => {
                let timer = self.ctx.timer();
                if timer.mode() == Some(TimerMode::Countdown) {
                    let remaining = timer.countdown_value();
                    self.history.record_countdown(remaining);
                    self.save();
                }
                Ok(None)
            }
            TickOutcome::Expired => {
                info!("{} ⏰ 倒计时结束", self.ctx);
                self.ctx.refresh_countdown();
                let report = self.run_trigger(ON_END_COUNTDOWN)?;
                self.history.record_countdown(0);
                self.save();
                Ok(Some(report))
            }
        }
    }

    /// 记录一次按钮操作并保存
    fn remember(&mut self, trigger: &str, report: &RunReport) {
        if report.ran("redo") {
            self.history = ActionHistory::new(self.context_key.clone());
            self.clear_store();
            return;
        }

        self.history.record(trigger);
        if report.ran("validate") {
            if let Some(score) = self.ctx.last_score() {
                self.history.record_score(score);
            }
        }
        if self.ctx.timer().mode() == Some(TimerMode::Chrono) {
            self.history.record_chrono(self.ctx.timer().chrono_value());
        }
        self.save();
    }

    /// 保存失败只记录警告
    fn save(&mut self) {
        if self.replaying || !self.ttl.is_enabled() {
            return;
        }
        let Some(store) = &self.store else {
            return;
        };

        self.history.key = self.context_key.clone();
        self.history.saved_at = Some(Utc::now());
        self.history.session_only = self.ttl == ContextTtl::Session;
        if let Err(e) = store.save(&context_id(&self.ctx.quiz_id), &self.history) {
            warn!("{} ⚠️ 保存上下文失败: {}", self.ctx, e);
        }
    }

    fn clear_store(&self) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = store.clear(&context_id(&self.ctx.quiz_id)) {
            warn!("{} ⚠️ 清除上下文失败: {}", self.ctx, e);
        }
    }

    /// 等待存储就绪后回放保存的历史，返回回放的按钮次数
    ///
    /// 存储超时未就绪、校验键不一致或已过期时不回放。
    pub async fn restore_context(&mut self, policy: PollPolicy) -> Result<usize> {
        if !self.ttl.is_enabled() {
            return Ok(0);
        }
        let Some(store) = self.store.clone() else {
            return Ok(0);
        };

        let outcome = wait_until(policy, || store.is_ready()).await;
        if !outcome.is_ready() {
            warn!(
                "{} ⚠️ 上下文存储未就绪 (检查 {} 次)，跳过恢复",
                self.ctx,
                outcome.attempts()
            );
            return Ok(0);
        }

        let id = context_id(&self.ctx.quiz_id);
        let Some(saved) = store.load(&id)? else {
            debug!("{} 没有保存的上下文", self.ctx);
            return Ok(0);
        };

        if saved.key != self.context_key {
            info!("{} 上下文校验键不一致，丢弃", self.ctx);
            self.clear_store();
            return Ok(0);
        }
        if saved.is_expired(self.ttl, Utc::now()) {
            info!("{} 上下文已过期，丢弃", self.ctx);
            self.clear_store();
            return Ok(0);
        }

        self.replaying = true;
        let replayed = self.replay(&saved);
        self.replaying = false;
        let replayed = replayed?;

        self.history = saved;
        info!("{} ✓ 已恢复上下文，回放 {} 次操作", self.ctx, replayed);
        Ok(replayed)
    }

    fn replay(&mut self, saved: &ActionHistory) -> Result<usize> {
        let mut replayed = 0;
        for action in &saved.actions {
            if let Some(remaining) = ActionHistory::parse_countdown(action) {
                self.ctx.timer_mut().set_countdown(remaining);
                self.ctx.refresh_countdown();
                continue;
            }
            match Button::from_trigger(action) {
                Some(button) => {
                    self.press(button)?;
                    replayed += 1;
                }
                None => debug!("{} 回放时跳过未知记录 '{}'", self.ctx, action),
            }
        }
        if let Some(chrono) = saved.chrono {
            self.ctx.timer_mut().set_chrono(chrono);
        }
        Ok(replayed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory_quiz::MemoryQuiz;
    use crate::models::score::Score;
    use crate::services::context_store::{JsonFileContextStore, MemoryContextStore};
    use crate::workflow::widget_ctx::END_COUNTDOWN;

    const DOC: &str = r#"
        id = "q1"
        nb_retry = 1
        context_key = "v1"
        context_ttl = 0

        [scenario]
        validate = [["validate", "userColor", "goto(maxRetry,1,2)"],
                    ["showMessage(Encourage)", "show(Retry)", "hide(Submit)", "goto(maxRetry,0,3)"],
                    ["showMessage(Congratulate)", "score", "hide(Submit)"]]
        retry = [["state(Enabled)", "hide(Retry)", "retry", "show(Submit)", "set(validate,0)"]]
        redo = [["redo"]]

        [[questions]]
        id = "q1"
        right = "a"
    "#;

    fn widget() -> QuizWidget<MemoryQuiz> {
        let doc: ScenarioDocument = toml::from_str(DOC).unwrap();
        let quiz = MemoryQuiz::from_document("pquiz", &doc);
        QuizWidget::from_document(&doc, quiz, true).unwrap()
    }

    #[test]
    fn test_missing_button_scenario_is_noop() {
        let mut widget = widget();
        widget.start_timer();
        let report = widget.press(Button::RightAnswer).unwrap();
        assert!(report.is_empty());
        assert!(widget.ctx().timer().is_running());
        assert!(widget.history().actions.is_empty());
    }

    #[test]
    fn test_wrong_answer_then_retry() {
        let mut widget = widget();
        widget.quiz_mut().answer("q1", "x");

        let report = widget.press(Button::Submit).unwrap();
        assert_eq!(report.steps, vec![0, 1]);
        assert!(widget.quiz().is_visible("Retry"));

        widget.press(Button::Retry).unwrap();
        assert!(widget.quiz().is_enabled());
        assert_eq!(widget.ctx().counter("validate"), 0);
        assert_eq!(widget.ctx().retries_left(), 0);

        widget.quiz_mut().answer("q1", "x");
        let report = widget.press(Button::Submit).unwrap();
        assert_eq!(report.steps, vec![0, 2]);
        assert_eq!(widget.quiz().score_text(), Some("0 / 1"));
    }

    #[test]
    fn test_countdown_end_runs_scenario() {
        let doc: ScenarioDocument = toml::from_str(
            r#"
            id = "q2"
            countdown = 1
            [scenario]
            onEndCountdown = ["validate", "disable"]
            "#,
        )
        .unwrap();
        let quiz = MemoryQuiz::from_document("pquiz", &doc);
        let mut widget = QuizWidget::from_document(&doc, quiz, false).unwrap();

        widget.start_timer();
        assert!(widget.tick().unwrap().is_none());
        let report = widget.tick().unwrap().unwrap();
        assert_eq!(report.actions, vec!["validate", "disable"]);
        assert_eq!(widget.ctx().counter(END_COUNTDOWN), 1);
        assert!(widget.tick().unwrap().is_none());
    }

    fn engine_widget(questions: &str) -> QuizWidget<MemoryQuiz> {
        let doc: ScenarioDocument = toml::from_str(&format!(
            r#"
            id = "e1"
            hidden = ["Wrong", "Right"]
            [scenario]
            validate = [["goto(engine(choices),1,1)", "show(Wrong)"], ["show(Right)"]]
            {}
            "#,
            questions
        ))
        .unwrap();
        let quiz = MemoryQuiz::from_document("pquiz", &doc);
        QuizWidget::from_document(&doc, quiz, true).unwrap()
    }

    #[test]
    fn test_engine_condition_jumps_for_matching_single_question() {
        let mut widget = engine_widget(
            r#"
            [[questions]]
            id = "q1"
            right = "a"
            engine = "choices"
            "#,
        );
        let report = widget.press(Button::Submit).unwrap();
        assert_eq!(report.steps, vec![0, 1]);
        assert_eq!(report.actions, vec!["goto(engine(choices),1,1)", "show(Right)"]);
        assert!(!widget.quiz().is_visible("Wrong"));
        assert!(widget.quiz().is_visible("Right"));
    }

    #[test]
    fn test_engine_condition_falls_through_otherwise() {
        let other_engine = r#"
            [[questions]]
            id = "q1"
            right = "a"
            engine = "blanks"
            "#;
        let several = r#"
            [[questions]]
            id = "q1"
            right = "a"
            engine = "choices"
            [[questions]]
            id = "q2"
            right = "b"
            engine = "choices"
            "#;

        for questions in [other_engine, several] {
            let mut widget = engine_widget(questions);
            let report = widget.press(Button::Submit).unwrap();
            assert!(report.ran("show(Wrong)"));
            assert!(widget.quiz().is_visible("Wrong"));
        }
    }

    #[test]
    fn test_score_condition_after_validate() {
        let doc: ScenarioDocument = toml::from_str(
            r#"
            id = "s1"
            hidden = ["Perfect"]
            [scenario]
            validate = [["validate", "goto(scoreEq100,0,2)"], ["show(Perfect)"], []]
            [[questions]]
            id = "q1"
            right = "a"
            "#,
        )
        .unwrap();

        let quiz = MemoryQuiz::from_document("pquiz", &doc);
        let mut widget = QuizWidget::from_document(&doc, quiz, true).unwrap();
        widget.quiz_mut().answer("q1", "a");
        widget.press(Button::Submit).unwrap();
        assert!(widget.quiz().is_visible("Perfect"));

        let quiz = MemoryQuiz::from_document("pquiz", &doc);
        let mut widget = QuizWidget::from_document(&doc, quiz, true).unwrap();
        widget.quiz_mut().answer("q1", "x");
        let report = widget.press(Button::Submit).unwrap();
        assert_eq!(report.steps, vec![0, 2]);
        assert!(!widget.quiz().is_visible("Perfect"));
    }

    #[tokio::test]
    async fn test_history_saved_and_replayed() {
        let store = Arc::new(MemoryContextStore::new());

        let mut first = widget().attach_store(store.clone());
        first.quiz_mut().answer("q1", "x");
        first.press(Button::Submit).unwrap();
        assert_eq!(first.history().encoded(), "validate");
        assert!(store.raw("q1_action").is_some());

        let mut second = widget().attach_store(store.clone());
        second.quiz_mut().answer("q1", "x");
        let replayed = second.restore_context(PollPolicy::default()).await.unwrap();
        assert_eq!(replayed, 1);
        assert!(second.quiz().is_visible("Retry"));
        assert!(!second.quiz().is_enabled());

        second.press(Button::Redo).unwrap();
        assert!(store.raw("q1_action").is_none());
        assert!(second.history().actions.is_empty());
    }

    #[test]
    fn test_each_validate_saves_its_score() {
        let store = Arc::new(MemoryContextStore::new());
        let mut widget = widget().attach_store(store.clone());

        widget.quiz_mut().answer("q1", "x");
        widget.press(Button::Submit).unwrap();
        widget.press(Button::Retry).unwrap();
        widget.quiz_mut().answer("q1", "a");
        widget.press(Button::Submit).unwrap();

        let saved = store.load("q1_action").unwrap().unwrap();
        assert_eq!(saved.encoded(), "validate::retry::validate");
        assert_eq!(saved.scores, vec![Score::new(0.0, 1), Score::new(1.0, 1)]);
    }

    #[tokio::test]
    async fn test_session_context_ends_with_the_store() {
        let path = std::env::temp_dir().join(format!("quiz_widget_session_{}.json", std::process::id()));
        let _ = std::fs::remove_file(&path);

        let store = Arc::new(JsonFileContextStore::new(&path));
        let mut first = widget().attach_store(store.clone());
        first.quiz_mut().answer("q1", "x");
        first.press(Button::Submit).unwrap();

        let mut same_session = widget().attach_store(store.clone());
        let replayed = same_session.restore_context(PollPolicy::default()).await.unwrap();
        assert_eq!(replayed, 1);

        let reopened = Arc::new(JsonFileContextStore::new(&path));
        let mut next_session = widget().attach_store(reopened);
        let replayed = next_session.restore_context(PollPolicy::default()).await.unwrap();
        assert_eq!(replayed, 0);
        assert!(next_session.history().actions.is_empty());

        let _ = std::fs::remove_file(&path);
    }
}

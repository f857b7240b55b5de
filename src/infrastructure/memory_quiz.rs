//! 内存测验
//!
//! [`QuizAdapter`] 的内存实现：每题一分，答案逐字比较。
//! 命令行回放和测试都用它代替真实页面。

use anyhow::Result;
use std::collections::BTreeSet;
use tracing::debug;

use crate::infrastructure::quiz_adapter::QuizAdapter;
use crate::models::document::{QuestionSpec, ScenarioDocument};
use crate::models::message::MessageBoard;
use crate::models::score::Score;
use crate::models::state::{ColorMode, WidgetState};

/// 当前显示的是哪一份答案
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerView {
    /// 正在作答
    #[default]
    Working,
    User,
    Right,
}

#[derive(Debug, Clone)]
struct MemoryQuestion {
    id: String,
    right: String,
    initial: Option<String>,
    user: Option<String>,
    submitted: Option<String>,
}

/// 内存测验
#[derive(Debug, Clone)]
pub struct MemoryQuiz {
    prefix: String,
    initial_hidden: BTreeSet<String>,
    hidden: BTreeSet<String>,
    state: WidgetState,
    enabled: bool,
    view: AnswerView,
    coloring: Option<ColorMode>,
    answer_text_visible: bool,
    score_text: Option<String>,
    message: Option<String>,
    messages_shown: usize,
    board: MessageBoard,
    questions: Vec<MemoryQuestion>,
    calls: Vec<String>,
}

impl MemoryQuiz {
    /// 创建新的内存测验
    pub fn new(prefix: impl Into<String>, questions: &[QuestionSpec]) -> Self {
        Self {
            prefix: prefix.into(),
            initial_hidden: BTreeSet::new(),
            hidden: BTreeSet::new(),
            state: WidgetState::Enabled,
            enabled: true,
            view: AnswerView::Working,
            coloring: None,
            answer_text_visible: false,
            score_text: None,
            message: None,
            messages_shown: 0,
            board: MessageBoard::default(),
            questions: questions
                .iter()
                .map(|q| MemoryQuestion {
                    id: q.id.clone(),
                    right: q.right.clone(),
                    initial: q.user.clone(),
                    user: q.user.clone(),
                    submitted: None,
                })
                .collect(),
            calls: Vec::new(),
        }
    }

    /// 按场景配置创建：题目、提示信息、初始隐藏元素
    pub fn from_document(prefix: &str, doc: &ScenarioDocument) -> Self {
        let quiz = Self::new(prefix, &doc.questions).with_messages(MessageBoard::new(doc.messages.clone()));
        quiz.with_hidden(doc.hidden.iter().map(String::as_str))
    }

    pub fn with_messages(mut self, board: MessageBoard) -> Self {
        self.board = board;
        self
    }

    /// 设置初始隐藏的元素（不含前缀），`redo` 时恢复到这里
    pub fn with_hidden<'a>(mut self, targets: impl IntoIterator<Item = &'a str>) -> Self {
        let classes: BTreeSet<String> = targets.into_iter().map(|t| self.class_of(t)).collect();
        self.initial_hidden = classes.clone();
        self.hidden = classes;
        self
    }

    fn class_of(&self, target: &str) -> String {
        format!("{}{}", self.prefix, target)
    }

    fn record(&mut self, call: impl Into<String>) {
        let call = call.into();
        debug!("内存测验调用: {}", call);
        self.calls.push(call);
    }

    /// 作答，锁定时返回 `false`
    pub fn answer(&mut self, question_id: &str, value: impl Into<String>) -> bool {
        if !self.enabled {
            return false;
        }
        match self.questions.iter_mut().find(|q| q.id == question_id) {
            Some(question) => {
                question.user = Some(value.into());
                true
            }
            None => false,
        }
    }

    pub fn is_visible(&self, target: &str) -> bool {
        !self.hidden.contains(&self.class_of(target))
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn view(&self) -> AnswerView {
        self.view
    }

    pub fn coloring(&self) -> Option<ColorMode> {
        self.coloring
    }

    pub fn answer_text_visible(&self) -> bool {
        self.answer_text_visible
    }

    pub fn score_text(&self) -> Option<&str> {
        self.score_text.as_deref()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn user_answer(&self, question_id: &str) -> Option<&str> {
        self.questions
            .iter()
            .find(|q| q.id == question_id)
            .and_then(|q| q.user.as_deref())
    }

    /// 提交时记录下的答案
    pub fn submitted_answer(&self, question_id: &str) -> Option<&str> {
        self.questions
            .iter()
            .find(|q| q.id == question_id)
            .and_then(|q| q.submitted.as_deref())
    }

    /// 按顺序记录的适配器调用
    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }
}

impl QuizAdapter for MemoryQuiz {
    fn set_visible(&mut self, target: &str, visible: bool) -> Result<()> {
        let class = self.class_of(target);
        if visible {
            self.hidden.remove(&class);
            self.record(format!("show({})", target));
        } else {
            self.hidden.insert(class);
            self.record(format!("hide({})", target));
        }
        Ok(())
    }

    fn set_state(&mut self, state: WidgetState) -> Result<()> {
        self.state = state;
        self.record(format!("state({})", state));
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        self.enabled = false;
        for question in &mut self.questions {
            question.submitted = question.user.clone();
        }
        self.record("validate");
        Ok(())
    }

    fn disable(&mut self) -> Result<()> {
        self.enabled = false;
        self.record("disable");
        Ok(())
    }

    fn retry(&mut self) -> Result<()> {
        // 只清掉答错的题
        for question in &mut self.questions {
            if question.user.as_deref() != Some(question.right.as_str()) {
                question.user = None;
            }
        }
        self.enabled = true;
        self.view = AnswerView::Working;
        self.coloring = None;
        self.answer_text_visible = false;
        self.message = None;
        self.record("retry");
        Ok(())
    }

    fn redo(&mut self) -> Result<()> {
        for question in &mut self.questions {
            question.user = question.initial.clone();
            question.submitted = None;
        }
        self.hidden = self.initial_hidden.clone();
        self.state = WidgetState::Enabled;
        self.enabled = true;
        self.view = AnswerView::Working;
        self.coloring = None;
        self.answer_text_visible = false;
        self.score_text = None;
        self.message = None;
        self.record("redo");
        Ok(())
    }

    fn show_user_answer(&mut self) -> Result<()> {
        self.view = AnswerView::User;
        self.record("userAnswer");
        Ok(())
    }

    fn show_right_answer(&mut self) -> Result<()> {
        self.view = AnswerView::Right;
        self.record("rightAnswer");
        Ok(())
    }

    fn show_answer_text(&mut self) -> Result<()> {
        self.answer_text_visible = true;
        self.record("answerText");
        Ok(())
    }

    fn color(&mut self, mode: ColorMode) -> Result<()> {
        self.coloring = Some(mode);
        self.record(format!("color({:?})", mode));
        Ok(())
    }

    fn compute_score(&self) -> Result<Score> {
        let right = self
            .questions
            .iter()
            .filter(|q| q.user.as_deref() == Some(q.right.as_str()))
            .count();
        Ok(Score::new(right as f64, self.questions.len() as u32))
    }

    fn display_score(&mut self, text: Option<&str>) -> Result<()> {
        self.score_text = text.map(str::to_string);
        self.record(format!("displayScore({})", text.unwrap_or("")));
        Ok(())
    }

    fn show_message(&mut self, mode: &str, percent: f64) -> Result<()> {
        if let Some(text) = self.board.pick(mode, percent, self.messages_shown) {
            self.message = Some(text.to_string());
            self.messages_shown += 1;
        }
        self.record(format!("showMessage({})", mode));
        Ok(())
    }

    fn hide_messages(&mut self) -> Result<()> {
        self.message = None;
        self.record("hideMessages");
        Ok(())
    }
}

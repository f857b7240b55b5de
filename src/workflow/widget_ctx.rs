//! 组件上下文
//!
//! 封装"某个测验动作栏当前走到哪一步"：计数器、重试次数、计时器和最近得分。
//! 每个组件一份，互不影响。

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;

use crate::models::action::Condition;
use crate::models::score::Score;
use crate::services::timer::QuizTimer;

/// 派生计数器：没有重试机会或已满分时为 1
pub const MAX_RETRY: &str = "maxRetry";
/// 派生计数器：得分百分比（取整）
pub const SCORE: &str = "score";
/// 派生计数器：倒计时结束后为 1
pub const END_COUNTDOWN: &str = "endCountdown";

/// 组件上下文
#[derive(Debug, Clone)]
pub struct WidgetContext {
    /// 测验 ID（仅用于日志和存储键）
    pub quiz_id: String,

    counters: HashMap<String, i64>,

    /// 配置的重试次数
    nb_retry: i64,

    /// 剩余重试次数
    retries_left: i64,

    base_score: Option<u32>,

    /// 单题测验的题型；多题或组合题为 `None`
    engine: Option<String>,

    last_score: Option<Score>,

    timer: QuizTimer,
}

impl WidgetContext {
    /// 创建新的组件上下文
    pub fn new(quiz_id: impl Into<String>, nb_retry: i64, countdown: Option<u32>) -> Self {
        let mut ctx = Self {
            quiz_id: quiz_id.into(),
            counters: HashMap::new(),
            nb_retry,
            retries_left: nb_retry,
            base_score: None,
            engine: None,
            last_score: None,
            timer: QuizTimer::new(countdown),
        };
        ctx.refresh_retry_counter();
        ctx
    }

    pub fn with_base_score(mut self, base_score: Option<u32>) -> Self {
        self.base_score = base_score;
        self
    }

    pub fn with_engine(mut self, engine: Option<String>) -> Self {
        self.engine = engine;
        self
    }

    /// 读取计数器，不存在时为 0
    pub fn counter(&self, label: &str) -> i64 {
        self.counters.get(label).copied().unwrap_or(0)
    }

    /// 计算 `goto` / `setif` 的条件值
    ///
    /// 题型条件只对单题测验成立；得分条件在还没有得分时为 0。
    pub fn condition(&self, condition: &Condition) -> i64 {
        match condition {
            Condition::Counter(label) => self.counter(label),
            Condition::Engine(engines) => {
                let matched = self
                    .engine
                    .as_deref()
                    .is_some_and(|engine| engines.iter().any(|e| e == engine));
                i64::from(matched)
            }
            Condition::ScoreEq(percent) => {
                let matched = self.last_score.is_some_and(|score| {
                    score.total != 0 && (score.percent() - *percent as f64).abs() < f64::EPSILON
                });
                i64::from(matched)
            }
        }
    }

    pub fn set_counter(&mut self, label: impl Into<String>, value: i64) {
        self.counters.insert(label.into(), value);
    }

    /// 所有计数器（按名称排序）
    pub fn counters(&self) -> BTreeMap<&str, i64> {
        self.counters
            .iter()
            .map(|(k, v)| (k.as_str(), *v))
            .collect()
    }

    pub fn retries_left(&self) -> i64 {
        self.retries_left
    }

    /// 消耗一次重试机会
    pub fn consume_retry(&mut self) {
        self.retries_left -= 1;
        self.refresh_retry_counter();
    }

    pub fn base_score(&self) -> Option<u32> {
        self.base_score
    }

    pub fn last_score(&self) -> Option<Score> {
        self.last_score
    }

    pub fn timer(&self) -> &QuizTimer {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut QuizTimer {
        &mut self.timer
    }

    /// 记录新得分并刷新派生计数器
    pub fn record_score(&mut self, score: Score) {
        self.last_score = Some(score);
        self.set_counter(SCORE, score.percent().round() as i64);
        self.refresh_retry_counter();
    }

    /// 根据计时器刷新 `endCountdown`
    pub fn refresh_countdown(&mut self) {
        let expired = i64::from(self.timer.is_expired());
        self.set_counter(END_COUNTDOWN, expired);
    }

    fn refresh_retry_counter(&mut self) {
        let perfect = self.last_score.is_some_and(|s| s.is_perfect());
        let exhausted = self.retries_left <= 0 || perfect;
        self.set_counter(MAX_RETRY, i64::from(exhausted));
    }

    /// 重新开始：清空计数器、得分，计时器和重试次数回到初始值
    pub fn reset(&mut self) {
        self.counters.clear();
        self.last_score = None;
        self.retries_left = self.nb_retry;
        self.timer.reset(true);
        self.refresh_retry_counter();
    }
}

impl Display for WidgetContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[测验 {}]", self.quiz_id)
    }
}

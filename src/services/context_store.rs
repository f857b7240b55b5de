//! 上下文存储 - 业务能力层
//!
//! 保存动作栏的操作历史，页面重新打开时按历史回放。

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::score::Score;
use crate::models::trigger::{RIGHT_ANSWER, USER_ANSWER};

const COUNTDOWN_PREFIX: &str = "countdown_";

/// 上下文有效期
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextTtl {
    /// 不保存
    Disabled,
    /// 会话期内有效
    Session,
    Seconds(u64),
}

impl ContextTtl {
    /// 配置值：缺省或负数不保存，0 为会话期，正数为秒
    pub fn from_config(ttl: Option<i64>) -> Self {
        match ttl {
            None => ContextTtl::Disabled,
            Some(t) if t < 0 => ContextTtl::Disabled,
            Some(0) => ContextTtl::Session,
            Some(t) => ContextTtl::Seconds(t as u64),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, ContextTtl::Disabled)
    }
}

/// 存储键
pub fn context_id(quiz_id: &str) -> String {
    format!("{}_action", quiz_id)
}

/// 动作栏的操作历史
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionHistory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chrono: Option<u64>,
    /// 每次提交时的得分，按提交顺序
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scores: Vec<Score>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    /// 只在本次会话内有效，不写入持久存储
    #[serde(skip)]
    pub session_only: bool,
}

impl ActionHistory {
    pub fn new(key: Option<String>) -> Self {
        Self {
            key,
            ..Default::default()
        }
    }

    /// 记录一次按钮操作
    ///
    /// 连续切换"用户答案/正确答案"会互相抵消，只保留最后的状态。
    pub fn record(&mut self, action: &str) {
        let last = self.actions.last().map(String::as_str);
        let toggles_back = (action == USER_ANSWER && last == Some(RIGHT_ANSWER))
            || (action == RIGHT_ANSWER && last == Some(USER_ANSWER));
        if toggles_back {
            self.actions.pop();
        } else {
            self.actions.push(action.to_string());
        }
    }

    /// 记录倒计时剩余值，替换上一条倒计时记录
    pub fn record_countdown(&mut self, remaining: i64) {
        if self
            .actions
            .last()
            .is_some_and(|a| a.starts_with(COUNTDOWN_PREFIX))
        {
            self.actions.pop();
        }
        self.actions.push(format!("{}{}", COUNTDOWN_PREFIX, remaining));
    }

    pub fn record_chrono(&mut self, value: u64) {
        self.chrono = Some(value);
    }

    pub fn record_score(&mut self, score: Score) {
        self.scores.push(score);
    }

    /// 解析倒计时记录
    pub fn parse_countdown(action: &str) -> Option<i64> {
        action.strip_prefix(COUNTDOWN_PREFIX)?.parse().ok()
    }

    /// 历史的紧凑写法 `validate::retry::…`
    pub fn encoded(&self) -> String {
        self.actions.join("::")
    }

    pub fn is_expired(&self, ttl: ContextTtl, now: DateTime<Utc>) -> bool {
        match (ttl, self.saved_at) {
            (ContextTtl::Seconds(seconds), Some(saved_at)) => {
                // 超出可表示范围的有效期视为永不过期
                let deadline = i64::try_from(seconds)
                    .ok()
                    .and_then(Duration::try_seconds)
                    .and_then(|lifetime| saved_at.checked_add_signed(lifetime));
                deadline.is_some_and(|deadline| deadline < now)
            }
            _ => false,
        }
    }
}

/// 上下文存储能力
pub trait ContextStore: Send + Sync {
    /// 存储是否已就绪（加载完成）
    fn is_ready(&self) -> bool {
        true
    }

    fn save(&self, id: &str, history: &ActionHistory) -> Result<()>;

    fn load(&self, id: &str) -> Result<Option<ActionHistory>>;

    fn clear(&self, id: &str) -> Result<()>;
}

fn encode(history: &ActionHistory) -> AppResult<String> {
    Ok(serde_json::to_string(history)?)
}

fn decode(json: &str) -> AppResult<ActionHistory> {
    Ok(serde_json::from_str(json)?)
}

/// 内存存储
#[derive(Debug, Default)]
pub struct MemoryContextStore {
    entries: Mutex<HashMap<String, String>>,
    pending_loads: AtomicUsize,
}

impl MemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 标记一次尚未完成的加载
    pub fn begin_loading(&self) {
        self.pending_loads.fetch_add(1, Ordering::SeqCst);
    }

    pub fn finish_loading(&self) {
        let _ = self
            .pending_loads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    /// 原始 JSON 文本
    pub fn raw(&self, id: &str) -> Option<String> {
        self.entries.lock().ok()?.get(id).cloned()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| AppError::Other("上下文存储锁已损坏".to_string()).into())
    }
}

impl ContextStore for MemoryContextStore {
    fn is_ready(&self) -> bool {
        self.pending_loads.load(Ordering::SeqCst) == 0
    }

    fn save(&self, id: &str, history: &ActionHistory) -> Result<()> {
        let json = encode(history)?;
        self.entries()?.insert(id.to_string(), json);
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Option<ActionHistory>> {
        let entries = self.entries()?;
        match entries.get(id) {
            Some(json) => Ok(Some(decode(json)?)),
            None => Ok(None),
        }
    }

    fn clear(&self, id: &str) -> Result<()> {
        self.entries()?.remove(id);
        Ok(())
    }
}

/// JSON 文件存储，所有测验共用一个文件
///
/// 会话期内有效的历史只留在内存里，进程结束即失效。
#[derive(Debug)]
pub struct JsonFileContextStore {
    path: PathBuf,
    lock: Mutex<()>,
    session: MemoryContextStore,
}

impl JsonFileContextStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            session: MemoryContextStore::new(),
        }
    }

    fn read_all(&self) -> Result<BTreeMap<String, ActionHistory>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| AppError::file_read_failed(self.path.display().to_string(), e))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        let all = serde_json::from_str(&content)
            .map_err(|e| AppError::json_parse_failed(self.path.display().to_string(), e))?;
        Ok(all)
    }

    fn write_all(&self, all: &BTreeMap<String, ActionHistory>) -> Result<()> {
        let json = serde_json::to_string_pretty(all)?;
        std::fs::write(&self.path, json)
            .map_err(|e| AppError::file_write_failed(self.path.display().to_string(), e))?;
        debug!("上下文已写入 {}", self.path.display());
        Ok(())
    }

    fn update<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, ActionHistory>),
    {
        let _guard = self.lock.lock().map_err(|_| AppError::Other("上下文文件锁已损坏".to_string()))?;
        let mut all = self.read_all()?;
        change(&mut all);
        self.write_all(&all)
    }
}

impl ContextStore for JsonFileContextStore {
    fn save(&self, id: &str, history: &ActionHistory) -> Result<()> {
        if history.session_only {
            self.session.save(id, history)?;
            return self.update(|all| {
                all.remove(id);
            });
        }
        self.session.clear(id)?;
        self.update(|all| {
            all.insert(id.to_string(), history.clone());
        })
    }

    fn load(&self, id: &str) -> Result<Option<ActionHistory>> {
        if let Some(history) = self.session.load(id)? {
            return Ok(Some(history));
        }
        let _guard = self.lock.lock().map_err(|_| AppError::Other("上下文文件锁已损坏".to_string()))?;
        Ok(self.read_all()?.remove(id))
    }

    fn clear(&self, id: &str) -> Result<()> {
        self.session.clear(id)?;
        self.update(|all| {
            all.remove(id);
        })
    }
}

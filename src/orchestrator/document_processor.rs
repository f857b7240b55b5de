//! 单个场景回放器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责回放单个测验场景，是场景级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **组装组件**：内存测验 + 场景表 + 上下文存储 + SCORM 上报
//! 2. **恢复上下文**：等待存储就绪后回放保存的历史
//! 3. **回放序列**：按配置依次按按钮、作答、计时
//! 4. **统计输出**：记录执行的动作数和最终状态

use anyhow::Result;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::infrastructure::lms_bridge::MemoryLms;
use crate::infrastructure::memory_quiz::MemoryQuiz;
use crate::models::document::ScenarioDocument;
use crate::models::trigger::Button;
use crate::services::context_store::ContextStore;
use crate::services::scorm_reporter::ScormReporter;
use crate::utils::logging::{append_log_line, truncate_text};
use crate::workflow::QuizWidget;

/// 回放序列中的一项
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayItem {
    Press(Button),
    /// `q1=b`：作答
    Answer { question: String, value: String },
    /// 计时一秒
    Tick,
    /// 触发 `onModified`
    Modified,
    Unknown(String),
}

impl ReplayItem {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if let Some((question, value)) = text.split_once('=') {
            return ReplayItem::Answer {
                question: question.trim().to_string(),
                value: value.trim().to_string(),
            };
        }
        match text {
            "tick" => ReplayItem::Tick,
            "modified" => ReplayItem::Modified,
            _ => Button::from_trigger(text)
                .map(ReplayItem::Press)
                .unwrap_or_else(|| ReplayItem::Unknown(text.to_string())),
        }
    }
}

impl fmt::Display for ReplayItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayItem::Press(button) => write!(f, "{}", button.trigger()),
            ReplayItem::Answer { question, value } => write!(f, "{}={}", question, value),
            ReplayItem::Tick => write!(f, "tick"),
            ReplayItem::Modified => write!(f, "modified"),
            ReplayItem::Unknown(text) => write!(f, "{}", text),
        }
    }
}

/// 回放统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayStats {
    /// 恢复上下文时回放的按钮次数
    pub restored: usize,
    pub presses: usize,
    /// 执行的动作总数
    pub actions: usize,
    pub skipped: usize,
    /// 最终分数文本
    pub score_text: Option<String>,
}

/// 回放单个测验场景
///
/// # 参数
/// - `doc`: 场景配置
/// - `doc_index`: 场景索引（用于日志）
/// - `config`: 配置
/// - `store`: 上下文存储
///
/// # 返回
/// 返回回放统计
pub async fn process_document(
    doc: &ScenarioDocument,
    doc_index: usize,
    config: &Config,
    store: Arc<dyn ContextStore>,
) -> Result<ReplayStats> {
    info!(
        "[场景 {}] 🎬 开始回放测验 {} ({} 个触发器)",
        doc_index,
        doc.id,
        doc.scenario.len()
    );

    let quiz = MemoryQuiz::from_document(&config.class_prefix, doc);
    let mut widget = QuizWidget::from_document(doc, quiz, config.strict_actions)?
        .attach_store(store)
        .with_verbose_logging(config.verbose_logging);

    let lms = Arc::new(Mutex::new(MemoryLms::new(config.scorm())));
    widget
        .registry_mut()
        .register_scorm(ScormReporter::new(Arc::clone(&lms)));

    if config.strict_actions {
        widget.validate_actions()?;
    }

    let mut stats = ReplayStats {
        restored: widget.restore_context(config.poll_policy()).await?,
        ..Default::default()
    };
    widget.start_timer();

    for item in config.replay_items().iter().map(|s| ReplayItem::parse(s)) {
        match &item {
            ReplayItem::Press(button) => {
                let report = widget.press(*button)?;
                stats.presses += 1;
                stats.actions += report.actions.len();
            }
            ReplayItem::Answer { question, value } => {
                if widget.quiz_mut().answer(question, value.as_str()) {
                    let report = widget.on_modified()?;
                    stats.actions += report.actions.len();
                } else {
                    warn!("[场景 {}] ⚠️ 无法作答 {} (已锁定或题目不存在)", doc_index, item);
                    stats.skipped += 1;
                }
            }
            ReplayItem::Tick => {
                if let Some(report) = widget.tick()? {
                    stats.actions += report.actions.len();
                }
            }
            ReplayItem::Modified => {
                let report = widget.on_modified()?;
                stats.actions += report.actions.len();
            }
            ReplayItem::Unknown(text) => {
                warn!(
                    "[场景 {}] ⚠️ 无法识别的回放项 '{}'，跳过",
                    doc_index,
                    truncate_text(text, 40)
                );
                stats.skipped += 1;
            }
        }
    }

    stats.score_text = widget.quiz().score_text().map(str::to_string);

    let summary = format!(
        "{} 状态={} 分数={} 计数器={:?} 历史={} 计时={}",
        widget.ctx(),
        widget.quiz().state(),
        stats.score_text.as_deref().unwrap_or("-"),
        widget.ctx().counters(),
        widget.history().encoded(),
        widget.ctx().timer().display()
    );
    info!("[场景 {}] {}", doc_index, summary);
    if let Err(e) = append_log_line(&config.output_log_file, &summary) {
        error!("[场景 {}] 写入日志文件失败: {}", doc_index, e);
    }

    log_document_complete(doc_index, &stats, &lms);
    Ok(stats)
}

fn log_document_complete(doc_index: usize, stats: &ReplayStats, lms: &Mutex<MemoryLms>) {
    info!("[场景 {}] {}", doc_index, "─".repeat(40));
    info!(
        "[场景 {}] ✓ 回放完成: 按钮 {} 次, 动作 {} 个, 跳过 {} 项, 恢复 {} 次",
        doc_index, stats.presses, stats.actions, stats.skipped, stats.restored
    );
    if let Ok(lms) = lms.lock() {
        if !lms.calls().is_empty() {
            info!("[场景 {}] 📤 LMS 调用 {} 次", doc_index, lms.calls().len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_replay_items() {
        assert_eq!(ReplayItem::parse("validate"), ReplayItem::Press(Button::Submit));
        assert_eq!(ReplayItem::parse(" retry "), ReplayItem::Press(Button::Retry));
        assert_eq!(
            ReplayItem::parse("q1 = b"),
            ReplayItem::Answer {
                question: "q1".into(),
                value: "b".into()
            }
        );
        assert_eq!(ReplayItem::parse("tick"), ReplayItem::Tick);
        assert_eq!(ReplayItem::parse("modified"), ReplayItem::Modified);
        assert_eq!(
            ReplayItem::parse("onEndCountdown"),
            ReplayItem::Unknown("onEndCountdown".into())
        );
        assert_eq!(ReplayItem::parse("q1=b").to_string(), "q1=b");
    }
}

//! SCORM 成绩上报 - 业务能力层
//!
//! 把测验得分写到 LMS：原始分、满分、最低分、归一化分数和通过状态。

use anyhow::Result;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::error::AppError;
use crate::infrastructure::lms_bridge::{LmsBridge, ScormVersion};
use crate::models::score::Score;

/// 默认及格线（百分比）
pub const DEFAULT_MASTERY_PERCENT: f64 = 50.0;

/// 多个组件共用一个 LMS 会话
impl<B: LmsBridge> LmsBridge for Arc<Mutex<B>> {
    fn version(&self) -> ScormVersion {
        match self.lock() {
            Ok(bridge) => bridge.version(),
            Err(poisoned) => poisoned.into_inner().version(),
        }
    }

    fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        self.lock()
            .map_err(|_| AppError::Other("LMS 会话锁已损坏".to_string()))?
            .set_value(key, value)
    }

    fn commit(&mut self) -> Result<()> {
        self.lock().map_err(|_| AppError::Other("LMS 会话锁已损坏".to_string()))?.commit()
    }

    fn terminate(&mut self) -> Result<()> {
        self.lock()
            .map_err(|_| AppError::Other("LMS 会话锁已损坏".to_string()))?
            .terminate()
    }
}

/// SCORM 成绩上报器
#[derive(Debug)]
pub struct ScormReporter<B> {
    bridge: B,
    mastery_percent: f64,
    finished: bool,
    reports: usize,
}

impl<B: LmsBridge> ScormReporter<B> {
    pub fn new(bridge: B) -> Self {
        Self {
            bridge,
            mastery_percent: DEFAULT_MASTERY_PERCENT,
            finished: false,
            reports: 0,
        }
    }

    /// 设置及格线（百分比）
    pub fn with_mastery(mut self, percent: f64) -> Self {
        self.mastery_percent = percent;
        self
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// 已上报次数
    pub fn reports(&self) -> usize {
        self.reports
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// 上报一次得分，`finish` 时结束会话
    ///
    /// 会话结束后的上报直接忽略。
    pub fn report(&mut self, score: &Score, finish: bool) -> Result<()> {
        if self.finished {
            warn!("⚠️ SCORM 会话已结束，忽略本次上报");
            return Ok(());
        }

        let version = self.bridge.version();
        let passed = score.total != 0 && score.percent() >= self.mastery_percent;
        let status = if passed { "passed" } else { "failed" };

        self.bridge
            .set_value(version.score_raw_key(), &format_number(score.score))?;
        self.bridge
            .set_value(version.score_max_key(), &score.total.to_string())?;
        self.bridge.set_value(version.score_min_key(), "0")?;
        if let Some(key) = version.score_scaled_key() {
            let scaled = if score.total == 0 {
                0.0
            } else {
                score.score / f64::from(score.total)
            };
            self.bridge.set_value(key, &format!("{:.2}", scaled))?;
        }
        self.bridge.set_value(version.status_key(), status)?;
        if let Some(key) = version.completion_key() {
            self.bridge.set_value(key, "completed")?;
        }
        self.bridge.commit()?;
        self.reports += 1;

        info!(
            "📤 SCORM 上报: {} / {} ({})",
            format_number(score.score),
            score.total,
            status
        );

        if finish {
            self.bridge.terminate()?;
            self.finished = true;
            info!("SCORM 会话已结束");
        }

        Ok(())
    }
}

/// 整数不带小数点
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

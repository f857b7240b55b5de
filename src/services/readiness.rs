//! 就绪等待 - 业务能力层
//!
//! 外部资源（上下文存储、LMS）异步就绪时，按固定间隔轮询，超时即放弃。

use std::time::Duration;
use tracing::debug;

/// 轮询策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// 最长等待时间
    pub max: Duration,
    /// 轮询间隔
    pub step: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max: Duration::from_millis(5000),
            step: Duration::from_millis(100),
        }
    }
}

impl PollPolicy {
    pub fn from_millis(max_ms: u64, step_ms: u64) -> Self {
        Self {
            max: Duration::from_millis(max_ms),
            step: Duration::from_millis(step_ms),
        }
    }

    /// 最多检查次数：`max / step`，至少一次
    pub fn max_attempts(&self) -> u32 {
        if self.step.is_zero() {
            return 1;
        }
        let attempts = self.max.as_nanos() / self.step.as_nanos();
        attempts.clamp(1, u128::from(u32::MAX)) as u32
    }
}

/// 轮询结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Ready { attempts: u32 },
    TimedOut { attempts: u32 },
}

impl PollOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, PollOutcome::Ready { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Ready { attempts } | PollOutcome::TimedOut { attempts } => *attempts,
        }
    }
}

/// 等待 `ready` 返回 `true`
///
/// 立即检查一次，之后每隔 `step` 再检查，总次数不超过 [`PollPolicy::max_attempts`]。
pub async fn wait_until<F>(policy: PollPolicy, mut ready: F) -> PollOutcome
where
    F: FnMut() -> bool,
{
    let max_attempts = policy.max_attempts();

    for attempt in 1..=max_attempts {
        if ready() {
            debug!("资源已就绪 (第 {} 次检查)", attempt);
            return PollOutcome::Ready { attempts: attempt };
        }
        if attempt < max_attempts {
            tokio::time::sleep(policy.step).await;
        }
    }

    debug!("等待资源超时 (共检查 {} 次)", max_attempts);
    PollOutcome::TimedOut {
        attempts: max_attempts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_attempts() {
        assert_eq!(PollPolicy::default().max_attempts(), 50);
        assert_eq!(PollPolicy::from_millis(50, 100).max_attempts(), 1);
        assert_eq!(PollPolicy::from_millis(100, 0).max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_fifty_polls() {
        let mut polls = 0;
        let started = tokio::time::Instant::now();

        let outcome = wait_until(PollPolicy::from_millis(5000, 100), || {
            polls += 1;
            false
        })
        .await;

        assert_eq!(outcome, PollOutcome::TimedOut { attempts: 50 });
        assert_eq!(polls, 50);
        assert!(started.elapsed() <= Duration::from_millis(5000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_as_soon_as_ready() {
        let mut polls = 0;
        let outcome = wait_until(PollPolicy::default(), || {
            polls += 1;
            polls == 3
        })
        .await;

        assert!(outcome.is_ready());
        assert_eq!(outcome.attempts(), 3);
    }

    #[test]
    fn test_ready_immediately_without_runtime_sleep() {
        let outcome = tokio_test::block_on(wait_until(PollPolicy::default(), || true));
        assert_eq!(outcome, PollOutcome::Ready { attempts: 1 });
    }
}

//! 计时服务 - 业务能力层
//!
//! 每个组件一个计时器：配置了倒计时就倒数，否则正计时。
//! 宿主每秒调用一次 [`QuizTimer::tick`]。

/// 计时方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    Countdown,
    Chrono,
}

/// 一次 tick 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// 计时器未运行
    Idle,
    Running,
    /// 倒计时刚刚结束
    Expired,
}

#[derive(Debug, Clone)]
pub struct QuizTimer {
    countdown_start: Option<u32>,
    mode: Option<TimerMode>,
    running: bool,
    countdown: i64,
    chrono: u64,
}

impl QuizTimer {
    pub fn new(countdown: Option<u32>) -> Self {
        Self {
            countdown_start: countdown,
            mode: None,
            running: false,
            countdown: countdown.map(i64::from).unwrap_or(0),
            chrono: 0,
        }
    }

    /// 启动计时，已在运行时不做任何事
    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.mode = Some(if self.countdown_start.is_some() {
            TimerMode::Countdown
        } else {
            TimerMode::Chrono
        });
        self.running = true;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }

        match self.mode {
            Some(TimerMode::Countdown) => {
                self.countdown -= 1;
                if self.countdown < 0 {
                    self.countdown = 0;
                    self.running = false;
                    TickOutcome::Expired
                } else {
                    TickOutcome::Running
                }
            }
            Some(TimerMode::Chrono) => {
                self.chrono += 1;
                TickOutcome::Running
            }
            None => TickOutcome::Idle,
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// 继续之前启动过的计时，返回是否恢复成功
    pub fn resume(&mut self) -> bool {
        if self.mode.is_none() || self.is_expired() {
            return false;
        }
        self.running = true;
        true
    }

    /// 停止并清空模式；`full` 时同时把数值恢复到初始值
    pub fn reset(&mut self, full: bool) {
        self.running = false;
        self.mode = None;
        if full {
            self.chrono = 0;
            self.countdown = self.countdown_start.map(i64::from).unwrap_or(0);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn mode(&self) -> Option<TimerMode> {
        self.mode
    }

    pub fn has_countdown(&self) -> bool {
        self.countdown_start.is_some()
    }

    /// 配置了倒计时且已经走完
    pub fn is_expired(&self) -> bool {
        self.countdown_start.is_some() && self.countdown <= 0
    }

    pub fn countdown_value(&self) -> i64 {
        self.countdown
    }

    pub fn chrono_value(&self) -> u64 {
        self.chrono
    }

    pub fn set_countdown(&mut self, value: i64) {
        self.countdown = value;
    }

    pub fn set_chrono(&mut self, value: u64) {
        self.chrono = value;
    }

    /// 当前显示值
    pub fn display(&self) -> String {
        if self.countdown_start.is_some() {
            format_timer(self.countdown)
        } else {
            format_timer(self.chrono as i64)
        }
    }
}

/// 格式化为 `分:秒`，负数按 0 处理
pub fn format_timer(seconds: i64) -> String {
    let seconds = seconds.max(0);
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

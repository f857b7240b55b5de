//! 触发器名称与按钮

/// 提交按钮触发的场景
pub const VALIDATE: &str = "validate";
pub const VERIFY: &str = "verify";
pub const RETRY: &str = "retry";
pub const REDO: &str = "redo";
pub const USER_ANSWER: &str = "userAnswer";
pub const RIGHT_ANSWER: &str = "rightAnswer";
/// 作答内容变化时触发
pub const ON_MODIFIED: &str = "onModified";
/// 倒计时结束时触发
pub const ON_END_COUNTDOWN: &str = "onEndCountdown";

/// 动作栏上的按钮
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Submit,
    UserAnswer,
    RightAnswer,
    VerifyUserAnswer,
    Retry,
    Redo,
}

impl Button {
    pub const ALL: [Button; 6] = [
        Button::Submit,
        Button::UserAnswer,
        Button::RightAnswer,
        Button::VerifyUserAnswer,
        Button::Retry,
        Button::Redo,
    ];

    /// 按钮对应的触发器
    pub fn trigger(self) -> &'static str {
        match self {
            Button::Submit => VALIDATE,
            Button::UserAnswer => USER_ANSWER,
            Button::RightAnswer => RIGHT_ANSWER,
            Button::VerifyUserAnswer => VERIFY,
            Button::Retry => RETRY,
            Button::Redo => REDO,
        }
    }

    /// 按钮 class 后缀（不含前缀）
    pub fn class_suffix(self) -> &'static str {
        match self {
            Button::Submit => "Submit",
            Button::UserAnswer => "UserAnswer",
            Button::RightAnswer => "RightAnswer",
            Button::VerifyUserAnswer => "VerifyUserAnswer",
            Button::Retry => "Retry",
            Button::Redo => "Redo",
        }
    }

    /// 从触发器名称反查按钮
    pub fn from_trigger(trigger: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.trigger() == trigger)
    }
}

impl std::fmt::Display for Button {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.class_suffix())
    }
}

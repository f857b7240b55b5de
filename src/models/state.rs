use serde::{Deserialize, Serialize};

/// 测验组件的状态标签，同一时刻只有一个生效
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WidgetState {
    /// 可作答
    #[default]
    Enabled,
    /// 已禁用
    Disabled,
    /// 已提交
    Validated,
    /// 显示正确答案
    RightAnswer,
    /// 显示用户答案
    UserAnswer,
    /// 已批改
    Corrected,
}

impl WidgetState {
    pub const ALL: [WidgetState; 6] = [
        WidgetState::Enabled,
        WidgetState::Disabled,
        WidgetState::Validated,
        WidgetState::RightAnswer,
        WidgetState::UserAnswer,
        WidgetState::Corrected,
    ];

    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            WidgetState::Enabled => "Enabled",
            WidgetState::Disabled => "Disabled",
            WidgetState::Validated => "Validated",
            WidgetState::RightAnswer => "RightAnswer",
            WidgetState::UserAnswer => "UserAnswer",
            WidgetState::Corrected => "Corrected",
        }
    }

    /// 从名称解析状态（精确匹配）
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|state| state.name() == s)
    }

    /// 引擎元素上的状态 class，`Enabled` 没有 class
    pub fn css_class(self, prefix: &str) -> Option<String> {
        match self {
            WidgetState::Enabled => None,
            other => Some(format!("{}State{}", prefix, other.name())),
        }
    }
}

impl std::fmt::Display for WidgetState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 答案着色方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorMode {
    /// 标出用户答案的对错
    User,
    /// 只标出正确的答案
    Right,
    /// 标出全部答案的对错
    Full,
}

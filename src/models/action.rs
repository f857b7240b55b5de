//! 场景动作
//!
//! 场景表里的每一项都是形如 `hide(Retry)`、`goto(maxRetry,1,2)` 的字符串，
//! 加载时一次性解析成 [`Action`]，执行时不再做字符串分派。

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::models::state::{ColorMode, WidgetState};

/// 动作字符串解析错误
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("动作为空")]
    Empty,
    #[error("括号不匹配: {0}")]
    Unbalanced(String),
    #[error("动作 {action} 需要 {expected} 个参数，实际 {found} 个")]
    Arity {
        action: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("动作 {action} 的参数 '{value}' 不是整数")]
    NotANumber { action: &'static str, value: String },
    #[error("未知的状态: {0}")]
    UnknownState(String),
    #[error("正则表达式错误: {0}")]
    Pattern(#[from] regex::Error),
}

/// `name` 或 `name(args)`
static INVOCATION: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^([^()]+)(?:\((.*)\))?$"));

/// 原始动作调用：动作名 + 参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInvocation {
    pub name: String,
    pub args: Vec<String>,
}

impl RawInvocation {
    /// 解析动作字符串
    ///
    /// 空格会被忽略。`goto`/`setif` 的第一个参数可以自带括号，
    /// 例如 `goto(engine(choices,blanks),1,2)`。
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Err(ParseError::Empty);
        }

        let re = INVOCATION.as_ref().map_err(|e| ParseError::Pattern(e.clone()))?;
        let caps = re
            .captures(&compact)
            .ok_or_else(|| ParseError::Unbalanced(compact.clone()))?;

        let name = caps[1].to_string();
        let inner = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        if inner.matches('(').count() != inner.matches(')').count() {
            return Err(ParseError::Unbalanced(compact));
        }

        Ok(Self {
            name,
            args: split_args(inner),
        })
    }
}

/// 拆分参数列表，带括号的首参数保持完整
fn split_args(inner: &str) -> Vec<String> {
    if inner.is_empty() {
        return Vec::new();
    }

    match inner.rfind(')') {
        Some(idx) if idx > 0 => {
            let mut args = vec![inner[..=idx].to_string()];
            args.extend(
                inner[idx + 1..]
                    .split(',')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            );
            args
        }
        _ => inner.split(',').map(str::to_string).collect(),
    }
}

impl fmt::Display for RawInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}({})", self.name, self.args.join(","))
        }
    }
}

/// `goto` / `setif` 的条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// 计数器，包括 `maxRetry`、`score`、`endCountdown` 等派生计数器
    Counter(String),
    /// `engine(choices,blanks)`：单题测验的题型在列表中时为 1
    Engine(Vec<String>),
    /// `scoreEq100`：得分百分比恰好等于给定值时为 1
    ScoreEq(i64),
}

impl Condition {
    pub fn parse(text: &str) -> Self {
        if let Some(list) = text
            .strip_prefix("engine(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return Condition::Engine(
                list.split(',')
                    .filter(|e| !e.is_empty())
                    .map(str::to_string)
                    .collect(),
            );
        }
        if let Some(percent) = text
            .strip_prefix("scoreEq")
            .and_then(|p| p.parse().ok())
        {
            return Condition::ScoreEq(percent);
        }
        Condition::Counter(text.to_string())
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Counter(label) => write!(f, "{}", label),
            Condition::Engine(engines) => write!(f, "engine({})", engines.join(",")),
            Condition::ScoreEq(percent) => write!(f, "scoreEq{}", percent),
        }
    }
}

/// 内置动作种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuiltinKind {
    Show,
    Hide,
    State,
    Validate,
    Disable,
    Retry,
    Redo,
    UserAnswer,
    RightAnswer,
    AnswerText,
    Score,
    UserColor,
    RightColor,
    FullColor,
    ShowMessage,
    StopTimer,
    ResumeTimer,
    Goto,
    Set,
    SetIf,
}

static BUILTINS: phf::Map<&'static str, BuiltinKind> = phf::phf_map! {
    "show" => BuiltinKind::Show,
    "hide" => BuiltinKind::Hide,
    "state" => BuiltinKind::State,
    "validate" => BuiltinKind::Validate,
    "disable" => BuiltinKind::Disable,
    "retry" => BuiltinKind::Retry,
    "redo" => BuiltinKind::Redo,
    "userAnswer" => BuiltinKind::UserAnswer,
    "rightAnswer" => BuiltinKind::RightAnswer,
    "answerText" => BuiltinKind::AnswerText,
    "score" => BuiltinKind::Score,
    "userColor" => BuiltinKind::UserColor,
    "rightColor" => BuiltinKind::RightColor,
    "fullColor" => BuiltinKind::FullColor,
    "showMessage" => BuiltinKind::ShowMessage,
    "stopTimer" => BuiltinKind::StopTimer,
    "resumeTimer" => BuiltinKind::ResumeTimer,
    "goto" => BuiltinKind::Goto,
    "set" => BuiltinKind::Set,
    "setif" => BuiltinKind::SetIf,
};

/// 是否为内置动作名
pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains_key(name)
}

/// 已解析的场景动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// 显示 `<前缀><目标>` 元素
    Show(Vec<String>),
    /// 隐藏 `<前缀><目标>` 元素
    Hide(Vec<String>),
    State(WidgetState),
    Validate,
    Disable,
    Retry,
    Redo,
    UserAnswer,
    RightAnswer,
    AnswerText,
    Score,
    Color(ColorMode),
    /// 按得分区间显示提示信息（Congratulate / Encourage …）
    ShowMessage(String),
    StopTimer,
    ResumeTimer,
    /// 条件值等于 `from` 时跳到第 `to` 步
    Goto {
        condition: Condition,
        from: i64,
        to: usize,
    },
    Set { label: String, value: i64 },
    /// 条件值非零时把 `label` 设为 `ok`，否则设为 `nok`；`None` 表示不变
    SetIf {
        condition: Condition,
        label: String,
        nok: Option<i64>,
        ok: Option<i64>,
    },
    /// 非内置动作，执行时交给宿主注册的处理函数
    Custom { name: String, args: Vec<String> },
}

impl Action {
    /// 解析单个动作字符串
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Self::from_raw(RawInvocation::parse(text)?)
    }

    /// 把原始调用解析为内置动作或自定义动作
    pub fn from_raw(raw: RawInvocation) -> Result<Self, ParseError> {
        let Some(kind) = BUILTINS.get(raw.name.as_str()).copied() else {
            return Ok(Action::Custom {
                name: raw.name,
                args: raw.args,
            });
        };

        let args = raw.args;
        let action = match kind {
            BuiltinKind::Show => Action::Show(args),
            BuiltinKind::Hide => Action::Hide(args),
            BuiltinKind::State => {
                expect_arity("state", &args, 1)?;
                let state = WidgetState::parse(&args[0])
                    .ok_or_else(|| ParseError::UnknownState(args[0].clone()))?;
                Action::State(state)
            }
            BuiltinKind::Validate => Action::Validate,
            BuiltinKind::Disable => Action::Disable,
            BuiltinKind::Retry => Action::Retry,
            BuiltinKind::Redo => Action::Redo,
            BuiltinKind::UserAnswer => Action::UserAnswer,
            BuiltinKind::RightAnswer => Action::RightAnswer,
            BuiltinKind::AnswerText => Action::AnswerText,
            BuiltinKind::Score => Action::Score,
            BuiltinKind::UserColor => Action::Color(ColorMode::User),
            BuiltinKind::RightColor => Action::Color(ColorMode::Right),
            BuiltinKind::FullColor => Action::Color(ColorMode::Full),
            BuiltinKind::ShowMessage => {
                expect_arity("showMessage", &args, 1)?;
                Action::ShowMessage(args[0].clone())
            }
            BuiltinKind::StopTimer => Action::StopTimer,
            BuiltinKind::ResumeTimer => Action::ResumeTimer,
            BuiltinKind::Goto => {
                expect_arity("goto", &args, 3)?;
                let from = parse_number("goto", &args[1])?;
                let to = parse_number("goto", &args[2])?;
                let to = usize::try_from(to).map_err(|_| ParseError::NotANumber {
                    action: "goto",
                    value: args[2].clone(),
                })?;
                Action::Goto {
                    condition: Condition::parse(&args[0]),
                    from,
                    to,
                }
            }
            BuiltinKind::Set => {
                expect_arity("set", &args, 2)?;
                Action::Set {
                    label: args[0].clone(),
                    value: parse_number("set", &args[1])?,
                }
            }
            BuiltinKind::SetIf => {
                expect_arity("setif", &args, 4)?;
                Action::SetIf {
                    condition: Condition::parse(&args[0]),
                    label: args[1].clone(),
                    nok: parse_optional_number("setif", &args[2])?,
                    ok: parse_optional_number("setif", &args[3])?,
                }
            }
        };

        Ok(action)
    }

    /// 动作名（与场景表中的写法一致）
    pub fn name(&self) -> &str {
        match self {
            Action::Show(_) => "show",
            Action::Hide(_) => "hide",
            Action::State(_) => "state",
            Action::Validate => "validate",
            Action::Disable => "disable",
            Action::Retry => "retry",
            Action::Redo => "redo",
            Action::UserAnswer => "userAnswer",
            Action::RightAnswer => "rightAnswer",
            Action::AnswerText => "answerText",
            Action::Score => "score",
            Action::Color(ColorMode::User) => "userColor",
            Action::Color(ColorMode::Right) => "rightColor",
            Action::Color(ColorMode::Full) => "fullColor",
            Action::ShowMessage(_) => "showMessage",
            Action::StopTimer => "stopTimer",
            Action::ResumeTimer => "resumeTimer",
            Action::Goto { .. } => "goto",
            Action::Set { .. } => "set",
            Action::SetIf { .. } => "setif",
            Action::Custom { name, .. } => name,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Show(targets) | Action::Hide(targets) => {
                write!(f, "{}({})", self.name(), targets.join(","))
            }
            Action::State(state) => write!(f, "state({})", state),
            Action::ShowMessage(mode) => write!(f, "showMessage({})", mode),
            Action::Goto {
                condition,
                from,
                to,
            } => write!(f, "goto({},{},{})", condition, from, to),
            Action::Set { label, value } => write!(f, "set({},{})", label, value),
            Action::SetIf {
                condition,
                label,
                nok,
                ok,
            } => {
                let show = |v: &Option<i64>| v.map_or_else(|| "none".to_string(), |n| n.to_string());
                write!(f, "setif({},{},{},{})", condition, label, show(nok), show(ok))
            }
            Action::Custom { name, args } if args.is_empty() => write!(f, "{}", name),
            Action::Custom { name, args } => write!(f, "{}({})", name, args.join(",")),
            _ => write!(f, "{}", self.name()),
        }
    }
}

fn expect_arity(action: &'static str, args: &[String], expected: usize) -> Result<(), ParseError> {
    if args.len() != expected {
        return Err(ParseError::Arity {
            action,
            expected,
            found: args.len(),
        });
    }
    Ok(())
}

fn parse_number(action: &'static str, value: &str) -> Result<i64, ParseError> {
    value.parse().map_err(|_| ParseError::NotANumber {
        action,
        value: value.to_string(),
    })
}

fn parse_optional_number(action: &'static str, value: &str) -> Result<Option<i64>, ParseError> {
    if value == "none" {
        return Ok(None);
    }
    parse_number(action, value).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_spaced() {
        let raw = RawInvocation::parse(" hide( Retry , Submit ) ").unwrap();
        assert_eq!(raw.name, "hide");
        assert_eq!(raw.args, vec!["Retry", "Submit"]);

        let raw = RawInvocation::parse("score").unwrap();
        assert_eq!(raw.name, "score");
        assert!(raw.args.is_empty());
    }

    #[test]
    fn test_parse_nested_first_argument() {
        let raw = RawInvocation::parse("goto(engine(choices,blanks),1,2)").unwrap();
        assert_eq!(raw.name, "goto");
        assert_eq!(raw.args, vec!["engine(choices,blanks)", "1", "2"]);
    }

    #[test]
    fn test_parse_rejects_broken_text() {
        assert!(matches!(RawInvocation::parse("   "), Err(ParseError::Empty)));
        assert!(matches!(
            RawInvocation::parse("hide(Retry"),
            Err(ParseError::Unbalanced(_))
        ));
        assert!(matches!(
            RawInvocation::parse("goto(engine(a,1,2)"),
            Err(ParseError::Unbalanced(_))
        ));
    }

    #[test]
    fn test_resolve_builtins() {
        assert_eq!(
            Action::parse("goto(maxRetry,1,2)").unwrap(),
            Action::Goto {
                condition: Condition::Counter("maxRetry".into()),
                from: 1,
                to: 2
            }
        );
        assert_eq!(
            Action::parse("state(RightAnswer)").unwrap(),
            Action::State(WidgetState::RightAnswer)
        );
        assert_eq!(
            Action::parse("fullColor").unwrap(),
            Action::Color(ColorMode::Full)
        );
        assert_eq!(
            Action::parse("setif(maxRetry,validate,none,2)").unwrap(),
            Action::SetIf {
                condition: Condition::Counter("maxRetry".into()),
                label: "validate".into(),
                nok: None,
                ok: Some(2)
            }
        );
    }

    #[test]
    fn test_parse_conditions() {
        assert_eq!(
            Action::parse("goto(engine(choices,blanks),1,2)").unwrap(),
            Action::Goto {
                condition: Condition::Engine(vec!["choices".into(), "blanks".into()]),
                from: 1,
                to: 2
            }
        );
        assert_eq!(Condition::parse("scoreEq100"), Condition::ScoreEq(100));
        assert_eq!(
            Condition::parse("scoreEqual"),
            Condition::Counter("scoreEqual".into())
        );
        assert_eq!(
            Action::parse("goto(engine(choices),0,3)").unwrap().to_string(),
            "goto(engine(choices),0,3)"
        );
    }

    #[test]
    fn test_unknown_name_becomes_custom() {
        assert_eq!(
            Action::parse("scorm(finish)").unwrap(),
            Action::Custom {
                name: "scorm".into(),
                args: vec!["finish".into()]
            }
        );
        assert!(!is_builtin("scorm"));
    }

    #[test]
    fn test_bad_builtin_arguments() {
        assert!(matches!(
            Action::parse("goto(maxRetry,1)"),
            Err(ParseError::Arity { expected: 3, .. })
        ));
        assert!(matches!(
            Action::parse("set(validate,x)"),
            Err(ParseError::NotANumber { .. })
        ));
        assert!(matches!(
            Action::parse("goto(maxRetry,1,-1)"),
            Err(ParseError::NotANumber { .. })
        ));
        assert!(matches!(
            Action::parse("state(Sleeping)"),
            Err(ParseError::UnknownState(_))
        ));
    }

    #[test]
    fn test_display_matches_source_syntax() {
        for text in ["hide(Retry,Submit)", "goto(maxRetry,1,2)", "set(validate,0)", "score"] {
            assert_eq!(Action::parse(text).unwrap().to_string(), text);
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::models::message::MessageRange;
use crate::models::scenario::RawScenarioTable;

/// 测验中的一道题（内存测验使用）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionSpec {
    pub id: String,
    /// 正确答案
    pub right: String,
    /// 预置的用户答案
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// 题型，例如 `choices`、`blanks`、`composite`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
}

/// 一个测验动作栏的完整配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioDocument {
    /// 测验 ID，也用作上下文存储的键
    pub id: String,
    /// 允许重试次数，缺省为 -1（没有重试机会）
    #[serde(default = "default_nb_retry")]
    pub nb_retry: i64,
    /// 倒计时秒数，缺省时使用正计时
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countdown: Option<u32>,
    /// 显示分数时换算到的满分
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_score: Option<u32>,
    /// 上下文校验键
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_key: Option<String>,
    /// 上下文有效期：缺省或负数不保存，0 为会话期，正数为秒
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_ttl: Option<i64>,
    /// 初始隐藏的元素（不含前缀）
    #[serde(default)]
    pub hidden: Vec<String>,
    pub scenario: RawScenarioTable,
    #[serde(default)]
    pub messages: Vec<MessageRange>,
    #[serde(default)]
    pub questions: Vec<QuestionSpec>,
    #[serde(skip_serializing, skip_deserializing)]
    pub file_path: Option<String>,
}

fn default_nb_retry() -> i64 {
    -1
}

impl ScenarioDocument {
    pub fn with_file_path(mut self, file_path: String) -> Self {
        self.file_path = Some(file_path);
        self
    }

    /// 单题测验的题型，多题或组合题返回 `None`
    pub fn single_engine(&self) -> Option<&str> {
        match self.questions.as_slice() {
            [only] => only.engine.as_deref().filter(|e| *e != "composite"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let doc: ScenarioDocument = toml::from_str(
            r#"
            id = "q1"
            [scenario]
            validate = ["validate", "score"]
            "#,
        )
        .unwrap();

        assert_eq!(doc.nb_retry, -1);
        assert!(doc.countdown.is_none());
        assert!(doc.context_ttl.is_none());
        assert!(doc.hidden.is_empty());
        assert!(doc.questions.is_empty());
        assert!(doc.file_path.is_none());
        assert!(doc.single_engine().is_none());
    }

    #[test]
    fn test_single_engine() {
        let mut doc: ScenarioDocument = toml::from_str(
            r#"
            id = "q1"
            [scenario]
            validate = ["validate"]
            [[questions]]
            id = "a"
            right = "x"
            engine = "choices"
            "#,
        )
        .unwrap();
        assert_eq!(doc.single_engine(), Some("choices"));

        doc.questions[0].engine = Some("composite".into());
        assert_eq!(doc.single_engine(), None);

        doc.questions[0].engine = Some("choices".into());
        let second = doc.questions[0].clone();
        doc.questions.push(second);
        assert_eq!(doc.single_engine(), None);
    }
}

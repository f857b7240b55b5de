//! 场景表
//!
//! 触发器名 → 步骤列表 → 动作列表。加载后不可变，多个组件通过 `Arc` 共享。

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

use crate::error::AppError;
use crate::models::action::Action;

/// 一个步骤：按顺序执行的动作
pub type Step = Vec<Action>;

/// 配置文件中的一个场景
///
/// 可以写成多个步骤 `[["validate"], ["score"]]`，
/// 只有一步时也可以直接写成 `["validate", "score"]`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawScenario {
    Steps(Vec<Vec<String>>),
    Single(Vec<String>),
}

impl RawScenario {
    fn steps(&self) -> Vec<&[String]> {
        match self {
            RawScenario::Steps(steps) => steps.iter().map(Vec::as_slice).collect(),
            RawScenario::Single(step) => vec![step.as_slice()],
        }
    }
}

/// 配置文件中的场景表
pub type RawScenarioTable = BTreeMap<String, RawScenario>;

/// 已解析的场景表
#[derive(Debug, Clone, Default)]
pub struct ScenarioTable {
    scenarios: HashMap<String, Vec<Step>>,
}

impl ScenarioTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个触发器的场景（构建阶段使用）
    pub fn with_scenario(mut self, trigger: impl Into<String>, steps: Vec<Step>) -> Self {
        self.scenarios.insert(trigger.into(), steps);
        self
    }

    /// 解析配置中的场景表
    ///
    /// 严格模式下任何无法解析的动作都会报错；
    /// 否则记录警告并跳过该动作。
    pub fn compile(raw: &RawScenarioTable, strict: bool) -> Result<Self> {
        let mut scenarios = HashMap::new();

        for (trigger, raw_scenario) in raw {
            let mut steps = Vec::new();
            for (step_idx, raw_step) in raw_scenario.steps().into_iter().enumerate() {
                let mut step = Step::new();
                for text in raw_step {
                    match Action::parse(text) {
                        Ok(action) => step.push(action),
                        Err(e) if strict => {
                            return Err(AppError::action_parse_failed(
                                trigger.as_str(),
                                step_idx,
                                text.as_str(),
                                e,
                            )
                            .into());
                        }
                        Err(e) => {
                            warn!(
                                "⚠️ 忽略无法解析的动作 '{}' (触发器: {}, 步骤: {}): {}",
                                text, trigger, step_idx, e
                            );
                        }
                    }
                }
                steps.push(step);
            }
            scenarios.insert(trigger.clone(), steps);
        }

        Ok(Self { scenarios })
    }

    /// 获取触发器的步骤列表，未知触发器返回 `None`
    pub fn steps(&self, trigger: &str) -> Option<&[Step]> {
        self.scenarios.get(trigger).map(Vec::as_slice)
    }

    pub fn contains(&self, trigger: &str) -> bool {
        self.scenarios.contains_key(trigger)
    }

    /// 所有触发器名称（已排序）
    pub fn triggers(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.scenarios.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// 表中出现的所有自定义动作：`(触发器, 动作名)`
    pub fn custom_actions(&self) -> Vec<(&str, &str)> {
        let mut found = Vec::new();
        for trigger in self.triggers() {
            for step in self.scenarios[trigger].iter() {
                for action in step {
                    if let Action::Custom { name, .. } = action {
                        found.push((trigger, name.as_str()));
                    }
                }
            }
        }
        found
    }
}

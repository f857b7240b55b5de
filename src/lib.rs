//! # Quiz Scenario
//!
//! 一个场景驱动的测验动作栏：按钮触发场景，场景里的动作驱动测验
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有测验和 LMS 会话，只暴露能力
//! - `QuizAdapter` - 测验能力（显示/隐藏、状态、提交、重试、计分）
//! - `LmsBridge` - SCORM 1.2 / 2004 的 set-value / commit / terminate
//! - `MemoryQuiz` / `MemoryLms` - 内存实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不认识场景表
//! - `QuizTimer` - 倒计时 / 正计时
//! - `wait_until` - 有上限的就绪轮询
//! - `ContextStore` - 操作历史的保存与读取
//! - `ScormReporter` - 成绩上报
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次触发"的完整处理流程
//! - `WidgetContext` - 组件上下文（计数器、重试次数、计时器）
//! - `ActionRegistry` - 动作分派（内置 + 自定义）
//! - `ScenarioInterpreter` - 场景控制流（步骤、goto）
//! - `QuizWidget` - 按钮、计时、上下文回放
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量场景回放，持有上下文存储
//! - `orchestrator/document_processor` - 单个场景回放
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{LmsBridge, MemoryLms, MemoryQuiz, QuizAdapter, ScormVersion};
pub use models::{Action, Button, ScenarioDocument, ScenarioTable, Score, WidgetState};
pub use orchestrator::{process_document, App};
pub use workflow::{ActionRegistry, ActionScope, QuizWidget, RunReport, ScenarioInterpreter, WidgetContext};

//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量回放和调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量场景回放器
//! - 管理应用生命周期（初始化、运行）
//! - 批量加载场景（Vec<ScenarioDocument>）
//! - 持有上下文存储
//! - 输出全局统计信息
//!
//! ### `document_processor` - 单个场景回放器
//! - 组装 QuizWidget（内存测验 + 场景表 + SCORM 上报）
//! - 恢复上下文，按配置回放按钮/作答/计时
//! - 输出单个场景的统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<ScenarioDocument>)
//!     ↓
//! document_processor (处理单个 ScenarioDocument)
//!     ↓
//! workflow::QuizWidget / ScenarioInterpreter (处理单个触发器)
//!     ↓
//! services (能力层：timer / readiness / context_store / scorm)
//!     ↓
//! infrastructure (基础设施：QuizAdapter / LmsBridge)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：batch_processor 管批量，document_processor 管单个
//! 2. **资源隔离**：只有编排层持有上下文存储
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod batch_processor;
pub mod document_processor;

// 重新导出主要类型
pub use batch_processor::App;
pub use document_processor::{process_document, ReplayItem, ReplayStats};

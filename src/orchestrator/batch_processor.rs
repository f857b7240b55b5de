//! 批量场景回放器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量场景的回放和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：日志文件、上下文存储
//! 2. **批量加载**：扫描并加载所有场景配置（`Vec<ScenarioDocument>`）
//! 3. **并发回放**：每个场景一个组件，在同一线程上并发推进
//! 4. **全局统计**：汇总所有场景的回放结果
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个场景的细节
//! - **资源所有者**：唯一持有上下文存储的模块
//! - **向下委托**：委托 document_processor 回放单个场景

use anyhow::Result;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::models::document::ScenarioDocument;
use crate::models::loaders::load_all_scenario_documents;
use crate::orchestrator::document_processor::{self, ReplayStats};
use crate::services::context_store::{ContextStore, JsonFileContextStore};
use crate::utils::logging::{init_log_file, log_documents_loaded, log_startup, print_final_stats};

/// 应用主结构
pub struct App {
    config: Config,
    store: Arc<dyn ContextStore>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;
        init_log_file(&config.output_log_file)?;
        log_startup(&config.scenario_folder, &config.replay_items());

        let store: Arc<dyn ContextStore> = Arc::new(JsonFileContextStore::new(&config.context_file));
        Ok(Self::with_store(config, store))
    }

    /// 使用指定的上下文存储
    pub fn with_store(config: Config, store: Arc<dyn ContextStore>) -> Self {
        Self { config, store }
    }

    /// 运行应用主逻辑，返回每个场景的回放结果
    pub async fn run(&self) -> Result<Vec<(String, Result<ReplayStats>)>> {
        let documents = self.load_documents().await?;

        if documents.is_empty() {
            warn!("⚠️ 没有找到场景 TOML 文件，程序结束");
            return Ok(Vec::new());
        }

        log_documents_loaded(documents.len());

        let results = self.process_all_documents(&documents).await;

        let success = results.iter().filter(|(_, r)| r.is_ok()).count();
        let failed = results.len() - success;
        print_final_stats(success, failed, results.len(), &self.config.output_log_file);

        Ok(results)
    }

    /// 加载场景
    async fn load_documents(&self) -> Result<Vec<ScenarioDocument>> {
        info!("\n📁 正在扫描场景配置...");
        load_all_scenario_documents(&self.config.scenario_folder).await
    }

    /// 回放所有场景
    async fn process_all_documents(
        &self,
        documents: &[ScenarioDocument],
    ) -> Vec<(String, Result<ReplayStats>)> {
        let tasks = documents.iter().enumerate().map(|(idx, doc)| {
            let store = Arc::clone(&self.store);
            async move {
                let doc_index = idx + 1;
                let result =
                    document_processor::process_document(doc, doc_index, &self.config, store).await;
                if let Err(e) = &result {
                    error!("[场景 {}] ❌ 回放过程中发生错误: {:#}", doc_index, e);
                }
                (doc.id.clone(), result)
            }
        });

        join_all(tasks).await
    }
}

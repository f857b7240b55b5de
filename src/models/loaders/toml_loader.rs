use crate::error::{AppError, FileError};
use crate::models::document::ScenarioDocument;
use anyhow::{Context, Result};
use futures::future::join_all;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 文件加载场景配置
pub async fn load_scenario_document(toml_file_path: &Path) -> Result<ScenarioDocument> {
    let content = fs::read_to_string(toml_file_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", toml_file_path.display()))?;

    let doc: ScenarioDocument = toml::from_str(&content).map_err(|e| {
        AppError::toml_parse_failed(toml_file_path.to_string_lossy().to_string(), e)
    })?;

    Ok(doc.with_file_path(toml_file_path.to_string_lossy().to_string()))
}

/// 从文件夹中加载所有场景配置
///
/// 文件并发读取，结果按文件名排序；单个文件失败只记录警告。
pub async fn load_all_scenario_documents(folder_path: &str) -> Result<Vec<ScenarioDocument>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        return Err(AppError::File(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        })
        .into());
    }

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    toml_files.sort();

    if toml_files.is_empty() {
        tracing::warn!("在文件夹 {} 中没有找到 TOML 文件", folder_path);
        return Ok(Vec::new());
    }

    let results = join_all(toml_files.iter().map(|path| load_scenario_document(path))).await;

    let mut documents = Vec::new();
    for (path, result) in toml_files.iter().zip(results) {
        match result {
            Ok(doc) => {
                tracing::info!(
                    "成功加载 {}: {} 个触发器",
                    path.file_name().unwrap_or_default().to_string_lossy(),
                    doc.scenario.len()
                );
                documents.push(doc);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_folder(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "quiz_scenario_{}_{}",
            name,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_load_folder_skips_broken_files() {
        let dir = temp_folder("loader");
        std::fs::write(
            dir.join("a.toml"),
            "id = \"q1\"\n[scenario]\nvalidate = [\"validate\"]\n",
        )
        .unwrap();
        std::fs::write(dir.join("b.toml"), "id = ").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let docs = load_all_scenario_documents(dir.to_str().unwrap())
            .await
            .unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "q1");
        assert!(docs[0].file_path.as_deref().unwrap().ends_with("a.toml"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_missing_folder_is_an_error() {
        let result = load_all_scenario_documents("/definitely/not/here").await;
        assert!(result.is_err());
    }
}

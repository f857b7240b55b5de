/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use anyhow::{Context, Result};
use std::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// 初始化 tracing 日志
///
/// 默认级别 `info`，可用 `RUST_LOG` 覆盖。重复调用不会报错。
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

/// 初始化日志文件，写入表头
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n场景回放日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path))?;
    Ok(())
}

/// 追加一行到日志文件
pub fn append_log_line(log_file_path: &str, line: &str) -> Result<()> {
    use std::io::Write;

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .with_context(|| format!("无法打开日志文件: {}", log_file_path))?;
    writeln!(file, "{}", line)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(scenario_folder: &str, replay: &[String]) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 场景回放模式");
    info!("📁 场景目录: {}", scenario_folder);
    info!("🎬 回放序列: {}", replay.join(" → "));
    info!("{}", "=".repeat(60));
}

/// 记录场景加载信息
pub fn log_documents_loaded(total: usize) {
    info!("✓ 找到 {} 个测验场景\n", total);
}

/// 打印所有场景的回放汇总
pub fn print_final_stats(success: usize, failed: usize, total: usize, log_file_path: &str) {
    info!("{}", "─".repeat(40));
    info!(
        "📊 回放结束 {}: 成功 {}/{}，失败 {}",
        chrono::Local::now().format("%H:%M:%S"),
        success,
        total,
        failed
    );
    info!("📝 回放记录: {}", log_file_path);
}

/// 按字符数截断，超出部分用 `...` 表示
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

use crate::error::{AppError, AppResult};
use crate::infrastructure::lms_bridge::ScormVersion;
use crate::services::readiness::PollPolicy;

/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 场景 TOML 文件存放目录
    pub scenario_folder: String,
    /// 元素 class 前缀
    pub class_prefix: String,
    /// 场景表中出现未注册的动作时是否报错
    pub strict_actions: bool,
    /// 等待上下文存储就绪的最长时间（毫秒）
    pub poll_max_ms: u64,
    /// 轮询间隔（毫秒）
    pub poll_step_ms: u64,
    /// 回放的操作序列，逗号分隔
    ///
    /// 按钮触发器名、`q1=b`（作答）、`tick`（计时一秒）、`modified`
    pub replay_triggers: String,
    /// SCORM 版本：`1.2` 或 `2004`
    pub scorm_version: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
    /// 上下文存储文件
    pub context_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scenario_folder: "scenarios".to_string(),
            class_prefix: "pquiz".to_string(),
            strict_actions: false,
            poll_max_ms: 5000,
            poll_step_ms: 100,
            replay_triggers: "validate,retry,validate".to_string(),
            scorm_version: "2004".to_string(),
            verbose_logging: false,
            output_log_file: "scenario_log.txt".to_string(),
            context_file: "quiz_context.json".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            scenario_folder: std::env::var("SCENARIO_FOLDER").unwrap_or(default.scenario_folder),
            class_prefix: std::env::var("CLASS_PREFIX").unwrap_or(default.class_prefix),
            strict_actions: std::env::var("STRICT_ACTIONS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.strict_actions),
            poll_max_ms: std::env::var("POLL_MAX_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.poll_max_ms),
            poll_step_ms: std::env::var("POLL_STEP_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.poll_step_ms),
            replay_triggers: std::env::var("REPLAY_TRIGGERS").unwrap_or(default.replay_triggers),
            scorm_version: std::env::var("SCORM_VERSION").unwrap_or(default.scorm_version),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            context_file: std::env::var("CONTEXT_FILE").unwrap_or(default.context_file),
        }
    }

    /// 检查互相矛盾或无法使用的配置
    pub fn validate(&self) -> AppResult<()> {
        if self.poll_step_ms == 0 {
            return Err(AppError::invalid_config("poll_step_ms", self.poll_step_ms, "轮询间隔必须大于 0"));
        }
        if self.poll_max_ms < self.poll_step_ms {
            return Err(AppError::invalid_config("poll_max_ms", self.poll_max_ms, "不能小于轮询间隔"));
        }
        if self.class_prefix.trim().is_empty() {
            return Err(AppError::invalid_config("class_prefix", &self.class_prefix, "前缀不能为空"));
        }
        Ok(())
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::from_millis(self.poll_max_ms, self.poll_step_ms)
    }

    /// 拆分回放序列，忽略空项
    pub fn replay_items(&self) -> Vec<String> {
        self.replay_triggers
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// 无法识别时按 SCORM 2004 处理
    pub fn scorm(&self) -> ScormVersion {
        match self.scorm_version.trim() {
            "1.2" | "12" => ScormVersion::Scorm12,
            _ => ScormVersion::Scorm2004,
        }
    }
}

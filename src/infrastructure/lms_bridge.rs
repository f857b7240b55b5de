//! LMS 桥接 - 基础设施层
//!
//! SCORM 1.2 与 SCORM 2004 的调用名和数据模型键不同，
//! 这里统一成 set-value / commit / terminate 三个能力。

use anyhow::Result;
use std::collections::BTreeMap;

use crate::error::{AppError, BridgeError};

/// SCORM 版本
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScormVersion {
    Scorm12,
    Scorm2004,
}

impl ScormVersion {
    /// 写值调用名
    pub fn set_value_method(self) -> &'static str {
        match self {
            ScormVersion::Scorm12 => "LMSSetValue",
            ScormVersion::Scorm2004 => "SetValue",
        }
    }

    pub fn commit_method(self) -> &'static str {
        match self {
            ScormVersion::Scorm12 => "LMSCommit",
            ScormVersion::Scorm2004 => "Commit",
        }
    }

    pub fn terminate_method(self) -> &'static str {
        match self {
            ScormVersion::Scorm12 => "LMSFinish",
            ScormVersion::Scorm2004 => "Terminate",
        }
    }

    pub fn score_raw_key(self) -> &'static str {
        match self {
            ScormVersion::Scorm12 => "cmi.core.score.raw",
            ScormVersion::Scorm2004 => "cmi.score.raw",
        }
    }

    pub fn score_max_key(self) -> &'static str {
        match self {
            ScormVersion::Scorm12 => "cmi.core.score.max",
            ScormVersion::Scorm2004 => "cmi.score.max",
        }
    }

    pub fn score_min_key(self) -> &'static str {
        match self {
            ScormVersion::Scorm12 => "cmi.core.score.min",
            ScormVersion::Scorm2004 => "cmi.score.min",
        }
    }

    /// 归一化分数键，SCORM 1.2 没有这个字段
    pub fn score_scaled_key(self) -> Option<&'static str> {
        match self {
            ScormVersion::Scorm12 => None,
            ScormVersion::Scorm2004 => Some("cmi.score.scaled"),
        }
    }

    /// 通过/未通过状态键
    pub fn status_key(self) -> &'static str {
        match self {
            ScormVersion::Scorm12 => "cmi.core.lesson_status",
            ScormVersion::Scorm2004 => "cmi.success_status",
        }
    }

    /// 完成状态键，SCORM 1.2 与通过状态共用一个字段
    pub fn completion_key(self) -> Option<&'static str> {
        match self {
            ScormVersion::Scorm12 => None,
            ScormVersion::Scorm2004 => Some("cmi.completion_status"),
        }
    }
}

/// LMS 桥接能力
pub trait LmsBridge {
    fn version(&self) -> ScormVersion;

    fn set_value(&mut self, key: &str, value: &str) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    fn terminate(&mut self) -> Result<()>;
}

/// 内存 LMS，记录所有调用
#[derive(Debug, Clone)]
pub struct MemoryLms {
    version: ScormVersion,
    values: BTreeMap<String, String>,
    calls: Vec<String>,
    commits: usize,
    terminated: bool,
}

impl MemoryLms {
    pub fn new(version: ScormVersion) -> Self {
        Self {
            version,
            values: BTreeMap::new(),
            calls: Vec::new(),
            commits: 0,
            terminated: false,
        }
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    pub fn commits(&self) -> usize {
        self.commits
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    fn ensure_open(&self, method: &str) -> Result<()> {
        if self.terminated {
            return Err(AppError::Bridge(BridgeError::Terminated {
                method: method.to_string(),
            })
            .into());
        }
        Ok(())
    }
}

impl LmsBridge for MemoryLms {
    fn version(&self) -> ScormVersion {
        self.version
    }

    fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let method = self.version.set_value_method();
        self.ensure_open(method)?;
        if !key.starts_with("cmi.") {
            return Err(AppError::Bridge(BridgeError::SetValueRejected {
                key: key.to_string(),
                value: value.to_string(),
            })
            .into());
        }
        self.calls.push(format!("{}({}, {})", method, key, value));
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        let method = self.version.commit_method();
        self.ensure_open(method)?;
        self.calls.push(format!("{}(\"\")", method));
        self.commits += 1;
        Ok(())
    }

    fn terminate(&mut self) -> Result<()> {
        let method = self.version.terminate_method();
        self.ensure_open(method)?;
        self.calls.push(format!("{}(\"\")", method));
        self.terminated = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialect_method_names() {
        let mut lms = MemoryLms::new(ScormVersion::Scorm12);
        lms.set_value("cmi.core.score.raw", "80").unwrap();
        lms.commit().unwrap();
        lms.terminate().unwrap();
        assert_eq!(
            lms.calls(),
            &[
                "LMSSetValue(cmi.core.score.raw, 80)",
                "LMSCommit(\"\")",
                "LMSFinish(\"\")"
            ]
        );
    }

    #[test]
    fn test_terminated_session_rejects_calls() {
        let mut lms = MemoryLms::new(ScormVersion::Scorm2004);
        lms.terminate().unwrap();
        let err = lms.set_value("cmi.score.raw", "1").unwrap_err();
        assert!(err.to_string().contains("SetValue"));
        assert!(lms.commit().is_err());
    }

    #[test]
    fn test_rejects_non_cmi_key() {
        let mut lms = MemoryLms::new(ScormVersion::Scorm2004);
        assert!(lms.set_value("score", "1").is_err());
        assert_eq!(lms.value("score"), None);
    }
}

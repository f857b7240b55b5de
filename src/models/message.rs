use serde::{Deserialize, Serialize};

/// 某一得分区间的提示信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRange {
    /// 信息类别，例如 `Congratulate`、`Encourage`
    pub mode: String,
    /// 百分比区间，写作 `"0-99"`
    pub range: String,
    pub texts: Vec<String>,
}

impl MessageRange {
    /// 解析区间上下限，格式错误时返回 `None`
    pub fn bounds(&self) -> Option<(f64, f64)> {
        let (min, max) = self.range.split_once('-')?;
        Some((min.trim().parse().ok()?, max.trim().parse().ok()?))
    }

    fn covers(&self, percent: f64) -> bool {
        self.bounds()
            .map(|(min, max)| percent >= min && percent <= max)
            .unwrap_or(false)
    }
}

/// 按得分挑选提示信息
#[derive(Debug, Clone, Default)]
pub struct MessageBoard {
    ranges: Vec<MessageRange>,
}

impl MessageBoard {
    pub fn new(ranges: Vec<MessageRange>) -> Self {
        Self { ranges }
    }

    /// 取第一个覆盖该百分比的区间，`attempt` 用于在多条文案之间轮换
    pub fn pick(&self, mode: &str, percent: f64, attempt: usize) -> Option<&str> {
        let range = self
            .ranges
            .iter()
            .find(|r| r.mode == mode && r.covers(percent))?;
        if range.texts.is_empty() {
            return None;
        }
        Some(range.texts[attempt % range.texts.len()].as_str())
    }
}

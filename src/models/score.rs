use serde::{Deserialize, Serialize};

/// 测验得分
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Score {
    pub score: f64,
    pub total: u32,
}

impl Score {
    pub fn new(score: f64, total: u32) -> Self {
        Self { score, total }
    }

    /// 得分百分比，总分为 0 时返回 0
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.score * 100.0 / f64::from(self.total)
    }

    /// 是否满分（总分为 0 不算满分）
    pub fn is_perfect(&self) -> bool {
        self.total != 0 && self.score >= f64::from(self.total)
    }

    /// 生成显示文本 `"得分 / 总分"`
    ///
    /// 设置了 `base_score` 时按比例换算并四舍五入；总分为 0 时不显示。
    pub fn render(&self, base_score: Option<u32>) -> Option<String> {
        if self.total == 0 {
            return None;
        }

        match base_score {
            Some(base) => {
                let scaled = (self.score * f64::from(base) / f64::from(self.total)).round();
                Some(format!("{} / {}", scaled, base))
            }
            None => Some(format!("{} / {}", self.score, self.total)),
        }
    }
}

impl std::ops::Add for Score {
    type Output = Score;

    fn add(self, rhs: Score) -> Score {
        Score {
            score: self.score + rhs.score,
            total: self.total + rhs.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_and_perfect() {
        assert_eq!(Score::new(3.0, 4).percent(), 75.0);
        assert_eq!(Score::new(0.0, 0).percent(), 0.0);
        assert!(Score::new(4.0, 4).is_perfect());
        assert!(!Score::new(0.0, 0).is_perfect());
    }

    #[test]
    fn test_render_with_and_without_base() {
        assert_eq!(Score::new(2.5, 4).render(None).as_deref(), Some("2.5 / 4"));
        assert_eq!(Score::new(3.0, 4).render(None).as_deref(), Some("3 / 4"));
        assert_eq!(Score::new(1.0, 3).render(Some(20)).as_deref(), Some("7 / 20"));
        assert_eq!(Score::new(0.0, 0).render(Some(20)), None);
    }
}

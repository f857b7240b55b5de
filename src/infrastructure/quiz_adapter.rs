//! 测验适配器 - 基础设施层
//!
//! 场景动作最终都落到这里。适配器持有真实的测验状态（页面、题目），
//! 只暴露能力，不认识场景表。

use anyhow::Result;

use crate::models::score::Score;
use crate::models::state::{ColorMode, WidgetState};

/// 测验适配器
///
/// 失败直接向上返回，场景解释器不做重试。
pub trait QuizAdapter {
    /// 显示或隐藏 `<前缀><目标>` 元素，重复设置同一值不会翻转
    fn set_visible(&mut self, target: &str, visible: bool) -> Result<()>;

    /// 设置状态标签，替换之前的状态
    fn set_state(&mut self, state: WidgetState) -> Result<()>;

    /// 锁定作答并记录用户答案
    fn validate(&mut self) -> Result<()>;

    fn disable(&mut self) -> Result<()>;

    /// 重新开放作答
    fn retry(&mut self) -> Result<()>;

    /// 恢复到初始状态
    fn redo(&mut self) -> Result<()>;

    fn show_user_answer(&mut self) -> Result<()>;

    fn show_right_answer(&mut self) -> Result<()>;

    fn show_answer_text(&mut self) -> Result<()>;

    fn color(&mut self, mode: ColorMode) -> Result<()>;

    fn compute_score(&self) -> Result<Score>;

    /// 显示分数文本，`None` 表示清空并隐藏
    fn display_score(&mut self, text: Option<&str>) -> Result<()>;

    /// 显示某类提示信息
    fn show_message(&mut self, mode: &str, percent: f64) -> Result<()>;

    fn hide_messages(&mut self) -> Result<()>;
}

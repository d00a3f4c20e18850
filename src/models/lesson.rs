//! 课程（学员详情页里的子项）

use serde::Serialize;
use std::fmt;

/// 详情页课程表里的一行
///
/// 每次回到详情页都要重新发现：门户在访问一个课程后会重建整个列表，旧的位置不可信。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonItem {
    /// 课程编号（保留原始文本宽度）
    pub number: String,
    /// 在课程表第一列中的位置（从 0 开始，含表头等非课程行）
    pub position: usize,
    /// 是否通过编号规则
    pub admitted: bool,
}

/// 单个课程的处理结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LessonOutcome {
    /// 已提交缺勤说明
    Launched,
    /// 编号超长，被长度规则排除
    SkippedLengthRule,
    /// 同时带有注册标记和排除类别标记
    SkippedEnrollmentConflict,
    /// 没有注册标记，不适用
    NotApplicableNoMarker,
    /// 打开或操作失败
    Failed(String),
}

impl LessonOutcome {
    pub fn is_launched(&self) -> bool {
        matches!(self, LessonOutcome::Launched)
    }
}

impl fmt::Display for LessonOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LessonOutcome::Launched => write!(f, "已提交"),
            LessonOutcome::SkippedLengthRule => write!(f, "跳过 (编号超长)"),
            LessonOutcome::SkippedEnrollmentConflict => write!(f, "跳过 (注册 + 排除类别)"),
            LessonOutcome::NotApplicableNoMarker => write!(f, "不适用 (无注册标记)"),
            LessonOutcome::Failed(reason) => write!(f, "失败: {}", reason),
        }
    }
}

/// 课程编号 + 结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonResult {
    pub number: String,
    pub outcome: LessonOutcome,
}

impl LessonResult {
    pub fn new(number: impl Into<String>, outcome: LessonOutcome) -> Self {
        Self {
            number: number.into(),
            outcome,
        }
    }
}

impl fmt::Display for LessonResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "课程 {} - {}", self.number, self.outcome)
    }
}

//! 课程处理上下文
//!
//! 封装"我正在处理哪位学员的第几门课"这一信息

use std::fmt::Display;

/// 课程处理上下文（只用于日志）
#[derive(Debug, Clone)]
pub struct LessonCtx {
    /// 学员 ID
    pub record_id: String,
    /// 学员在本次运行中的序号（从 1 开始）
    pub record_index: usize,
    /// 课程在准入列表中的序号（从 1 开始）
    pub lesson_index: usize,
    /// 准入课程总数
    pub lesson_total: usize,
}

impl LessonCtx {
    pub fn new(record_id: impl Into<String>, record_index: usize, lesson_index: usize, lesson_total: usize) -> Self {
        Self {
            record_id: record_id.into(),
            record_index,
            lesson_index,
            lesson_total,
        }
    }
}

impl Display for LessonCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[学员 {} ID#{} 课程 {}/{}]",
            self.record_index, self.record_id, self.lesson_index, self.lesson_total
        )
    }
}

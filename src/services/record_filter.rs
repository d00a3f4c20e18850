//! 课程编号过滤 - 业务能力层
//!
//! 纯函数：决定详情页第一列里的哪些文本是要处理的课程

use regex::Regex;
use std::sync::OnceLock;

use crate::models::LessonItem;

/// 默认课程编号最大位数
pub const DEFAULT_MAX_DIGITS: usize = 4;

fn digits_only() -> Option<&'static Regex> {
    static DIGITS: OnceLock<Option<Regex>> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"^[0-9]+$").ok()).as_ref()
}

/// 一个单元格文本的归类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// 不是纯数字，表头或结构行
    NotALesson,
    /// 课程，且在处理范围内
    Admitted,
    /// 课程，但编号超过位数限制
    TooLong,
}

/// 是否是纯十进制数字
///
/// 正则不可用时一律不算课程
pub fn is_lesson_number(text: &str) -> bool {
    digits_only().is_some_and(|digits| digits.is_match(text))
}

/// 默认阈值下的准入判断
pub fn is_admitted(text: &str, allow_wide: bool) -> bool {
    RecordFilter::default().is_admitted(text, allow_wide)
}

/// 课程编号过滤器
#[derive(Debug, Clone, Copy)]
pub struct RecordFilter {
    max_digits: usize,
}

impl RecordFilter {
    pub fn new(max_digits: usize) -> Self {
        Self { max_digits }
    }

    pub fn classify(&self, text: &str, allow_wide: bool) -> Admission {
        if !is_lesson_number(text) {
            Admission::NotALesson
        } else if allow_wide || text.len() <= self.max_digits {
            Admission::Admitted
        } else {
            Admission::TooLong
        }
    }

    pub fn is_admitted(&self, text: &str, allow_wide: bool) -> bool {
        self.classify(text, allow_wide) == Admission::Admitted
    }

    /// 把课程表第一列的文本转换成课程列表
    ///
    /// 非数字行直接丢弃；超长编号保留但标记为未准入。
    pub fn discover(&self, cells: &[String], allow_wide: bool) -> Vec<LessonItem> {
        cells
            .iter()
            .enumerate()
            .filter_map(|(position, raw)| {
                let number = raw.trim();
                match self.classify(number, allow_wide) {
                    Admission::NotALesson => None,
                    admission => Some(LessonItem {
                        number: number.to_string(),
                        position,
                        admitted: admission == Admission::Admitted,
                    }),
                }
            })
            .collect()
    }
}

impl Default for RecordFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DIGITS)
    }
}

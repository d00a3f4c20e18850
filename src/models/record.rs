//! 学员记录

use chrono::NaiveDate;
use serde::Serialize;

/// 门户表单使用的日期格式
pub const PORTAL_DATE_FORMAT: &str = "%d/%m/%Y";

/// 一条待处理的学员记录（读入后不再修改）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    /// 学员 ID，也是记录的身份
    pub identifier: String,
    /// 缺勤开始日期
    pub period_start: NaiveDate,
    /// 缺勤结束日期
    pub period_end: NaiveDate,
}

impl Record {
    pub fn new(identifier: impl Into<String>, period_start: NaiveDate, period_end: NaiveDate) -> Self {
        Self {
            identifier: identifier.into(),
            period_start,
            period_end,
        }
    }

    pub fn start_text(&self) -> String {
        format_portal_date(self.period_start)
    }

    pub fn end_text(&self) -> String {
        format_portal_date(self.period_end)
    }

    /// 形如 `01/02/2025 a 10/02/2025`
    pub fn period_text(&self) -> String {
        format!("{} a {}", self.start_text(), self.end_text())
    }
}

pub fn format_portal_date(date: NaiveDate) -> String {
    date.format(PORTAL_DATE_FORMAT).to_string()
}

/// 解析表格里的日期文本
///
/// 支持 `dd/mm/yyyy`、`yyyy-mm-dd`，以及表格导出时带时间的写法
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let date_part = text
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or(text);

    NaiveDate::parse_from_str(date_part, PORTAL_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%Y-%m-%d"))
        .ok()
}

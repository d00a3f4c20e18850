//! 记录结果与运行汇总

use serde::Serialize;
use std::fmt;

use super::lesson::{LessonOutcome, LessonResult};
use super::record::Record;

/// 单条记录的最终状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RecordStatus {
    Success,
    NotFound,
    Error,
    NoLessons,
    /// 处理中途被取消
    Cancelled,
}

impl RecordStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RecordStatus::Success => "SUCCESS",
            RecordStatus::NotFound => "NOT_FOUND",
            RecordStatus::Error => "ERROR",
            RecordStatus::NoLessons => "NO_LESSONS",
            RecordStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单条记录的处理结果，每条记录恰好产生一个
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordOutcome {
    pub record: Record,
    pub status: RecordStatus,
    pub lesson_outcomes: Vec<LessonResult>,
    pub note: String,
}

impl RecordOutcome {
    pub fn new(record: Record) -> Self {
        Self {
            record,
            status: RecordStatus::Success,
            lesson_outcomes: Vec::new(),
            note: String::new(),
        }
    }

    pub fn push(&mut self, number: impl Into<String>, outcome: LessonOutcome) {
        self.lesson_outcomes.push(LessonResult::new(number, outcome));
    }

    pub fn launched_count(&self) -> usize {
        self.lesson_outcomes
            .iter()
            .filter(|r| r.outcome.is_launched())
            .count()
    }
}

/// 运行汇总
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// 搜索命中的记录数
    pub found_count: usize,
    /// 已提交的课程数
    pub processed_count: usize,
    /// 搜索未命中的记录数
    pub not_found_count: usize,
    pub search_year: String,
}

impl RunSummary {
    pub fn new(search_year: impl Into<String>) -> Self {
        Self {
            search_year: search_year.into(),
            ..Default::default()
        }
    }

    /// 结束时给监控端的提示
    pub fn terminal_message(&self) -> String {
        if self.found_count == 0 {
            format!("no matching records for year {}", self.search_year)
        } else {
            format!(
                "run completed: {} records found, {} lessons launched, {} not found",
                self.found_count, self.processed_count, self.not_found_count
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_terminal_message_distinguishes_empty_year() {
        let summary = RunSummary {
            not_found_count: 1,
            ..RunSummary::new("2025")
        };
        assert_eq!(summary.terminal_message(), "no matching records for year 2025");

        let summary = RunSummary {
            found_count: 1,
            processed_count: 2,
            ..RunSummary::new("2025")
        };
        assert_eq!(
            summary.terminal_message(),
            "run completed: 1 records found, 2 lessons launched, 0 not found"
        );
    }

    #[test]
    fn test_launched_count() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let mut outcome = RecordOutcome::new(Record::new("S1", date, date));
        outcome.push("10", LessonOutcome::Launched);
        outcome.push("20", LessonOutcome::NotApplicableNoMarker);
        outcome.push("30", LessonOutcome::Launched);
        assert_eq!(outcome.launched_count(), 2);
    }

    #[test]
    fn test_outcome_serializes_with_record() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let mut outcome = RecordOutcome::new(Record::new("S1", date, date));
        outcome.push("1001", LessonOutcome::Launched);

        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"period_start\":\"2025-02-01\""), "{}", json);
        assert!(json.contains("1001"), "{}", json);
    }
}

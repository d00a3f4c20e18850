//! 运行日志 - 业务能力层
//!
//! 只追加，不覆盖。每条记录结果写一次。

use anyhow::{Context, Result};
use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::models::{RecordOutcome, RunSummary};

/// 运行日志
///
/// 生命周期只覆盖一次运行，由引擎在构造时持有。
pub trait LogSink: Send + Sync {
    fn append_record_outcome(&self, outcome: &RecordOutcome) -> Result<()>;
    fn append_error(&self, identifier: &str, text: &str) -> Result<()>;
    fn append_run_summary(&self, summary: &RunSummary) -> Result<()>;
}

/// 写文件的运行日志
///
/// 职责：
/// - 每次运行一个文件，文件名带日期时间
/// - 只追加条目
pub struct FileLogSink {
    log_file_path: PathBuf,
}

impl FileLogSink {
    /// 在目录下创建 `log_<dd_mm_yy__HH_MMh>.txt`
    pub fn create(log_dir: impl AsRef<Path>) -> Result<Self> {
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)
            .with_context(|| format!("无法创建日志目录: {}", log_dir.display()))?;

        let file_name = format!("log_{}.txt", Local::now().format("%d_%m_%y__%H_%Mh"));
        Self::with_path(log_dir.join(file_name))
    }

    /// 使用指定文件路径，写入文件头
    pub fn with_path(path: impl Into<PathBuf>) -> Result<Self> {
        let log_file_path = path.into();
        let header = format!(
            "=== 课程缺勤提交日志 ===\n创建时间: {}\n{}\n\n",
            Local::now().format("%d/%m/%Y %H:%M:%S"),
            "-".repeat(50)
        );
        fs::write(&log_file_path, header)
            .with_context(|| format!("无法创建日志文件: {}", log_file_path.display()))?;

        Ok(Self { log_file_path })
    }

    pub fn path(&self) -> &Path {
        &self.log_file_path
    }

    fn append(&self, entry: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)
            .with_context(|| format!("无法打开日志文件: {}", self.log_file_path.display()))?;
        file.write_all(entry.as_bytes())?;
        Ok(())
    }
}

impl LogSink for FileLogSink {
    fn append_record_outcome(&self, outcome: &RecordOutcome) -> Result<()> {
        debug!("写入记录结果: {} ({})", outcome.record.identifier, outcome.status);
        self.append(&format_record_outcome(outcome, &timestamp()))
    }

    fn append_error(&self, identifier: &str, text: &str) -> Result<()> {
        debug!("写入错误: {}", identifier);
        self.append(&format_error(identifier, text, &timestamp()))
    }

    fn append_run_summary(&self, summary: &RunSummary) -> Result<()> {
        self.append(&format_run_summary(summary, &timestamp()))
    }
}

fn timestamp() -> String {
    Local::now().format("%d/%m/%Y %H:%M:%S").to_string()
}

pub fn format_record_outcome(outcome: &RecordOutcome, timestamp: &str) -> String {
    let details = if outcome.lesson_outcomes.is_empty() {
        "无".to_string()
    } else {
        outcome
            .lesson_outcomes
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut entry = String::from("记录结果\n");
    entry += &format!("时间: {}\n", timestamp);
    entry += &format!("学员 ID: {}\n", outcome.record.identifier);
    entry += &format!("期间: {}\n", outcome.record.period_text());
    entry += &format!("状态: {}\n", outcome.status);
    entry += &format!("课程数: {}\n", outcome.lesson_outcomes.len());
    entry += &format!("课程明细: {}\n", details);
    if !outcome.note.is_empty() {
        entry += &format!("备注: {}\n", outcome.note);
    }
    entry += &format!("{}\n\n", "-".repeat(30));
    entry
}

pub fn format_error(identifier: &str, text: &str, timestamp: &str) -> String {
    format!(
        "错误记录\n时间: {}\n学员 ID: {}\n错误: {}\n{}\n\n",
        timestamp,
        identifier,
        text,
        "-".repeat(30)
    )
}

pub fn format_run_summary(summary: &RunSummary, timestamp: &str) -> String {
    format!(
        "=== 处理结束 ===\n结束时间: {}\n搜索年份: {}\n找到学员: {}\n未找到学员: {}\n已提交课程: {}\n{}\n",
        timestamp,
        summary.search_year,
        summary.found_count,
        summary.not_found_count,
        summary.processed_count,
        "=".repeat(50)
    )
}

/// 内存中的一条日志
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEntry {
    Outcome(RecordOutcome),
    Error { identifier: String, text: String },
    Summary(RunSummary),
}

/// 内存运行日志，用于测试和嵌入
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    pub fn outcomes(&self) -> Vec<RecordOutcome> {
        self.lock()
            .iter()
            .filter_map(|entry| match entry {
                LogEntry::Outcome(outcome) => Some(outcome.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LogSink for MemoryLogSink {
    fn append_record_outcome(&self, outcome: &RecordOutcome) -> Result<()> {
        self.lock().push(LogEntry::Outcome(outcome.clone()));
        Ok(())
    }

    fn append_error(&self, identifier: &str, text: &str) -> Result<()> {
        self.lock().push(LogEntry::Error {
            identifier: identifier.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    fn append_run_summary(&self, summary: &RunSummary) -> Result<()> {
        self.lock().push(LogEntry::Summary(summary.clone()));
        Ok(())
    }
}

/// 共享同一个内存日志（测试里引擎持有一份，断言时读另一份）
impl<T: LogSink + ?Sized> LogSink for std::sync::Arc<T> {
    fn append_record_outcome(&self, outcome: &RecordOutcome) -> Result<()> {
        (**self).append_record_outcome(outcome)
    }

    fn append_error(&self, identifier: &str, text: &str) -> Result<()> {
        (**self).append_error(identifier, text)
    }

    fn append_run_summary(&self, summary: &RunSummary) -> Result<()> {
        (**self).append_run_summary(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LessonOutcome, Record, RecordStatus};
    use chrono::NaiveDate;

    fn outcome() -> RecordOutcome {
        let mut outcome = RecordOutcome::new(Record::new(
            "1002003",
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 10).unwrap(),
        ));
        outcome.push("10", LessonOutcome::Launched);
        outcome.push("20", LessonOutcome::SkippedEnrollmentConflict);
        outcome
    }

    #[test]
    fn test_format_record_outcome() {
        let text = format_record_outcome(&outcome(), "01/03/2025 10:00:00");
        assert!(text.contains("学员 ID: 1002003\n"));
        assert!(text.contains("期间: 01/02/2025 a 10/02/2025\n"));
        assert!(text.contains("状态: SUCCESS\n"));
        assert!(text.contains("课程数: 2\n"));
        assert!(text.contains("课程 10 - 已提交, 课程 20 - 跳过 (注册 + 排除类别)"));
        assert!(!text.contains("备注"));
    }

    #[test]
    fn test_file_sink_appends_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileLogSink::create(dir.path().join("log")).unwrap();

        let mut failed = outcome();
        failed.status = RecordStatus::Error;
        failed.note = "搜索框未出现".to_string();

        sink.append_record_outcome(&outcome()).unwrap();
        sink.append_error("1002004", "搜索框未出现").unwrap();
        sink.append_record_outcome(&failed).unwrap();
        sink.append_run_summary(&RunSummary::new("2025")).unwrap();

        let name = sink.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("log_") && name.ends_with("h.txt"), "{}", name);

        let content = fs::read_to_string(sink.path()).unwrap();
        assert!(content.starts_with("=== 课程缺勤提交日志 ==="));
        let first = content.find("状态: SUCCESS").unwrap();
        let error = content.find("错误: 搜索框未出现").unwrap();
        let second = content.find("状态: ERROR").unwrap();
        let summary = content.find("=== 处理结束 ===").unwrap();
        assert!(first < error && error < second && second < summary);
    }

    #[test]
    fn test_memory_sink_through_arc() {
        let sink = std::sync::Arc::new(MemoryLogSink::new());
        let shared: Box<dyn LogSink> = Box::new(sink.clone());
        shared.append_error("S1", "x").unwrap();
        shared.append_record_outcome(&outcome()).unwrap();

        assert_eq!(sink.entries().len(), 2);
        assert_eq!(sink.outcomes().len(), 1);
    }
}

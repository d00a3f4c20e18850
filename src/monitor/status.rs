//! 监控端的进度汇总
//!
//! 只读事件，不解析任何文本。每条 `RecordStarted` 开一行，`RecordFinished` 关掉同 ID 最近的一行。

use std::collections::HashMap;

use crate::models::{ProgressEvent, ProgressReceiver, RecordStatus};

/// 一行的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Running,
    Finished(RecordStatus),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRow {
    pub id: String,
    pub state: RowState,
}

/// 进度汇总
#[derive(Debug, Default)]
pub struct StatusAggregator {
    total: Option<usize>,
    rows: Vec<StatusRow>,
    /// ID → 最近一行的下标（学员表里可能出现重复 ID）
    latest: HashMap<String, usize>,
    counts: HashMap<RecordStatus, usize>,
    last_message: Option<String>,
}

impl StatusAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::RecordCount(total) => self.total = Some(total),
            ProgressEvent::RecordStarted(id) => {
                self.latest.insert(id.clone(), self.rows.len());
                self.rows.push(StatusRow {
                    id,
                    state: RowState::Running,
                });
            }
            ProgressEvent::RecordFinished { id, status } => {
                *self.counts.entry(status).or_default() += 1;
                match self.latest.get(&id) {
                    Some(&index) if self.rows[index].state == RowState::Running => {
                        self.rows[index].state = RowState::Finished(status);
                    }
                    _ => {
                        self.latest.insert(id.clone(), self.rows.len());
                        self.rows.push(StatusRow {
                            id,
                            state: RowState::Finished(status),
                        });
                    }
                }
            }
            ProgressEvent::GenericMessage(text) => self.last_message = Some(text),
        }
    }

    /// 读完通道里已到达的事件，返回读取数量
    pub fn drain(&mut self, events: &mut ProgressReceiver) -> usize {
        let mut applied = 0;
        while let Ok(event) = events.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    pub fn total(&self) -> Option<usize> {
        self.total
    }

    pub fn rows(&self) -> &[StatusRow] {
        &self.rows
    }

    pub fn count(&self, status: RecordStatus) -> usize {
        self.counts.get(&status).copied().unwrap_or(0)
    }

    pub fn finished_count(&self) -> usize {
        self.counts.values().sum()
    }

    /// 正在处理的记录
    pub fn running(&self) -> Option<&str> {
        self.rows
            .iter()
            .rev()
            .find(|row| row.state == RowState::Running)
            .map(|row| row.id.as_str())
    }

    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    /// 一行进度，例如 `3/10 finished | SUCCESS 2 | NOT_FOUND 1`
    pub fn progress_line(&self) -> String {
        let total = self
            .total
            .map(|t| t.to_string())
            .unwrap_or_else(|| "?".to_string());
        let mut line = format!("{}/{} finished", self.finished_count(), total);
        for status in [
            RecordStatus::Success,
            RecordStatus::NotFound,
            RecordStatus::NoLessons,
            RecordStatus::Error,
            RecordStatus::Cancelled,
        ] {
            let count = self.count(status);
            if count > 0 {
                line += &format!(" | {} {}", status, count);
            }
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::progress_channel;

    fn finished(id: &str, status: RecordStatus) -> ProgressEvent {
        ProgressEvent::RecordFinished {
            id: id.to_string(),
            status,
        }
    }

    #[test]
    fn test_rows_follow_event_order() {
        let mut status = StatusAggregator::new();
        status.apply(ProgressEvent::RecordCount(3));
        status.apply(ProgressEvent::RecordStarted("A".into()));
        status.apply(finished("A", RecordStatus::Success));
        status.apply(ProgressEvent::RecordStarted("B".into()));

        assert_eq!(status.total(), Some(3));
        assert_eq!(status.running(), Some("B"));
        assert_eq!(
            status.rows(),
            &[
                StatusRow {
                    id: "A".into(),
                    state: RowState::Finished(RecordStatus::Success)
                },
                StatusRow {
                    id: "B".into(),
                    state: RowState::Running
                },
            ]
        );
        assert_eq!(status.progress_line(), "1/3 finished | SUCCESS 1");
    }

    #[test]
    fn test_duplicate_ids_get_their_own_rows() {
        let mut status = StatusAggregator::new();
        for result in [RecordStatus::NotFound, RecordStatus::Success] {
            status.apply(ProgressEvent::RecordStarted("A".into()));
            status.apply(finished("A", result));
        }

        assert_eq!(status.rows().len(), 2);
        assert_eq!(status.rows()[0].state, RowState::Finished(RecordStatus::NotFound));
        assert_eq!(status.rows()[1].state, RowState::Finished(RecordStatus::Success));
        assert_eq!(status.finished_count(), 2);
        assert_eq!(status.running(), None);
    }

    #[test]
    fn test_drain_reads_pending_events() {
        let (tx, mut rx) = progress_channel();
        tx.record_count(1);
        tx.record_started("A");
        tx.record_finished("A", RecordStatus::Error);
        tx.message("run completed");

        let mut status = StatusAggregator::new();
        assert_eq!(status.drain(&mut rx), 4);
        assert_eq!(status.drain(&mut rx), 0);
        assert_eq!(status.count(RecordStatus::Error), 1);
        assert_eq!(status.last_message(), Some("run completed"));
        assert_eq!(status.progress_line(), "1/1 finished | ERROR 1");
    }
}

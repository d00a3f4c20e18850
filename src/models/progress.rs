//! 进度事件
//!
//! 工作任务是唯一的生产者，监控端是唯一的消费者。通道无界，发送永不阻塞工作任务。

use serde::Serialize;
use tokio::sync::mpsc;

use super::outcome::RecordStatus;

/// 结构化进度事件，监控端不需要解析任何文本
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ProgressEvent {
    RecordStarted(String),
    RecordFinished { id: String, status: RecordStatus },
    RecordCount(usize),
    GenericMessage(String),
}

pub type ProgressReceiver = mpsc::UnboundedReceiver<ProgressEvent>;

/// 进度事件发送端
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

/// 创建一对进度通道
pub fn progress_channel() -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ProgressSender { tx }, rx)
}

impl ProgressSender {
    /// 监控端已经退出时丢弃事件，不影响运行
    pub fn send(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }

    pub fn record_started(&self, id: &str) {
        self.send(ProgressEvent::RecordStarted(id.to_string()));
    }

    pub fn record_finished(&self, id: &str, status: RecordStatus) {
        self.send(ProgressEvent::RecordFinished {
            id: id.to_string(),
            status,
        });
    }

    pub fn record_count(&self, total: usize) {
        self.send(ProgressEvent::RecordCount(total));
    }

    pub fn message(&self, text: impl Into<String>) {
        self.send(ProgressEvent::GenericMessage(text.into()));
    }
}

//! 监控端句柄
//!
//! 工作任务在 tokio 任务里跑完整张学员表；监控端通过句柄发出暂停 / 继续 / 取消，
//! 并从事件通道读取进度。句柄不会阻塞工作任务。

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::Config;
use crate::control::ControlToken;
use crate::error::AppError;
use crate::infrastructure::{AutomationDriver, ChromiumDriver, DriverError};
use crate::models::{
    open_record_source, progress_channel, ProgressEvent, ProgressReceiver, ProgressSender,
    RecordSource, RunSummary,
};
use crate::orchestrator::{RunOutcome, WorkflowEngine};
use crate::services::{FileLogSink, LogSink};

/// 取消后的结束语
pub const CANCELLED_MESSAGE: &str = "run cancelled";

/// 一次运行的最终状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RunState {
    Completed { summary: RunSummary, message: String },
    Cancelled { summary: RunSummary },
    Failed { reason: String },
}

impl RunState {
    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            RunState::Completed { summary, .. } | RunState::Cancelled { summary } => Some(summary),
            RunState::Failed { .. } => None,
        }
    }

    /// 给操作员看的一行结束语
    pub fn message(&self) -> String {
        match self {
            RunState::Completed { message, .. } => message.clone(),
            RunState::Cancelled { .. } => CANCELLED_MESSAGE.to_string(),
            RunState::Failed { reason } => format!("run failed: {}", reason),
        }
    }
}

/// 监控端句柄
pub struct MonitorHandle {
    control: ControlToken,
    events: ProgressReceiver,
    worker: JoinHandle<RunState>,
}

impl MonitorHandle {
    /// 按配置启动一次运行
    ///
    /// 启动顺序：校验配置 → 打开学员表 → 创建运行日志 → 连接浏览器。
    /// 任何一步失败，运行以 `RunState::Failed` 结束，门户不会被访问。
    pub fn start(config: Config) -> Self {
        let control = ControlToken::new();
        let (events_tx, events_rx) = progress_channel();
        let worker = tokio::spawn(launch(config, control.clone(), events_tx));
        Self {
            control,
            events: events_rx,
            worker,
        }
    }

    /// 用现成的学员表、驱动和运行日志启动
    pub fn start_with(
        config: Config,
        source: Box<dyn RecordSource>,
        driver: Box<dyn AutomationDriver>,
        sink: Box<dyn LogSink>,
    ) -> Self {
        let control = ControlToken::new();
        let (events_tx, events_rx) = progress_channel();
        let worker_control = control.clone();
        let worker = tokio::spawn(async move {
            let engine = WorkflowEngine::new(config, driver, sink, worker_control, events_tx.clone());
            drive(&engine, source.as_ref(), &events_tx).await
        });
        Self {
            control,
            events: events_rx,
            worker,
        }
    }

    pub fn pause(&self) {
        info!("⏸ 请求暂停");
        self.control.pause();
    }

    pub fn resume(&self) {
        info!("▶ 请求继续");
        self.control.resume();
    }

    pub fn cancel(&self) {
        info!("⏹ 请求取消");
        self.control.cancel();
    }

    /// 控制令牌，供其他任务（例如读标准输入的任务）使用
    pub fn control(&self) -> &ControlToken {
        &self.control
    }

    /// 等待下一个事件；工作任务结束且事件读完后返回 `None`
    pub async fn next_event(&mut self) -> Option<ProgressEvent> {
        self.events.recv().await
    }

    /// 不等待，取一个已经到达的事件
    pub fn try_next_event(&mut self) -> Option<ProgressEvent> {
        self.events.try_recv().ok()
    }

    /// 等待工作任务结束
    pub async fn finish(self) -> RunState {
        match self.worker.await {
            Ok(state) => state,
            Err(e) => {
                error!("❌ 工作任务异常退出: {}", e);
                RunState::Failed {
                    reason: format!("worker task aborted: {}", e),
                }
            }
        }
    }
}

/// 生产环境的启动流程
async fn launch(config: Config, control: ControlToken, events: ProgressSender) -> RunState {
    if let Err(e) = config.validate() {
        return startup_failed(&events, AppError::from(e));
    }

    let source = match open_record_source(&config.records_file, &config.records_sheet).await {
        Ok(source) => source,
        Err(e) => return startup_failed(&events, AppError::from(e)),
    };

    let sink = match FileLogSink::create(&config.log_dir) {
        Ok(sink) => sink,
        Err(e) => return startup_failed(&events, AppError::log_failed(format!("{:#}", e))),
    };
    info!("📝 运行日志: {}", sink.path().display());

    let driver = match ChromiumDriver::open(&config).await {
        Ok(driver) => driver,
        Err(e) => {
            let err = DriverError::Browser(format!("{:#}", e));
            return startup_failed(&events, AppError::from(err));
        }
    };

    let engine = WorkflowEngine::new(
        config,
        Box::new(driver),
        Box::new(sink),
        control,
        events.clone(),
    );
    drive(&engine, source.as_ref(), &events).await
}

/// 跑完引擎，发出结束语，然后释放驱动
async fn drive(
    engine: &WorkflowEngine,
    source: &dyn RecordSource,
    events: &ProgressSender,
) -> RunState {
    let state = match engine.run(source).await {
        Ok(RunOutcome::Completed { summary, message }) => RunState::Completed { summary, message },
        Ok(RunOutcome::Cancelled(summary)) => RunState::Cancelled { summary },
        Err(e) => {
            error!("❌ 运行失败: {:#}", e);
            RunState::Failed {
                reason: format!("{:#}", e),
            }
        }
    };
    events.message(state.message());
    engine.shutdown().await;
    state
}

fn startup_failed(events: &ProgressSender, err: AppError) -> RunState {
    error!("❌ 启动失败: {}", err);
    let state = RunState::Failed {
        reason: err.to_string(),
    };
    events.message(state.message());
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_state_messages() {
        let mut summary = RunSummary::new("2025");
        summary.found_count = 1;
        summary.processed_count = 2;
        let completed = RunState::Completed {
            message: summary.terminal_message(),
            summary: summary.clone(),
        };
        assert_eq!(
            completed.message(),
            "run completed: 1 records found, 2 lessons launched, 0 not found"
        );
        assert_eq!(completed.summary(), Some(&summary));

        assert_eq!(
            RunState::Cancelled { summary }.message(),
            CANCELLED_MESSAGE
        );

        let failed = RunState::Failed {
            reason: "无法打开学员表".to_string(),
        };
        assert!(failed.message().starts_with("run failed: "));
        assert_eq!(failed.summary(), None);
    }

    #[tokio::test]
    async fn test_missing_records_file_fails_before_browser() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            records_file: dir.path().join("missing.toml").display().to_string(),
            log_dir: dir.path().join("log").display().to_string(),
            ..Config::default()
        };

        let mut handle = MonitorHandle::start(config);
        let mut messages = Vec::new();
        while let Some(event) = handle.next_event().await {
            messages.push(event);
        }

        let state = handle.finish().await;
        match &state {
            RunState::Failed { reason } => assert!(reason.contains("missing.toml"), "{}", reason),
            other => panic!("unexpected state: {:?}", other),
        }
        // 没有进入引擎，也没有创建运行日志
        assert_eq!(messages, vec![ProgressEvent::GenericMessage(state.message())]);
        assert!(!dir.path().join("log").exists());
    }

    #[tokio::test]
    async fn test_missing_workbook_fails_before_browser() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            records_file: dir.path().join("atestados.xlsx").display().to_string(),
            log_dir: dir.path().join("log").display().to_string(),
            ..Config::default()
        };

        let mut handle = MonitorHandle::start(config);
        while handle.next_event().await.is_some() {}

        match handle.finish().await {
            RunState::Failed { reason } => assert!(reason.contains("atestados.xlsx"), "{}", reason),
            other => panic!("unexpected state: {:?}", other),
        }
        assert!(!dir.path().join("log").exists());
    }
}

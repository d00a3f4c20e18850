//! 运行引擎 - 编排层
//!
//! ## 职责
//!
//! 本模块是一次运行的入口，负责逐行读取学员表并管理资源。
//!
//! ## 核心功能
//!
//! 1. **资源所有者**：唯一持有驱动和运行日志的模块
//! 2. **会话准备**：登录门户，进入考勤入口
//! 3. **顺序处理**：按表格顺序逐行处理，遇到空 ID 即停止
//! 4. **控制检查**：每行开始前检查暂停 / 取消
//! 5. **全局统计**：汇总 `RunSummary`，写入运行日志
//!
//! ## 设计特点
//!
//! - **单一工作任务**：一次只处理一条记录，不并发
//! - **向下委托**：单条记录交给 `RecordProcessor`

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Config;
use crate::control::ControlToken;
use crate::infrastructure::AutomationDriver;
use crate::models::{ProgressSender, RecordSource, RunSummary, SourceRow};
use crate::orchestrator::RecordProcessor;
use crate::services::{LogSink, PortalService};
use crate::utils::logging::{log_record_start, log_records_loaded};

/// 学员表为空时的结束语
pub const NO_RECORDS_MESSAGE: &str = "no records to process";

/// 一次运行的结局
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// 正常走完学员表
    Completed { summary: RunSummary, message: String },
    /// 在某个检查点被取消
    Cancelled(RunSummary),
}

impl RunOutcome {
    pub fn summary(&self) -> &RunSummary {
        match self {
            RunOutcome::Completed { summary, .. } => summary,
            RunOutcome::Cancelled(summary) => summary,
        }
    }
}

/// 运行引擎
pub struct WorkflowEngine {
    config: Config,
    driver: Box<dyn AutomationDriver>,
    sink: Box<dyn LogSink>,
    control: ControlToken,
    events: ProgressSender,
}

impl WorkflowEngine {
    pub fn new(
        config: Config,
        driver: Box<dyn AutomationDriver>,
        sink: Box<dyn LogSink>,
        control: ControlToken,
        events: ProgressSender,
    ) -> Self {
        Self {
            config,
            driver,
            sink,
            control,
            events,
        }
    }

    /// 处理整张学员表
    ///
    /// 只有登录失败这类会话级错误会返回 `Err`，单条记录的失败都记在日志里。
    pub async fn run(&self, source: &dyn RecordSource) -> Result<RunOutcome> {
        let total = source.count_until_end();
        self.events.record_count(total);
        log_records_loaded(total);

        let mut summary = RunSummary::new(&self.config.target_year);

        if total == 0 {
            warn!("⚠️ 学员表中没有待处理的行，运行结束");
            self.write_summary(&summary);
            return Ok(RunOutcome::Completed {
                summary,
                message: NO_RECORDS_MESSAGE.to_string(),
            });
        }

        if self.control.checkpoint().await.is_err() {
            return Ok(self.cancelled(summary));
        }

        let portal = PortalService::new(&self.config);
        let driver = self.driver.as_ref();
        portal
            .login(driver, &self.config.username, &self.config.password)
            .await?;
        portal.open_entry_screen(driver).await;

        let processor = RecordProcessor::new(
            driver,
            self.sink.as_ref(),
            &self.events,
            &self.control,
            &self.config,
        );

        let mut index = 0;
        for row in source.rows() {
            if self.control.checkpoint().await.is_err() {
                return Ok(self.cancelled(summary));
            }

            match row {
                SourceRow::EndOfData => {
                    info!("空 ID，学员表结束");
                    break;
                }
                SourceRow::Invalid { identifier, reason } => {
                    index += 1;
                    self.events.record_started(&identifier);
                    processor.reject(&identifier, &reason);
                }
                SourceRow::Record(record) => {
                    index += 1;
                    // 上一条记录把页面留在课程表里
                    if index > 1 {
                        portal.open_entry_screen(driver).await;
                    }

                    log_record_start(index, total, &record.identifier);
                    self.events.record_started(&record.identifier);

                    if processor.process(&record, index, &mut summary).await.is_err() {
                        return Ok(self.cancelled(summary));
                    }
                }
            }
        }

        self.write_summary(&summary);
        let message = summary.terminal_message();
        info!("🏁 {}", message);
        Ok(RunOutcome::Completed { summary, message })
    }

    /// 尽力关闭驱动
    pub async fn shutdown(&self) {
        if let Err(e) = self.driver.close().await {
            warn!("⚠️ 关闭浏览器失败: {}", e);
        }
    }

    fn cancelled(&self, summary: RunSummary) -> RunOutcome {
        warn!("⏹ 运行已取消");
        self.write_summary(&summary);
        RunOutcome::Cancelled(summary)
    }

    fn write_summary(&self, summary: &RunSummary) {
        if let Err(e) = self.sink.append_run_summary(summary) {
            warn!("⚠️ 写入运行统计失败: {:#}", e);
        }
    }
}

//! 单个学员处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责处理单个学员的所有课程，是记录级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **搜索学员**：按 ID 搜索，取第一行同时含目标年份和课程标记的结果
//! 2. **遍历课程**：每一轮都重新读取课程表再按位置取课程
//! 3. **流程调度**：把每门课交给 `LessonFlow`
//! 4. **错误隔离**：记录内的失败在这里接住，取消继续向上传
//! 5. **结果输出**：每条记录恰好写一次运行日志、发一次 `RecordFinished`

use std::collections::VecDeque;

use anyhow::Context;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::control::{Cancelled, ControlToken};
use crate::error::FlowError;
use crate::infrastructure::AutomationDriver;
use crate::models::{
    LessonItem, LessonOutcome, ProgressSender, Record, RecordOutcome, RecordStatus, RunSummary,
};
use crate::services::{AbsenceForm, LogSink, PortalService, RecordFilter};
use crate::workflow::{LessonCtx, LessonFlow};

/// 单个学员处理器
pub struct RecordProcessor<'a> {
    driver: &'a dyn AutomationDriver,
    sink: &'a dyn LogSink,
    events: &'a ProgressSender,
    control: &'a ControlToken,
    config: &'a Config,
    portal: PortalService,
    lesson_flow: LessonFlow,
    filter: RecordFilter,
}

impl<'a> RecordProcessor<'a> {
    pub fn new(
        driver: &'a dyn AutomationDriver,
        sink: &'a dyn LogSink,
        events: &'a ProgressSender,
        control: &'a ControlToken,
        config: &'a Config,
    ) -> Self {
        Self {
            driver,
            sink,
            events,
            control,
            config,
            portal: PortalService::new(config),
            lesson_flow: LessonFlow::new(config),
            filter: RecordFilter::new(config.max_lesson_digits),
        }
    }

    /// 处理一条记录
    ///
    /// 除取消外的任何失败都记为 `RecordStatus::Error` 并返回 `Ok`；
    /// 取消时先把当前记录收尾，再返回 `Err(Cancelled)`。
    pub async fn process(
        &self,
        record: &Record,
        record_index: usize,
        summary: &mut RunSummary,
    ) -> Result<RecordOutcome, Cancelled> {
        let mut outcome = RecordOutcome::new(record.clone());
        let mut skipped = VecDeque::new();

        let result = self
            .run_steps(record, record_index, &mut outcome, &mut skipped, summary)
            .await;
        // 剩下的超长课程排在最后，失败或取消时也保留
        push_skipped(&mut outcome, &mut skipped, None);

        let cancelled = match result {
            Ok(()) => None,
            Err(FlowError::Cancelled(cancelled)) => {
                warn!("[学员 {}] ⏹ 处理中途被取消", record_index);
                outcome.status = RecordStatus::Cancelled;
                outcome.note = "运行被取消".to_string();
                Some(cancelled)
            }
            Err(FlowError::Failed(e)) => {
                error!("[学员 {}] ❌ 处理过程中发生错误: {:#}", record_index, e);
                outcome.status = RecordStatus::Error;
                outcome.note = format!("{:#}", e);
                report_sink_failure(self.sink.append_error(&record.identifier, &outcome.note));
                None
            }
        };

        summary.processed_count += outcome.launched_count();
        self.finalize(&outcome);
        log_record_complete(record_index, &outcome);

        match cancelled {
            Some(cancelled) => Err(cancelled),
            None => Ok(outcome),
        }
    }

    /// 拒绝无法处理的行（日期缺失或无效），不接触门户
    pub fn reject(&self, identifier: &str, reason: &str) {
        error!("⚠️ 学员 {} 的数据无效: {}", identifier, reason);
        report_sink_failure(self.sink.append_error(identifier, reason));
        self.events.record_finished(identifier, RecordStatus::Error);
    }

    async fn run_steps(
        &self,
        record: &Record,
        record_index: usize,
        outcome: &mut RecordOutcome,
        skipped: &mut VecDeque<LessonItem>,
        summary: &mut RunSummary,
    ) -> Result<(), FlowError> {
        self.control.checkpoint().await?;

        // ========== 搜索学员 ==========
        let rows = self
            .portal
            .search(self.driver, &record.identifier)
            .await
            .context("搜索学员失败")?;
        self.control.checkpoint().await?;

        let Some(row_index) = PortalService::find_match(
            &rows,
            &self.config.target_year,
            &self.config.program_marker,
        ) else {
            warn!(
                "[学员 {}] ⚠️ 未找到 {} 年 {} 的注册 ({} 行结果)",
                record_index,
                self.config.target_year,
                self.config.program_marker,
                rows.len()
            );
            summary.not_found_count += 1;
            outcome.status = RecordStatus::NotFound;
            outcome.note = format!(
                "未找到 {} 年 {} 的注册",
                self.config.target_year, self.config.program_marker
            );
            return Ok(());
        };

        summary.found_count += 1;
        info!("[学员 {}] ✓ 找到匹配的注册 (第 {} 行)", record_index, row_index + 1);
        self.portal
            .open_result(self.driver, row_index)
            .await
            .context("打开学员详情失败")?;
        self.control.checkpoint().await?;

        // ========== 课程列表 ==========
        let items = self.discover_lessons().await?;
        for item in items.iter().filter(|item| !item.admitted) {
            info!("[学员 {}] 课程 {} 编号超长，跳过", record_index, item.number);
            skipped.push_back(item.clone());
        }

        let total = items.iter().filter(|item| item.admitted).count();
        if total == 0 {
            warn!("[学员 {}] ⚠️ 没有可处理的课程", record_index);
            outcome.status = RecordStatus::NoLessons;
            outcome.note = "没有可处理的课程".to_string();
            return Ok(());
        }
        info!("[学员 {}] 🛠️ 找到 {} 门待处理课程", record_index, total);

        // ========== 逐门处理 ==========
        let form = AbsenceForm::new(record, self.config);
        for index in 0..total {
            self.control.checkpoint().await?;

            // 门户在每次访问课程后重建课程表，旧的位置不可信
            let admitted: Vec<LessonItem> = self
                .discover_lessons()
                .await?
                .into_iter()
                .filter(|item| item.admitted)
                .collect();

            let Some(item) = admitted.get(index) else {
                warn!(
                    "[学员 {}] ⚠️ 课程表只剩 {} 门，停在第 {} 门",
                    record_index,
                    admitted.len(),
                    index + 1
                );
                break;
            };

            // 结果按课程表顺序排列
            push_skipped(outcome, skipped, Some(item.position));

            let ctx = LessonCtx::new(&record.identifier, record_index, index + 1, total);
            let lesson_outcome = self.lesson_flow.run(self.driver, item, &form, &ctx).await;
            outcome.push(item.number.clone(), lesson_outcome);
        }

        outcome.status = RecordStatus::Success;
        outcome.note = format!("期间: {}", record.period_text());
        Ok(())
    }

    /// 重新读取并过滤课程表
    async fn discover_lessons(&self) -> Result<Vec<LessonItem>, FlowError> {
        let cells = self
            .portal
            .lesson_cells(self.driver)
            .await
            .context("读取课程表失败")?;
        Ok(self.filter.discover(&cells, self.config.wide_admission))
    }

    /// 写运行日志并通知监控端，每条记录只调用一次
    fn finalize(&self, outcome: &RecordOutcome) {
        report_sink_failure(self.sink.append_record_outcome(outcome));
        self.events
            .record_finished(&outcome.record.identifier, outcome.status);
    }
}

/// 写入位置在 `before` 之前的超长课程，`None` 表示全部写入
fn push_skipped(
    outcome: &mut RecordOutcome,
    skipped: &mut VecDeque<LessonItem>,
    before: Option<usize>,
) {
    while let Some(item) = skipped.pop_front() {
        if before.is_some_and(|position| item.position >= position) {
            skipped.push_front(item);
            break;
        }
        outcome.push(item.number, LessonOutcome::SkippedLengthRule);
    }
}

/// 运行日志写不进去不影响处理
fn report_sink_failure(result: anyhow::Result<()>) {
    if let Err(e) = result {
        warn!("⚠️ 写入运行日志失败: {:#}", e);
    }
}

// ========== 日志辅助函数 ==========

fn log_record_complete(record_index: usize, outcome: &RecordOutcome) {
    info!(
        "[学员 {}] 课程统计: 已提交 {}, 总计 {}, 状态 {}",
        record_index,
        outcome.launched_count(),
        outcome.lesson_outcomes.len(),
        outcome.status
    );
}

//! 课程处理流程 - 流程层
//!
//! 核心职责：定义"一门课"的完整处理流程
//!
//! 流程顺序：
//! 1. 打开课程详情（失败 → Failed("open-failed")，不返回）
//! 2. 读取标记文本
//! 3. 没有注册标记 → 不适用
//! 4. 注册标记 + 排除类别标记（未放宽时）→ 跳过
//! 5. 否则填写并提交缺勤说明 → 已提交
//!
//! 只要打开了详情，无论哪一步失败都要尝试返回课程表，保证下一门课的页面状态一致。

use tracing::{error, info, warn};

use crate::config::Config;
use crate::infrastructure::AutomationDriver;
use crate::models::{LessonItem, LessonOutcome};
use crate::services::{AbsenceForm, PortalService};
use crate::workflow::lesson_ctx::LessonCtx;

/// 打开课程失败时的原因
pub const OPEN_FAILED: &str = "open-failed";

/// 标记文本的判断结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerDecision {
    /// 没有注册标记
    NoMarker,
    /// 注册标记与排除类别同时出现
    Conflict,
    /// 可以提交
    Apply,
}

/// 根据详情页标记决定如何处理
pub fn classify_marker(
    text: &str,
    enrollment_marker: &str,
    exclusion_marker: &str,
    wide_admission: bool,
) -> MarkerDecision {
    if !text.contains(enrollment_marker) {
        MarkerDecision::NoMarker
    } else if !wide_admission && text.contains(exclusion_marker) {
        MarkerDecision::Conflict
    } else {
        MarkerDecision::Apply
    }
}

/// 课程处理流程
///
/// - 编排单门课的状态机，每条路径都落到一个 `LessonOutcome`
/// - 不持有驱动，不做取消检查
/// - 调用方保证课程表是刚刚重新读取的
pub struct LessonFlow {
    portal: PortalService,
    enrollment_marker: String,
    exclusion_marker: String,
    wide_admission: bool,
}

impl LessonFlow {
    pub fn new(config: &Config) -> Self {
        Self {
            portal: PortalService::new(config),
            enrollment_marker: config.enrollment_marker.clone(),
            exclusion_marker: config.exclusion_marker.clone(),
            wide_admission: config.wide_admission,
        }
    }

    pub async fn run(
        &self,
        driver: &dyn AutomationDriver,
        item: &LessonItem,
        form: &AbsenceForm,
        ctx: &LessonCtx,
    ) -> LessonOutcome {
        if let Err(e) = self.portal.open_lesson(driver, item.position).await {
            error!("{} ❌ 无法打开课程 {}: {}", ctx, item.number, e);
            return LessonOutcome::Failed(OPEN_FAILED.to_string());
        }
        info!("{} ✅ 已打开课程 {}", ctx, item.number);

        let outcome = self.inspect_and_apply(driver, item, form, ctx).await;

        // 返回失败不影响本课结果
        if let Err(e) = self.portal.back_to_lessons(driver).await {
            warn!("{} ⚠️ 返回课程表失败: {}", ctx, e);
        }

        outcome
    }

    async fn inspect_and_apply(
        &self,
        driver: &dyn AutomationDriver,
        item: &LessonItem,
        form: &AbsenceForm,
        ctx: &LessonCtx,
    ) -> LessonOutcome {
        let marker = match self.portal.read_marker(driver).await {
            Ok(text) => text,
            Err(e) => {
                error!("{} ❌ 读取课程 {} 的标记失败: {}", ctx, item.number, e);
                return LessonOutcome::Failed(format!("marker-unreadable: {}", e));
            }
        };

        match classify_marker(
            &marker,
            &self.enrollment_marker,
            &self.exclusion_marker,
            self.wide_admission,
        ) {
            MarkerDecision::NoMarker => {
                info!("{} 课程 {} 没有 '{}' 标记，不适用", ctx, item.number, self.enrollment_marker);
                LessonOutcome::NotApplicableNoMarker
            }
            MarkerDecision::Conflict => {
                warn!(
                    "{} ⚠️ 课程 {} 同时有 '{}' 和 '{}'，跳过",
                    ctx, item.number, self.enrollment_marker, self.exclusion_marker
                );
                LessonOutcome::SkippedEnrollmentConflict
            }
            MarkerDecision::Apply => match self.portal.submit_absence(driver, form).await {
                Ok(()) => {
                    info!("{} ✓ 课程 {} 缺勤说明已提交", ctx, item.number);
                    LessonOutcome::Launched
                }
                Err(e) => {
                    error!("{} ❌ 课程 {} 提交失败: {:#}", ctx, item.number, e);
                    LessonOutcome::Failed(format!("submit-failed: {:#}", e))
                }
            },
        }
    }
}

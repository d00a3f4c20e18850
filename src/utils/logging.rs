//! 日志工具模块
//!
//! 初始化 tracing，并提供运行各阶段的日志输出函数

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::monitor::{RowState, RunState, StatusAggregator};

/// 初始化 tracing 输出，默认 `info`，可用 `RUST_LOG` 覆盖
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 课程缺勤批量提交");
    info!("📄 学员表: {} [{}]", config.records_file, config.records_sheet);
    info!(
        "📅 目标年份: {} / 课程标记: {}",
        config.target_year, config.program_marker
    );
    info!("📝 缺勤原因: {}", config.reason);
    if config.wide_admission {
        info!("🔓 已放宽课程编号长度限制");
    }
    info!("💡 输入 p 暂停, r 继续, c 取消");
    info!("{}", "=".repeat(60));
}

/// 记录学员表加载信息
pub fn log_records_loaded(total: usize) {
    info!("✓ 找到 {} 个待处理的学员", total);
}

/// 记录单个学员开始处理
pub fn log_record_start(index: usize, total: usize, identifier: &str) {
    info!("\n{}", "─".repeat(60));
    info!("👤 开始处理第 {}/{} 个学员: {}", index, total, identifier);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(state: &RunState, status: &StatusAggregator) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    if let Some(summary) = state.summary() {
        info!("✅ 找到学员: {}", summary.found_count);
        info!("❓ 未找到学员: {}", summary.not_found_count);
        info!("📨 已提交课程: {}", summary.processed_count);
    }
    info!("📋 {}", status.progress_line());
    for (index, row) in status.rows().iter().enumerate() {
        let label = match row.state {
            RowState::Running => "RUNNING".to_string(),
            RowState::Finished(result) => result.to_string(),
        };
        info!("  {:>3}. {:<12} {}", index + 1, row.id, label);
    }
    info!("{}", "=".repeat(60));
    info!("{}", state.message());
}

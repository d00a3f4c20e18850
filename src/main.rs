use anyhow::{anyhow, Result};
use tracing::{info, warn};

use lesson_launcher::models::ProgressEvent;
use lesson_launcher::monitor::spawn_stdin_reader;
use lesson_launcher::utils::logging;
use lesson_launcher::{Config, MonitorHandle, RunState, StatusAggregator};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();
    logging::log_startup(&config);

    let mut handle = MonitorHandle::start(config);
    // 阻塞读放在系统线程里，运行结束后不用等标准输入关闭
    if let Err(e) = spawn_stdin_reader(handle.control().clone()) {
        warn!("⚠️ 无法读取控制台命令: {}", e);
    }

    let mut status = StatusAggregator::new();
    while let Some(event) = handle.next_event().await {
        let finished = matches!(event, ProgressEvent::RecordFinished { .. });
        status.apply(event);
        if finished {
            info!("📋 {}", status.progress_line());
        }
    }

    let state = handle.finish().await;
    logging::print_final_stats(&state, &status);
    println!("{}", state.message());

    match state {
        RunState::Failed { reason } => Err(anyhow!(reason)),
        _ => Ok(()),
    }
}

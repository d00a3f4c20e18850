//! 控制台命令
//!
//! 标准输入的读取放在独立的系统线程里。阻塞读不占用运行时，
//! 主任务结束后进程直接退出，不必等用户再按一次回车。

use std::io::BufRead;
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use crate::control::ControlToken;

/// 控制台支持的命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Pause,
    Resume,
    Cancel,
}

impl ConsoleCommand {
    /// 空行返回 `Ok(None)`，无法识别的输入原样返回
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        match line.trim().to_lowercase().as_str() {
            "p" | "pause" => Ok(Some(ConsoleCommand::Pause)),
            "r" | "resume" => Ok(Some(ConsoleCommand::Resume)),
            "c" | "cancel" => Ok(Some(ConsoleCommand::Cancel)),
            "" => Ok(None),
            other => Err(other.to_string()),
        }
    }

    pub fn apply(self, control: &ControlToken) {
        match self {
            ConsoleCommand::Pause => {
                info!("⏸ 暂停（在下一个检查点生效）");
                control.pause();
            }
            ConsoleCommand::Resume => {
                info!("▶ 继续");
                control.resume();
            }
            ConsoleCommand::Cancel => {
                info!("⏹ 取消（当前步骤结束后停止）");
                control.cancel();
            }
        }
    }
}

/// 逐行读取命令直到输入结束
pub fn read_commands<R: BufRead>(reader: R, control: &ControlToken) {
    for line in reader.lines() {
        let Ok(line) = line else {
            break;
        };
        match ConsoleCommand::parse(&line) {
            Ok(Some(command)) => command.apply(control),
            Ok(None) => {}
            Err(other) => warn!("未知命令: {} (可用: p / r / c)", other),
        }
    }
}

/// 在后台线程里读标准输入
///
/// 返回的线程不需要 join，进程退出时随之结束。
pub fn spawn_stdin_reader(control: ControlToken) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("console-commands".to_string())
        .spawn(move || read_commands(std::io::stdin().lock(), &control))
}

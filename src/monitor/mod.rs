//! 监控层
//!
//! - `handle` - 启动工作任务，转发暂停 / 继续 / 取消，读取事件
//! - `console` - 在系统线程里读取控制台命令
//! - `status` - 把事件汇总成可显示的进度

pub mod console;
pub mod handle;
pub mod status;

pub use console::{read_commands, spawn_stdin_reader, ConsoleCommand};
pub use handle::{MonitorHandle, RunState, CANCELLED_MESSAGE};
pub use status::{RowState, StatusAggregator, StatusRow};

//! # Lesson Launcher
//!
//! 一个用于在学籍门户上批量提交课程缺勤说明的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构，外加一个监控层：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（浏览器页面），只暴露能力
//! - `AutomationDriver` - 打开页面、等待、填写、点击、读取文本
//! - `ChromiumDriver` - 基于 CDP 的实现，元素可在内容 iframe 中
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理门户上的一个动作
//! - `PortalService` - 登录 / 搜索 / 课程表 / 缺勤表单
//! - `RecordFilter` - 课程编号过滤
//! - `LogSink` - 只追加的运行日志
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一门课"的完整处理流程
//! - `LessonCtx` - 上下文封装（学员 ID + 课程序号）
//! - `LessonFlow` - 打开 → 读标记 → 决定 → 提交 → 返回
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/engine` - 整张学员表，持有驱动和运行日志
//! - `orchestrator/record_processor` - 单个学员，遍历课程表
//!
//! ### ⑤ 监控层（Monitor）
//! - `monitor/` - 启动工作任务、暂停 / 继续 / 取消、汇总进度事件
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod control;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod monitor;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, ReasonLabel};
pub use control::{Cancelled, ControlState, ControlToken};
pub use error::AppError;
pub use infrastructure::{AutomationDriver, ChromiumDriver, DriverError, Locator};
pub use models::{ProgressEvent, Record, RecordOutcome, RecordSource, RecordStatus, RunSummary};
pub use monitor::{MonitorHandle, RunState, StatusAggregator};
pub use orchestrator::{RunOutcome, WorkflowEngine};
pub use workflow::{LessonCtx, LessonFlow};

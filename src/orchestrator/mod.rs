//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责整张学员表的处理和流程调度。
//!
//! ## 模块划分
//!
//! ### `engine` - 运行引擎
//! - 持有驱动和运行日志
//! - 登录门户、逐行读取学员表
//! - 在每行开始前检查暂停 / 取消
//! - 汇总 `RunSummary`
//!
//! ### `record_processor` - 单个学员处理器
//! - 搜索学员、打开匹配的注册
//! - 每门课前重新读取课程表
//! - 把失败隔离在记录边界内
//!
//! ## 层次关系
//!
//! ```text
//! engine (处理整张学员表)
//!     ↓
//! record_processor (处理一个学员的 Vec<LessonItem>)
//!     ↓
//! workflow::LessonFlow (处理单门课程)
//!     ↓
//! services (能力层：portal / filter / log_sink)
//!     ↓
//! infrastructure (基础设施：AutomationDriver)
//! ```

pub mod engine;
pub mod record_processor;

pub use engine::{RunOutcome, WorkflowEngine, NO_RECORDS_MESSAGE};
pub use record_processor::RecordProcessor;

//! 自动化驱动能力 - 基础设施层
//!
//! 引擎只通过这个 trait 接触远端系统：导航、定位、等待、读文本、点击、填写。
//! 具体实现（Chrome DevTools / 测试桩）都在这个边界之后。

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// 元素定位方式
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// 按 id 定位
    Id(String),
    /// XPath 表达式（可匹配多个节点）
    XPath(String),
}

impl Locator {
    pub fn id(id: impl Into<String>) -> Self {
        Locator::Id(id.into())
    }

    pub fn xpath(expr: impl Into<String>) -> Self {
        Locator::XPath(expr.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "#{}", id),
            Locator::XPath(expr) => write!(f, "xpath:{}", expr),
        }
    }
}

/// 单次驱动调用的错误
#[derive(Debug, Error)]
pub enum DriverError {
    /// 元素不存在
    #[error("元素不存在: {locator}")]
    NotFound { locator: String },
    /// 等待超时
    #[error("等待元素超时 ({waited:?}): {locator}")]
    Timeout { locator: String, waited: Duration },
    /// 页面脚本执行失败
    #[error("执行脚本失败: {0}")]
    Script(String),
    /// 浏览器连接/协议错误
    #[error("浏览器错误: {0}")]
    Browser(String),
}

impl DriverError {
    pub fn not_found(locator: &Locator) -> Self {
        DriverError::NotFound {
            locator: locator.to_string(),
        }
    }

    pub fn timeout(locator: &Locator, waited: Duration) -> Self {
        DriverError::Timeout {
            locator: locator.to_string(),
            waited,
        }
    }

    /// NotFound / Timeout 都表示"元素不在"，调用方按需吞掉
    pub fn is_absent(&self) -> bool {
        matches!(self, DriverError::NotFound { .. } | DriverError::Timeout { .. })
    }
}

impl From<chromiumoxide::error::CdpError> for DriverError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        DriverError::Browser(err.to_string())
    }
}

impl From<serde_json::Error> for DriverError {
    fn from(err: serde_json::Error) -> Self {
        DriverError::Script(err.to_string())
    }
}

pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// 自动化驱动
///
/// 职责：
/// - 只暴露操作页面的能力
/// - 不认识学员 / 课程
/// - 不处理业务流程
///
/// 驱动由唯一的工作任务独占持有，不存在并发访问。
#[async_trait]
pub trait AutomationDriver: Send + Sync {
    /// 导航到目标地址
    async fn navigate(&self, target: &str) -> DriverResult<()>;

    /// 等待元素出现
    async fn await_element(&self, locator: &Locator, timeout: Duration) -> DriverResult<()>;

    /// 等待元素可点击
    async fn await_clickable(&self, locator: &Locator, timeout: Duration) -> DriverResult<()>;

    /// 清空并填写输入框
    async fn fill(&self, locator: &Locator, text: &str) -> DriverResult<()>;

    /// 点击元素（`<option>` 会被选中）
    async fn click(&self, locator: &Locator) -> DriverResult<()>;

    /// 读取元素文本
    async fn read_text(&self, locator: &Locator) -> DriverResult<String>;

    /// 读取定位器匹配到的所有节点的文本，按文档顺序
    async fn list_children(&self, locator: &Locator) -> DriverResult<Vec<String>>;

    /// 释放会话资源
    async fn close(&self) -> DriverResult<()>;
}

use thiserror::Error;

use crate::control::Cancelled;
use crate::infrastructure::DriverError;

/// 应用程序错误类型（启动阶段，跨越记录边界的错误）
#[derive(Debug, Error)]
pub enum AppError {
    /// 浏览器相关错误
    #[error("浏览器错误: {0}")]
    Driver(#[from] DriverError),
    /// 学员表错误
    #[error("数据源错误: {0}")]
    Source(#[from] SourceError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 运行日志错误
    #[error("日志错误: {0}")]
    Log(String),
}

/// 学员表错误
#[derive(Debug, Error)]
pub enum SourceError {
    /// 文件无法打开
    #[error("无法打开学员表 {path}: {reason}")]
    Unavailable { path: String, reason: String },
    /// 文件结构不对
    #[error("学员表格式错误 {path}: {reason}")]
    Parse { path: String, reason: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 缺勤原因不在固定列表里
    #[error("未知的缺勤原因: '{value}'")]
    UnknownReason { value: String },
    /// 需要依据代码的原因没有配置代码
    #[error("缺勤原因 '{reason}' 需要填写依据代码")]
    MissingJustification { reason: String },
    /// 字段取值不合法
    #[error("配置项 {field} 不合法: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// 记录边界以下的流程错误
///
/// 取消必须一路传到引擎；其他失败在记录边界被接住。
#[derive(Debug, Error)]
pub enum FlowError {
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl From<DriverError> for FlowError {
    fn from(err: DriverError) -> Self {
        FlowError::Failed(err.into())
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建日志写入错误
    pub fn log_failed(source: impl std::fmt::Display) -> Self {
        AppError::Log(source.to_string())
    }
}

impl SourceError {
    pub fn unavailable(path: impl Into<String>, source: impl std::fmt::Display) -> Self {
        SourceError::Unavailable {
            path: path.into(),
            reason: source.to_string(),
        }
    }

    pub fn parse(path: impl Into<String>, source: impl std::fmt::Display) -> Self {
        SourceError::Parse {
            path: path.into(),
            reason: source.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_error_keeps_cancellation_distinct() {
        let err: FlowError = Cancelled.into();
        assert!(matches!(err, FlowError::Cancelled(_)));

        let err: FlowError = DriverError::Script("boom".into()).into();
        assert!(matches!(err, FlowError::Failed(_)));
        assert!(err.to_string().contains("boom"));
    }
}

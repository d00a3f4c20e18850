//! 暂停 / 继续 / 取消控制
//!
//! 监控端写状态，工作任务只在检查点读状态。检查点是工作任务唯一会因暂停而挂起的地方。

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

/// 运行控制状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ControlState {
    Running,
    Paused,
    Cancelled,
}

/// 监控端请求了取消
///
/// 单独成型，保证它不会被当成普通错误在记录边界被吞掉
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("运行已被取消")]
pub struct Cancelled;

/// 工作任务与监控端共享的控制令牌
///
/// 克隆得到的是同一个令牌。取消是终态：之后的 pause / resume 都不再生效。
#[derive(Debug, Clone)]
pub struct ControlToken {
    state: Arc<watch::Sender<ControlState>>,
}

impl ControlToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ControlState::Running);
        Self {
            state: Arc::new(tx),
        }
    }

    /// 当前状态
    pub fn state(&self) -> ControlState {
        *self.state.borrow()
    }

    pub fn is_cancelled(&self) -> bool {
        self.state() == ControlState::Cancelled
    }

    /// 请求暂停，工作任务会在下一个检查点停下
    pub fn pause(&self) {
        self.state.send_if_modified(|state| {
            if *state == ControlState::Running {
                *state = ControlState::Paused;
                true
            } else {
                false
            }
        });
    }

    /// 解除暂停
    pub fn resume(&self) {
        self.state.send_if_modified(|state| {
            if *state == ControlState::Paused {
                *state = ControlState::Running;
                true
            } else {
                false
            }
        });
    }

    /// 请求取消（幂等），同时释放暂停
    pub fn cancel(&self) {
        self.state.send_if_modified(|state| {
            if *state == ControlState::Cancelled {
                false
            } else {
                *state = ControlState::Cancelled;
                true
            }
        });
    }

    /// 检查点
    ///
    /// - Running：立即返回
    /// - Paused：挂起，直到 resume 或 cancel 唤醒
    /// - Cancelled：返回 `Err(Cancelled)`
    pub async fn checkpoint(&self) -> Result<(), Cancelled> {
        let mut rx = self.state.subscribe();
        loop {
            let current = *rx.borrow_and_update();
            match current {
                ControlState::Running => return Ok(()),
                ControlState::Cancelled => return Err(Cancelled),
                ControlState::Paused => {}
            }
            // 发送端由 self 持有，changed() 不会因关闭而失败
            if rx.changed().await.is_err() {
                return Err(Cancelled);
            }
        }
    }
}

impl Default for ControlToken {
    fn default() -> Self {
        Self::new()
    }
}

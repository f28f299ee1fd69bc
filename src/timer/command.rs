//! 空闲定时器命令定义
//! Idle timer command definitions
//!
//! 定义了调用者与空闲定时器 actor 之间的私有请求/应答协议。
//!
//! Defines the private request/response protocol between callers and the
//! idle timer actor.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// The notification invoked when a timer fires.
/// 定时器触发时调用的通知函数。
pub type TimeoutCallback = Arc<dyn Fn() + Send + Sync>;

/// A request to change the idle threshold. The actor sends on `done` once the
/// change has been fully applied.
///
/// 修改空闲阈值的请求。变更完全生效后 actor 通过 `done` 应答。
#[derive(Debug)]
pub struct SetTimeoutTicket {
    pub new_dur: Duration,
    pub done: oneshot::Sender<()>,
}

impl SetTimeoutTicket {
    pub fn new(new_dur: Duration) -> (Self, oneshot::Receiver<()>) {
        let (done, done_rx) = oneshot::channel();
        (Self { new_dur, done }, done_rx)
    }

    /// Acknowledges the ticket. The requester may have given up already.
    pub fn complete(self) {
        let _ = self.done.send(());
    }
}

/// Commands serviced by the actor loop, one at a time.
/// 由 actor 循环逐个处理的命令。
pub enum IdleTimerCommand {
    /// Read the configured threshold (zero when disabled).
    /// 读取当前配置的阈值（禁用时为零）。
    GetIdleTimeout {
        response_tx: oneshot::Sender<Duration>,
    },
    /// Change the threshold.
    /// 修改阈值。
    SetIdleTimeout(SetTimeoutTicket),
    /// Replace the timeout callback.
    /// 替换超时回调。
    SetCallback {
        callback: TimeoutCallback,
        response_tx: oneshot::Sender<()>,
    },
    /// Read the fired flag.
    /// 读取已触发标志。
    TimedOut { response_tx: oneshot::Sender<bool> },
}

impl fmt::Debug for IdleTimerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetIdleTimeout { .. } => f.write_str("GetIdleTimeout"),
            Self::SetIdleTimeout(ticket) => f
                .debug_tuple("SetIdleTimeout")
                .field(&ticket.new_dur)
                .finish(),
            Self::SetCallback { .. } => f.write_str("SetCallback"),
            Self::TimedOut { .. } => f.write_str("TimedOut"),
        }
    }
}

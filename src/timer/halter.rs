//! 协作式取消器
//! Cooperative canceller
//!
//! 由两个一次性信号组成的关闭握手：“请求停止”广播信号和“关闭完成”信号。
//! 后台循环观察前者并退出，退出后关闭后者。
//!
//! A two-signal shutdown handshake: a broadcast "stop requested" signal and a
//! "shutdown complete" signal. The background loop observes the former, exits,
//! and closes the latter once it has released everything it held.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error};

/// A one-shot broadcast signal. Closing it twice is a programmer error.
///
/// 一次性广播信号。重复关闭属于编程错误。
#[derive(Debug)]
pub struct Signal {
    name: &'static str,
    tx: watch::Sender<bool>,
}

impl Signal {
    /// Creates an open signal.
    pub fn new(name: &'static str) -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { name, tx }
    }

    /// Closes the signal, waking every current and future waiter.
    ///
    /// # Panics
    /// Panics if the signal was already closed.
    ///
    /// 关闭信号，唤醒所有当前和未来的等待者。重复关闭会 panic。
    pub fn close(&self) {
        if self.tx.send_replace(true) {
            panic!("{} signal closed twice", self.name);
        }
    }

    /// Whether the signal has been closed.
    pub fn is_closed(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the signal is closed; immediately if it already is.
    /// 信号关闭后完成；若已关闭则立即完成。
    pub async fn closed(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so this only returns once closed.
        let _ = rx.wait_for(|closed| *closed).await;
    }
}

/// The canceller governing a background loop's lifetime.
///
/// `req_stop` is closed exactly once by the owner; `done` is closed exactly
/// once by the loop after it has fully exited.
///
/// 管理后台循环生命周期的取消器。
#[derive(Debug)]
pub struct Halter {
    req_stop: Signal,
    done: Signal,
}

impl Halter {
    pub fn new() -> Self {
        Self {
            req_stop: Signal::new("stop-requested"),
            done: Signal::new("done"),
        }
    }

    /// Requests termination. Must be invoked at most once.
    /// 请求终止。最多只能调用一次。
    pub fn request_stop(&self) {
        self.req_stop.close();
    }

    /// Signals that the loop has exited. Must be invoked at most once.
    /// 表示循环已退出。最多只能调用一次。
    pub fn mark_done(&self) {
        self.done.close();
    }

    /// Whether a stop has been requested.
    /// 是否已请求停止。
    pub fn is_stop_requested(&self) -> bool {
        self.req_stop.is_closed()
    }

    /// Whether the loop has marked itself done.
    /// 循环是否已标记完成。
    pub fn is_done(&self) -> bool {
        self.done.is_closed()
    }

    /// Resolves once a stop has been requested.
    /// 在请求停止后完成。
    pub async fn stop_requested(&self) {
        self.req_stop.closed().await
    }

    /// Resolves once the loop has marked itself done.
    /// 在循环标记完成后完成。
    pub async fn done(&self) {
        self.done.closed().await
    }

    /// Requests a stop and waits up to `grace` for the loop to finish.
    ///
    /// # Panics
    /// Panics if the loop does not finish in time: a background task that
    /// ignores a stop request is a leaked task, not a recoverable fault.
    ///
    /// 请求停止并最多等待 `grace` 让循环结束。超时即 panic。
    pub async fn stop_and_wait(&self, grace: Duration) {
        self.request_stop();
        if tokio::time::timeout(grace, self.done()).await.is_err() {
            error!(?grace, "background loop did not honor stop request");
            panic!("background loop still running {grace:?} after stop was requested");
        }
        debug!("background loop stopped");
    }
}

impl Default for Halter {
    fn default() -> Self {
        Self::new()
    }
}

/// Marks the halter done when dropped, so the loop signals completion on
/// every exit path, unwinding included.
///
/// 在被丢弃时将取消器标记为完成，确保循环在任何退出路径上都发出完成信号。
pub(crate) struct DoneGuard {
    halter: Arc<Halter>,
}

impl DoneGuard {
    pub(crate) fn new(halter: Arc<Halter>) -> Self {
        Self { halter }
    }
}

impl Drop for DoneGuard {
    fn drop(&mut self) {
        self.halter.mark_done();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signal_wakes_waiters() {
        let halter = Arc::new(Halter::new());
        assert!(!halter.is_stop_requested());

        let waiter = {
            let halter = halter.clone();
            tokio::spawn(async move { halter.stop_requested().await })
        };
        tokio::task::yield_now().await;
        halter.request_stop();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(halter.is_stop_requested());
        // Late waiters resolve immediately.
        halter.stop_requested().await;
    }

    #[tokio::test]
    async fn test_done_is_independent_of_stop() {
        let halter = Halter::new();
        assert!(!halter.is_done());

        // A loop may exit on its own, without a stop request.
        halter.mark_done();
        assert!(halter.is_done());
        assert!(!halter.is_stop_requested());
        tokio::time::timeout(Duration::from_secs(1), halter.done())
            .await
            .unwrap();
    }

    #[test]
    #[should_panic(expected = "closed twice")]
    fn test_double_close_panics() {
        let halter = Halter::new();
        halter.request_stop();
        halter.request_stop();
    }

    #[tokio::test]
    async fn test_stop_and_wait_returns_when_loop_exits() {
        let halter = Arc::new(Halter::new());
        let worker = {
            let halter = halter.clone();
            tokio::spawn(async move {
                let _guard = DoneGuard::new(halter.clone());
                halter.stop_requested().await;
            })
        };

        halter.stop_and_wait(Duration::from_secs(1)).await;
        assert!(halter.is_done());
        worker.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    #[should_panic(expected = "after stop was requested")]
    async fn test_stop_and_wait_panics_on_stuck_loop() {
        let halter = Halter::new();
        // Nothing ever marks it done.
        halter.stop_and_wait(Duration::from_millis(100)).await;
    }
}

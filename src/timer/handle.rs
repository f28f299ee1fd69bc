//! 空闲定时器句柄
//! Idle timer handle
//!
//! 本模块包含空闲定时器的客户端句柄。热路径上的 `reset`/`nanos_since`
//! 直接操作共享的原子时间戳；其余操作作为命令发送给 actor 并同步等待应答，
//! 同时与停止信号竞争，因此在关闭之后不会无限期阻塞。
//!
//! This module contains the client handle of the idle timer. The hot-path
//! `reset`/`nanos_since` operate directly on the shared atomic timestamp;
//! every other operation is sent to the actor as a command and awaits its
//! acknowledgement while racing the stop signal, so nothing blocks past
//! shutdown.

use crate::config::IdleTimerConfig;
use crate::error::{IdleTimerError, Result};
use crate::timer::{
    actor::{Activity, IdleTimerActor},
    clock::MonoClock,
    command::{IdleTimerCommand, SetTimeoutTicket, TimeoutCallback},
    halter::Halter,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Watches a channel's I/O activity and notifies a callback once it has
/// stalled for longer than the configured idle duration.
///
/// Cloning is cheap; every clone drives the same background actor. Call
/// [`stop`](Self::stop) exactly once when the monitored channel closes.
///
/// ```no_run
/// # async fn demo() -> tunnel_idle::error::Result<()> {
/// use std::time::Duration;
/// use tunnel_idle::timer::IdleTimer;
///
/// let timer = IdleTimer::new(None, Duration::ZERO);
/// timer.set_timeout_callback(|| eprintln!("channel went idle")).await?;
/// timer.set_idle_timeout(Duration::from_secs(30)).await?;
///
/// // On every successful read or write:
/// timer.reset();
///
/// timer.stop().await;
/// # Ok(())
/// # }
/// ```
///
/// 监视通道的I/O活动，并在停滞超过配置的空闲时长后通知回调。
#[derive(Debug, Clone)]
pub struct IdleTimer {
    command_tx: mpsc::Sender<IdleTimerCommand>,
    activity: Arc<Activity>,
    halter: Arc<Halter>,
    stop_grace_period: Duration,
}

impl IdleTimer {
    /// Creates a timer with the default configuration and starts its actor.
    ///
    /// `callback` may be `None` if it is supplied later through
    /// [`set_timeout_callback`](Self::set_timeout_callback), which must happen
    /// before the timer can fire. A `dur` of zero starts the timer disabled.
    ///
    /// Must be called within a tokio runtime.
    ///
    /// 使用默认配置创建定时器并启动其 actor。`dur` 为零时定时器处于禁用状态。
    pub fn new(callback: Option<TimeoutCallback>, dur: Duration) -> Self {
        Self::with_config(callback, dur, IdleTimerConfig::default())
    }

    /// Creates a timer with an explicit configuration.
    /// 使用指定配置创建定时器。
    pub fn with_config(
        callback: Option<TimeoutCallback>,
        dur: Duration,
        config: IdleTimerConfig,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::channel(config.command_buffer_size.max(1));
        let activity = Arc::new(Activity::new(MonoClock::new()));
        let halter = Arc::new(Halter::new());
        let stop_grace_period = config.stop_grace_period;

        let actor = IdleTimerActor::new(
            callback,
            activity.clone(),
            halter.clone(),
            config,
            command_rx,
        );
        tokio::spawn(actor.run(dur));

        debug!(?dur, "idle timer created");
        Self {
            command_tx,
            activity,
            halter,
            stop_grace_period,
        }
    }

    /// Records activity now, restarting the idle clock. Lock-free; never
    /// touches the actor.
    ///
    /// 记录当前时刻的活动，重新开始空闲计时。无锁，不经过 actor。
    #[inline]
    pub fn reset(&self) {
        self.activity.reset();
    }

    /// Nanoseconds since the last [`reset`](Self::reset). Lock-free.
    /// 自上次 [`reset`](Self::reset) 以来的纳秒数。无锁。
    #[inline]
    pub fn nanos_since(&self) -> u64 {
        self.activity.nanos_since()
    }

    /// Sets the idle threshold and waits until the actor has applied it.
    ///
    /// - zero disables detection and clears a raised timeout;
    /// - the currently active value is a no-op: the idle clock keeps running
    ///   and a raised timeout stays raised;
    /// - any other value (re)arms detection from now.
    ///
    /// 设置空闲阈值并等待 actor 应用。零表示禁用；与当前值相同则不做任何事；
    /// 其他值会从现在开始重新计时。
    pub async fn set_idle_timeout(&self, dur: Duration) -> Result<()> {
        let (ticket, done_rx) = SetTimeoutTicket::new(dur);
        self.request(IdleTimerCommand::SetIdleTimeout(ticket), done_rx)
            .await
    }

    /// Returns the configured threshold, zero if detection is disabled.
    /// 返回当前配置的阈值，禁用时为零。
    pub async fn get_idle_timeout(&self) -> Result<Duration> {
        let (response_tx, response_rx) = oneshot::channel();
        self.request(IdleTimerCommand::GetIdleTimeout { response_tx }, response_rx)
            .await
    }

    /// Whether the idle threshold has been exceeded since the timer was last
    /// armed. This only reports the flag raised by the periodic check; it does
    /// not look at the clock itself.
    ///
    /// 自上次布防以来是否已超过空闲阈值。仅报告周期性检查设置的标志。
    pub async fn timed_out(&self) -> Result<bool> {
        let (response_tx, response_rx) = oneshot::channel();
        self.request(IdleTimerCommand::TimedOut { response_tx }, response_rx)
            .await
    }

    /// Replaces the callback invoked when the timer fires.
    ///
    /// The callback runs on its own task, so it may freely call back into
    /// this timer.
    ///
    /// 替换定时器触发时调用的回调。回调在独立任务上运行，可以安全地回调本定时器。
    pub async fn set_timeout_callback<F>(&self, callback: F) -> Result<()>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let (response_tx, response_rx) = oneshot::channel();
        let command = IdleTimerCommand::SetCallback {
            callback: Arc::new(callback),
            response_tx,
        };
        self.request(command, response_rx).await
    }

    /// Stops the actor and waits for it to exit. After this returns, every
    /// command returns [`IdleTimerError::Stopped`] without blocking.
    ///
    /// # Panics
    /// Panics if called more than once, or if the actor has not exited within
    /// the configured grace period.
    ///
    /// 停止 actor 并等待其退出。只能调用一次。
    pub async fn stop(&self) {
        self.halter.stop_and_wait(self.stop_grace_period).await;
    }

    /// Whether [`stop`](Self::stop) has been requested.
    pub fn is_stopped(&self) -> bool {
        self.halter.is_stop_requested()
    }

    async fn request<T>(
        &self,
        command: IdleTimerCommand,
        response_rx: oneshot::Receiver<T>,
    ) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.halter.stop_requested() => return Err(IdleTimerError::Stopped),
            sent = self.command_tx.send(command) => {
                sent.map_err(|_| IdleTimerError::Stopped)?;
            }
        }

        tokio::select! {
            biased;
            _ = self.halter.stop_requested() => Err(IdleTimerError::Stopped),
            response = response_rx => response.map_err(|_| IdleTimerError::Stopped),
        }
    }
}

//! Idle Timer Actor - 空闲超时检测器
//!
//! 该模块实现拥有全部非原子定时器状态的单线程事件循环。所有状态转换都在
//! 循环内部逐个命令地完成，因此这些字段无需加锁。
//!
//! Idle Timer Actor - Idle Timeout Detector
//!
//! This module implements the single-threaded event loop that owns all
//! non-atomic timer state. Every transition happens inside the loop, one
//! command at a time, so none of these fields need a lock.

use crate::config::IdleTimerConfig;
use crate::timer::{
    clock::MonoClock,
    command::{IdleTimerCommand, SetTimeoutTicket, TimeoutCallback},
    halter::{DoneGuard, Halter},
};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::{
    sync::mpsc,
    time::{Instant, Interval, MissedTickBehavior, interval_at},
};
use tracing::{debug, error, trace};

/// Where the first check lands when `now + period` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// The last-activity timestamp, shared between the handles and the actor
/// without going through the command channel.
///
/// 最近活动时间戳，在句柄和 actor 之间共享，不经过命令通道。
#[derive(Debug)]
pub(crate) struct Activity {
    clock: MonoClock,
    last: AtomicU64,
}

impl Activity {
    pub(crate) fn new(clock: MonoClock) -> Self {
        Self {
            clock,
            last: AtomicU64::new(0),
        }
    }

    /// Stamps "now" as the last observed activity. Last write wins.
    /// 将“现在”记为最近一次活动。最后写入者胜出。
    #[inline]
    pub(crate) fn reset(&self) {
        self.last.store(self.clock.now(), Ordering::Release);
    }

    #[inline]
    pub(crate) fn nanos_since(&self) -> u64 {
        self.clock.nanos_since(self.last.load(Ordering::Acquire))
    }
}

/// Owner of the timer state machine.
///
/// - Disabled: `idle_dur` is zero, no heartbeat.
/// - Armed: `idle_dur > 0`, heartbeat running, `timed_out` false.
/// - Fired: `timed_out` true, heartbeat stopped until re-armed or disabled.
///
/// 定时器状态机的拥有者。
pub(crate) struct IdleTimerActor {
    idle_dur: Duration,
    timed_out: bool,
    callback: Option<TimeoutCallback>,
    heartbeat: Option<Interval>,
    activity: Arc<Activity>,
    halter: Arc<Halter>,
    config: IdleTimerConfig,
    command_rx: mpsc::Receiver<IdleTimerCommand>,
}

impl IdleTimerActor {
    pub(crate) fn new(
        callback: Option<TimeoutCallback>,
        activity: Arc<Activity>,
        halter: Arc<Halter>,
        config: IdleTimerConfig,
        command_rx: mpsc::Receiver<IdleTimerCommand>,
    ) -> Self {
        Self {
            idle_dur: Duration::ZERO,
            timed_out: false,
            callback,
            heartbeat: None,
            activity,
            halter,
            config,
            command_rx,
        }
    }

    /// Runs the loop until a stop is requested or every handle is gone.
    /// 运行循环，直到收到停止请求或所有句柄都被丢弃。
    pub(crate) async fn run(self, initial_dur: Duration) {
        let _done = DoneGuard::new(self.halter.clone());
        // The actor, heartbeat included, is gone by the time `_done` drops.
        self.run_loop(initial_dur).await;
    }

    async fn run_loop(mut self, initial_dur: Duration) {
        if !initial_dur.is_zero() {
            self.arm(initial_dur);
        }
        debug!(idle_dur = ?self.idle_dur, "idle timer actor started");

        loop {
            tokio::select! {
                biased;

                _ = self.halter.stop_requested() => break,

                command = self.command_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        debug!("all idle timer handles dropped");
                        break;
                    }
                },

                _ = next_heartbeat(&mut self.heartbeat) => self.on_heartbeat(),
            }
        }

        debug!("idle timer actor exited");
    }

    fn handle_command(&mut self, command: IdleTimerCommand) {
        trace!(?command, "idle timer command");
        match command {
            IdleTimerCommand::GetIdleTimeout { response_tx } => {
                let _ = response_tx.send(self.idle_dur);
            }
            IdleTimerCommand::SetIdleTimeout(ticket) => self.set_idle_timeout(ticket),
            IdleTimerCommand::SetCallback {
                callback,
                response_tx,
            } => {
                self.callback = Some(callback);
                let _ = response_tx.send(());
            }
            IdleTimerCommand::TimedOut { response_tx } => {
                let _ = response_tx.send(self.timed_out);
            }
        }
    }

    fn set_idle_timeout(&mut self, ticket: SetTimeoutTicket) {
        let new_dur = ticket.new_dur;
        if new_dur == self.idle_dur {
            // Neither the clock nor a raised flag is touched.
            ticket.complete();
            return;
        }

        if new_dur.is_zero() {
            self.heartbeat = None;
            self.idle_dur = Duration::ZERO;
            self.timed_out = false;
            debug!("idle timer disabled");
        } else {
            self.arm(new_dur);
        }
        ticket.complete();
    }

    /// Starts (or restarts) the periodic check and re-arms from now.
    /// 启动（或重启）周期性检查并从现在开始重新计时。
    fn arm(&mut self, idle_dur: Duration) {
        let period = self.config.check_interval(idle_dur);
        let now = Instant::now();
        let start = now
            .checked_add(period)
            .unwrap_or_else(|| now + FAR_FUTURE);
        let mut heartbeat = interval_at(start, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.idle_dur = idle_dur;
        self.timed_out = false;
        self.heartbeat = Some(heartbeat);
        self.activity.reset();
        debug!(?idle_dur, check_interval = ?period, "idle timer armed");
    }

    fn on_heartbeat(&mut self) {
        if self.idle_dur.is_zero() {
            invariant_violation("idle timer heartbeat observed while disabled");
        }

        let elapsed = self.activity.nanos_since();
        // Thresholds past u64::MAX ns can never be exceeded.
        let threshold = u64::try_from(self.idle_dur.as_nanos()).unwrap_or(u64::MAX);
        if elapsed <= threshold {
            return;
        }

        self.timed_out = true;
        // Fire once; stays quiet until re-armed.
        self.heartbeat = None;

        let Some(callback) = self.callback.clone() else {
            invariant_violation("idle timer fired but no timeout callback was ever set");
        };
        debug!(
            idle_dur = ?self.idle_dur,
            elapsed = ?Duration::from_nanos(elapsed),
            "idle timeout fired"
        );
        // The callback may call back into this timer, so never run it inline.
        tokio::spawn(async move { callback() });
    }
}

async fn next_heartbeat(heartbeat: &mut Option<Interval>) {
    match heartbeat {
        Some(heartbeat) => {
            heartbeat.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// A structurally broken caller or a corrupted state machine; there is no
/// sane way to continue.
fn invariant_violation(message: &str) -> ! {
    error!("{message}");
    std::process::abort()
}

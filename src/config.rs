//! 定义了空闲定时器的可配置参数。
//! Defines configurable parameters for the idle timer.

use std::time::Duration;

/// Tunables for an [`IdleTimer`](crate::timer::IdleTimer).
///
/// 空闲定时器的可调参数。
#[derive(Debug, Clone)]
pub struct IdleTimerConfig {
    /// The periodic staleness check runs every `idle_dur / check_divisor`.
    /// A divisor of 1 checks once per idle period, which may detect a stall
    /// up to almost two full periods after the last activity.
    ///
    /// 周期性过期检查每隔 `idle_dur / check_divisor` 运行一次。
    /// 除数为1时每个空闲周期只检查一次，检测延迟最多接近两个完整周期。
    pub check_divisor: u32,

    /// The lower bound on the check interval.
    /// 检查间隔的下限。
    pub min_check_interval: Duration,

    /// How long `stop()` waits for the actor loop to exit before treating it
    /// as a stuck task.
    ///
    /// `stop()` 在将 actor 循环视为卡死任务之前等待其退出的时间。
    pub stop_grace_period: Duration,

    /// The capacity of the actor's command channel.
    /// actor 命令通道的容量。
    pub command_buffer_size: usize,
}

impl IdleTimerConfig {
    /// Returns the effective check interval for an idle threshold.
    /// 返回给定空闲阈值的实际检查间隔。
    pub fn check_interval(&self, idle_dur: Duration) -> Duration {
        let divisor = self.check_divisor.max(1);
        (idle_dur / divisor).max(self.min_check_interval)
    }
}

impl Default for IdleTimerConfig {
    fn default() -> Self {
        Self {
            check_divisor: 10,
            min_check_interval: Duration::from_millis(1),
            stop_grace_period: Duration::from_secs(10),
            command_buffer_size: 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_interval_divides_threshold() {
        let config = IdleTimerConfig::default();
        assert_eq!(
            config.check_interval(Duration::from_millis(50)),
            Duration::from_millis(5)
        );
    }

    #[test]
    fn test_check_interval_is_clamped() {
        let config = IdleTimerConfig::default();
        assert_eq!(
            config.check_interval(Duration::from_micros(100)),
            Duration::from_millis(1)
        );

        let coarse = IdleTimerConfig {
            check_divisor: 0,
            ..Default::default()
        };
        assert_eq!(
            coarse.check_interval(Duration::from_millis(50)),
            Duration::from_millis(50)
        );
    }
}

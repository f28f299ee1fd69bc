//! 单调时钟
//! Monotonic clock
//!
//! 提供一个只用于计算相对时间差的纳秒计数器，不受系统时钟调整影响。
//!
//! Supplies a nanosecond counter used only for relative elapsed-time
//! arithmetic, immune to wall-clock adjustments.

use tokio::time::Instant;

/// A monotonic nanosecond counter anchored at an arbitrary fixed epoch.
///
/// Backed by `tokio::time::Instant`, so it follows the runtime's clock
/// (including a paused test clock). Absolute readings are meaningless
/// outside the owning timer.
///
/// 以任意固定纪元为起点的单调纳秒计数器。
#[derive(Debug, Clone, Copy)]
pub struct MonoClock {
    epoch: Instant,
}

impl MonoClock {
    /// Creates a clock whose epoch is "now".
    /// 创建一个以“现在”为纪元的时钟。
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Nanoseconds elapsed since the epoch. Never decreases.
    /// 自纪元以来经过的纳秒数，永不递减。
    #[inline]
    pub fn now(&self) -> u64 {
        // u64 nanoseconds cover ~584 years.
        self.epoch.elapsed().as_nanos() as u64
    }

    /// Nanoseconds elapsed since an earlier reading of [`now`](Self::now).
    /// 自先前某次 [`now`](Self::now) 读数以来经过的纳秒数。
    #[inline]
    pub fn nanos_since(&self, stamp: u64) -> u64 {
        self.now().saturating_sub(stamp)
    }
}

impl Default for MonoClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_clock_follows_runtime_time() {
        let clock = MonoClock::new();
        let start = clock.now();
        tokio::time::advance(Duration::from_millis(25)).await;
        assert_eq!(clock.nanos_since(start), 25_000_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_is_monotonic() {
        let clock = MonoClock::new();
        let mut prev = clock.now();
        for _ in 0..10 {
            tokio::time::advance(Duration::from_micros(7)).await;
            let next = clock.now();
            assert!(next >= prev);
            prev = next;
        }
        // A stamp from the future saturates instead of wrapping.
        assert_eq!(clock.nanos_since(prev + 1_000), 0);
    }
}

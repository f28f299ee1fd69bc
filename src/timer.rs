//! 空闲超时检测模块
//! Idle Timeout Detection Module
//!
//! 该模块实现了一个长期运行的后台 actor，它监视 SSH 通道的I/O活动，
//! 并在活动停滞超过可配置的时长后通知注册的处理函数。时长可以在任意
//! 调用线程上并发地修改、禁用和重新布防。
//!
//! This module implements a long-lived background actor that watches an SSH
//! channel's I/O activity and notifies a registered handler once activity has
//! stalled for a configurable duration. The duration may be changed, disabled
//! and re-armed concurrently from any caller.

pub mod clock;
pub mod command;
pub mod halter;
pub mod handle;

mod actor;


pub use clock::MonoClock;
pub use command::TimeoutCallback;
pub use halter::{Halter, Signal};
pub use handle::IdleTimer;

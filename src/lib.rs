#![deny(clippy::expect_used, clippy::unwrap_used)]

//! Idle-timeout detection and key-material utilities for SSH tunnels.
//! SSH 隧道的空闲超时检测与密钥材料工具。

pub mod config;
pub mod error;
pub mod keys;
pub mod stream;
pub mod timer;

mod testing;

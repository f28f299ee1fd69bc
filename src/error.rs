//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned by the idle timer command API.
/// 空闲定时器命令接口返回的错误。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IdleTimerError {
    /// The timer has been stopped (or is stopping); the command had no effect.
    /// 定时器已停止（或正在停止）；命令没有产生任何效果。
    #[error("Idle timer has been stopped")]
    Stopped,
}

/// Errors produced while generating, serializing or loading key material.
/// 生成、序列化或加载密钥材料时产生的错误。
#[derive(Debug, Error)]
pub enum KeyError {
    /// An underlying I/O error occurred.
    /// 发生了底层的I/O错误。
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Reading a key file failed.
    /// 读取密钥文件失败。
    #[error("failed to read key file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The key material could not be encoded or decoded.
    /// 密钥材料无法编码或解码。
    #[error("SSH key error: {0}")]
    Ssh(#[from] ssh_key::Error),

    /// The requested modulus is smaller than the accepted minimum.
    /// 请求的模数小于允许的最小值。
    #[error("RSA key size {bits} is below the minimum of {min} bits")]
    KeyTooSmall { bits: usize, min: usize },

    /// The parsed key is not an RSA key.
    /// 解析出的密钥不是RSA密钥。
    #[error("expected an RSA key, found {0}")]
    NotRsa(String),

    /// The input contained no authorized-key line.
    /// 输入中没有 authorized_keys 行。
    #[error("no public key found in input")]
    NoPublicKey,
}

/// A specialized `Result` type for the idle timer.
/// 空闲定时器专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, IdleTimerError>;

impl From<IdleTimerError> for std::io::Error {
    fn from(err: IdleTimerError) -> Self {
        use std::io::ErrorKind;
        match err {
            IdleTimerError::Stopped => ErrorKind::BrokenPipe.into(),
        }
    }
}

//! 带空闲检测的流包装器
//! Idle-tracking stream wrapper
//!
//! `IdleStream` 包装任意 `AsyncRead + AsyncWrite`，每次成功的非空读写都会
//! 重置其空闲定时器，因此长时间但仍在推进的传输不会被误判为停滞。
//!
//! `IdleStream` wraps any `AsyncRead + AsyncWrite` and resets its idle timer
//! on every successful, non-empty read or write, so a long transfer that keeps
//! making progress is never mistaken for a stall.

use crate::timer::IdleTimer;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, ReadBuf};

/// A stream whose I/O activity feeds an [`IdleTimer`].
///
/// The stream owns the timer's lifetime: [`close`](Self::close) stops it.
///
/// 其I/O活动驱动 [`IdleTimer`] 的流。
#[derive(Debug)]
pub struct IdleStream<S> {
    inner: S,
    timer: IdleTimer,
}

impl<S> IdleStream<S> {
    /// Wraps `inner`. The timer's clock is restarted now.
    pub fn new(inner: S, timer: IdleTimer) -> Self {
        timer.reset();
        Self { inner, timer }
    }

    /// The timer fed by this stream.
    pub fn timer(&self) -> &IdleTimer {
        &self.timer
    }

    /// Sets the idle threshold of the underlying timer; zero disables it.
    /// A stopped timer surfaces as [`io::ErrorKind::BrokenPipe`].
    ///
    /// 设置底层定时器的空闲阈值；零表示禁用。定时器已停止时返回
    /// [`io::ErrorKind::BrokenPipe`]。
    pub async fn set_idle_timeout(&self, dur: Duration) -> io::Result<()> {
        self.timer.set_idle_timeout(dur).await?;
        Ok(())
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Unwraps the stream. The timer keeps running; the caller becomes
    /// responsible for stopping it.
    pub fn into_inner(self) -> (S, IdleTimer) {
        (self.inner, self.timer)
    }
}

impl<S: AsyncWrite + Unpin> IdleStream<S> {
    /// Shuts down the write side and stops the timer.
    ///
    /// 关闭写端并停止定时器。
    pub async fn close(mut self) -> io::Result<()> {
        let shutdown = self.inner.shutdown().await;
        self.timer.stop().await;
        shutdown
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for IdleStream<S> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        let this = &mut *self;
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if matches!(poll, Poll::Ready(Ok(()))) && buf.filled().len() > before {
            this.timer.reset();
        }
        poll
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for IdleStream<S> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = &mut *self;
        let poll = Pin::new(&mut this.inner).poll_write(cx, buf);
        if matches!(poll, Poll::Ready(Ok(n)) if n > 0) {
            this.timer.reset();
        }
        poll
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, duplex};

    #[tokio::test(start_paused = true)]
    async fn test_reads_and_writes_reset_timer() {
        let (client, mut server) = duplex(64);
        let timer = IdleTimer::new(None, Duration::ZERO);
        let mut stream = IdleStream::new(client, timer);

        tokio::time::advance(Duration::from_millis(30)).await;
        assert_eq!(stream.timer().nanos_since(), 30_000_000);

        stream.write_all(b"ping").await.unwrap();
        assert_eq!(stream.timer().nanos_since(), 0);

        tokio::time::advance(Duration::from_millis(30)).await;
        server.write_all(b"pong").await.unwrap();
        let mut buf = [0u8; 4];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"pong");
        assert_eq!(stream.timer().nanos_since(), 0);

        let mut echoed = [0u8; 4];
        server.read_exact(&mut echoed).await.unwrap();
        assert_eq!(&echoed, b"ping");

        stream.close().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_eof_does_not_count_as_activity() {
        let (client, server) = duplex(64);
        let timer = IdleTimer::new(None, Duration::ZERO);
        let mut stream = IdleStream::new(client, timer);
        drop(server);

        tokio::time::advance(Duration::from_millis(10)).await;
        let mut buf = Vec::new();
        assert_eq!(stream.read_to_end(&mut buf).await.unwrap(), 0);
        assert_eq!(stream.timer().nanos_since(), 10_000_000);

        let (_, timer) = stream.into_inner();
        timer.stop().await;
    }

    #[tokio::test]
    async fn test_set_idle_timeout_on_stopped_timer_is_broken_pipe() {
        let (client, _server) = duplex(64);
        let stream = IdleStream::new(client, IdleTimer::new(None, Duration::ZERO));
        stream.timer().stop().await;

        let err = stream
            .set_idle_timeout(Duration::from_millis(50))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);

        // The timer is already stopped, so skip `close()`.
        let _ = stream.into_inner();
    }
}

//! tests/common/harness.rs
use std::sync::Once;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream, duplex};
use tokio::sync::mpsc;
use tunnel_idle::{stream::IdleStream, timer::IdleTimer};

/// Initializes tracing for tests, ensuring it's only done once.
pub fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        let filter =
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tunnel_idle=debug".to_string());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// A client stream wired to an in-memory echo peer, with its idle timer
/// reporting timeouts on a channel.
pub struct TunnelHarness {
    pub client: IdleStream<DuplexStream>,
    pub timeouts: mpsc::UnboundedReceiver<()>,
}

impl TunnelHarness {
    pub async fn new(idle: Duration) -> Self {
        init_tracing();
        let (client, server) = duplex(1024);
        tokio::spawn(echo(server));

        let (timeout_tx, timeouts) = mpsc::unbounded_channel();
        let timer = IdleTimer::new(None, Duration::ZERO);
        timer
            .set_timeout_callback(move || {
                let _ = timeout_tx.send(());
            })
            .await
            .unwrap();

        let client = IdleStream::new(client, timer);
        client.set_idle_timeout(idle).await.unwrap();
        Self { client, timeouts }
    }

    /// Sends `payload` and waits for it to come back.
    pub async fn round_trip(&mut self, payload: &[u8]) {
        self.client.write_all(payload).await.unwrap();
        let mut echoed = vec![0u8; payload.len()];
        self.client.read_exact(&mut echoed).await.unwrap();
        assert_eq!(echoed, payload);
    }
}

async fn echo(mut server: DuplexStream) {
    let mut buf = [0u8; 256];
    loop {
        match server.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if server.write_all(&buf[..n]).await.is_err() {
                    break;
                }
            }
        }
    }
}

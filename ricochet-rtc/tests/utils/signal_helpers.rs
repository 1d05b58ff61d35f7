use anyhow::{Context, Result};
use ricochet_rtc::{NegotiationState, SignalingChannel, SignalingEndpoint};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::DuplexStream;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::timeout;

/// Timeout for signal exchange operations (ms).
pub const SIGNAL_TIMEOUT_MS: u64 = 5000;

/// Timeout for connection establishment (ms).
pub const CONNECTION_TIMEOUT_MS: u64 = 15000;

/// Timeout for data to cross an established connection (ms).
pub const DELIVERY_TIMEOUT_MS: u64 = 10000;

/// Two in-memory signaling channels wired to each other.
pub fn duplex_channels() -> (SignalingChannel<DuplexStream>, SignalingChannel<DuplexStream>) {
    let (a, b) = tokio::io::duplex(64 * 1024);
    (
        SignalingChannel::from_stream(a),
        SignalingChannel::from_stream(b),
    )
}

/// A loopback address nothing is listening on right now.
pub async fn free_addr() -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    Ok(listener.local_addr()?)
}

/// Connect a listening and a dialing channel on `addr`.
pub async fn tcp_channels(
    addr: SocketAddr,
) -> Result<(SignalingChannel<TcpStream>, SignalingChannel<TcpStream>)> {
    let listener = tokio::spawn(async move {
        let mut channel = SignalingChannel::new(SignalingEndpoint::listen(addr));
        channel.connect().await.map(|_| channel)
    });

    let mut dialer = SignalingChannel::new(SignalingEndpoint::dial(addr));
    let mut attempts = 0;
    while let Err(e) = dialer.connect().await {
        attempts += 1;
        if attempts >= 50 {
            return Err(e).context("Listener never came up");
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let listener = listener.await?.context("Listen side failed")?;
    Ok((listener, dialer))
}

/// Wait until the negotiation reports `want`.
pub async fn wait_for_state(
    rx: &mut watch::Receiver<NegotiationState>,
    want: NegotiationState,
    timeout_ms: u64,
) -> Result<()> {
    timeout(Duration::from_millis(timeout_ms), rx.wait_for(|s| *s == want))
        .await
        .with_context(|| format!("Timeout waiting for {want}"))?
        .context("Negotiator dropped")?;
    Ok(())
}

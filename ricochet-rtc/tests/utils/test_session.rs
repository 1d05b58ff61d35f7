use anyhow::{Context, Result};
use ricochet_rtc::{NegotiationState, Negotiator, PeerSession};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;

use super::signal_helpers::{SIGNAL_TIMEOUT_MS, free_addr, tcp_channels, wait_for_state};

/// Negotiators of a connected pair, running until `cancel` fires.
pub struct NegotiatedPair {
    pub cancel: CancellationToken,
    pub offerer: JoinHandle<()>,
    pub answerer: JoinHandle<()>,
}

impl NegotiatedPair {
    pub async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.offerer.await;
        let _ = self.answerer.await;
    }
}

/// Run offer/answer between two real sessions over loopback TCP signaling.
/// Returns once both sides are `Stable`.
pub async fn negotiate(offer: Arc<PeerSession>, answer: Arc<PeerSession>) -> Result<NegotiatedPair> {
    let addr = free_addr().await?;
    let (listen, dial) = tcp_channels(addr).await?;

    let mut offerer = Negotiator::new("test-offer", offer, listen);
    let answerer = Negotiator::new("test-answer", answer, dial);
    let mut offer_state = offerer.subscribe();
    let mut answer_state = answerer.subscribe();

    offerer.offer().await.context("Failed to send offer")?;

    let cancel = CancellationToken::new();
    let offerer = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if let Err(e) = offerer.run(cancel).await {
                tracing::warn!("[test-offer] {}", e);
            }
        }
    });
    let answerer = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if let Err(e) = answerer.run(cancel).await {
                tracing::warn!("[test-answer] {}", e);
            }
        }
    });

    wait_for_state(&mut offer_state, NegotiationState::Stable, SIGNAL_TIMEOUT_MS).await?;
    wait_for_state(&mut answer_state, NegotiationState::Stable, SIGNAL_TIMEOUT_MS).await?;

    Ok(NegotiatedPair {
        cancel,
        offerer,
        answerer,
    })
}

pub async fn wait_for_connected(
    state: &mut watch::Receiver<RTCPeerConnectionState>,
    timeout_ms: u64,
) -> Result<()> {
    timeout(
        Duration::from_millis(timeout_ms),
        state.wait_for(|s| *s == RTCPeerConnectionState::Connected),
    )
    .await
    .context("Timeout waiting for peer connection")?
    .context("Peer session dropped")?;
    Ok(())
}

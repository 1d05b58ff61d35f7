use crate::signaling::channel::{SignalingChannel, SignalingError};
use crate::transport::PeerTransport;
use ricochet_core::{IceCandidate, SessionDescription, SignalMessage};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    /// Offerer only: our offer is out and we wait for the answer.
    LocalOfferSet,
    RemoteDescriptionSet,
    /// Answerer only: answer applied locally, about to be sent.
    LocalAnswerSet,
    Stable,
}

impl fmt::Display for NegotiationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error(transparent)]
    Signaling(#[from] SignalingError),

    #[error(transparent)]
    Peer(#[from] anyhow::Error),

    #[error("an offer is already waiting for its answer")]
    OfferOutstanding,
}

/// Drives offer/answer and candidate exchange for one peer connection over one
/// signaling channel.
///
/// The negotiator is the only code that touches the connection's descriptions
/// and remote candidates. It keeps listening after `Stable` for as long as the
/// channel stays open.
pub struct Negotiator<P, T = TcpStream> {
    name: String,
    peer: Arc<P>,
    channel: SignalingChannel<T>,
    state_tx: watch::Sender<NegotiationState>,
    has_remote: bool,
    pending: Vec<IceCandidate>,
    known: HashSet<IceCandidate>,
    local_candidates: Option<mpsc::UnboundedReceiver<IceCandidate>>,
}

impl<P, T> Negotiator<P, T>
where
    P: PeerTransport,
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// `channel` must already be connected.
    pub fn new(name: impl Into<String>, peer: Arc<P>, channel: SignalingChannel<T>) -> Self {
        let (state_tx, _) = watch::channel(NegotiationState::Idle);
        Self {
            name: name.into(),
            peer,
            channel,
            state_tx,
            has_remote: false,
            pending: Vec::new(),
            known: HashSet::new(),
            local_candidates: None,
        }
    }

    /// Relay locally gathered candidates to the remote side (trickle ICE).
    pub fn with_local_candidates(mut self, rx: mpsc::UnboundedReceiver<IceCandidate>) -> Self {
        self.local_candidates = Some(rx);
        self
    }

    pub fn state(&self) -> NegotiationState {
        *self.state_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<NegotiationState> {
        self.state_tx.subscribe()
    }

    /// Create and send our offer. Offerer only; call before [`Negotiator::run`].
    pub async fn offer(&mut self) -> Result<(), NegotiationError> {
        match self.state() {
            NegotiationState::Idle => {}
            NegotiationState::LocalOfferSet => return Err(NegotiationError::OfferOutstanding),
            other => {
                warn!("[{}] Ignoring offer request in state {}", self.name, other);
                return Ok(());
            }
        }

        let offer = self.peer.create_local_offer().await?;
        self.set_state(NegotiationState::LocalOfferSet);
        self.channel.send(&offer.into()).await?;
        info!("[{}] Offer sent", self.name);
        Ok(())
    }

    /// Serve the channel until it closes, fails or `cancel` fires. The channel
    /// is closed on the way out.
    pub async fn run(mut self, cancel: CancellationToken) -> Result<(), NegotiationError> {
        debug!("[{}] Negotiation loop started", self.name);
        let result = self.serve(&cancel).await;
        self.channel.close().await;

        match &result {
            Ok(()) => info!("[{}] Negotiation loop finished", self.name),
            Err(e) => warn!("[{}] Negotiation loop failed: {}", self.name, e),
        }
        result
    }

    async fn serve(&mut self, cancel: &CancellationToken) -> Result<(), NegotiationError> {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),

                msg = self.channel.receive() => match msg? {
                    Some(msg) => self.handle_message(msg).await?,
                    None => {
                        info!("[{}] Signaling channel closed by peer", self.name);
                        return Ok(());
                    }
                },

                candidate = next_local_candidate(&mut self.local_candidates) => match candidate {
                    Some(candidate) => self.channel.send(&candidate.into()).await?,
                    None => self.local_candidates = None,
                },
            }
        }
    }

    /// Apply one incoming message.
    pub async fn handle_message(&mut self, msg: SignalMessage) -> Result<(), NegotiationError> {
        match msg {
            SignalMessage::Description(desc) => self.handle_description(desc).await,
            SignalMessage::Candidate(candidate) => {
                self.handle_candidate(candidate).await;
                Ok(())
            }
        }
    }

    async fn handle_description(&mut self, desc: SessionDescription) -> Result<(), NegotiationError> {
        let state = self.state();

        if desc.is_offer() {
            if state != NegotiationState::Idle {
                warn!(
                    "[{}] Ignoring offer received in state {} (renegotiation unsupported)",
                    self.name, state
                );
                return Ok(());
            }

            self.peer.set_remote_description(desc).await?;
            self.remote_set().await;

            let answer = self.peer.create_local_answer().await?;
            self.set_state(NegotiationState::LocalAnswerSet);
            self.channel.send(&answer.into()).await?;
            info!("[{}] Answer sent", self.name);
            self.set_state(NegotiationState::Stable);
        } else {
            if state != NegotiationState::LocalOfferSet {
                warn!(
                    "[{}] Ignoring answer received in state {} (no offer outstanding)",
                    self.name, state
                );
                return Ok(());
            }

            self.peer.set_remote_description(desc).await?;
            self.remote_set().await;
            info!("[{}] Answer applied", self.name);
            self.set_state(NegotiationState::Stable);
        }

        Ok(())
    }

    async fn handle_candidate(&mut self, candidate: IceCandidate) {
        if !self.known.insert(candidate.clone()) {
            debug!("[{}] Duplicate ICE candidate ignored", self.name);
            return;
        }

        if !self.has_remote {
            debug!("[{}] Buffering ICE candidate until remote description", self.name);
            self.pending.push(candidate);
            return;
        }

        self.apply_candidate(candidate).await;
    }

    async fn remote_set(&mut self) {
        self.has_remote = true;
        self.set_state(NegotiationState::RemoteDescriptionSet);

        let pending = std::mem::take(&mut self.pending);
        if !pending.is_empty() {
            debug!("[{}] Applying {} buffered ICE candidates", self.name, pending.len());
        }
        for candidate in pending {
            self.apply_candidate(candidate).await;
        }
    }

    async fn apply_candidate(&self, candidate: IceCandidate) {
        if let Err(e) = self.peer.add_ice_candidate(candidate).await {
            warn!("[{}] Failed to add ICE candidate: {:?}", self.name, e);
        }
    }

    fn set_state(&self, state: NegotiationState) {
        debug!("[{}] Negotiation state -> {}", self.name, state);
        self.state_tx.send_replace(state);
    }
}

async fn next_local_candidate(
    rx: &mut Option<mpsc::UnboundedReceiver<IceCandidate>>,
) -> Option<IceCandidate> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

use anyhow::Result;
use async_trait::async_trait;
use ricochet_core::{IceCandidate, SessionDescription};

/// The part of a peer connection the negotiator drives.
#[async_trait]
pub trait PeerTransport: Send + Sync + 'static {
    /// Create an offer, apply it as the local description and return what should be sent.
    async fn create_local_offer(&self) -> Result<SessionDescription>;

    /// Create an answer to the current remote offer and apply it locally.
    async fn create_local_answer(&self) -> Result<SessionDescription>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;
}

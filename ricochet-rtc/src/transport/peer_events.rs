use bytes::Bytes;
use ricochet_core::IceCandidate;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use webrtc::data_channel::RTCDataChannel;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::track::track_remote::TrackRemote;

/// Everything a peer session reports back, one stream per kind of event.
pub struct PeerEvents {
    /// Locally gathered candidates; only fed when trickle ICE is enabled.
    pub local_candidates: mpsc::UnboundedReceiver<IceCandidate>,
    /// Data channels created by the remote peer.
    pub data_channels: mpsc::UnboundedReceiver<AnnouncedChannel>,
    /// Media tracks sent by the remote peer.
    pub tracks: mpsc::UnboundedReceiver<Arc<TrackRemote>>,
    pub state: watch::Receiver<RTCPeerConnectionState>,
}

/// A data channel opened by the remote side together with everything it
/// receives, in arrival order. The message stream is hooked up before the
/// channel is announced, so nothing sent on it can be missed.
pub struct AnnouncedChannel {
    pub channel: Arc<RTCDataChannel>,
    pub messages: mpsc::UnboundedReceiver<Bytes>,
}

use crate::transport::peer_events::{AnnouncedChannel, PeerEvents};
use crate::transport::peer_transport::PeerTransport;
use crate::transport::transport_config::TransportConfig;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use ricochet_core::{IceCandidate, SdpType, SessionDescription};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::data_channel::RTCDataChannel;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_remote::TrackRemote;

/// One side of one WebRTC peer connection.
pub struct PeerSession {
    pub name: String,
    peer_connection: Arc<RTCPeerConnection>,
    trickle_ice: bool,
}

impl PeerSession {
    /// Build the peer connection and wire its callbacks into [`PeerEvents`].
    pub async fn new(name: impl Into<String>, config: TransportConfig) -> Result<(Self, PeerEvents)> {
        let name = name.into();

        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let ice_servers = if config.ice_servers.is_empty() {
            vec![]
        } else {
            vec![RTCIceServer {
                urls: config.ice_servers,
                ..Default::default()
            }]
        };
        let rtc_config = RTCConfiguration {
            ice_servers,
            ..Default::default()
        };

        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        let (state_tx, state_rx) = watch::channel(RTCPeerConnectionState::New);
        let (candidate_tx, candidate_rx) = mpsc::unbounded_channel();
        let (dc_tx, dc_rx) = mpsc::unbounded_channel();
        let (track_tx, track_rx) = mpsc::unbounded_channel();

        let name_state = name.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                info!("[{}] Peer connection state: {}", name_state, s);
                let _ = state_tx.send(s);
                Box::pin(async {})
            },
        ));

        if config.trickle_ice {
            peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
                let tx = candidate_tx.clone();
                Box::pin(async move {
                    let Some(candidate) = c else { return };
                    let Ok(init) = candidate.to_json() else {
                        return;
                    };
                    let _ = tx.send(from_candidate_init(init));
                })
            }));
        }

        let name_dc = name.clone();
        peer_connection.on_data_channel(Box::new(move |dc: Arc<RTCDataChannel>| {
            debug!("[{}] Remote announced data channel '{}'", name_dc, dc.label());

            let (msg_tx, msg_rx) = mpsc::unbounded_channel();
            dc.on_message(Box::new(move |msg: DataChannelMessage| {
                let _ = msg_tx.send(msg.data);
                Box::pin(async {})
            }));

            let _ = dc_tx.send(AnnouncedChannel {
                channel: dc,
                messages: msg_rx,
            });
            Box::pin(async {})
        }));

        let name_track = name.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                debug!(
                    "[{}] Remote track announced ({})",
                    name_track,
                    track.codec().capability.mime_type
                );
                let _ = track_tx.send(track);
                Box::pin(async {})
            },
        ));

        let session = Self {
            name,
            peer_connection,
            trickle_ice: config.trickle_ice,
        };
        let events = PeerEvents {
            local_candidates: candidate_rx,
            data_channels: dc_rx,
            tracks: track_rx,
            state: state_rx,
        };

        Ok((session, events))
    }

    /// Attach an outbound track. Must happen before the offer is created.
    pub async fn add_track(
        &self,
        track: Arc<dyn TrackLocal + Send + Sync>,
    ) -> Result<Arc<RTCRtpSender>> {
        let sender = self
            .peer_connection
            .add_track(track)
            .await
            .context("Failed to add track")?;
        Ok(sender)
    }

    /// Create a reliable, ordered data channel. Must happen before the offer is created.
    pub async fn create_data_channel(&self, label: &str) -> Result<Arc<RTCDataChannel>> {
        let dc = self
            .peer_connection
            .create_data_channel(label, None)
            .await
            .with_context(|| format!("Failed to create data channel '{label}'"))?;
        info!("[{}] Data channel '{}' created", self.name, label);
        Ok(dc)
    }

    /// Close the peer connection. Safe to call more than once.
    pub async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }

    async fn apply_local(&self, desc: RTCSessionDescription) -> Result<SessionDescription> {
        let mut gathering_complete = self.peer_connection.gathering_complete_promise().await;

        self.peer_connection
            .set_local_description(desc)
            .await
            .context("Failed to set local description")?;

        if !self.trickle_ice {
            let _ = gathering_complete.recv().await;
        }

        let local = self
            .peer_connection
            .local_description()
            .await
            .context("Local description missing after it was set")?;
        to_session_description(local)
    }
}

#[async_trait]
impl PeerTransport for PeerSession {
    async fn create_local_offer(&self) -> Result<SessionDescription> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.apply_local(offer).await
    }

    async fn create_local_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.apply_local(answer).await
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        let desc = match desc.sdp_type {
            SdpType::Offer => RTCSessionDescription::offer(desc.sdp)?,
            SdpType::Answer => RTCSessionDescription::answer(desc.sdp)?,
        };
        self.peer_connection
            .set_remote_description(desc)
            .await
            .context("Failed to set remote description")?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            ..Default::default()
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .context("Failed to add ICE candidate")?;
        Ok(())
    }
}

fn to_session_description(desc: RTCSessionDescription) -> Result<SessionDescription> {
    match desc.sdp_type {
        RTCSdpType::Offer => Ok(SessionDescription::offer(desc.sdp)),
        RTCSdpType::Answer => Ok(SessionDescription::answer(desc.sdp)),
        other => bail!("Unsupported local description type {other}"),
    }
}

fn from_candidate_init(init: RTCIceCandidateInit) -> IceCandidate {
    IceCandidate {
        candidate: init.candidate,
        sdp_mid: init.sdp_mid,
        sdp_m_line_index: init.sdp_mline_index,
    }
}

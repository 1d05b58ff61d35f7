use crate::media::MediaConfig;
use crate::transport::PeerSession;
use anyhow::Result;
use ricochet_core::Frame;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use webrtc::api::media_engine::MIME_TYPE_VP8;
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

const TRACK_ID: &str = "ball";
const STREAM_ID: &str = "ricochet";
const VIDEO_CLOCK_RATE: u32 = 90_000;

/// Produces the next frame to send. Each call renders exactly one new frame.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Frame;
}

/// Outbound video track fed from a [`FrameSource`].
///
/// Frames travel as raw pixels behind a small header. The VP8 payloader only
/// splits them into RTP packets; nothing is actually VP8 encoded.
pub struct OutboundVideo {
    track: Arc<TrackLocalStaticSample>,
    frame_interval: Duration,
}

impl OutboundVideo {
    pub fn new(config: &MediaConfig) -> Self {
        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: VIDEO_CLOCK_RATE,
                ..Default::default()
            },
            TRACK_ID.to_owned(),
            STREAM_ID.to_owned(),
        ));

        Self {
            track,
            frame_interval: config.frame_interval(),
        }
    }

    /// Add the track to `session`. Must run before the offer is created so the
    /// offer advertises the video.
    pub async fn attach(&self, session: &PeerSession) -> Result<()> {
        let sender = session.add_track(self.track.clone()).await?;

        // RTCP has to be read for the interceptors to do their job.
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1500];
            while sender.read(&mut buf).await.is_ok() {}
        });

        info!("[{}] Video track attached", session.name);
        Ok(())
    }

    pub async fn write_frame(&self, frame: &Frame) -> Result<()> {
        self.track
            .write_sample(&Sample {
                data: frame.encode(),
                duration: self.frame_interval,
                ..Default::default()
            })
            .await?;
        Ok(())
    }

    /// Pull one frame per tick and send it until `cancel` fires. Returns the
    /// number of frames pulled.
    pub async fn pump<S: FrameSource>(&self, mut source: S, cancel: CancellationToken) -> u64 {
        let mut ticker = tokio::time::interval(self.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut pulled = 0u64;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let frame = source.next_frame();
                    pulled += 1;
                    if let Err(e) = self.write_frame(&frame).await {
                        warn!("Dropping frame {}: {:?}", pulled, e);
                    }
                }
            }
        }

        debug!("Frame pump stopped after {} frames", pulled);
        pulled
    }
}

use crate::media::MediaConfig;
use crate::media::assembler::FrameAssembler;
use anyhow::{Result, bail};
use ricochet_core::Frame;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_remote::TrackRemote;

/// Receiving end of the video track.
///
/// Decoded frames go into a bounded broadcast queue: when a consumer falls
/// behind, the oldest frames are dropped and the consumer is told how many.
pub struct InboundVideo {
    frames: broadcast::Sender<Frame>,
}

impl InboundVideo {
    pub fn new(config: &MediaConfig) -> Self {
        let (frames, _) = broadcast::channel(config.queue_depth.max(1));
        Self { frames }
    }

    /// A consumer handle. Only frames decoded after this call are seen.
    pub fn subscribe(&self) -> FrameReceiver {
        FrameReceiver {
            rx: self.frames.subscribe(),
            dropped: 0,
        }
    }

    /// Wait for the remote video track, then decode it until the track ends or
    /// `cancel` fires. Returns the number of frames decoded.
    pub async fn run(
        self,
        tracks: &mut mpsc::UnboundedReceiver<Arc<TrackRemote>>,
        cancel: CancellationToken,
    ) -> Result<u64> {
        let track = loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => return Ok(0),
                t = tracks.recv() => t,
            };
            match next {
                Some(t) if t.kind() == RTPCodecType::Video => break t,
                Some(_) => debug!("Ignoring non-video track"),
                None => bail!("Peer session ended before a video track arrived"),
            }
        };
        info!("Receiving video track");

        let mut assembler = FrameAssembler::default();
        let mut decoded = 0u64;

        loop {
            let read = tokio::select! {
                _ = cancel.cancelled() => break,
                r = track.read_rtp() => r,
            };
            let packet = match read {
                Ok((packet, _)) => packet,
                Err(e) => {
                    info!("Video track ended: {}", e);
                    break;
                }
            };

            match assembler.push(&packet) {
                Some(Ok(frame)) => {
                    decoded += 1;
                    // No subscriber means nobody wants the frame right now.
                    let _ = self.frames.send(frame);
                }
                Some(Err(e)) => warn!("Dropping undecodable frame: {}", e),
                None => {}
            }
        }

        debug!("Video receiver stopped after {} frames", decoded);
        Ok(decoded)
    }
}

/// Pull side of the frame queue, handing out frames in arrival order.
pub struct FrameReceiver {
    rx: broadcast::Receiver<Frame>,
    dropped: u64,
}

impl FrameReceiver {
    /// Block the current thread until a frame arrives. `None` once the video
    /// receiver is gone. Must not be called from async code.
    pub fn blocking_next(&mut self) -> Option<Frame> {
        loop {
            match self.rx.blocking_recv() {
                Ok(frame) => return Some(frame),
                Err(broadcast::error::RecvError::Lagged(n)) => self.note_dropped(n),
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub async fn next(&mut self) -> Option<Frame> {
        loop {
            match self.rx.recv().await {
                Ok(frame) => return Some(frame),
                Err(broadcast::error::RecvError::Lagged(n)) => self.note_dropped(n),
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Frames skipped so far because this consumer was too slow.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn note_dropped(&mut self, n: u64) {
        self.dropped += n;
        debug!("Frame consumer lagging, dropped {} oldest frames", n);
    }
}

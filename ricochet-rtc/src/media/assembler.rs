use bytes::{Bytes, BytesMut};
use ricochet_core::{Frame, FrameError};
use tracing::{debug, trace};
use webrtc::rtp::codecs::vp8::Vp8Packet;
use webrtc::rtp::packet::Packet;
use webrtc::rtp::packetizer::Depacketizer;

/// Rebuilds frames from VP8-payloaded RTP packets.
///
/// Packets of one frame share a timestamp, the last one carries the marker bit.
/// A frame with a hole in its sequence numbers, or one whose first packet went
/// missing, is thrown away.
#[derive(Default)]
pub(crate) struct FrameAssembler {
    depacketizer: Vp8Packet,
    timestamp: Option<u32>,
    next_seq: u16,
    buf: BytesMut,
    broken: bool,
}

impl FrameAssembler {
    /// Feed one packet. Returns a result once a frame is complete.
    pub(crate) fn push(&mut self, packet: &Packet) -> Option<Result<Frame, FrameError>> {
        let header = &packet.header;

        if self.timestamp != Some(header.timestamp) {
            if !self.buf.is_empty() {
                debug!("Discarding incomplete frame at ts {:?}", self.timestamp);
            }
            self.buf.clear();
            self.timestamp = Some(header.timestamp);
            self.broken = !self.depacketizer.is_partition_head(&packet.payload);
        } else if header.sequence_number != self.next_seq {
            trace!(
                "Sequence gap: expected {}, got {}",
                self.next_seq, header.sequence_number
            );
            self.broken = true;
        }
        self.next_seq = header.sequence_number.wrapping_add(1);

        if !self.broken {
            match self.depacketizer.depacketize(&packet.payload) {
                Ok(chunk) => self.buf.extend_from_slice(&chunk),
                Err(e) => {
                    debug!("Bad VP8 payload: {}", e);
                    self.broken = true;
                }
            }
        }

        if !header.marker {
            return None;
        }

        let complete = !self.broken;
        self.timestamp = None;
        self.broken = false;
        let data: Bytes = self.buf.split().freeze();

        complete.then(|| Frame::decode(data))
    }
}

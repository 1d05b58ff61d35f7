mod assembler;
mod inbound;
mod outbound;

pub use inbound::{FrameReceiver, InboundVideo};
pub use outbound::{FrameSource, OutboundVideo};

use std::time::Duration;

#[derive(Clone, Debug)]
pub struct MediaConfig {
    /// Frames pushed per second by the sending side.
    pub fps: u32,
    /// Decoded frames kept for a slow consumer before the oldest are dropped.
    pub queue_depth: usize,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            fps: 10,
            queue_depth: 2,
        }
    }
}

impl MediaConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }
}

use crate::data::CoordinatorConfig;
use crate::transport::AnnouncedChannel;
use anyhow::{Result, bail};
use ricochet_core::CoordinateEstimate;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Answering side of the coordinate channel: decodes every message on the
/// announced channel and forwards it, in arrival order, to a sink.
pub struct CoordinateReceiver {
    label: String,
}

impl CoordinateReceiver {
    pub fn new(config: &CoordinatorConfig) -> Self {
        Self {
            label: config.label.clone(),
        }
    }

    /// Wait for the remote side to announce our channel, then forward
    /// estimates until the channel goes away or `cancel` fires. Channels with
    /// other labels are ignored. Returns how many estimates were forwarded.
    pub async fn run(
        self,
        announced: &mut mpsc::UnboundedReceiver<AnnouncedChannel>,
        sink: mpsc::UnboundedSender<CoordinateEstimate>,
        cancel: CancellationToken,
    ) -> Result<u64> {
        let mut messages = loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => return Ok(0),
                a = announced.recv() => a,
            };
            match next {
                Some(a) if a.channel.label() == self.label => break a.messages,
                Some(a) => warn!("Ignoring unexpected data channel '{}'", a.channel.label()),
                None => bail!("Peer session ended before '{}' was announced", self.label),
            }
        };
        info!("Receiving estimates on '{}'", self.label);

        let mut forwarded = 0u64;
        loop {
            let data = tokio::select! {
                _ = cancel.cancelled() => break,
                m = messages.recv() => match m {
                    Some(m) => m,
                    None => break,
                },
            };

            let estimate = match CoordinateEstimate::from_bytes(&data) {
                Ok(e) => e,
                Err(e) => {
                    warn!("Skipping malformed estimate ({} bytes): {}", data.len(), e);
                    continue;
                }
            };

            if sink.send(estimate).is_err() {
                debug!("Estimate sink gone, stopping");
                break;
            }
            forwarded += 1;
        }

        info!("Coordinate receiver stopped after {} estimates", forwarded);
        Ok(forwarded)
    }
}

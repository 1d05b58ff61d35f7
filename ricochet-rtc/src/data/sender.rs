use crate::data::CoordinatorConfig;
use crate::transport::PeerSession;
use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use ricochet_core::CoordinateEstimate;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use webrtc::data_channel::RTCDataChannel;

/// Offering side of the coordinate channel: drains a queue of estimates onto
/// the data channel, one message per estimate, in queue order.
pub struct CoordinateSender {
    channel: Arc<RTCDataChannel>,
    opened: Arc<Notify>,
    send_interval: Duration,
}

impl CoordinateSender {
    /// Create the data channel on `session`. Must run before the offer is
    /// created so the offer carries the SCTP section.
    pub async fn create(session: &PeerSession, config: &CoordinatorConfig) -> Result<Self> {
        let channel = session.create_data_channel(&config.label).await?;
        let opened = Arc::new(Notify::new());

        let notify = opened.clone();
        let label = config.label.clone();
        channel.on_open(Box::new(move || {
            info!("Data channel '{}' open", label);
            notify.notify_one();
            Box::pin(async {})
        }));

        let label = config.label.clone();
        channel.on_close(Box::new(move || {
            info!("Data channel '{}' closed", label);
            Box::pin(async {})
        }));

        Ok(Self {
            channel,
            opened,
            send_interval: config.send_interval,
        })
    }

    /// Wait for the channel to open, then send every estimate taken from
    /// `queue` until the queue closes or `cancel` fires. Returns how many
    /// estimates went out.
    pub async fn run(
        self,
        mut queue: mpsc::UnboundedReceiver<CoordinateEstimate>,
        cancel: CancellationToken,
    ) -> Result<u64> {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(0),
            _ = self.opened.notified() => {}
        }

        let mut sent = 0u64;
        loop {
            let estimate = tokio::select! {
                _ = cancel.cancelled() => break,
                e = queue.recv() => match e {
                    Some(e) => e,
                    None => {
                        debug!("Estimate queue closed");
                        break;
                    }
                },
            };

            let payload = estimate
                .to_bytes()
                .map_err(|e| anyhow!("Failed to encode {:?}: {}", estimate, e))?;
            self.channel
                .send(&Bytes::from(payload))
                .await
                .context("Failed to send coordinate estimate")?;
            sent += 1;
            debug!("Sent estimate ({}, {})", estimate.x, estimate.y);

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.send_interval) => {}
            }
        }

        info!("Coordinate sender stopped after {} estimates", sent);
        Ok(sent)
    }
}

use anyhow::{Context, Result};
use ricochet::rtc::{SignalingChannel, SignalingEndpoint};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How often to try a signaling connect before giving up.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const ONCE: RetryPolicy = RetryPolicy {
        attempts: 1,
        delay: Duration::ZERO,
    };
}

/// Connect a signaling channel, retrying per `retry`. `Ok(None)` when `cancel`
/// fires first.
pub async fn open_channel(
    endpoint: SignalingEndpoint,
    retry: RetryPolicy,
    cancel: &CancellationToken,
) -> Result<Option<SignalingChannel>> {
    let mut channel = SignalingChannel::new(endpoint);
    let attempts = retry.attempts.max(1);

    let mut attempt = 0;
    loop {
        attempt += 1;
        let result = tokio::select! {
            _ = cancel.cancelled() => return Ok(interrupted(endpoint)),
            r = channel.connect() => r,
        };

        match result {
            Ok(()) => return Ok(Some(channel)),
            Err(e) if attempt < attempts => {
                warn!("Signaling attempt {}/{} failed: {}", attempt, attempts, e);
                tokio::select! {
                    _ = cancel.cancelled() => return Ok(interrupted(endpoint)),
                    _ = tokio::time::sleep(retry.delay) => {}
                }
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Giving up after {attempts} attempts"));
            }
        }
    }
}

fn interrupted(endpoint: SignalingEndpoint) -> Option<SignalingChannel> {
    info!("Interrupted while connecting ({})", endpoint);
    None
}

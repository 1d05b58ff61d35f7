use anyhow::{Context, Result, anyhow, bail};
use ricochet::model::IceCandidate;
use ricochet::rtc::{Negotiator, PeerSession, SignalingChannel};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// Spawn `fut`; if it fails, everything sharing `cancel` is shut down too.
pub fn spawn_supervised<T, F>(
    name: &'static str,
    cancel: CancellationToken,
    fut: F,
) -> JoinHandle<Result<T>>
where
    T: Send + 'static,
    F: Future<Output = Result<T>> + Send + 'static,
{
    tokio::spawn(async move {
        let result = fut.await;
        if let Err(e) = &result {
            error!("{} failed: {:#}", name, e);
            cancel.cancel();
        }
        result
    })
}

pub async fn join<T>(name: &str, handle: JoinHandle<Result<T>>) -> Result<T> {
    handle.await.with_context(|| format!("{name} panicked"))?
}

/// Wait for a worker thread without blocking the runtime.
pub async fn join_thread<T: Send + 'static>(
    name: &str,
    handle: std::thread::JoinHandle<T>,
) -> Result<T> {
    tokio::task::spawn_blocking(move || handle.join())
        .await?
        .map_err(|_| anyhow!("{name} worker panicked"))
}

pub fn negotiator(
    name: &str,
    session: &Arc<PeerSession>,
    channel: SignalingChannel,
    local_candidates: mpsc::UnboundedReceiver<IceCandidate>,
    trickle_ice: bool,
) -> Negotiator<PeerSession> {
    let negotiator = Negotiator::new(name, session.clone(), channel);
    if trickle_ice {
        negotiator.with_local_candidates(local_candidates)
    } else {
        negotiator
    }
}

/// Run a negotiator in the background. The signaling link is needed for the
/// whole session, so the loop ending before `cancel` fires is an error.
pub fn spawn_negotiator(
    name: &'static str,
    negotiator: Negotiator<PeerSession>,
    cancel: CancellationToken,
) -> JoinHandle<Result<()>> {
    let token = cancel.clone();
    spawn_supervised(name, cancel, async move {
        negotiator.run(token.clone()).await?;
        if !token.is_cancelled() {
            bail!("{name}: peer closed the signaling channel");
        }
        Ok(())
    })
}

pub async fn close_sessions(sessions: &[&Arc<PeerSession>]) {
    for session in sessions {
        if let Err(e) = session.close().await {
            warn!("[{}] Close failed: {:#}", session.name, e);
        }
    }
}

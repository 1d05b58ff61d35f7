use crate::args::ClientArgs;
use crate::display;
use crate::signaling::{RetryPolicy, open_channel};
use crate::tasks::{
    close_sessions, join, join_thread, negotiator, spawn_negotiator, spawn_supervised,
};
use crate::workers::detection_worker;
use anyhow::{Context, Result};
use ricochet::Detector;
use ricochet::rtc::{CoordinateSender, InboundVideo, PeerEvents, PeerSession, SignalingEndpoint};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub async fn run(args: ClientArgs, cancel: CancellationToken) -> Result<()> {
    let transport = args.net.transport_config();

    display::print_banner("client", args.net.media_addr, args.net.coords_addr);

    let (media, media_events) = PeerSession::new("media", transport.clone()).await?;
    let (coords, coords_events) = PeerSession::new("coords", transport).await?;
    let (media, coords) = (Arc::new(media), Arc::new(coords));

    let result = track(&args, &media, &coords, media_events, coords_events, &cancel).await;

    cancel.cancel();
    close_sessions(&[&media, &coords]).await;
    result
}

async fn track(
    args: &ClientArgs,
    media: &Arc<PeerSession>,
    coords: &Arc<PeerSession>,
    media_events: PeerEvents,
    coords_events: PeerEvents,
    cancel: &CancellationToken,
) -> Result<()> {
    let trickle = args.net.trickle_ice;

    // The data channel must exist before the coords offer is created.
    let sender = CoordinateSender::create(coords, &args.net.coordinator_config()).await?;
    let inbound = InboundVideo::new(&args.net.media_config());
    let mut frames = inbound.subscribe();

    let retry = RetryPolicy {
        attempts: args.retries,
        delay: Duration::from_millis(args.retry_delay_ms),
    };
    let Some(media_channel) =
        open_channel(SignalingEndpoint::dial(args.net.media_addr), retry, cancel).await?
    else {
        return Ok(());
    };
    let Some(coords_channel) =
        open_channel(SignalingEndpoint::dial(args.net.coords_addr), retry, cancel).await?
    else {
        return Ok(());
    };

    let media_negotiator = negotiator(
        "media",
        media,
        media_channel,
        media_events.local_candidates,
        trickle,
    );
    let mut coords_negotiator = negotiator(
        "coords",
        coords,
        coords_channel,
        coords_events.local_candidates,
        trickle,
    );
    coords_negotiator.offer().await?;

    let media_task = spawn_negotiator("media negotiation", media_negotiator, cancel.clone());
    let coords_task = spawn_negotiator("coords negotiation", coords_negotiator, cancel.clone());

    let video_task = spawn_supervised("video receiver", cancel.clone(), {
        let mut tracks = media_events.tracks;
        let cancel = cancel.clone();
        async move { inbound.run(&mut tracks, cancel).await }
    });

    let (estimate_tx, estimate_rx) = mpsc::unbounded_channel();
    let detector = Detector {
        threshold: args.threshold,
        ..Default::default()
    };
    let worker = std::thread::Builder::new()
        .name("detection-worker".into())
        .spawn(move || detection_worker(move || frames.blocking_next(), &detector, estimate_tx))
        .context("Failed to start detection worker")?;

    let sender_task = spawn_supervised(
        "coordinate sender",
        cancel.clone(),
        sender.run(estimate_rx, cancel.clone()),
    );

    info!("Tracking, press Ctrl-C to stop");
    cancel.cancelled().await;

    let video_result = join("video receiver", video_task).await;
    let stats = join_thread("detection", worker).await?;
    let sent_result = join("coordinate sender", sender_task).await;
    let media_result = join("media negotiation", media_task).await;
    let coords_result = join("coords negotiation", coords_task).await;

    info!(
        "Client stopped: {} frames decoded, {} balls found, {} misses, {} estimates sent",
        video_result.as_ref().copied().unwrap_or_default(),
        stats.found,
        stats.missed,
        sent_result.as_ref().copied().unwrap_or_default()
    );
    video_result?;
    sent_result?;
    media_result?;
    coords_result?;
    Ok(())
}

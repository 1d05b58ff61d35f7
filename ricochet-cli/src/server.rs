use crate::args::ServerArgs;
use crate::display;
use crate::signaling::{RetryPolicy, open_channel};
use crate::tasks::{
    close_sessions, join, join_thread, negotiator, spawn_negotiator, spawn_supervised,
};
use crate::workers::error_worker;
use anyhow::{Context, Result};
use ricochet::BouncingBall;
use ricochet::model::{Frame, PixelFormat, Position};
use ricochet::rtc::{
    CoordinateReceiver, FrameSource, OutboundVideo, PeerEvents, PeerSession, SignalingEndpoint,
};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Advances the ball once per frame and publishes where it went.
pub struct BallFrames {
    ball: BouncingBall,
    format: PixelFormat,
    position: watch::Sender<Position>,
}

impl BallFrames {
    pub fn new(ball: BouncingBall, format: PixelFormat, position: watch::Sender<Position>) -> Self {
        Self {
            ball,
            format,
            position,
        }
    }
}

impl FrameSource for BallFrames {
    fn next_frame(&mut self) -> Frame {
        let frame = self.ball.increment_frame(self.format);
        self.position.send_replace(self.ball.position());
        frame
    }
}

pub async fn run(args: ServerArgs, cancel: CancellationToken) -> Result<()> {
    let ball = BouncingBall::new(args.length, args.width, args.radius, args.speed)
        .context("Invalid ball parameters")?;
    let transport = args.net.transport_config();

    display::print_banner("server", args.net.media_addr, args.net.coords_addr);

    let (media, media_events) = PeerSession::new("media", transport.clone()).await?;
    let (coords, coords_events) = PeerSession::new("coords", transport).await?;
    let (media, coords) = (Arc::new(media), Arc::new(coords));

    let result = stream(&args, ball, &media, &coords, media_events, coords_events, &cancel).await;

    cancel.cancel();
    close_sessions(&[&media, &coords]).await;
    result
}

async fn stream(
    args: &ServerArgs,
    ball: BouncingBall,
    media: &Arc<PeerSession>,
    coords: &Arc<PeerSession>,
    media_events: PeerEvents,
    coords_events: PeerEvents,
    cancel: &CancellationToken,
) -> Result<()> {
    let trickle = args.net.trickle_ice;
    let format = if args.rgb {
        PixelFormat::Rgb24
    } else {
        PixelFormat::Gray8
    };

    let outbound = Arc::new(OutboundVideo::new(&args.net.media_config()));
    outbound.attach(media).await?;

    let (media_channel, coords_channel) = tokio::try_join!(
        open_channel(
            SignalingEndpoint::listen(args.net.media_addr),
            RetryPolicy::ONCE,
            cancel
        ),
        open_channel(
            SignalingEndpoint::listen(args.net.coords_addr),
            RetryPolicy::ONCE,
            cancel
        ),
    )?;
    let (Some(media_channel), Some(coords_channel)) = (media_channel, coords_channel) else {
        return Ok(());
    };

    let mut media_negotiator = negotiator(
        "media",
        media,
        media_channel,
        media_events.local_candidates,
        trickle,
    );
    media_negotiator.offer().await?;
    let coords_negotiator = negotiator(
        "coords",
        coords,
        coords_channel,
        coords_events.local_candidates,
        trickle,
    );

    let media_task = spawn_negotiator("media negotiation", media_negotiator, cancel.clone());
    let coords_task = spawn_negotiator("coords negotiation", coords_negotiator, cancel.clone());

    let (estimate_tx, estimate_rx) = mpsc::unbounded_channel();
    let (position_tx, position_rx) = watch::channel(ball.position());

    let worker = std::thread::Builder::new()
        .name("error-worker".into())
        .spawn(move || error_worker(estimate_rx, position_rx, display::print_report))
        .context("Failed to start error worker")?;

    let receiver = spawn_supervised("coordinate receiver", cancel.clone(), {
        let receiver = CoordinateReceiver::new(&args.net.coordinator_config());
        let mut announced = coords_events.data_channels;
        let cancel = cancel.clone();
        async move { receiver.run(&mut announced, estimate_tx, cancel).await }
    });

    let pump = tokio::spawn({
        let source = BallFrames::new(ball, format, position_tx);
        let outbound = outbound.clone();
        let cancel = cancel.clone();
        async move { outbound.pump(source, cancel).await }
    });

    info!("Streaming, press Ctrl-C to stop");
    cancel.cancelled().await;

    let frames = pump.await.context("Frame pump panicked")?;
    let media_result = join("media negotiation", media_task).await;
    let coords_result = join("coords negotiation", coords_task).await;
    let receiver_result = join("coordinate receiver", receiver).await;
    let scored = join_thread("error", worker).await?;

    info!(
        "Server stopped: {} frames sent, {} estimates scored",
        frames, scored
    );
    media_result?;
    coords_result?;
    receiver_result?;
    Ok(())
}

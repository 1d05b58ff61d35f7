use std::sync::Arc;
use std::time::Duration;

use ricochet_core::{Detector, Frame, PixelFormat, Position};
use ricochet_rtc::{FrameSource, InboundVideo, MediaConfig, OutboundVideo, PeerSession, TransportConfig};
use tokio::time::timeout;

use crate::integration::init_tracing;
use crate::utils::{DELIVERY_TIMEOUT_MS, negotiate};

struct StillBall(Frame);

/// 80x60 gray frame with a bright disc of radius 12 centered at (40, 30).
fn small_ball() -> Frame {
    let (w, h) = (80i32, 60i32);
    let pixels = (0..h)
        .flat_map(|y| (0..w).map(move |x| (x, y)))
        .map(|(x, y)| {
            let (dx, dy) = (x - 40, y - 30);
            if dx * dx + dy * dy <= 144 { 255 } else { 0 }
        })
        .collect::<Vec<u8>>();
    Frame::new(w as u16, h as u16, PixelFormat::Gray8, pixels).unwrap()
}

impl FrameSource for StillBall {
    fn next_frame(&mut self) -> Frame {
        self.0.clone()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_frames_cross_the_connection_intact() {
    init_tracing();

    let media = MediaConfig {
        fps: 20,
        ..Default::default()
    };

    let (offer, _offer_events) = PeerSession::new("media-offer", TransportConfig::default())
        .await
        .expect("Failed to create offering session");
    let (answer, mut answer_events) = PeerSession::new("media-answer", TransportConfig::default())
        .await
        .expect("Failed to create answering session");
    let (offer, answer) = (Arc::new(offer), Arc::new(answer));

    let outbound = Arc::new(OutboundVideo::new(&media));
    outbound.attach(&offer).await.expect("Failed to attach track");

    let inbound = InboundVideo::new(&media);
    let mut frames = inbound.subscribe();

    let pair = negotiate(offer.clone(), answer.clone())
        .await
        .expect("Negotiation failed");

    let sent = small_ball();
    let position = Position::new(40, 30);

    let pump = tokio::spawn({
        let outbound = outbound.clone();
        let cancel = pair.cancel.clone();
        let source = StillBall(sent.clone());
        async move { outbound.pump(source, cancel).await }
    });
    let receiver = tokio::spawn({
        let cancel = pair.cancel.clone();
        async move { inbound.run(&mut answer_events.tracks, cancel).await }
    });

    let received = timeout(Duration::from_millis(DELIVERY_TIMEOUT_MS), frames.next())
        .await
        .expect("No frame arrived")
        .expect("Video receiver stopped");
    assert_eq!(received, sent);

    let estimate = Detector::default().detect(&received).expect("Ball not found");
    assert!(estimate.distance_to(&position) <= 1.5);

    pair.shutdown().await;
    assert!(pump.await.unwrap() >= 1);
    assert!(receiver.await.unwrap().expect("Receiver failed") >= 1);

    offer.close().await.expect("Failed to close offerer");
    answer.close().await.expect("Failed to close answerer");
}

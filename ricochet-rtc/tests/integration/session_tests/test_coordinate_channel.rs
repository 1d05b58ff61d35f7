use std::sync::Arc;
use std::time::Duration;

use ricochet_core::CoordinateEstimate;
use ricochet_rtc::{
    CoordinateReceiver, CoordinateSender, CoordinatorConfig, PeerSession, TransportConfig,
};
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::integration::init_tracing;
use crate::utils::{CONNECTION_TIMEOUT_MS, DELIVERY_TIMEOUT_MS, negotiate, wait_for_connected};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_estimates_arrive_in_order() {
    init_tracing();

    let config = CoordinatorConfig {
        send_interval: Duration::from_millis(5),
        ..Default::default()
    };

    let (offer, mut offer_events) = PeerSession::new("coords-offer", TransportConfig::default())
        .await
        .expect("Failed to create offering session");
    let (answer, mut answer_events) = PeerSession::new("coords-answer", TransportConfig::default())
        .await
        .expect("Failed to create answering session");
    let (offer, answer) = (Arc::new(offer), Arc::new(answer));

    // The channel has to exist before the offer is made.
    let sender = CoordinateSender::create(&offer, &config)
        .await
        .expect("Failed to create data channel");

    let pair = negotiate(offer.clone(), answer.clone())
        .await
        .expect("Negotiation failed");
    wait_for_connected(&mut offer_events.state, CONNECTION_TIMEOUT_MS)
        .await
        .expect("Offerer not connected");
    wait_for_connected(&mut answer_events.state, CONNECTION_TIMEOUT_MS)
        .await
        .expect("Answerer not connected");

    let (sink_tx, mut sink_rx) = mpsc::unbounded_channel();
    let receiver = tokio::spawn({
        let cancel = pair.cancel.clone();
        let receiver = CoordinateReceiver::new(&config);
        async move {
            receiver
                .run(&mut answer_events.data_channels, sink_tx, cancel)
                .await
        }
    });

    let estimates: Vec<_> = (0..10).map(|i| CoordinateEstimate::new(i * 7, 500 - i)).collect();
    let (queue_tx, queue_rx) = mpsc::unbounded_channel();
    for e in &estimates {
        queue_tx.send(*e).unwrap();
    }
    drop(queue_tx);

    let sent = timeout(
        Duration::from_millis(DELIVERY_TIMEOUT_MS),
        sender.run(queue_rx, pair.cancel.clone()),
    )
    .await
    .expect("Sender stalled")
    .expect("Sender failed");
    assert_eq!(sent, 10);

    let mut received = Vec::new();
    while received.len() < estimates.len() {
        let next = timeout(Duration::from_millis(DELIVERY_TIMEOUT_MS), sink_rx.recv())
            .await
            .expect("Timeout waiting for estimate")
            .expect("Receiver stopped early");
        received.push(next);
    }
    assert_eq!(received, estimates);

    pair.shutdown().await;
    let forwarded = receiver.await.unwrap().expect("Receiver failed");
    assert_eq!(forwarded, 10);

    offer.close().await.expect("Failed to close offerer");
    answer.close().await.expect("Failed to close answerer");
}

#[tokio::test]
async fn test_sender_stops_on_cancel_before_open() {
    init_tracing();

    let (session, _events) = PeerSession::new("lonely", TransportConfig::default())
        .await
        .expect("Failed to create session");
    let sender = CoordinateSender::create(&session, &CoordinatorConfig::default())
        .await
        .expect("Failed to create data channel");

    let (_queue_tx, queue_rx) = mpsc::unbounded_channel();
    let cancel = tokio_util::sync::CancellationToken::new();
    cancel.cancel();

    let sent = sender.run(queue_rx, cancel).await.expect("Sender failed");
    assert_eq!(sent, 0);

    session.close().await.expect("Failed to close session");
}

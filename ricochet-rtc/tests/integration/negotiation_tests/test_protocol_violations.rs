use std::sync::Arc;
use std::time::Duration;

use ricochet_core::{IceCandidate, SdpType, SessionDescription, SignalMessage};
use ricochet_rtc::{NegotiationError, NegotiationState, Negotiator, SignalingChannel, SignalingError};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::integration::init_tracing;
use crate::utils::{MockPeer, PeerCall, SIGNAL_TIMEOUT_MS, duplex_channels};

#[tokio::test]
async fn test_second_offer_while_waiting_is_rejected() {
    init_tracing();

    let (_remote, local) = duplex_channels();
    let peer = MockPeer::new("offer");
    let mut negotiator = Negotiator::new("offer", Arc::new(peer.clone()), local);

    negotiator.offer().await.expect("First offer failed");
    let second = negotiator.offer().await;

    assert!(matches!(second, Err(NegotiationError::OfferOutstanding)));
    assert_eq!(negotiator.state(), NegotiationState::LocalOfferSet);
    assert_eq!(peer.calls().await, vec![PeerCall::CreateOffer]);
}

#[tokio::test]
async fn test_answer_without_offer_is_ignored() {
    init_tracing();

    let (_remote, local) = duplex_channels();
    let peer = MockPeer::new("answer");
    let mut negotiator = Negotiator::new("answer", Arc::new(peer.clone()), local);

    negotiator
        .handle_message(SessionDescription::answer("stray").into())
        .await
        .expect("Stray answer must not be fatal");

    assert_eq!(negotiator.state(), NegotiationState::Idle);
    assert!(peer.calls().await.is_empty());
}

#[tokio::test]
async fn test_offer_after_stable_is_ignored() {
    init_tracing();

    let (mut remote, local) = duplex_channels();
    let peer = MockPeer::new("answer");
    let negotiator = Negotiator::new("answer", Arc::new(peer.clone()), local);
    let state = negotiator.subscribe();

    let cancel = CancellationToken::new();
    let task = tokio::spawn(negotiator.run(cancel.clone()));

    remote
        .send(&SessionDescription::offer("first").into())
        .await
        .unwrap();
    let answer = remote.receive().await.unwrap();
    assert!(matches!(
        answer,
        Some(SignalMessage::Description(ref d)) if d.sdp_type == SdpType::Answer
    ));

    remote
        .send(&SessionDescription::offer("second").into())
        .await
        .unwrap();
    // Anything after the second offer proves it has been handled.
    remote.send(&IceCandidate::new("marker").into()).await.unwrap();
    assert!(peer.wait_for_candidate("marker", SIGNAL_TIMEOUT_MS).await);

    assert_eq!(*state.borrow(), NegotiationState::Stable);
    assert_eq!(
        peer.calls().await,
        vec![
            PeerCall::SetRemote(SdpType::Offer),
            PeerCall::CreateAnswer,
            PeerCall::AddCandidate("marker".into()),
        ]
    );
    assert!(
        tokio::time::timeout(Duration::from_millis(100), remote.receive())
            .await
            .is_err(),
        "No second answer expected"
    );

    cancel.cancel();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_malformed_message_fails_the_loop() {
    init_tracing();

    let (mut raw, stream) = tokio::io::duplex(1024);
    let peer = MockPeer::new("answer");
    let negotiator = Negotiator::new("answer", Arc::new(peer), SignalingChannel::from_stream(stream));

    let task = tokio::spawn(negotiator.run(CancellationToken::new()));
    raw.write_all(b"{\"sdp\": 42}\n").await.unwrap();

    let result = tokio::time::timeout(Duration::from_millis(SIGNAL_TIMEOUT_MS), task)
        .await
        .expect("Loop did not stop")
        .unwrap();

    assert!(matches!(
        result,
        Err(NegotiationError::Signaling(SignalingError::Decode(_)))
    ));
}

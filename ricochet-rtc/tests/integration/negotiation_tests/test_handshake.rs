use std::sync::Arc;

use ricochet_core::SdpType;
use ricochet_rtc::{NegotiationState, Negotiator};
use tokio_util::sync::CancellationToken;

use crate::integration::init_tracing;
use crate::utils::{MockPeer, PeerCall, SIGNAL_TIMEOUT_MS, duplex_channels, wait_for_state};

#[tokio::test]
async fn test_offer_answer_reaches_stable_on_both_sides() {
    init_tracing();

    let (left, right) = duplex_channels();
    let offer_peer = MockPeer::new("offer");
    let answer_peer = MockPeer::new("answer");

    let mut offerer = Negotiator::new("offer", Arc::new(offer_peer.clone()), left);
    let answerer = Negotiator::new("answer", Arc::new(answer_peer.clone()), right);
    let mut offer_state = offerer.subscribe();
    let mut answer_state = answerer.subscribe();

    offerer.offer().await.expect("Failed to send offer");
    assert_eq!(offerer.state(), NegotiationState::LocalOfferSet);

    let cancel = CancellationToken::new();
    let offer_task = tokio::spawn(offerer.run(cancel.clone()));
    let answer_task = tokio::spawn(answerer.run(cancel.clone()));

    wait_for_state(&mut offer_state, NegotiationState::Stable, SIGNAL_TIMEOUT_MS)
        .await
        .expect("Offerer never became stable");
    wait_for_state(&mut answer_state, NegotiationState::Stable, SIGNAL_TIMEOUT_MS)
        .await
        .expect("Answerer never became stable");

    assert_eq!(
        offer_peer.calls().await,
        vec![PeerCall::CreateOffer, PeerCall::SetRemote(SdpType::Answer)]
    );
    assert_eq!(
        answer_peer.calls().await,
        vec![PeerCall::SetRemote(SdpType::Offer), PeerCall::CreateAnswer]
    );

    cancel.cancel();
    offer_task.await.unwrap().expect("Offerer loop failed");
    answer_task.await.unwrap().expect("Answerer loop failed");
}

#[tokio::test]
async fn test_loop_ends_when_peer_hangs_up() {
    init_tracing();

    let (mut left, right) = duplex_channels();
    let peer = MockPeer::new("answer");
    let answerer = Negotiator::new("answer", Arc::new(peer.clone()), right);

    let task = tokio::spawn(answerer.run(CancellationToken::new()));
    left.close().await;
    drop(left);

    let result = tokio::time::timeout(
        std::time::Duration::from_millis(SIGNAL_TIMEOUT_MS),
        task,
    )
    .await
    .expect("Loop did not notice the hang-up")
    .unwrap();

    assert!(result.is_ok());
    assert!(peer.calls().await.is_empty());
}

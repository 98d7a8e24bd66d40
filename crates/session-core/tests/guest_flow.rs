//! Guest side of the exchange: offer intake, answer publication, connection evidence

mod common;

use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::time::Instant;

use common::*;
use qrlink_envelope_core::decode;
use qrlink_session_core::{
    ConnectionEvidence, ConnectivityState, ControllerConfig, ControllerNotice, EngineEvent,
    NegotiationPhase, Role, SdpKind, SessionError, SessionWarning, TrackKind,
};

/// Join and accept a foreign offer, leaving the guest in AnswerReady
async fn answered(h: &Harness) {
    h.handle.join().await.unwrap();
    h.handle.offer_received(foreign_offer_token()).await.unwrap();
    assert_eq!(h.handle.phase(), NegotiationPhase::AnswerReady);
}

#[tokio::test(start_paused = true)]
async fn test_offer_produces_answer_token() {
    let h = harness(EngineScript::default());
    h.handle.join().await.unwrap();
    assert_eq!(h.handle.phase(), NegotiationPhase::AwaitingOffer);

    h.handle.offer_received(foreign_offer_token()).await.unwrap();

    let status = h.handle.status();
    assert_eq!(status.phase, NegotiationPhase::AnswerReady);
    assert_eq!(status.role, Some(Role::Guest));
    let answer = decode(status.local_token.as_deref().unwrap()).unwrap();
    assert_eq!(answer.kind, SdpKind::Answer);
    assert!(answer.text.contains("a=setup:active"));
    assert_eq!(h.engine().remote().map(|d| d.kind), Some(SdpKind::Offer));
}

#[tokio::test(start_paused = true)]
async fn test_short_paste_is_ignored() {
    let h = harness(EngineScript::default());
    h.handle.join().await.unwrap();
    let before = h.handle.status();

    h.handle.paste("abc").await.unwrap();
    h.handle.paste("   fifteen chars   ").await.unwrap();
    h.handle.paste("\n\n").await.unwrap();

    assert_eq!(h.handle.status(), before);
}

#[tokio::test(start_paused = true)]
async fn test_paste_dispatches_by_phase() {
    let h = harness(EngineScript::default());
    h.handle.join().await.unwrap();

    let err = h
        .handle
        .paste("sixteen-or-more characters of noise")
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Decode(_)));
    assert_eq!(h.handle.phase(), NegotiationPhase::AwaitingOffer);

    let err = h.handle.paste(foreign_answer_token()).await.unwrap_err();
    assert_eq!(
        err,
        SessionError::TypeMismatch {
            expected: SdpKind::Offer,
            found: SdpKind::Answer,
        }
    );
    assert_eq!(h.handle.phase(), NegotiationPhase::AwaitingOffer);

    h.handle
        .paste(format!("\n  {}  \n", foreign_offer_token()))
        .await
        .unwrap();
    assert_eq!(h.handle.phase(), NegotiationPhase::AnswerReady);

    let err = h.handle.paste(foreign_offer_token()).await.unwrap_err();
    assert_eq!(
        err,
        SessionError::invalid_state("paste a code", NegotiationPhase::AnswerReady)
    );
}

#[tokio::test(start_paused = true)]
async fn test_transport_connected_is_evidence() {
    let h = harness(EngineScript::default());
    answered(&h).await;

    h.engine().set_connectivity(ConnectivityState::Connected);
    let status = h
        .handle
        .wait_for_phase(NegotiationPhase::Connected, Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(status.evidence, Some(ConnectionEvidence::TransportConnected));
    assert!(!status.connection_assumed());
}

#[tokio::test(start_paused = true)]
async fn test_inbound_track_is_evidence() {
    let h = harness(EngineScript::default());
    answered(&h).await;

    h.engine().emit(EngineEvent::TrackArrived(TrackKind::Video));
    let status = h
        .handle
        .wait_for_phase(NegotiationPhase::Connected, Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(status.evidence, Some(ConnectionEvidence::InboundMedia));
}

#[tokio::test(start_paused = true)]
async fn test_stable_fallback_assumes_connected() {
    let h = harness(EngineScript::default());
    let mut notices = h.handle.subscribe();
    let started = Instant::now();
    answered(&h).await;

    let status = h
        .handle
        .wait_for_phase(NegotiationPhase::Connected, WAIT)
        .await
        .unwrap();
    assert_elapsed(started, Duration::from_secs(15));
    assert_eq!(status.evidence, Some(ConnectionEvidence::StableFallback));
    assert!(status.connection_assumed());
    assert!(warnings(&drain(&mut notices)).contains(&SessionWarning::AssumedConnected));

    // Later transport evidence replaces the assumption.
    h.engine().set_connectivity(ConnectivityState::Completed);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(
        h.handle.status().evidence,
        Some(ConnectionEvidence::TransportConnected)
    );
}

#[tokio::test(start_paused = true)]
async fn test_fallback_can_be_disabled() {
    let config = ControllerConfig::default().with_assume_connected_when_stable(false);
    let h = harness_with(config, EngineScript::default(), MockCapture::new());
    answered(&h).await;

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.handle.phase(), NegotiationPhase::AnswerReady);
}

#[tokio::test(start_paused = true)]
async fn test_connectivity_failure_is_fatal() {
    let h = harness(EngineScript::default());
    let mut notices = h.handle.subscribe();
    answered(&h).await;

    h.engine().set_connectivity(ConnectivityState::Failed);
    let status = h
        .handle
        .wait_for_phase(NegotiationPhase::Failed, Duration::from_secs(1))
        .await
        .unwrap();
    assert!(matches!(
        status.failure,
        Some(SessionError::ConnectivityLost(_))
    ));
    assert!(drain(&mut notices)
        .iter()
        .any(|n| matches!(n, ControllerNotice::Error(SessionError::ConnectivityLost(_)))));

    // The fallback timer died with the phase change.
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(h.handle.phase(), NegotiationPhase::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_offer_fails_session() {
    let script = EngineScript {
        offer_rejected: true,
        ..EngineScript::default()
    };
    let h = harness(script);
    h.handle.join().await.unwrap();

    let err = h
        .handle
        .offer_received(foreign_offer_token())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Negotiation(_)));
    assert_eq!(h.handle.phase(), NegotiationPhase::Failed);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_after_connect_only_warns() {
    let h = harness(EngineScript::default());
    answered(&h).await;
    h.engine().set_connectivity(ConnectivityState::Connected);
    h.handle
        .wait_for_phase(NegotiationPhase::Connected, Duration::from_secs(1))
        .await
        .unwrap();

    let mut notices = h.handle.subscribe();
    h.engine().set_connectivity(ConnectivityState::Disconnected);
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(h.handle.phase(), NegotiationPhase::Connected);
    assert_eq!(
        warnings(&drain(&mut notices)),
        vec![SessionWarning::ConnectionInterrupted]
    );
}

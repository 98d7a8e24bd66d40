//! Shared helpers for controller tests
//!
//! The engine and capture doubles are scripted: each test picks how gathering,
//! answer application and device access behave, then drives the controller
//! through its public handle. Tests run on a paused clock so timer bounds are
//! exact.

#![allow(dead_code)]

pub mod mock_capture;
pub mod mock_engine;

pub use mock_capture::*;
pub use mock_engine::*;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;

use qrlink_envelope_core::encode;
use qrlink_session_core::{
    ControllerConfig, ControllerHandle, ControllerNotice, SessionDescription, SessionWarning,
    TrackKind,
};

/// Generous upper bound for phase waits; the paused clock makes it free
pub const WAIT: Duration = Duration::from_secs(120);

pub struct Harness {
    pub handle: ControllerHandle,
    pub engines: Arc<MockEngineFactory>,
    pub capture: Arc<MockCapture>,
}

impl Harness {
    /// Engine created for the most recent session
    pub fn engine(&self) -> Arc<MockEngine> {
        self.engines.last()
    }
}

pub fn harness(script: EngineScript) -> Harness {
    harness_with(ControllerConfig::default(), script, MockCapture::new())
}

pub fn harness_with(
    config: ControllerConfig,
    script: EngineScript,
    capture: Arc<MockCapture>,
) -> Harness {
    let engines = MockEngineFactory::new(script);
    let handle = ControllerHandle::spawn(config, capture.clone(), engines.clone()).unwrap();
    Harness {
        handle,
        engines,
        capture,
    }
}

/// Every notice currently queued for `notices`
pub fn drain(notices: &mut broadcast::Receiver<ControllerNotice>) -> Vec<ControllerNotice> {
    let mut seen = Vec::new();
    while let Ok(notice) = notices.try_recv() {
        seen.push(notice);
    }
    seen
}

pub fn warnings(notices: &[ControllerNotice]) -> Vec<SessionWarning> {
    notices
        .iter()
        .filter_map(|notice| match notice {
            ControllerNotice::Warning(warning) => Some(*warning),
            _ => None,
        })
        .collect()
}

/// Token for an offer produced by some other device
pub fn foreign_offer_token() -> String {
    let offer = SessionDescription::offer(with_candidates(&render_description(
        "actpass",
        &[TrackKind::Audio, TrackKind::Video],
    )));
    encode(&offer).unwrap()
}

/// Token for an answer produced by some other device
pub fn foreign_answer_token() -> String {
    let answer = SessionDescription::answer(with_candidates(&render_description(
        "active",
        &[TrackKind::Audio, TrackKind::Video],
    )));
    encode(&answer).unwrap()
}

/// Assert `started` lies `expected` in the past, give or take timer granularity
pub fn assert_elapsed(started: tokio::time::Instant, expected: Duration) {
    let elapsed = started.elapsed();
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(50),
        "expected ~{:?}, elapsed {:?}",
        expected,
        elapsed
    );
}

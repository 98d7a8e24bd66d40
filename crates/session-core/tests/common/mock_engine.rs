//! Scripted peer-connection engine

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use qrlink_session_core::{
    ConnectivityState, EngineError, EngineEvent, EngineEventSink, EngineFactory, GatheringState,
    LocalMedia, NegotiationEngine, SdpKind, SessionDescription, SessionEpoch, SignalingState,
    TrackKind,
};

/// How a mock engine behaves
#[derive(Debug, Clone)]
pub struct EngineScript {
    /// Gathering finishes as soon as the local description is set
    pub gathering_completes: bool,
    /// Number of remote answers rejected before one is accepted
    pub answer_rejections: usize,
    /// Remote offers are refused
    pub offer_rejected: bool,
    /// Signaling reads reporting `Stable` while the local offer is pending
    pub stable_while_offering: usize,
}

impl Default for EngineScript {
    fn default() -> Self {
        Self {
            gathering_completes: true,
            answer_rejections: 0,
            offer_rejected: false,
            stable_while_offering: 0,
        }
    }
}

impl EngineScript {
    pub fn slow_gathering() -> Self {
        Self {
            gathering_completes: false,
            ..Self::default()
        }
    }

    pub fn rejecting_answers(times: usize) -> Self {
        Self {
            answer_rejections: times,
            ..Self::default()
        }
    }

    /// The engine claims not to expect an answer for the first `times` checks
    pub fn not_expecting_answer(times: usize) -> Self {
        Self {
            stable_while_offering: times,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
struct EngineState {
    signaling: SignalingState,
    gathering: GatheringState,
    connectivity: ConnectivityState,
    local: Option<SessionDescription>,
    remote: Option<SessionDescription>,
    tracks: Vec<TrackKind>,
    answer_rejections_left: usize,
    stable_reports_left: usize,
    close_calls: usize,
}

pub struct MockEngine {
    sink: EngineEventSink,
    script: EngineScript,
    state: Mutex<EngineState>,
}

impl MockEngine {
    fn new(sink: EngineEventSink, script: EngineScript) -> Self {
        let state = EngineState {
            signaling: SignalingState::Stable,
            gathering: GatheringState::New,
            connectivity: ConnectivityState::New,
            local: None,
            remote: None,
            tracks: Vec::new(),
            answer_rejections_left: script.answer_rejections,
            stable_reports_left: script.stable_while_offering,
            close_calls: 0,
        };
        Self {
            sink,
            script,
            state: Mutex::new(state),
        }
    }

    pub fn epoch(&self) -> SessionEpoch {
        self.sink.epoch()
    }

    /// Push an event as the real engine would, regardless of session state
    pub fn emit(&self, event: EngineEvent) {
        self.sink.emit(event);
    }

    pub fn complete_gathering(&self) {
        self.state.lock().unwrap().gathering = GatheringState::Complete;
        self.emit(EngineEvent::CandidateDiscovered(None));
    }

    pub fn set_connectivity(&self, state: ConnectivityState) {
        self.state.lock().unwrap().connectivity = state;
        self.emit(EngineEvent::ConnectivityStateChanged(state));
    }

    pub fn remote(&self) -> Option<SessionDescription> {
        self.state.lock().unwrap().remote.clone()
    }

    pub fn tracks(&self) -> Vec<TrackKind> {
        self.state.lock().unwrap().tracks.clone()
    }

    pub fn close_calls(&self) -> usize {
        self.state.lock().unwrap().close_calls
    }

    pub fn is_closed(&self) -> bool {
        self.close_calls() > 0
    }

    fn set_signaling(&self, state: &mut EngineState, signaling: SignalingState) {
        state.signaling = signaling;
        self.sink.emit(EngineEvent::SignalingStateChanged(signaling));
    }

    fn ensure_open(state: &EngineState) -> Result<(), EngineError> {
        if state.close_calls > 0 {
            return Err(EngineError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl NegotiationEngine for MockEngine {
    async fn add_local_media(&self, media: Arc<dyn LocalMedia>) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        Self::ensure_open(&state)?;
        state.tracks = media.tracks();
        Ok(())
    }

    async fn create_local_offer(&self) -> Result<SessionDescription, EngineError> {
        let state = self.state.lock().unwrap();
        Self::ensure_open(&state)?;
        Ok(SessionDescription::offer(render_description(
            "actpass",
            &state.tracks,
        )))
    }

    async fn create_local_answer(&self) -> Result<SessionDescription, EngineError> {
        let state = self.state.lock().unwrap();
        Self::ensure_open(&state)?;
        if state.signaling != SignalingState::HaveRemoteOffer {
            return Err(EngineError::WrongSignalingState(state.signaling));
        }
        Ok(SessionDescription::answer(render_description(
            "active",
            &state.tracks,
        )))
    }

    async fn set_local_description(
        &self,
        description: &SessionDescription,
    ) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        Self::ensure_open(&state)?;
        state.local = Some(description.clone());
        let signaling = match description.kind {
            SdpKind::Offer => SignalingState::HaveLocalOffer,
            SdpKind::Answer => SignalingState::Stable,
        };
        self.set_signaling(&mut state, signaling);

        if self.script.gathering_completes {
            state.gathering = GatheringState::Complete;
            self.sink
                .emit(EngineEvent::GatheringStateChanged(GatheringState::Complete));
        } else {
            state.gathering = GatheringState::Gathering;
            self.sink
                .emit(EngineEvent::GatheringStateChanged(GatheringState::Gathering));
        }
        Ok(())
    }

    async fn set_remote_description(
        &self,
        description: &SessionDescription,
    ) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        Self::ensure_open(&state)?;
        match description.kind {
            SdpKind::Offer => {
                if self.script.offer_rejected {
                    return Err(EngineError::Rejected("unsupported offer".into()));
                }
                state.remote = Some(description.clone());
                self.set_signaling(&mut state, SignalingState::HaveRemoteOffer);
            }
            SdpKind::Answer => {
                if state.signaling != SignalingState::HaveLocalOffer {
                    return Err(EngineError::WrongSignalingState(state.signaling));
                }
                if state.answer_rejections_left > 0 {
                    state.answer_rejections_left -= 1;
                    return Err(EngineError::Rejected("answer not applicable yet".into()));
                }
                state.remote = Some(description.clone());
                self.set_signaling(&mut state, SignalingState::Stable);
            }
        }
        Ok(())
    }

    fn local_description(&self) -> Option<SessionDescription> {
        let state = self.state.lock().unwrap();
        let local = state.local.as_ref()?;
        if state.gathering == GatheringState::New {
            return Some(local.clone());
        }
        Some(SessionDescription::new(local.kind, with_candidates(&local.text)))
    }

    fn gathering_state(&self) -> GatheringState {
        self.state.lock().unwrap().gathering
    }

    fn connectivity_state(&self) -> ConnectivityState {
        self.state.lock().unwrap().connectivity
    }

    fn signaling_state(&self) -> SignalingState {
        let mut state = self.state.lock().unwrap();
        if state.signaling == SignalingState::HaveLocalOffer && state.stable_reports_left > 0 {
            state.stable_reports_left -= 1;
            return SignalingState::Stable;
        }
        state.signaling
    }

    async fn close(&self) {
        let mut state = self.state.lock().unwrap();
        state.close_calls += 1;
        state.signaling = SignalingState::Closed;
        state.connectivity = ConnectivityState::Closed;
    }
}

pub struct MockEngineFactory {
    script: EngineScript,
    engines: Mutex<Vec<Arc<MockEngine>>>,
}

impl MockEngineFactory {
    pub fn new(script: EngineScript) -> Arc<Self> {
        Arc::new(Self {
            script,
            engines: Mutex::new(Vec::new()),
        })
    }

    pub fn last(&self) -> Arc<MockEngine> {
        self.engines.lock().unwrap().last().cloned().unwrap()
    }

    pub fn get(&self, index: usize) -> Arc<MockEngine> {
        self.engines.lock().unwrap()[index].clone()
    }

    pub fn created(&self) -> usize {
        self.engines.lock().unwrap().len()
    }
}

impl EngineFactory for MockEngineFactory {
    fn create(&self, events: EngineEventSink) -> Result<Arc<dyn NegotiationEngine>, EngineError> {
        let engine = Arc::new(MockEngine::new(events, self.script.clone()));
        self.engines.lock().unwrap().push(engine.clone());
        let engine: Arc<dyn NegotiationEngine> = engine;
        Ok(engine)
    }
}

/// A browser-shaped description without candidates
pub fn render_description(setup: &str, tracks: &[TrackKind]) -> String {
    let mids: Vec<String> = (0..tracks.len()).map(|i| i.to_string()).collect();
    let mut sdp = format!(
        "v=0\r\no=- 4611731400430051336 2 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\na=group:BUNDLE {}\r\na=msid-semantic: WMS mock\r\n",
        mids.join(" ")
    );
    for (mid, track) in tracks.iter().enumerate() {
        let (header, codecs) = match track {
            TrackKind::Audio => (
                "m=audio 9 UDP/TLS/RTP/SAVPF 111 0",
                "a=rtpmap:111 opus/48000/2\r\na=fmtp:111 minptime=10;useinbandfec=1\r\na=rtpmap:0 PCMU/8000\r\n",
            ),
            TrackKind::Video => (
                "m=video 9 UDP/TLS/RTP/SAVPF 96 97",
                "a=rtpmap:96 VP8/90000\r\na=rtcp-fb:96 nack pli\r\na=rtpmap:97 rtx/90000\r\na=fmtp:97 apt=96\r\n",
            ),
        };
        sdp.push_str(header);
        sdp.push_str("\r\nc=IN IP4 0.0.0.0\r\na=rtcp:9 IN IP4 0.0.0.0\r\n");
        sdp.push_str("a=ice-ufrag:mK3d\r\na=ice-pwd:Jq2nVb8xZr5tLw1sYp4cHd7e\r\na=ice-options:trickle\r\n");
        sdp.push_str("a=fingerprint:sha-256 4A:1F:90:2C:77:E3:0B:5D:C8:16:AF:62:3E:D9:04:B7:5A:8C:21:F0:93:6E:DB:47:1C:A5:38:E2:0D:7F:B1:64\r\n");
        sdp.push_str(&format!("a=setup:{}\r\na=mid:{}\r\n", setup, mid));
        sdp.push_str("a=extmap:1 urn:ietf:params:rtp-hdrext:sdes:mid\r\na=sendrecv\r\na=rtcp-mux\r\n");
        sdp.push_str(codecs);
        sdp.push_str(&format!("a=ssrc:{} cname:mock\r\n", 1000 + mid));
    }
    sdp
}

/// Insert gathered candidates after every media header
pub fn with_candidates(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 512);
    for line in text.split("\r\n").filter(|line| !line.is_empty()) {
        out.push_str(line);
        out.push_str("\r\n");
        if line.starts_with("m=") {
            out.push_str("a=candidate:1 1 udp 2122260223 192.168.1.20 50000 typ host generation 0\r\n");
            out.push_str("a=candidate:2 1 udp 2122194687 10.0.0.5 50002 typ host generation 0\r\n");
            out.push_str("a=candidate:3 1 udp 1686052607 203.0.113.9 50000 typ srflx raddr 192.168.1.20 rport 50000 generation 0\r\n");
        }
    }
    out
}

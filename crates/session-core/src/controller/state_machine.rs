//! Negotiation state machine
//!
//! Runs on one task and handles one input at a time, so handlers never
//! interleave. Each handler is given the live session explicitly.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, trace, warn};

use crate::capture::MediaCapture;
use crate::config::ControllerConfig;
use crate::engine::{EngineEvent, EngineEventSink, EngineFactory};
use crate::errors::{Result, SessionError};
use crate::events::{Command, ControllerInput, ControllerNotice, ControllerStatus, SessionWarning};
use crate::session::NegotiationSession;
use crate::timers::{TimerKind, TimerSet};
use crate::types::{
    ConnectionEvidence, ConnectivityState, GatheringState, NegotiationPhase, Role, SessionEpoch,
    SignalingState,
};
use qrlink_envelope_core::{decode, encode_envelope};
use qrlink_sdp_core::{SdpKind, SessionDescription};

/// Attempts at applying one remote answer, the first included
const MAX_ANSWER_ATTEMPTS: u32 = 2;

/// Collaborators and outputs shared by every handler
pub(crate) struct ControllerContext {
    config: ControllerConfig,
    capture: Arc<dyn MediaCapture>,
    engines: Arc<dyn EngineFactory>,
    /// Weak so the controller stops once every handle is gone
    inbox: mpsc::WeakUnboundedSender<ControllerInput>,
    notices: broadcast::Sender<ControllerNotice>,
}

pub(crate) struct NegotiationController {
    ctx: ControllerContext,
    session: Option<NegotiationSession>,
    last_epoch: SessionEpoch,
    status: watch::Sender<ControllerStatus>,
}

impl NegotiationController {
    pub(crate) fn new(
        config: ControllerConfig,
        capture: Arc<dyn MediaCapture>,
        engines: Arc<dyn EngineFactory>,
        inbox: mpsc::WeakUnboundedSender<ControllerInput>,
        status: watch::Sender<ControllerStatus>,
        notices: broadcast::Sender<ControllerNotice>,
    ) -> Self {
        Self {
            ctx: ControllerContext {
                config,
                capture,
                engines,
                inbox,
                notices,
            },
            session: None,
            last_epoch: SessionEpoch(0),
            status,
        }
    }

    pub(crate) fn phase(&self) -> NegotiationPhase {
        self.session
            .as_ref()
            .map_or(NegotiationPhase::Idle, |session| session.phase)
    }

    pub(crate) async fn handle_input(&mut self, input: ControllerInput) {
        match input {
            ControllerInput::Command { command, reply } => {
                let name = command.name();
                debug!("Handling {} in {}", name, self.phase());
                let result = self.handle_command(command).await;
                if let Err(err) = &result {
                    debug!("{} returned error: {}", name, err);
                    self.ctx.notify(ControllerNotice::Error(err.clone()));
                }
                self.publish_status();
                let _ = reply.send(result);
            }
            ControllerInput::Engine { epoch, event } => {
                let Some(session) = self.session.as_mut().filter(|s| s.epoch == epoch) else {
                    debug!("Discarding {:?} from stale {}", event, epoch);
                    return;
                };
                let result = self.ctx.on_engine_event(session, event);
                let result = self.ctx.settle(session, result);
                self.finish_reaction(result);
            }
            ControllerInput::Timer { epoch, kind, seq } => {
                let Some(session) = self.session.as_mut().filter(|s| s.epoch == epoch) else {
                    debug!("Discarding {:?} #{} from stale {}", kind, seq, epoch);
                    return;
                };
                if !session.timers.take_fired(kind, seq) {
                    debug!("Discarding superseded {:?} #{} for {}", kind, seq, epoch);
                    return;
                }
                let result = self.ctx.on_timer(session, kind).await;
                let result = self.ctx.settle(session, result);
                self.finish_reaction(result);
            }
            ControllerInput::Shutdown { reply } => {
                self.shutdown().await;
                let _ = reply.send(());
            }
        }
    }

    /// End any live session before the task exits
    pub(crate) async fn shutdown(&mut self) {
        self.end_session().await;
        self.publish_status();
    }

    async fn handle_command(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Start => self.open(Role::Host).await,
            Command::Join => self.open(Role::Guest).await,
            Command::GuestScanned => {
                let session = expect_phase(
                    &mut self.session,
                    NegotiationPhase::OfferReady,
                    "confirm the guest scanned",
                )?;
                self.ctx.set_phase(session, NegotiationPhase::AwaitingAnswer);
                Ok(())
            }
            Command::OfferReceived(token) => self.receive_offer(&token).await,
            Command::AnswerReceived(token) => self.receive_answer(&token).await,
            Command::Paste(text) => self.paste(&text).await,
            Command::End => {
                self.end_session().await;
                Ok(())
            }
        }
    }

    async fn open(&mut self, role: Role) -> Result<()> {
        if self.session.is_some() {
            self.end_session().await;
        }

        let epoch = self.last_epoch.next();
        self.last_epoch = epoch;
        let sink = EngineEventSink::new(epoch, self.ctx.inbox.clone());
        let engine = self.ctx.engines.create(sink)?;
        let timers = TimerSet::new(epoch, self.ctx.inbox.clone());
        let session = self
            .session
            .insert(NegotiationSession::new(epoch, role, engine, timers));
        info!("Opened {} as {}", epoch, role);

        match role {
            Role::Host => {
                self.ctx.set_phase(session, NegotiationPhase::CreatingOffer);
                let result = self.ctx.create_offer(session).await;
                self.ctx.settle(session, result)
            }
            Role::Guest => {
                self.ctx.set_phase(session, NegotiationPhase::AwaitingOffer);
                Ok(())
            }
        }
    }

    async fn receive_offer(&mut self, token: &str) -> Result<()> {
        let session = expect_phase(
            &mut self.session,
            NegotiationPhase::AwaitingOffer,
            "accept an offer",
        )?;
        let offer = decode_expected(token, session.role.remote_kind())?;
        let result = self.ctx.accept_offer(session, offer).await;
        self.ctx.settle(session, result)
    }

    async fn receive_answer(&mut self, token: &str) -> Result<()> {
        let session = expect_phase(
            &mut self.session,
            NegotiationPhase::AwaitingAnswer,
            "accept an answer",
        )?;
        let answer = decode_expected(token, session.role.remote_kind())?;
        let result = self.ctx.accept_answer(session, answer).await;
        self.ctx.settle(session, result)
    }

    async fn paste(&mut self, text: &str) -> Result<()> {
        let text = text.trim();
        let length = text.chars().count();
        if length < self.ctx.config.min_paste_len {
            debug!("Ignoring paste of {} characters", length);
            return Ok(());
        }

        let phase = self.phase();
        match phase.accepted_kind() {
            Some(SdpKind::Offer) => self.receive_offer(text).await,
            Some(SdpKind::Answer) => self.receive_answer(text).await,
            None => Err(SessionError::invalid_state("paste a code", phase)),
        }
    }

    async fn end_session(&mut self) {
        let Some(mut session) = self.session.take() else {
            debug!("No live session to end");
            return;
        };
        let from = session.phase;
        session.teardown().await;
        info!("Ended {} ({} in {})", session.epoch, session.role, from);
        self.ctx.notify(ControllerNotice::PhaseChanged {
            epoch: session.epoch,
            from,
            to: NegotiationPhase::Idle,
        });
    }

    fn finish_reaction(&mut self, result: Result<()>) {
        if let Err(err) = result {
            self.ctx.notify(ControllerNotice::Error(err));
        }
        self.publish_status();
    }

    fn publish_status(&self) {
        let status = match &self.session {
            Some(session) => ControllerStatus {
                phase: session.phase,
                role: Some(session.role),
                epoch: Some(session.epoch),
                local_token: session.local_token.clone(),
                failure: session.failure.clone(),
                evidence: session.evidence,
            },
            None => ControllerStatus::idle(),
        };
        self.status.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
    }
}

impl ControllerContext {
    fn notify(&self, notice: ControllerNotice) {
        // No subscribers is fine.
        let _ = self.notices.send(notice);
    }

    /// Move to `phase`, cancelling every timer armed for the old one
    fn set_phase(&self, session: &mut NegotiationSession, phase: NegotiationPhase) {
        let from = session.phase;
        if from == phase {
            return;
        }
        let cancelled = session.timers.cancel_all();
        session.phase = phase;
        info!("{}: {} -> {}", session.epoch, from, phase);
        if cancelled > 0 {
            trace!("{}: cancelled {} timers leaving {}", session.epoch, cancelled, from);
        }
        self.notify(ControllerNotice::PhaseChanged {
            epoch: session.epoch,
            from,
            to: phase,
        });
    }

    fn raise_warning(&self, session: &mut NegotiationSession, warning: SessionWarning) {
        warn!("{}: {:?} in {}", session.epoch, warning, session.phase);
        self.notify(ControllerNotice::Warning(warning));
        session
            .timers
            .arm(TimerKind::WarningDismiss, self.config.warning_dismiss());
    }

    /// Record a fatal error on the session and move it to `Failed`
    fn settle(&self, session: &mut NegotiationSession, result: Result<()>) -> Result<()> {
        match result {
            Err(err) if err.is_fatal() => {
                error!("{} failed in {}: {}", session.epoch, session.phase, err);
                session.failure = Some(err.clone());
                self.set_phase(session, NegotiationPhase::Failed);
                Err(err)
            }
            other => other,
        }
    }

    async fn attach_media(&self, session: &mut NegotiationSession) -> Result<()> {
        let preferred = self.config.preferred_constraints;
        let media = match self.capture.acquire(preferred).await {
            Ok(media) => media,
            Err(first) => {
                let fallback = self.config.fallback_constraints;
                warn!(
                    "{}: capture of {} failed ({}), retrying with {}",
                    session.epoch, preferred, first, fallback
                );
                let media = self.capture.acquire(fallback).await.map_err(|second| {
                    SessionError::Capture(format!("{}; {} fallback: {}", first, fallback, second))
                })?;
                self.raise_warning(session, SessionWarning::CaptureDegraded);
                media
            }
        };

        debug!("{}: captured {:?}", session.epoch, media.tracks());
        session.local_media = Some(media.clone());
        session.engine.add_local_media(media).await?;
        Ok(())
    }

    async fn create_offer(&self, session: &mut NegotiationSession) -> Result<()> {
        self.attach_media(session).await?;

        let engine = session.engine.clone();
        let offer = engine.create_local_offer().await?;
        engine.set_local_description(&offer).await?;
        session.local_description = Some(offer);

        self.await_gathering(session)
    }

    async fn accept_offer(
        &self,
        session: &mut NegotiationSession,
        offer: SessionDescription,
    ) -> Result<()> {
        self.set_phase(session, NegotiationPhase::CreatingAnswer);
        self.attach_media(session).await?;

        let engine = session.engine.clone();
        engine
            .set_remote_description(&offer)
            .await
            .map_err(|e| SessionError::negotiation(format!("offer rejected: {}", e)))?;
        session.remote_description = Some(offer);

        let answer = engine.create_local_answer().await?;
        engine.set_local_description(&answer).await?;
        session.local_description = Some(answer);

        self.await_gathering(session)
    }

    fn await_gathering(&self, session: &mut NegotiationSession) -> Result<()> {
        if session.engine.gathering_state() == GatheringState::Complete {
            return self.publish_local(session, false);
        }
        debug!(
            "{}: waiting up to {:?} for candidate gathering",
            session.epoch,
            self.config.gather_timeout()
        );
        session
            .timers
            .arm(TimerKind::GatherTimeout, self.config.gather_timeout());
        Ok(())
    }

    /// Encode the local description and enter the ready phase
    fn publish_local(&self, session: &mut NegotiationSession, partial: bool) -> Result<()> {
        let description = session
            .engine
            .local_description()
            .or_else(|| session.local_description.clone())
            .ok_or_else(|| SessionError::negotiation("engine has no local description"))?;
        if description.kind != session.role.local_kind() {
            return Err(SessionError::negotiation(format!(
                "engine produced an {} for the {}",
                description.kind, session.role
            )));
        }
        let envelope = encode_envelope(&description)?;
        info!(
            "{}: {} code ready ({} chars from {} record bytes)",
            session.epoch,
            description.kind,
            envelope.token.len(),
            envelope.record_len
        );

        session.local_description = Some(description);
        session.local_token = Some(envelope.token.clone());
        let ready = match session.role {
            Role::Host => NegotiationPhase::OfferReady,
            Role::Guest => NegotiationPhase::AnswerReady,
        };
        self.set_phase(session, ready);
        self.notify(ControllerNotice::TokenReady {
            epoch: session.epoch,
            role: session.role,
            token: envelope.token,
        });

        if partial {
            self.raise_warning(session, SessionWarning::GatheringIncomplete);
        }
        if session.role == Role::Guest {
            session
                .timers
                .arm(TimerKind::ConnectFallback, self.config.connect_fallback());
        }
        Ok(())
    }

    async fn accept_answer(
        &self,
        session: &mut NegotiationSession,
        answer: SessionDescription,
    ) -> Result<()> {
        if session.pending_answer.is_some() {
            debug!("{}: new answer replaces the pending one", session.epoch);
        }
        session.pending_answer = Some(answer);
        session.answer_attempts = 0;
        self.apply_pending_answer(session).await
    }

    async fn apply_pending_answer(&self, session: &mut NegotiationSession) -> Result<()> {
        let Some(answer) = session.pending_answer.clone() else {
            return Ok(());
        };
        session.answer_attempts += 1;

        let engine = session.engine.clone();
        let signaling = engine.signaling_state();
        let outcome = if signaling.expects_remote_answer() {
            engine
                .set_remote_description(&answer)
                .await
                .map_err(|e| e.to_string())
        } else {
            Err(format!("engine is not expecting an answer ({})", signaling))
        };

        match outcome {
            Ok(()) => {
                session.pending_answer = None;
                session.remote_description = Some(answer);
                self.connect(session, ConnectionEvidence::AnswerApplied);
                Ok(())
            }
            Err(reason) if session.answer_attempts < MAX_ANSWER_ATTEMPTS => {
                warn!(
                    "{}: answer not applied ({}), retrying in {:?}",
                    session.epoch,
                    reason,
                    self.config.answer_retry_delay()
                );
                session
                    .timers
                    .arm(TimerKind::AnswerRetry, self.config.answer_retry_delay());
                Ok(())
            }
            Err(reason) => {
                session.pending_answer = None;
                Err(SessionError::negotiation(format!(
                    "answer rejected after {} attempts: {}",
                    session.answer_attempts, reason
                )))
            }
        }
    }

    fn connect(&self, session: &mut NegotiationSession, evidence: ConnectionEvidence) {
        info!("{}: connected ({:?})", session.epoch, evidence);
        session.evidence = Some(evidence);
        self.set_phase(session, NegotiationPhase::Connected);
    }

    fn on_engine_event(&self, session: &mut NegotiationSession, event: EngineEvent) -> Result<()> {
        match event {
            EngineEvent::CandidateDiscovered(Some(candidate)) => {
                trace!("{}: gathered {}", session.epoch, candidate);
                Ok(())
            }
            EngineEvent::CandidateDiscovered(None)
            | EngineEvent::GatheringStateChanged(GatheringState::Complete) => {
                if session.phase.is_creating() && session.local_description.is_some() {
                    self.publish_local(session, false)
                } else {
                    Ok(())
                }
            }
            EngineEvent::GatheringStateChanged(_) => Ok(()),
            EngineEvent::SignalingStateChanged(state) => {
                debug!("{}: signaling {} in {}", session.epoch, state, session.phase);
                Ok(())
            }
            EngineEvent::ConnectivityStateChanged(state) => self.on_connectivity(session, state),
            EngineEvent::TrackArrived(kind) => {
                session.remote_tracks.push(kind);
                if session.phase == NegotiationPhase::AnswerReady
                    && session.engine.signaling_state().after_answer()
                {
                    self.connect(session, ConnectionEvidence::InboundMedia);
                }
                Ok(())
            }
        }
    }

    fn on_connectivity(&self, session: &mut NegotiationSession, state: ConnectivityState) -> Result<()> {
        debug!("{}: connectivity {:?} in {}", session.epoch, state, session.phase);
        match state {
            state if state.is_established() => {
                match session.phase {
                    NegotiationPhase::AnswerReady => {
                        self.connect(session, ConnectionEvidence::TransportConnected)
                    }
                    NegotiationPhase::Connected
                        if session.evidence.map_or(false, |e| e.is_assumed()) =>
                    {
                        info!("{}: assumed connection confirmed by transport", session.epoch);
                        session.evidence = Some(ConnectionEvidence::TransportConnected);
                    }
                    _ => {}
                }
                Ok(())
            }
            ConnectivityState::Failed if session.phase.is_active() => Err(
                SessionError::ConnectivityLost("transport connectivity checks failed".into()),
            ),
            ConnectivityState::Disconnected if session.phase == NegotiationPhase::Connected => {
                self.raise_warning(session, SessionWarning::ConnectionInterrupted);
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn on_timer(&self, session: &mut NegotiationSession, kind: TimerKind) -> Result<()> {
        match kind {
            TimerKind::GatherTimeout if session.phase.is_creating() => {
                warn!(
                    "{}: gathering incomplete after {:?}, using the candidates found so far",
                    session.epoch,
                    self.config.gather_timeout()
                );
                self.publish_local(session, true)
            }
            TimerKind::ConnectFallback if session.phase == NegotiationPhase::AnswerReady => {
                self.connect_fallback(session);
                Ok(())
            }
            TimerKind::AnswerRetry if session.phase == NegotiationPhase::AwaitingAnswer => {
                self.apply_pending_answer(session).await
            }
            TimerKind::WarningDismiss => {
                self.notify(ControllerNotice::WarningDismissed);
                Ok(())
            }
            kind => {
                debug!("{}: {:?} fired in {}, ignoring", session.epoch, kind, session.phase);
                Ok(())
            }
        }
    }

    fn connect_fallback(&self, session: &mut NegotiationSession) {
        let signaling = session.engine.signaling_state();
        if self.config.assume_connected_when_stable && signaling == SignalingState::Stable {
            warn!(
                "{}: no connection evidence after {:?}, assuming connected on stable signaling",
                session.epoch,
                self.config.connect_fallback()
            );
            self.connect(session, ConnectionEvidence::StableFallback);
            self.raise_warning(session, SessionWarning::AssumedConnected);
        } else {
            info!(
                "{}: still waiting for connection evidence (signaling {})",
                session.epoch, signaling
            );
        }
    }
}

fn expect_phase<'a>(
    slot: &'a mut Option<NegotiationSession>,
    phase: NegotiationPhase,
    operation: &str,
) -> Result<&'a mut NegotiationSession> {
    let current = slot
        .as_ref()
        .map_or(NegotiationPhase::Idle, |session| session.phase);
    match slot {
        Some(session) if current == phase => Ok(session),
        _ => Err(SessionError::invalid_state(operation, current)),
    }
}

/// Decode a token and check it is the kind the phase accepts
fn decode_expected(token: &str, expected: SdpKind) -> Result<SessionDescription> {
    let description = decode(token).ok_or_else(|| {
        SessionError::decode(format!("{} characters did not decode", token.trim().len()))
    })?;
    if description.kind != expected {
        return Err(SessionError::TypeMismatch {
            expected,
            found: description.kind,
        });
    }
    Ok(description)
}

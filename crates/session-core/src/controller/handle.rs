use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, info};

use super::state_machine::NegotiationController;
use crate::capture::MediaCapture;
use crate::config::ControllerConfig;
use crate::engine::EngineFactory;
use crate::errors::{Result, SessionError};
use crate::events::{Command, ControllerInput, ControllerNotice, ControllerStatus};
use crate::types::NegotiationPhase;

/// Notices buffered per subscriber before the slowest one starts lagging
const NOTICE_CAPACITY: usize = 64;

/// Cloneable handle to a running negotiation controller
///
/// Every command is queued on the controller's inbox together with engine
/// events and timer firings, and answered once the controller has finished
/// handling it. Observers read [`ControllerStatus`] snapshots or subscribe to
/// [`ControllerNotice`]s.
///
/// Dropping the last handle stops the controller and releases its session.
#[derive(Clone)]
pub struct ControllerHandle {
    inbox: mpsc::UnboundedSender<ControllerInput>,
    status: watch::Receiver<ControllerStatus>,
    notices: broadcast::Sender<ControllerNotice>,
}

impl ControllerHandle {
    /// Validate `config` and spawn the controller task
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(
        config: ControllerConfig,
        capture: Arc<dyn MediaCapture>,
        engines: Arc<dyn EngineFactory>,
    ) -> Result<Self> {
        config.validate()?;

        let (inbox, inbox_rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(ControllerStatus::idle());
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);

        let controller = NegotiationController::new(
            config,
            capture,
            engines,
            inbox.downgrade(),
            status_tx,
            notices.clone(),
        );
        tokio::spawn(run(controller, inbox_rx));

        Ok(Self {
            inbox,
            status,
            notices,
        })
    }

    /// Begin a host session, replacing any live one
    pub async fn start(&self) -> Result<()> {
        self.command(Command::Start).await
    }

    /// Begin a guest session, replacing any live one
    pub async fn join(&self) -> Result<()> {
        self.command(Command::Join).await
    }

    pub async fn offer_received(&self, token: impl Into<String>) -> Result<()> {
        self.command(Command::OfferReceived(token.into())).await
    }

    pub async fn guest_scanned(&self) -> Result<()> {
        self.command(Command::GuestScanned).await
    }

    pub async fn answer_received(&self, token: impl Into<String>) -> Result<()> {
        self.command(Command::AnswerReceived(token.into())).await
    }

    /// Submit manually pasted text; short input is ignored
    pub async fn paste(&self, text: impl Into<String>) -> Result<()> {
        self.command(Command::Paste(text.into())).await
    }

    /// Tear down any live session; safe to call in any phase
    pub async fn end(&self) -> Result<()> {
        self.command(Command::End).await
    }

    /// Recover from a failure by returning to `Idle`
    pub async fn retry(&self) -> Result<()> {
        self.end().await
    }

    pub fn status(&self) -> ControllerStatus {
        self.status.borrow().clone()
    }

    pub fn phase(&self) -> NegotiationPhase {
        self.status.borrow().phase
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ControllerNotice> {
        self.notices.subscribe()
    }

    /// Wait until the controller reports `phase`
    ///
    /// Returns `None` if `timeout` elapses first or the controller stops.
    pub async fn wait_for_phase(
        &self,
        phase: NegotiationPhase,
        timeout: Duration,
    ) -> Option<ControllerStatus> {
        let mut status = self.status.clone();
        let waited = tokio::time::timeout(timeout, async move {
            status
                .wait_for(|current| current.phase == phase)
                .await
                .map(|current| current.clone())
        })
        .await;

        match waited {
            Ok(Ok(current)) => Some(current),
            Ok(Err(_)) => None,
            Err(_) => {
                debug!("Timed out after {:?} waiting for {}", timeout, phase);
                None
            }
        }
    }

    /// End any live session and stop the controller task
    pub async fn shutdown(&self) {
        let (reply, done) = oneshot::channel();
        if self.inbox.send(ControllerInput::Shutdown { reply }).is_ok() {
            let _ = done.await;
        }
    }

    /// False once `shutdown` has returned or the task has exited
    pub fn is_running(&self) -> bool {
        !self.inbox.is_closed()
    }

    async fn command(&self, command: Command) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.inbox
            .send(ControllerInput::Command { command, reply })
            .map_err(|_| SessionError::ControllerClosed)?;
        response.await.map_err(|_| SessionError::ControllerClosed)?
    }
}

async fn run(
    mut controller: NegotiationController,
    mut inbox: mpsc::UnboundedReceiver<ControllerInput>,
) {
    info!("Negotiation controller started");
    while let Some(input) = inbox.recv().await {
        if matches!(input, ControllerInput::Shutdown { .. }) {
            // Closed before the reply so `is_running` is false once it lands.
            inbox.close();
            controller.handle_input(input).await;
            info!("Negotiation controller stopped");
            return;
        }
        controller.handle_input(input).await;
    }

    debug!("Every handle dropped, releasing the live session");
    controller.shutdown().await;
    info!("Negotiation controller stopped");
}

//! Per-session cancellable timers
//!
//! Each armed timer is a spawned sleep that posts a `Timer` input back to the
//! controller. Arming a kind again replaces the previous instance; a firing
//! only counts if its sequence number still matches the armed one. Timers
//! hold the inbox weakly and never keep a controller alive.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::events::ControllerInput;
use crate::types::SessionEpoch;

/// Timers a session can arm
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum TimerKind {
    /// Bounds candidate gathering
    GatherTimeout,
    /// Guest fallback for reaching Connected
    ConnectFallback,
    /// Second attempt at applying a remote answer
    AnswerRetry,
    /// Clears a transient warning
    WarningDismiss,
}

struct ArmedTimer {
    seq: u64,
    handle: JoinHandle<()>,
}

pub(crate) struct TimerSet {
    epoch: SessionEpoch,
    inbox: mpsc::WeakUnboundedSender<ControllerInput>,
    next_seq: u64,
    armed: HashMap<TimerKind, ArmedTimer>,
}

impl TimerSet {
    pub(crate) fn new(
        epoch: SessionEpoch,
        inbox: mpsc::WeakUnboundedSender<ControllerInput>,
    ) -> Self {
        Self {
            epoch,
            inbox,
            next_seq: 0,
            armed: HashMap::new(),
        }
    }

    /// Arm `kind` to fire after `delay`, replacing any armed instance
    pub(crate) fn arm(&mut self, kind: TimerKind, delay: Duration) {
        self.cancel(kind);
        self.next_seq += 1;
        let seq = self.next_seq;
        let epoch = self.epoch;
        let inbox = self.inbox.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inbox) = inbox.upgrade() {
                let _ = inbox.send(ControllerInput::Timer { epoch, kind, seq });
            }
        });
        trace!("Armed {:?} #{} for {} in {:?}", kind, seq, epoch, delay);
        self.armed.insert(kind, ArmedTimer { seq, handle });
    }

    pub(crate) fn cancel(&mut self, kind: TimerKind) -> bool {
        match self.armed.remove(&kind) {
            Some(timer) => {
                timer.handle.abort();
                true
            }
            None => false,
        }
    }

    pub(crate) fn cancel_all(&mut self) -> usize {
        let count = self.armed.len();
        for (_, timer) in self.armed.drain() {
            timer.handle.abort();
        }
        count
    }

    /// Consume a firing; true only for the currently armed instance
    pub(crate) fn take_fired(&mut self, kind: TimerKind, seq: u64) -> bool {
        match self.armed.get(&kind) {
            Some(timer) if timer.seq == seq => {
                self.armed.remove(&kind);
                true
            }
            _ => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_armed(&self, kind: TimerKind) -> bool {
        self.armed.contains_key(&kind)
    }

    #[cfg(test)]
    pub(crate) fn armed_count(&self) -> usize {
        self.armed.len()
    }
}

impl Drop for TimerSet {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

//! Per-pane recompute timers.
//!
//! A timer is a tokio task that sleeps and then posts a [`TimerFired`]
//! message back to the session's channel; the session applies it on its
//! own task. Each pane has at most one pending timer. Scheduling a new one
//! cancels the old task, and the generation counter rejects a message the
//! old task had already sent.

use crate::pane::Pane;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    /// Waiting for upstream input to settle before recomputing.
    Debounce,
    /// Results are ready; holding the completion notice until the
    /// latency budget is used up.
    Settle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    pub pane: Pane,
    pub phase: TimerPhase,
    pub generation: u64,
}

#[derive(Debug)]
struct PendingTimer {
    phase: TimerPhase,
    generation: u64,
    cancellation_token: CancellationToken,
}

#[derive(Debug)]
pub struct PaneTimer {
    pane: Pane,
    generation: u64,
    pending: Option<PendingTimer>,
    sender: mpsc::UnboundedSender<TimerFired>,
    runtime: Handle,
}

impl PaneTimer {
    /// Create a timer whose tasks run on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime. Scheduling later works
    /// from any thread.
    pub fn new(pane: Pane, sender: mpsc::UnboundedSender<TimerFired>) -> Self {
        Self::with_runtime(pane, sender, Handle::current())
    }

    pub fn with_runtime(pane: Pane, sender: mpsc::UnboundedSender<TimerFired>, runtime: Handle) -> Self {
        Self {
            pane,
            generation: 0,
            pending: None,
            sender,
            runtime,
        }
    }

    /// Replace any pending timer with one firing `phase` after `delay`.
    pub fn schedule(&mut self, phase: TimerPhase, delay: Duration) -> u64 {
        self.cancel();
        self.generation += 1;

        let fired = TimerFired {
            pane: self.pane,
            phase,
            generation: self.generation,
        };
        let cancellation_token = CancellationToken::new();
        let token = cancellation_token.clone();
        let sender = self.sender.clone();

        self.runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    log::debug!("⏱️ {} {:?} timer #{} cancelled", fired.pane, fired.phase, fired.generation);
                }
                _ = tokio::time::sleep(delay) => {
                    if sender.send(fired).is_err() {
                        log::debug!("⏱️ {} timer fired after session closed", fired.pane);
                    }
                }
            }
        });

        self.pending = Some(PendingTimer {
            phase,
            generation: self.generation,
            cancellation_token,
        });
        self.generation
    }

    /// Cancel the pending timer, if any. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.cancellation_token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn pending_phase(&self) -> Option<TimerPhase> {
        self.pending.as_ref().map(|p| p.phase)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Consume `fired` if it belongs to the pending timer.
    ///
    /// Returns false for messages from cancelled or replaced timers.
    pub fn accept(&mut self, fired: &TimerFired) -> bool {
        let current = self
            .pending
            .as_ref()
            .map(|p| p.generation == fired.generation && p.phase == fired.phase)
            .unwrap_or(false);

        if current && fired.pane == self.pane {
            self.pending = None;
            true
        } else {
            log::debug!(
                "⏱️ {} ignoring stale {:?} timer #{}",
                self.pane,
                fired.phase,
                fired.generation
            );
            false
        }
    }
}

impl Drop for PaneTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

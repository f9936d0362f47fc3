//! The three-pane coordinator.
//!
//! A [`Session`] owns the item, action and modifier panes, applies inbound
//! operations to them, and carries selection changes downstream. Timer
//! messages arrive on a channel and are applied on the session's own task,
//! so pane state is only ever touched from one place.

use crate::command::Command;
use crate::config::SearchConfig;
use crate::context::SearchContext;
use crate::element::Element;
use crate::pane::third::{resolve_target, ModifierTarget};
use crate::pane::{FirstPane, Pane, PaneChange, SecondPane, ThirdPane, TimerOutcome};
use crate::timer::{TimerFired, TimerPhase};
use crate::universe::Universe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Outbound events for whoever presents the panes.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    SearchStarted {
        pane: Pane,
        /// True when an upstream pane caused the search.
        upstream: bool,
    },
    SearchFinished {
        pane: Pane,
        selection_changed: bool,
        query_changed: bool,
        selection: Option<Element>,
        query: String,
    },
    SelectionChanged {
        pane: Pane,
    },
}

enum Inbound {
    Command(Option<Command>),
    Timer(TimerFired),
}

pub struct Session {
    config: SearchConfig,
    first: FirstPane,
    second: SecondPane,
    third: ThirdPane,
    focus: Pane,
    timer_receiver: mpsc::UnboundedReceiver<TimerFired>,
    outbox: Vec<Notification>,
}

impl Session {
    /// Timers run on the tokio runtime current at construction, so the
    /// synchronous operations may then be called from anywhere.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(universe: Arc<dyn Universe>, config: SearchConfig) -> Self {
        let (timer_sender, timer_receiver) = mpsc::unbounded_channel();
        Self {
            first: FirstPane::new(universe.clone()),
            second: SecondPane::new(universe.clone(), &config, timer_sender.clone()),
            third: ThirdPane::new(universe, &config, timer_sender),
            config,
            focus: Pane::First,
            timer_receiver,
            outbox: Vec::new(),
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn first(&self) -> &FirstPane {
        &self.first
    }

    pub fn second(&self) -> &SecondPane {
        &self.second
    }

    pub fn third(&self) -> &ThirdPane {
        &self.third
    }

    pub fn focused(&self) -> Pane {
        self.focus
    }

    pub fn focus(&mut self, pane: Pane) {
        self.focus = pane;
    }

    /// Notifications emitted since the last call, oldest first.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.outbox)
    }

    // ---- Inbound operations -------------------------------------------------

    pub fn append_char(&mut self, pane: Pane, c: char) -> bool {
        let change = match pane {
            Pane::First => self.first.append_char(c),
            Pane::Second => {
                self.resolve_second();
                self.second.append_char(c)
            }
            Pane::Third => {
                self.resolve_third();
                self.third.append_char(c)
            }
        };
        self.complete(pane, Some(change))
    }

    pub fn delete_char(&mut self, pane: Pane) -> bool {
        let change = match pane {
            Pane::First => self.first.delete_char(),
            Pane::Second => {
                self.resolve_second();
                self.second.delete_char()
            }
            Pane::Third => {
                self.resolve_third();
                self.third.delete_char()
            }
        };
        self.complete(pane, change)
    }

    /// Enter or leave explicit text mode. The action pane has none.
    pub fn set_text_mode(&mut self, pane: Pane, enabled: bool) -> bool {
        let change = match pane {
            Pane::First => self.first.set_text_mode(enabled),
            Pane::Second => None,
            Pane::Third => {
                self.resolve_third();
                self.third.set_text_mode(enabled)
            }
        };
        self.complete(pane, change)
    }

    /// Toggle a secondary cursor. Only the item pane multi-selects.
    pub fn toggle_secondary_selection(&mut self, pane: Pane, index: usize) -> bool {
        let change = match pane {
            Pane::First => self.first.toggle_secondary(index),
            Pane::Second | Pane::Third => None,
        };
        self.complete(pane, change)
    }

    pub fn drill_into_children(&mut self, pane: Pane) -> bool {
        let change = match pane {
            Pane::First => self.first.drill_into_children(),
            Pane::Second => {
                self.resolve_second();
                self.second.drill_into_children()
            }
            Pane::Third => {
                self.resolve_third();
                self.third.drill_into_children()
            }
        };
        self.complete(pane, change)
    }

    pub fn drill_to_parent(&mut self, pane: Pane) -> bool {
        let change = match pane {
            Pane::First => self.first.drill_to_parent(),
            Pane::Second => {
                self.resolve_second();
                self.second.drill_to_parent()
            }
            Pane::Third => {
                self.resolve_third();
                self.third.drill_to_parent()
            }
        };
        self.complete(pane, change)
    }

    pub fn move_cursor(&mut self, pane: Pane, delta: isize) -> bool {
        let change = match pane {
            Pane::First => self.first.move_cursor(delta),
            Pane::Second => {
                self.resolve_second();
                self.second.move_cursor(delta)
            }
            Pane::Third => {
                self.resolve_third();
                self.third.move_cursor(delta)
            }
        };
        self.complete(pane, Some(change))
    }

    pub fn set_cursor(&mut self, pane: Pane, index: isize) -> bool {
        let change = match pane {
            Pane::First => self.first.set_cursor(index),
            Pane::Second => {
                self.resolve_second();
                self.second.set_cursor(index)
            }
            Pane::Third => {
                self.resolve_third();
                self.third.set_cursor(index)
            }
        };
        self.complete(pane, Some(change))
    }

    /// Clear `pane` and every pane downstream of it.
    pub fn reset(&mut self, pane: Pane) -> bool {
        log::debug!("Session: reset {}", pane);
        if pane == Pane::First {
            let change = self.first.reset();
            self.announce(Pane::First, change);
        }
        if pane != Pane::Third {
            let change = self.second.reset();
            self.announce(Pane::Second, change);
        }
        let change = self.third.reset();
        self.announce(Pane::Third, change);
        true
    }

    /// Apply a command to the focused pane.
    pub fn execute(&mut self, command: &Command) -> bool {
        let pane = self.focus;
        match command {
            Command::NextPane => {
                self.focus = pane.next();
                true
            }
            Command::PreviousPane => {
                self.focus = pane.previous();
                true
            }
            Command::FocusPane(target) => {
                self.focus = *target;
                true
            }
            Command::Input(c) => self.append_char(pane, *c),
            Command::Backspace => self.delete_char(pane),
            Command::TextModeOn => self.set_text_mode(pane, true),
            Command::TextModeOff => self.set_text_mode(pane, false),
            Command::ToggleTextMode => {
                let enabled = !self.explicit_text_mode(pane);
                self.set_text_mode(pane, enabled)
            }
            Command::ToggleSecondary => {
                let cursor = self.context(pane).cursor();
                self.toggle_secondary_selection(pane, cursor)
            }
            Command::ToggleSecondaryAt(index) => self.toggle_secondary_selection(pane, *index),
            Command::DrillIn => self.drill_into_children(pane),
            Command::DrillOut => self.drill_to_parent(pane),
            Command::Reset => self.reset(pane),
            Command::Up => self.move_cursor(pane, -1),
            Command::Down => self.move_cursor(pane, 1),
            Command::Select(index) => self.set_cursor(pane, *index as isize),
            Command::Sequence(commands) => commands
                .iter()
                .fold(true, |succeeded, command| self.execute(command) && succeeded),
        }
    }

    // ---- Reads --------------------------------------------------------------

    /// Current selection of `pane`, recomputing first if it is pending.
    pub fn selection(&mut self, pane: Pane) -> Option<Element> {
        self.resolve(pane);
        self.context(pane).selection().cloned()
    }

    /// Current results of `pane`, recomputing first if they are pending.
    pub fn results(&mut self, pane: Pane) -> Vec<Element> {
        self.resolve(pane);
        self.context(pane).results().to_vec()
    }

    /// Results as they stand, without forcing pending work.
    pub fn peek_results(&self, pane: Pane) -> &[Element] {
        self.context(pane).results()
    }

    pub fn query(&self, pane: Pane) -> &str {
        self.context(pane).query()
    }

    pub fn secondary(&self, pane: Pane) -> &[Element] {
        self.context(pane).secondary()
    }

    pub fn text_mode(&self, pane: Pane) -> bool {
        match pane {
            Pane::First => self.first.text_mode(),
            Pane::Second => false,
            Pane::Third => self.third.text_mode(),
        }
    }

    pub fn explicit_text_mode(&self, pane: Pane) -> bool {
        match pane {
            Pane::First => self.first.explicit_text_mode(),
            Pane::Second => false,
            Pane::Third => self.third.explicit_text_mode(),
        }
    }

    /// True while `pane` has a recompute or announcement outstanding.
    pub fn is_pending(&self, pane: Pane) -> bool {
        match pane {
            Pane::First => false,
            Pane::Second => self.second.is_pending(),
            Pane::Third => self.third.is_pending(),
        }
    }

    pub fn has_pending_timers(&self) -> bool {
        self.second.is_pending() || self.third.is_pending()
    }

    pub fn context(&self, pane: Pane) -> &SearchContext {
        match pane {
            Pane::First => self.first.context(),
            Pane::Second => self.second.context(),
            Pane::Third => self.third.context(),
        }
    }

    /// The action the modifier pane would serve right now.
    pub fn modifier_target(&self) -> Option<ModifierTarget> {
        let first_full = self.first.full_selection();
        resolve_target(self.first.selection(), &first_full, self.second.peek_selection())
    }

    // ---- Timers -------------------------------------------------------------

    /// Apply a timer message. Returns false when it was stale.
    pub fn handle_timer(&mut self, fired: TimerFired) -> bool {
        match fired.pane {
            Pane::First => false,
            Pane::Second => {
                let upstream = self.first.full_selection();
                match self.second.on_timer(&fired, &upstream) {
                    TimerOutcome::Stale | TimerOutcome::Deferred => false,
                    TimerOutcome::Recomputed(_) => {
                        self.schedule_third();
                        true
                    }
                    TimerOutcome::Finished(change) => {
                        if fired.phase == TimerPhase::Debounce {
                            self.schedule_third();
                        }
                        self.announce(Pane::Second, change);
                        true
                    }
                }
            }
            Pane::Third => {
                let target = self.modifier_target();
                let settling = self.second.needs_recompute();
                match self.third.on_timer(&fired, target, settling) {
                    TimerOutcome::Stale => false,
                    TimerOutcome::Deferred => true,
                    TimerOutcome::Recomputed(change) | TimerOutcome::Finished(change) => {
                        self.announce(Pane::Third, change);
                        true
                    }
                }
            }
        }
    }

    /// Apply every timer message already delivered. Returns how many were
    /// accepted.
    pub fn pump_timers(&mut self) -> usize {
        let mut accepted = 0;
        while let Ok(fired) = self.timer_receiver.try_recv() {
            if self.handle_timer(fired) {
                accepted += 1;
            }
        }
        accepted
    }

    /// Wait for the next timer message.
    pub async fn next_timer(&mut self) -> Option<TimerFired> {
        self.timer_receiver.recv().await
    }

    /// Let every pending timer run to completion.
    pub async fn settle(&mut self) {
        while self.has_pending_timers() {
            match self.timer_receiver.recv().await {
                Some(fired) => {
                    self.handle_timer(fired);
                }
                None => break,
            }
        }
    }

    /// Apply timer messages as they arrive for `duration`.
    pub async fn run_for(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while let Ok(Some(fired)) = tokio::time::timeout_at(deadline, self.timer_receiver.recv()).await {
            self.handle_timer(fired);
        }
    }

    /// Drive the session from a command channel until it closes.
    ///
    /// Notifications are forwarded as they are produced.
    pub async fn run(
        &mut self,
        mut commands: mpsc::Receiver<Command>,
        notifications: mpsc::UnboundedSender<Notification>,
    ) {
        log::info!("🔎 Session loop started");
        loop {
            let inbound = tokio::select! {
                command = commands.recv() => Inbound::Command(command),
                Some(fired) = self.timer_receiver.recv() => Inbound::Timer(fired),
            };

            match inbound {
                Inbound::Command(Some(command)) => {
                    log::debug!("🔎 Session: {}", command.to_string());
                    self.execute(&command);
                }
                Inbound::Command(None) => break,
                Inbound::Timer(fired) => {
                    self.handle_timer(fired);
                }
            }

            for notification in self.take_notifications() {
                if notifications.send(notification).is_err() {
                    log::debug!("🔎 Session: notification receiver gone");
                }
            }
        }
        log::info!("🔎 Session loop finished");
    }

    // ---- Internals ----------------------------------------------------------

    fn resolve(&mut self, pane: Pane) {
        match pane {
            Pane::First => {}
            Pane::Second => self.resolve_second(),
            Pane::Third => self.resolve_third(),
        }
    }

    /// Run the action pane's pending work now.
    fn resolve_second(&mut self) {
        let recomputing = self.second.needs_recompute();
        let upstream = self.first.full_selection();
        if let Some(change) = self.second.fast_search(&upstream) {
            if recomputing {
                self.schedule_third();
            }
            self.announce(Pane::Second, change);
        }
    }

    /// Bring the action pane and then the modifier pane up to date.
    fn resolve_third(&mut self) {
        self.resolve_second();
        let target = self.modifier_target();
        if let Some(change) = self.third.flush(target) {
            self.announce(Pane::Third, change);
        }
    }

    fn schedule_third(&mut self) {
        self.third.upstream_changed();
        self.outbox.push(Notification::SearchStarted {
            pane: Pane::Third,
            upstream: true,
        });
    }

    /// The item pane's selection changed.
    fn propagate(&mut self, pane: Pane) {
        match pane {
            Pane::First => {
                self.second.upstream_changed(Instant::now());
                self.outbox.push(Notification::SearchStarted {
                    pane: Pane::Second,
                    upstream: true,
                });
                self.schedule_third();
            }
            Pane::Second => self.schedule_third(),
            Pane::Third => {}
        }
    }

    /// Finish a synchronous operation on `pane`; `None` means it was
    /// rejected and nothing changed.
    fn complete(&mut self, pane: Pane, change: Option<PaneChange>) -> bool {
        let Some(change) = change else {
            log::debug!("Session: operation on {} rejected", pane);
            return false;
        };
        self.outbox.push(Notification::SearchStarted {
            pane,
            upstream: false,
        });
        self.announce(pane, change);
        if change.selection_changed {
            self.propagate(pane);
        }
        true
    }

    fn announce(&mut self, pane: Pane, change: PaneChange) {
        let context = self.context(pane);
        let finished = Notification::SearchFinished {
            pane,
            selection_changed: change.selection_changed,
            query_changed: change.query_changed,
            selection: context.selection().cloned(),
            query: context.query().to_string(),
        };
        self.outbox.push(finished);
        if change.selection_changed {
            self.outbox.push(Notification::SelectionChanged { pane });
        }
    }
}

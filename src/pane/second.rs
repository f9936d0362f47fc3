//! The action pane.
//!
//! Shows what can be done with the item pane's selection: actions that
//! support the selected item(s), or items an already selected action
//! supports. Upstream changes are debounced, and the completion notice
//! is held back so fast recomputes appear with a steady latency while
//! slow ones are announced as soon as they finish.

use super::{search_universe, track, PaneChange, TimerOutcome};
use crate::config::SearchConfig;
use crate::context::{ContextChain, SearchContext};
use crate::element::{kinds, Element, ElementKind, KindSet};
use crate::timer::{PaneTimer, TimerFired, TimerPhase};
use crate::universe::Universe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// How long to hold a completion notice, given the time already spent
/// since the upstream change. `None` means announce immediately.
pub fn settle_delay(elapsed: Duration, ceiling: Duration) -> Option<Duration> {
    if elapsed >= ceiling {
        None
    } else {
        Some(ceiling - elapsed)
    }
}

/// Kinds the action pane searches for, given the upstream primary selection.
pub fn kinds_for_upstream(upstream: &Element) -> KindSet {
    if upstream.kind.is_action() {
        kinds(&[ElementKind::Item])
    } else {
        kinds(&[ElementKind::Action])
    }
}

pub struct SecondPane {
    universe: Arc<dyn Universe>,
    chain: ContextChain,
    timer: PaneTimer,
    debounce: Duration,
    ceiling: Duration,
    /// Upstream selection the current results were computed against.
    upstream: Vec<Element>,
    upstream_changed_at: Option<Instant>,
    /// Change made by the last recompute, reported when its notice is sent.
    unannounced: Option<PaneChange>,
    recomputes: u64,
}

impl SecondPane {
    pub fn new(
        universe: Arc<dyn Universe>,
        config: &SearchConfig,
        timer_sender: mpsc::UnboundedSender<TimerFired>,
    ) -> Self {
        Self {
            universe,
            chain: ContextChain::new(kinds(&[ElementKind::Action])),
            timer: PaneTimer::new(super::Pane::Second, timer_sender),
            debounce: config.second_pane_debounce(),
            ceiling: config.second_pane_ceiling(),
            upstream: Vec::new(),
            upstream_changed_at: None,
            unannounced: None,
            recomputes: 0,
        }
    }

    pub fn context(&self) -> &SearchContext {
        self.chain.context()
    }

    pub fn chain(&self) -> &ContextChain {
        &self.chain
    }

    /// Current selection without forcing a pending recompute.
    pub fn peek_selection(&self) -> Option<&Element> {
        self.chain.context().selection()
    }

    pub fn upstream(&self) -> &[Element] {
        &self.upstream
    }

    /// Number of recomputes performed, for diagnostics.
    pub fn recomputes(&self) -> u64 {
        self.recomputes
    }

    pub fn is_pending(&self) -> bool {
        self.timer.is_pending()
    }

    /// True while a debounced recompute has not run yet.
    pub fn needs_recompute(&self) -> bool {
        self.timer.pending_phase() == Some(TimerPhase::Debounce)
    }

    /// The item pane's selection changed: restart the debounce window.
    pub fn upstream_changed(&mut self, now: Instant) {
        self.upstream_changed_at = Some(now);
        self.unannounced = None;
        self.timer.schedule(TimerPhase::Debounce, self.debounce);
        log::debug!("Second pane: upstream changed, recompute in {:?}", self.debounce);
    }

    /// Deliver a timer message.
    ///
    /// `upstream` is the item pane's selection as of now. The time spent
    /// since the upstream change is measured once the recompute is done,
    /// so a slow recompute is announced without further waiting.
    pub fn on_timer(&mut self, fired: &TimerFired, upstream: &[Element]) -> TimerOutcome {
        if !self.timer.accept(fired) {
            return TimerOutcome::Stale;
        }

        match fired.phase {
            TimerPhase::Debounce => {
                let change = self.recompute(upstream);
                let elapsed = self
                    .upstream_changed_at
                    .map(|at| Instant::now().saturating_duration_since(at))
                    .unwrap_or(self.ceiling);

                match settle_delay(elapsed, self.ceiling) {
                    None => {
                        log::debug!("Second pane: slow recompute ({:?}), finishing now", elapsed);
                        TimerOutcome::Finished(change)
                    }
                    Some(remaining) => {
                        self.unannounced = Some(change);
                        self.timer.schedule(TimerPhase::Settle, remaining);
                        TimerOutcome::Recomputed(change)
                    }
                }
            }
            TimerPhase::Settle => TimerOutcome::Finished(self.unannounced.take().unwrap_or_default()),
        }
    }

    /// Run a pending recompute immediately.
    ///
    /// Cancels whatever timer is pending, so its message becomes stale.
    /// Returns the change to announce, or `None` when nothing was pending.
    pub fn fast_search(&mut self, upstream: &[Element]) -> Option<PaneChange> {
        match self.timer.pending_phase()? {
            TimerPhase::Debounce => {
                self.timer.cancel();
                log::debug!("Second pane: fast search");
                Some(self.recompute(upstream))
            }
            TimerPhase::Settle => {
                self.timer.cancel();
                Some(self.unannounced.take().unwrap_or_default())
            }
        }
    }

    /// Rebuild the chain from scratch against `upstream`.
    ///
    /// With no upstream selection the previous results are kept.
    fn recompute(&mut self, upstream: &[Element]) -> PaneChange {
        let Some(primary) = upstream.first() else {
            log::debug!("Second pane: no upstream selection, keeping results");
            return PaneChange::default();
        };

        let start = std::time::Instant::now();
        self.recomputes += 1;
        self.upstream = upstream.to_vec();
        let kinds = kinds_for_upstream(primary);
        let universe = self.universe.as_ref();
        let anchors = &self.upstream;

        let change = track(&mut self.chain, |chain| {
            chain.reset(kinds);
            let context = chain.context_mut();
            let results = search(universe, anchors, "", context.kinds(), None);
            context.set_results(results);
            true
        })
        .unwrap_or_default();

        log::debug!(
            "Second pane: recomputed for '{}' -> {} results in {:?}",
            primary.name,
            self.chain.context().results().len(),
            start.elapsed()
        );
        change
    }

    pub fn append_char(&mut self, c: char) -> PaneChange {
        let universe = self.universe.as_ref();
        let anchors = &self.upstream;
        track(&mut self.chain, |chain| {
            chain.append_char(c, |query, kinds, candidates| {
                search(universe, anchors, query, kinds, candidates)
            });
            true
        })
        .unwrap_or_default()
    }

    pub fn delete_char(&mut self) -> Option<PaneChange> {
        track(&mut self.chain, |chain| chain.delete_char())
    }

    pub fn drill_into_children(&mut self) -> Option<PaneChange> {
        let selection = self.peek_selection()?.clone();
        let children = self.universe.children(&selection);
        let kinds = self.chain.context().kinds().clone();
        let universe = self.universe.as_ref();
        let anchors = &self.upstream;
        track(&mut self.chain, |chain| {
            chain.drill_into(children, kinds, |query, kinds, candidates| {
                search(universe, anchors, query, kinds, candidates)
            })
        })
    }

    pub fn drill_to_parent(&mut self) -> Option<PaneChange> {
        track(&mut self.chain, |chain| chain.drill_to_parent())
    }

    pub fn set_cursor(&mut self, index: isize) -> PaneChange {
        track(&mut self.chain, |chain| {
            chain.context_mut().set_cursor(index);
            true
        })
        .unwrap_or_default()
    }

    pub fn move_cursor(&mut self, delta: isize) -> PaneChange {
        track(&mut self.chain, |chain| {
            chain.context_mut().move_cursor(delta);
            true
        })
        .unwrap_or_default()
    }

    /// Clear the pane and drop any pending work.
    pub fn reset(&mut self) -> PaneChange {
        self.timer.cancel();
        self.upstream.clear();
        self.upstream_changed_at = None;
        self.unannounced = None;
        track(&mut self.chain, |chain| {
            chain.reset(kinds(&[ElementKind::Action]));
            true
        })
        .unwrap_or_default()
    }
}

/// Search rule of the action pane.
///
/// The universe narrows to objects compatible with the primary upstream
/// selection; with several items selected, an action must support all
/// of them.
fn search(
    universe: &dyn Universe,
    upstream: &[Element],
    query: &str,
    kinds: &KindSet,
    candidates: Option<&[Element]>,
) -> Vec<Element> {
    let Some(primary) = upstream.first() else {
        return Vec::new();
    };

    let mut results = search_universe(universe, query, kinds, candidates, Some(primary));
    if primary.kind.is_item_like() && upstream.len() > 1 {
        results.retain(|action| {
            upstream[1..]
                .iter()
                .all(|item| universe.supports_item(action, item))
        });
    }
    results
}

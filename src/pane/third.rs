//! The modifier pane.
//!
//! Offers the extra argument an action takes: a recipient, a destination,
//! a new name. Which action that is depends on both upstream panes, so
//! the pane recomputes a short fixed delay after either of them changes.

use super::{search_universe, track, Pane, PaneChange, TimerOutcome};
use crate::config::SearchConfig;
use crate::context::{ContextChain, SearchContext};
use crate::element::{kinds, Element, ElementKind, KindSet};
use crate::scorer;
use crate::timer::{PaneTimer, TimerFired, TimerPhase};
use crate::universe::Universe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// The action a modifier is chosen for, with the items it acts on.
#[derive(Debug, Clone, PartialEq)]
pub struct ModifierTarget {
    pub action: Element,
    pub items: Vec<Element>,
}

/// Work out which action the modifier pane serves.
///
/// An action picked in the item pane acts on the action pane's selection;
/// otherwise the action pane's selection acts on everything selected in
/// the item pane.
pub fn resolve_target(
    first_primary: Option<&Element>,
    first_full: &[Element],
    second_primary: Option<&Element>,
) -> Option<ModifierTarget> {
    match (first_primary, second_primary) {
        (Some(action), _) if action.kind.is_action() => Some(ModifierTarget {
            action: action.clone(),
            items: second_primary.into_iter().cloned().collect(),
        }),
        (_, Some(action)) if action.kind.is_action() => Some(ModifierTarget {
            action: action.clone(),
            items: first_full.to_vec(),
        }),
        _ => None,
    }
}

pub struct ThirdPane {
    universe: Arc<dyn Universe>,
    chain: ContextChain,
    timer: PaneTimer,
    delay: Duration,
    target: Option<ModifierTarget>,
    /// Kinds the current action accepts; empty when it takes no modifier.
    modifier_kinds: KindSet,
    explicit_text_mode: bool,
    recomputes: u64,
}

impl ThirdPane {
    pub fn new(
        universe: Arc<dyn Universe>,
        config: &SearchConfig,
        timer_sender: mpsc::UnboundedSender<TimerFired>,
    ) -> Self {
        Self {
            universe,
            chain: ContextChain::new(KindSet::new()),
            timer: PaneTimer::new(Pane::Third, timer_sender),
            delay: config.third_pane_delay(),
            target: None,
            modifier_kinds: KindSet::new(),
            explicit_text_mode: false,
            recomputes: 0,
        }
    }

    pub fn context(&self) -> &SearchContext {
        self.chain.context()
    }

    pub fn chain(&self) -> &ContextChain {
        &self.chain
    }

    pub fn selection(&self) -> Option<&Element> {
        self.chain.context().selection()
    }

    pub fn target(&self) -> Option<&ModifierTarget> {
        self.target.as_ref()
    }

    pub fn modifier_kinds(&self) -> &KindSet {
        &self.modifier_kinds
    }

    pub fn recomputes(&self) -> u64 {
        self.recomputes
    }

    pub fn is_pending(&self) -> bool {
        self.timer.is_pending()
    }

    pub fn explicit_text_mode(&self) -> bool {
        self.explicit_text_mode
    }

    pub fn implicit_text_mode(&self) -> bool {
        let results = self.chain.context().results();
        !self.explicit_text_mode && results.len() == 1 && results[0].is_text()
    }

    pub fn text_mode(&self) -> bool {
        self.explicit_text_mode || self.implicit_text_mode()
    }

    /// An upstream pane changed: recompute after the fixed delay.
    pub fn upstream_changed(&mut self) {
        self.timer.schedule(TimerPhase::Debounce, self.delay);
        log::debug!("Third pane: upstream changed, recompute in {:?}", self.delay);
    }

    /// Deliver a timer message.
    ///
    /// While the action pane is still waiting out its own debounce the
    /// recompute is skipped; that pane's recompute reschedules this one.
    pub fn on_timer(
        &mut self,
        fired: &TimerFired,
        target: Option<ModifierTarget>,
        upstream_settling: bool,
    ) -> TimerOutcome {
        if !self.timer.accept(fired) {
            return TimerOutcome::Stale;
        }
        if upstream_settling {
            log::debug!("Third pane: action pane still settling, deferring");
            return TimerOutcome::Deferred;
        }
        TimerOutcome::Finished(self.recompute(target))
    }

    /// Run a pending recompute now. `None` when nothing was pending.
    pub fn flush(&mut self, target: Option<ModifierTarget>) -> Option<PaneChange> {
        if !self.timer.cancel() {
            return None;
        }
        log::debug!("Third pane: fast search");
        Some(self.recompute(target))
    }

    /// Start over for `target`. Without a target the results are kept.
    fn recompute(&mut self, target: Option<ModifierTarget>) -> PaneChange {
        let Some(target) = target else {
            log::debug!("Third pane: no action upstream, keeping results");
            return PaneChange::default();
        };

        self.recomputes += 1;
        self.modifier_kinds = self.universe.modifier_kinds(&target.action);
        self.explicit_text_mode = false;
        self.target = Some(target);

        let universe = self.universe.as_ref();
        let target = self.target.as_ref();
        let kinds = self.modifier_kinds.clone();
        let change = track(&mut self.chain, |chain| {
            chain.reset(kinds);
            let context = chain.context_mut();
            let results = search(universe, target, false, "", context.kinds(), None);
            context.set_results(results);
            true
        })
        .unwrap_or_default();

        log::debug!(
            "Third pane: {} modifiers for '{}'",
            self.chain.context().results().len(),
            self.target.as_ref().map(|t| t.action.name.as_str()).unwrap_or("")
        );
        change
    }

    pub fn append_char(&mut self, c: char) -> PaneChange {
        let universe = self.universe.as_ref();
        let target = self.target.as_ref();
        let text_only = self.explicit_text_mode;
        track(&mut self.chain, |chain| {
            chain.append_char(c, |query, kinds, candidates| {
                search(universe, target, text_only, query, kinds, candidates)
            });
            true
        })
        .unwrap_or_default()
    }

    pub fn delete_char(&mut self) -> Option<PaneChange> {
        track(&mut self.chain, |chain| chain.delete_char())
    }

    /// Switch explicit text mode. Only actions that take text allow it.
    pub fn set_text_mode(&mut self, enabled: bool) -> Option<PaneChange> {
        if enabled == self.explicit_text_mode {
            return None;
        }
        if enabled && !self.modifier_kinds.contains(&ElementKind::Text) {
            log::debug!("Third pane: action takes no text, text mode refused");
            return None;
        }

        self.explicit_text_mode = enabled;
        let kinds = if enabled {
            kinds(&[ElementKind::Text])
        } else {
            self.modifier_kinds.clone()
        };

        let universe = self.universe.as_ref();
        let target = self.target.as_ref();
        let change = track(&mut self.chain, |chain| {
            chain.rebuild(kinds, |query, kinds, candidates| {
                search(universe, target, enabled, query, kinds, candidates)
            });
            true
        });
        Some(change.unwrap_or_default())
    }

    pub fn drill_into_children(&mut self) -> Option<PaneChange> {
        let selection = self.selection()?.clone();
        let children = self.universe.children(&selection);
        let kinds = self.chain.context().kinds().clone();
        let universe = self.universe.as_ref();
        let target = self.target.as_ref();
        let text_only = self.explicit_text_mode;
        track(&mut self.chain, |chain| {
            chain.drill_into(children, kinds, |query, kinds, candidates| {
                search(universe, target, text_only, query, kinds, candidates)
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

    pub fn reset(&mut self) -> PaneChange {
        self.timer.cancel();
        self.target = None;
        self.modifier_kinds = KindSet::new();
        self.explicit_text_mode = false;
        track(&mut self.chain, |chain| {
            chain.reset(KindSet::new());
            true
        })
        .unwrap_or_default()
    }
}

/// Search rule of the modifier pane.
///
/// Universe objects the action accepts, the action's own dynamic
/// modifiers, and, for actions that take text, the query itself.
fn search(
    universe: &dyn Universe,
    target: Option<&ModifierTarget>,
    text_only: bool,
    query: &str,
    kinds: &KindSet,
    candidates: Option<&[Element]>,
) -> Vec<Element> {
    let Some(target) = target else {
        return Vec::new();
    };
    if kinds.is_empty() {
        return Vec::new();
    }
    let text = (!query.is_empty() && kinds.contains(&ElementKind::Text)).then(|| Element::text(query));
    if text_only {
        return text.into_iter().collect();
    }

    let mut pool: Vec<Element> = search_universe(universe, query, kinds, candidates, None)
        .into_iter()
        .filter(|modifier| {
            universe.supports_modifier_item_for_items(&target.action, &target.items, modifier)
        })
        .collect();

    for dynamic in universe.dynamic_modifier_items(&target.action, &target.items) {
        if !pool.contains(&dynamic) {
            pool.push(dynamic);
        }
    }
    if let Some(text) = text {
        if !pool.contains(&text) {
            pool.push(text);
        }
    }

    scorer::rank(pool, query)
}

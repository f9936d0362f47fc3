//! The item pane.
//!
//! Searches items and actions together. Every keystroke is searched
//! synchronously, continuing from the previous keystroke's results.

use super::{search_universe, track, PaneChange};
use crate::context::{ContextChain, SearchContext};
use crate::element::{kinds, Element, ElementKind, KindSet};
use crate::universe::Universe;
use std::sync::Arc;

pub fn default_kinds() -> KindSet {
    kinds(&[ElementKind::Item, ElementKind::Action])
}

fn text_kinds() -> KindSet {
    kinds(&[ElementKind::Text])
}

pub struct FirstPane {
    universe: Arc<dyn Universe>,
    chain: ContextChain,
    explicit_text_mode: bool,
    /// Kind filter to restore when explicit text mode ends.
    saved_kinds: Option<KindSet>,
    /// Kind filter in force before the first secondary cursor was added.
    multi_select_kinds: Option<KindSet>,
}

impl FirstPane {
    pub fn new(universe: Arc<dyn Universe>) -> Self {
        Self {
            universe,
            chain: ContextChain::new(default_kinds()),
            explicit_text_mode: false,
            saved_kinds: None,
            multi_select_kinds: None,
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

    /// Primary selection plus secondary selections.
    pub fn full_selection(&self) -> Vec<Element> {
        self.chain.context().full_selection()
    }

    pub fn explicit_text_mode(&self) -> bool {
        self.explicit_text_mode
    }

    /// A lone text result the user did not ask for.
    pub fn implicit_text_mode(&self) -> bool {
        let results = self.chain.context().results();
        !self.explicit_text_mode && results.len() == 1 && results[0].is_text()
    }

    pub fn text_mode(&self) -> bool {
        self.explicit_text_mode || self.implicit_text_mode()
    }

    pub fn append_char(&mut self, c: char) -> PaneChange {
        let universe = self.universe.as_ref();
        let multi_select_kinds = &mut self.multi_select_kinds;
        track(&mut self.chain, |chain| {
            let was_multi_selecting = !chain.context().secondary().is_empty();
            chain.append_char(c, |query, kinds, candidates| {
                search(universe, query, kinds, candidates)
            });
            // The new query may have filtered every secondary cursor away.
            if was_multi_selecting && chain.context().secondary().is_empty() {
                let kinds = multi_select_kinds.take().unwrap_or_else(default_kinds);
                widen(universe, chain, kinds);
            }
            true
        })
        .unwrap_or_default()
    }

    pub fn delete_char(&mut self) -> Option<PaneChange> {
        track(&mut self.chain, |chain| chain.delete_char())
    }

    pub fn set_text_mode(&mut self, enabled: bool) -> Option<PaneChange> {
        if enabled == self.explicit_text_mode {
            return None;
        }

        let kinds = if enabled {
            let current = self.chain.context();
            // Replaying from the level root drops secondary cursors, so
            // remember the filter from before multi-selection began.
            let restore = if current.secondary().is_empty() {
                current.kinds().clone()
            } else {
                self.multi_select_kinds.take().unwrap_or_else(default_kinds)
            };
            self.saved_kinds = Some(restore);
            text_kinds()
        } else {
            self.saved_kinds.take().unwrap_or_else(default_kinds)
        };
        self.explicit_text_mode = enabled;
        log::debug!("First pane: text mode {} (kinds {:?})", enabled, kinds);

        let universe = self.universe.as_ref();
        let change = track(&mut self.chain, |chain| {
            chain.rebuild(kinds, |query, kinds, candidates| {
                search(universe, query, kinds, candidates)
            });
            true
        });
        Some(change.unwrap_or_default())
    }

    /// Toggle the secondary cursor on `results[index]`.
    ///
    /// Only items can be multi-selected. Adding the first secondary cursor
    /// narrows the pane to items so the selection downstream panes see is
    /// consistent; removing the last one restores the earlier filter.
    pub fn toggle_secondary(&mut self, index: usize) -> Option<PaneChange> {
        let context = self.chain.context();
        let eligible = context
            .results()
            .get(index)
            .map(|e| e.kind.can_multi_select())
            .unwrap_or(false);
        if !eligible {
            return None;
        }
        let first_secondary = context.secondary().is_empty();

        let universe = self.universe.as_ref();
        let multi_select_kinds = &mut self.multi_select_kinds;
        track(&mut self.chain, |chain| {
            let context = chain.context_mut();
            if !context.toggle_secondary(index) {
                return false;
            }
            if context.secondary().is_empty() {
                let kinds = multi_select_kinds.take().unwrap_or_else(default_kinds);
                log::debug!("First pane: last secondary cursor removed, back to {:?}", kinds);
                widen(universe, chain, kinds);
            } else if first_secondary {
                *multi_select_kinds = Some(context.kinds().clone());
                let narrowed: KindSet = context
                    .kinds()
                    .iter()
                    .copied()
                    .filter(|k| k.can_multi_select())
                    .collect();
                let candidates = context.results().to_vec();
                let results = search(universe, context.query(), &narrowed, Some(&candidates));
                log::debug!(
                    "First pane: first secondary cursor, narrowed to {:?} ({} results)",
                    narrowed,
                    results.len()
                );
                context.refilter(narrowed, results);
            }
            true
        })
    }

    pub fn drill_into_children(&mut self) -> Option<PaneChange> {
        let selection = self.selection()?.clone();
        let children = self.universe.children(&selection);
        let universe = self.universe.as_ref();
        track(&mut self.chain, |chain| {
            chain.drill_into(children, default_kinds(), |query, kinds, candidates| {
                search(universe, query, kinds, candidates)
            })
        })
    }

    pub fn drill_to_parent(&mut self) -> Option<PaneChange> {
        track(&mut self.chain, |chain| chain.drill_to_parent())
    }

    pub fn reset(&mut self) -> PaneChange {
        self.explicit_text_mode = false;
        self.saved_kinds = None;
        self.multi_select_kinds = None;
        track(&mut self.chain, |chain| {
            chain.reset(default_kinds());
            true
        })
        .unwrap_or_default()
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
}

/// Recompute the head context under a wider kind filter. The narrowed
/// results are no use as candidates, so the search restarts from the
/// level's scope.
fn widen(universe: &dyn Universe, chain: &mut ContextChain, kinds: KindSet) {
    let scope = chain.level_scope().map(|scope| scope.to_vec());
    let query = chain.context().query().to_string();
    let results = search(universe, &query, &kinds, scope.as_deref());
    chain.context_mut().refilter(kinds, results);
}

/// Search rule of the item pane.
///
/// Nothing is shown before the first keystroke at the top level. In text
/// mode the query itself is the only result, and a query that matches
/// nothing is offered as text.
fn search(
    universe: &dyn Universe,
    query: &str,
    kinds: &KindSet,
    candidates: Option<&[Element]>,
) -> Vec<Element> {
    if *kinds == text_kinds() {
        return if query.is_empty() {
            Vec::new()
        } else {
            vec![Element::text(query)]
        };
    }
    if query.is_empty() && candidates.is_none() {
        return Vec::new();
    }

    let results = search_universe(universe, query, kinds, candidates, None);
    if results.is_empty() && !query.is_empty() {
        return vec![Element::text(query)];
    }
    results
}

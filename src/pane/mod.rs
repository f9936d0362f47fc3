//! Pane controllers.
//!
//! Each pane owns a [`ContextChain`](crate::context::ContextChain) and
//! decides how its results are computed. Panes never talk to each other;
//! the [`Session`](crate::session::Session) reads one pane's selection and
//! hands it to the next.

use crate::context::{ContextChain, ContextSnapshot};
use crate::element::{Element, KindSet};
use crate::universe::Universe;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

pub mod first;
pub mod second;
pub mod third;

pub use first::FirstPane;
pub use second::SecondPane;
pub use third::ThirdPane;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pane {
    First,
    Second,
    Third,
}

impl Pane {
    pub const ALL: [Pane; 3] = [Pane::First, Pane::Second, Pane::Third];

    pub fn next(self) -> Pane {
        match self {
            Pane::First => Pane::Second,
            Pane::Second => Pane::Third,
            Pane::Third => Pane::First,
        }
    }

    pub fn previous(self) -> Pane {
        match self {
            Pane::First => Pane::Third,
            Pane::Second => Pane::First,
            Pane::Third => Pane::Second,
        }
    }

    pub fn number(self) -> usize {
        match self {
            Pane::First => 1,
            Pane::Second => 2,
            Pane::Third => 3,
        }
    }

    pub fn from_string(s: &str) -> Result<Pane, String> {
        match s.trim().to_lowercase().as_str() {
            "1" | "first" | "item" => Ok(Pane::First),
            "2" | "second" | "action" => Ok(Pane::Second),
            "3" | "third" | "modifier" => Ok(Pane::Third),
            other => Err(format!("Unknown pane: {}", other)),
        }
    }
}

impl fmt::Display for Pane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pane {}", self.number())
    }
}

/// What an accepted pane operation changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaneChange {
    pub selection_changed: bool,
    pub query_changed: bool,
}

impl PaneChange {
    pub fn between(before: &ContextSnapshot, after: &ContextSnapshot) -> Self {
        Self {
            selection_changed: before.selection_differs(after),
            query_changed: before.query_differs(after),
        }
    }

    pub fn merge(self, other: PaneChange) -> PaneChange {
        PaneChange {
            selection_changed: self.selection_changed || other.selection_changed,
            query_changed: self.query_changed || other.query_changed,
        }
    }
}

/// Result of delivering a timer message to a pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    /// The message belonged to a superseded timer and was ignored.
    Stale,
    /// Results were recomputed; completion will be announced later.
    Recomputed(PaneChange),
    /// The pane's search is complete.
    Finished(PaneChange),
    /// The pane could not run yet because its upstream is still settling.
    Deferred,
}

/// Apply `operation` to `chain` and report what it changed, or `None` if
/// the operation was rejected.
pub(crate) fn track<F>(chain: &mut ContextChain, operation: F) -> Option<PaneChange>
where
    F: FnOnce(&mut ContextChain) -> bool,
{
    let before = chain.context().snapshot();
    if !operation(chain) {
        return None;
    }
    let after = chain.context().snapshot();
    Some(PaneChange::between(&before, &after))
}

/// Query the universe, absorbing failures into an empty result set.
pub(crate) fn search_universe(
    universe: &dyn Universe,
    query: &str,
    kinds: &KindSet,
    candidates: Option<&[Element]>,
    anchor: Option<&Element>,
) -> Vec<Element> {
    let start = Instant::now();
    let candidates: Option<Vec<Element>> =
        candidates.map(|c| c.iter().filter(|e| !e.is_text()).cloned().collect());

    match universe.search(query, kinds, candidates.as_deref(), anchor) {
        Ok(results) => {
            log::debug!(
                "Search: '{}' kinds={:?} candidates={:?} anchor={:?} -> {} results in {:?}",
                query,
                kinds,
                candidates.as_ref().map(|c| c.len()),
                anchor.map(|a| &a.name),
                results.len(),
                start.elapsed()
            );
            results
        }
        Err(error) => {
            log::warn!("Search: universe failed for '{}': {}", query, error);
            Vec::new()
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::element::ElementKind;
    use crate::error::UniverseError;

    /// A universe whose searches always fail.
    pub(crate) struct BrokenUniverse;

    impl Universe for BrokenUniverse {
        fn search(
            &self,
            _query: &str,
            _kinds: &KindSet,
            _candidates: Option<&[Element]>,
            _anchor: Option<&Element>,
        ) -> Result<Vec<Element>, UniverseError> {
            Err(UniverseError::Unavailable("index offline".to_string()))
        }

        fn children(&self, _element: &Element) -> Vec<Element> {
            Vec::new()
        }

        fn supports_item(&self, _action: &Element, _item: &Element) -> bool {
            true
        }

        fn modifier_kinds(&self, _action: &Element) -> KindSet {
            KindSet::new()
        }

        fn supports_modifier_item_for_items(
            &self,
            _action: &Element,
            _items: &[Element],
            _modifier: &Element,
        ) -> bool {
            false
        }

        fn dynamic_modifier_items(&self, _action: &Element, _items: &[Element]) -> Vec<Element> {
            Vec::new()
        }
    }

    #[test]
    fn test_pane_cycle() {
        assert_eq!(Pane::First.next(), Pane::Second);
        assert_eq!(Pane::Third.next(), Pane::First);
        assert_eq!(Pane::First.previous(), Pane::Third);
    }

    #[test]
    fn test_pane_parsing() {
        assert_eq!(Pane::from_string("2").unwrap(), Pane::Second);
        assert_eq!(Pane::from_string("Modifier").unwrap(), Pane::Third);
        assert!(Pane::from_string("4").is_err());
    }

    #[test]
    fn test_failed_search_is_empty() {
        let results = search_universe(
            &BrokenUniverse,
            "cal",
            &crate::element::kinds(&[ElementKind::Item]),
            None,
            None,
        );
        assert!(results.is_empty());
    }

    #[test]
    fn test_text_candidates_are_not_forwarded() {
        let catalog = crate::universe::tests::test_catalog();
        let candidates = vec![
            Element::text("ca"),
            catalog.get("app.calendar").unwrap().clone(),
        ];
        let results = search_universe(
            &catalog,
            "cal",
            &crate::element::kinds(&[ElementKind::Item, ElementKind::Text]),
            Some(&candidates),
            None,
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Calendar");
    }
}

//! Search contexts and the per-pane context chain.
//!
//! A [`SearchContext`] is one pane's state after a particular edit. The
//! [`ContextChain`] keeps every context that is still reachable in an
//! arena: the head is always the last record, and `previous`/`parent`
//! links only ever point at earlier records. Popping back along either
//! link truncates the arena, so an undo lands on the very record that was
//! current before the edit.

use crate::element::{Element, ElementId, KindSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContextId(usize);

/// What a pane reports as "changed" is decided by comparing snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSnapshot {
    pub query: String,
    pub kinds: KindSet,
    pub selection: Option<ElementId>,
    pub secondary: Vec<ElementId>,
}

impl ContextSnapshot {
    pub fn selection_differs(&self, other: &ContextSnapshot) -> bool {
        self.selection != other.selection || self.secondary != other.secondary
    }

    pub fn query_differs(&self, other: &ContextSnapshot) -> bool {
        self.query != other.query || self.kinds != other.kinds
    }
}

#[derive(Debug, Clone)]
pub struct SearchContext {
    query: String,
    kinds: KindSet,
    results: Vec<Element>,
    cursor: usize,
    secondary: Vec<Element>,
    /// Candidate set of a drilled-in level; only set on the level's root.
    scope: Option<Vec<Element>>,
    previous: Option<ContextId>,
    parent: Option<ContextId>,
}

impl SearchContext {
    pub fn new(kinds: KindSet) -> Self {
        Self {
            query: String::new(),
            kinds,
            results: Vec::new(),
            cursor: 0,
            secondary: Vec::new(),
            scope: None,
            previous: None,
            parent: None,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn kinds(&self) -> &KindSet {
        &self.kinds
    }

    pub fn results(&self) -> &[Element] {
        &self.results
    }

    /// Replace the results, resetting the cursor and dropping secondary
    /// cursors that are no longer among them.
    pub fn set_results(&mut self, results: Vec<Element>) {
        self.results = results;
        self.cursor = 0;
        let results = &self.results;
        self.secondary.retain(|element| results.contains(element));
    }

    /// Replace the results under a narrower kind filter, keeping the
    /// primary selection when it survives.
    pub fn refilter(&mut self, kinds: KindSet, results: Vec<Element>) {
        let selected = self.selection().cloned();
        self.kinds = kinds;
        self.set_results(results);
        if let Some(selected) = selected {
            if let Some(position) = self.results.iter().position(|e| *e == selected) {
                self.cursor = position;
            }
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the primary cursor, clamped to the result range.
    pub fn set_cursor(&mut self, cursor: isize) {
        let last = self.results.len().saturating_sub(1);
        self.cursor = if cursor <= 0 {
            0
        } else {
            (cursor as usize).min(last)
        };
    }

    pub fn move_cursor(&mut self, delta: isize) {
        self.set_cursor(self.cursor as isize + delta);
    }

    pub fn selection(&self) -> Option<&Element> {
        self.results.get(self.cursor)
    }

    pub fn secondary(&self) -> &[Element] {
        &self.secondary
    }

    /// Toggle the secondary cursor on `results[index]`.
    ///
    /// Returns false when `index` is out of range.
    pub fn toggle_secondary(&mut self, index: usize) -> bool {
        let Some(element) = self.results.get(index) else {
            return false;
        };
        if let Some(position) = self.secondary.iter().position(|s| s == element) {
            self.secondary.remove(position);
        } else {
            self.secondary.push(element.clone());
        }
        true
    }

    /// The primary selection followed by every secondary selection.
    pub fn full_selection(&self) -> Vec<Element> {
        let mut selection: Vec<Element> = self.selection().into_iter().cloned().collect();
        for element in &self.secondary {
            if !selection.contains(element) {
                selection.push(element.clone());
            }
        }
        selection
    }

    pub fn previous(&self) -> Option<ContextId> {
        self.previous
    }

    pub fn parent(&self) -> Option<ContextId> {
        self.parent
    }

    pub fn snapshot(&self) -> ContextSnapshot {
        ContextSnapshot {
            query: self.query.clone(),
            kinds: self.kinds.clone(),
            selection: self.selection().map(|e| e.id.clone()),
            secondary: self.secondary.iter().map(|e| e.id.clone()).collect(),
        }
    }

    /// Candidates a continuation search from this context should use.
    fn continuation_candidates(&self) -> Option<&[Element]> {
        if self.query.is_empty() {
            self.scope.as_deref()
        } else {
            Some(&self.results)
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContextChain {
    arena: Vec<SearchContext>,
}

impl ContextChain {
    pub fn new(kinds: KindSet) -> Self {
        Self {
            arena: vec![SearchContext::new(kinds)],
        }
    }

    pub fn head_id(&self) -> ContextId {
        ContextId(self.arena.len() - 1)
    }

    pub fn context(&self) -> &SearchContext {
        &self.arena[self.arena.len() - 1]
    }

    pub fn context_mut(&mut self) -> &mut SearchContext {
        let head = self.arena.len() - 1;
        &mut self.arena[head]
    }

    pub fn get(&self, id: ContextId) -> Option<&SearchContext> {
        self.arena.get(id.0)
    }

    /// Number of live contexts across both link axes.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Push a context whose query is the current one plus `c`.
    ///
    /// `search` receives the new query, the kind filter, and the
    /// candidates to continue from: the current results once something
    /// has been typed, the drilled-in child set at a level root, or
    /// `None` to scan the whole universe.
    pub fn append_char<F>(&mut self, c: char, search: F)
    where
        F: FnOnce(&str, &KindSet, Option<&[Element]>) -> Vec<Element>,
    {
        let previous_id = self.head_id();
        let head = self.context();

        let mut query = head.query.clone();
        query.extend(c.to_lowercase());
        let kinds = head.kinds.clone();
        let results = search(&query, &kinds, head.continuation_candidates());

        let mut next = SearchContext::new(kinds);
        next.query = query;
        next.secondary = head.secondary.clone();
        next.previous = Some(previous_id);
        next.parent = head.parent;
        next.set_results(results);

        self.arena.push(next);
    }

    /// Pop back to the context one edit ago; false at a level root.
    pub fn delete_char(&mut self) -> bool {
        match self.context().previous {
            Some(previous) => {
                self.arena.truncate(previous.0 + 1);
                true
            }
            None => false,
        }
    }

    /// Enter a child search scoped to `children`.
    ///
    /// Returns false, leaving the chain untouched, when there are no
    /// children.
    pub fn drill_into<F>(&mut self, children: Vec<Element>, kinds: KindSet, search: F) -> bool
    where
        F: FnOnce(&str, &KindSet, Option<&[Element]>) -> Vec<Element>,
    {
        if children.is_empty() {
            return false;
        }

        let results = search("", &kinds, Some(&children));
        let mut child = SearchContext::new(kinds);
        child.scope = Some(children);
        child.parent = Some(self.head_id());
        child.set_results(results);

        self.arena.push(child);
        true
    }

    /// Return to the context the current level was drilled from,
    /// discarding the whole child chain.
    pub fn drill_to_parent(&mut self) -> bool {
        match self.context().parent {
            Some(parent) => {
                self.arena.truncate(parent.0 + 1);
                true
            }
            None => false,
        }
    }

    /// Candidate set of the current drill level, `None` at the top level.
    pub fn level_scope(&self) -> Option<&[Element]> {
        let mut root = self.head_id();
        while let Some(previous) = self.arena[root.0].previous {
            root = previous;
        }
        self.arena[root.0].scope.as_deref()
    }

    pub fn reset(&mut self, kinds: KindSet) {
        self.arena.clear();
        self.arena.push(SearchContext::new(kinds));
    }

    /// Rebuild the current level under a new kind filter by replaying its
    /// query one character at a time from the level root.
    pub fn rebuild<F>(&mut self, kinds: KindSet, mut search: F)
    where
        F: FnMut(&str, &KindSet, Option<&[Element]>) -> Vec<Element>,
    {
        let query = self.context().query.clone();

        let mut root = self.head_id();
        while let Some(previous) = self.arena[root.0].previous {
            root = previous;
        }
        self.arena.truncate(root.0 + 1);

        let level_root = self.context_mut();
        level_root.kinds = kinds;
        let results = search("", &level_root.kinds, level_root.scope.as_deref());
        level_root.set_results(results);

        for c in query.chars() {
            self.append_char(c, &mut search);
        }
    }
}

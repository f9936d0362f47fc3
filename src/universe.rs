//! The object universe boundary.
//!
//! Panes never own objects; they ask a [`Universe`] for ranked candidates
//! and for the action-compatibility facts they need. [`Catalog`] is an
//! in-memory universe loaded from JSON.

use crate::element::{Element, ElementId, ElementKind, KindSet};
use crate::error::{Result, TrisearchError, UniverseError};
use crate::scorer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Built-in catalog used when no universe file is given.
pub const SAMPLE_CATALOG: &str = include_str!("../data/sample_catalog.json");

/// Category an action lists to accept every item.
const ANY_CATEGORY: &str = "*";

/// Implicit category of free-text objects.
const TEXT_CATEGORY: &str = "text";

pub trait Universe: Send + Sync {
    /// Rank objects of the allowed `kinds` against `query`.
    ///
    /// When `candidates` is given only those objects are considered. When
    /// `anchor` is given, results are first narrowed to objects compatible
    /// with it: actions that support an item anchor, or items supported by
    /// an action anchor. Results are sorted and zero-truncated as
    /// [`scorer::rank`] does.
    fn search(
        &self,
        query: &str,
        kinds: &KindSet,
        candidates: Option<&[Element]>,
        anchor: Option<&Element>,
    ) -> std::result::Result<Vec<Element>, UniverseError>;

    /// Contained objects of `element`; empty when it has none.
    fn children(&self, element: &Element) -> Vec<Element>;

    fn supports_item(&self, action: &Element, item: &Element) -> bool;

    /// Kinds `action` accepts as a modifier; empty means no third pane.
    fn modifier_kinds(&self, action: &Element) -> KindSet;

    fn supports_modifier_item_for_items(
        &self,
        action: &Element,
        items: &[Element],
        modifier: &Element,
    ) -> bool;

    /// Modifier objects the action manufactures on the fly.
    fn dynamic_modifier_items(&self, action: &Element, items: &[Element]) -> Vec<Element>;
}

/// One object in a [`Catalog`], with the action facts attached to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub element: Element,
    #[serde(default)]
    pub children: Vec<String>,
    /// Item categories this action accepts (`"*"` for all).
    #[serde(default)]
    pub supports: Vec<String>,
    #[serde(default)]
    pub modifier_kinds: Vec<ElementKind>,
    #[serde(default)]
    pub modifier_categories: Vec<String>,
    #[serde(default)]
    pub dynamic_modifiers: Vec<String>,
}

impl CatalogEntry {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            children: Vec::new(),
            supports: Vec::new(),
            modifier_kinds: Vec::new(),
            modifier_categories: Vec::new(),
            dynamic_modifiers: Vec::new(),
        }
    }

    pub fn item(id: &str, name: &str, categories: &[&str]) -> Self {
        Self::new(Element::new(id, name, ElementKind::Item).with_categories(categories))
    }

    pub fn action(id: &str, name: &str, supports: &[&str]) -> Self {
        let mut entry = Self::new(Element::new(id, name, ElementKind::Action));
        entry.supports = supports.iter().map(|s| s.to_string()).collect();
        entry
    }

    pub fn with_children(mut self, children: &[&str]) -> Self {
        self.children = children.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_modifiers(mut self, kinds: &[ElementKind], categories: &[&str]) -> Self {
        self.modifier_kinds = kinds.to_vec();
        self.modifier_categories = categories.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_dynamic_modifiers(mut self, names: &[&str]) -> Self {
        self.dynamic_modifiers = names.iter().map(|n| n.to_string()).collect();
        self
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    elements: Vec<CatalogEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<ElementId, usize>,
}

impl Catalog {
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Result<Self> {
        let mut index = HashMap::new();
        for (position, entry) in entries.iter().enumerate() {
            if index.insert(entry.element.id.clone(), position).is_some() {
                return Err(TrisearchError::Catalog(format!(
                    "duplicate element id '{}'",
                    entry.element.id
                )));
            }
        }

        for entry in &entries {
            for child in &entry.children {
                if !index.contains_key(&ElementId(child.clone())) {
                    return Err(TrisearchError::Catalog(format!(
                        "element '{}' lists unknown child '{}'",
                        entry.element.id, child
                    )));
                }
            }
        }

        log::debug!("Catalog: indexed {} elements", entries.len());
        Ok(Self { entries, index })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::from_entries(file.elements)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn sample() -> Result<Self> {
        Self::from_json(SAMPLE_CATALOG)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Element> {
        self.entry(&ElementId(id.to_string())).map(|e| &e.element)
    }

    fn entry(&self, id: &ElementId) -> Option<&CatalogEntry> {
        self.index.get(id).map(|position| &self.entries[*position])
    }

    fn categories_of(element: &Element) -> impl Iterator<Item = &str> {
        let text = element.is_text().then_some(TEXT_CATEGORY);
        element.categories.iter().map(String::as_str).chain(text)
    }

    fn compatible_with_anchor(&self, element: &Element, anchor: &Element) -> bool {
        if anchor.kind.is_action() {
            element.kind.is_item_like() && self.supports_item(anchor, element)
        } else {
            element.kind.is_action() && self.supports_item(element, anchor)
        }
    }
}

impl Universe for Catalog {
    fn search(
        &self,
        query: &str,
        kinds: &KindSet,
        candidates: Option<&[Element]>,
        anchor: Option<&Element>,
    ) -> std::result::Result<Vec<Element>, UniverseError> {
        let pool: Vec<Element> = match candidates {
            Some(candidates) => candidates.to_vec(),
            None => self.entries.iter().map(|e| e.element.clone()).collect(),
        };

        let filtered: Vec<Element> = pool
            .into_iter()
            .filter(|element| kinds.contains(&element.kind))
            .filter(|element| match anchor {
                Some(anchor) => self.compatible_with_anchor(element, anchor),
                None => true,
            })
            .collect();

        Ok(scorer::rank(filtered, query))
    }

    fn children(&self, element: &Element) -> Vec<Element> {
        self.entry(&element.id)
            .map(|entry| {
                entry
                    .children
                    .iter()
                    .filter_map(|child| self.entry(&ElementId(child.clone())))
                    .map(|child| child.element.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn supports_item(&self, action: &Element, item: &Element) -> bool {
        let Some(entry) = self.entry(&action.id) else {
            return false;
        };
        if entry.supports.iter().any(|s| s == ANY_CATEGORY) {
            return true;
        }
        Self::categories_of(item).any(|category| entry.supports.iter().any(|s| s == category))
    }

    fn modifier_kinds(&self, action: &Element) -> KindSet {
        self.entry(&action.id)
            .map(|entry| entry.modifier_kinds.iter().copied().collect())
            .unwrap_or_default()
    }

    fn supports_modifier_item_for_items(
        &self,
        action: &Element,
        items: &[Element],
        modifier: &Element,
    ) -> bool {
        let Some(entry) = self.entry(&action.id) else {
            return false;
        };
        if !entry.modifier_kinds.contains(&modifier.kind) || items.contains(modifier) {
            return false;
        }
        entry.modifier_categories.is_empty()
            || Self::categories_of(modifier)
                .any(|category| entry.modifier_categories.iter().any(|c| c == category))
    }

    fn dynamic_modifier_items(&self, action: &Element, _items: &[Element]) -> Vec<Element> {
        self.entry(&action.id)
            .map(|entry| {
                entry
                    .dynamic_modifiers
                    .iter()
                    .map(|name| {
                        Element::new(
                            format!("dynamic:{}:{}", action.id, name),
                            name.clone(),
                            ElementKind::Text,
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::element::kinds;

    /// A small universe shared by the pane and session unit tests.
    pub(crate) fn test_catalog() -> Catalog {
        Catalog::from_entries(vec![
            CatalogEntry::item("app.calculator", "Calculator", &["application"]),
            CatalogEntry::item("app.calendar", "Calendar", &["application"]),
            CatalogEntry::item("app.call", "Call Waiting", &["application"]),
            CatalogEntry::item("dir.music", "Music", &["folder"])
                .with_children(&["file.song", "file.album"]),
            CatalogEntry::item("file.song", "Song.ogg", &["file"]),
            CatalogEntry::item("file.album", "Album Cover.png", &["file"]),
            CatalogEntry::item("contact.ann", "Ann Smith", &["contact"]),
            CatalogEntry::action("act.run", "Run", &["application"]),
            CatalogEntry::action("act.open", "Open", &["file", "folder"]),
            CatalogEntry::action("act.email", "Email To", &["file"])
                .with_modifiers(&[ElementKind::Item], &["contact"]),
            CatalogEntry::action("act.rename", "Rename", &["file", "folder"])
                .with_modifiers(&[ElementKind::Text], &[])
                .with_dynamic_modifiers(&["New Name"]),
            CatalogEntry::action("act.search", "Search Web", &["text"]),
        ])
        .unwrap()
    }

    fn ids(elements: &[Element]) -> Vec<&str> {
        elements.iter().map(|e| e.id.0.as_str()).collect()
    }

    #[test]
    fn test_search_full_universe() {
        let catalog = test_catalog();
        let results = catalog
            .search("cal", &kinds(&[ElementKind::Item, ElementKind::Action]), None, None)
            .unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].id.0, "app.calendar");
    }

    #[test]
    fn test_search_respects_kinds() {
        let catalog = test_catalog();
        let results = catalog
            .search("", &kinds(&[ElementKind::Action]), None, None)
            .unwrap();
        assert!(results.iter().all(|e| e.kind == ElementKind::Action));
        assert_eq!(results.len(), 5);
    }

    #[test]
    fn test_search_within_candidates() {
        let catalog = test_catalog();
        let candidates = vec![catalog.get("app.call").unwrap().clone()];
        let results = catalog
            .search("c", &kinds(&[ElementKind::Item]), Some(&candidates), None)
            .unwrap();
        assert_eq!(ids(&results), vec!["app.call"]);
    }

    #[test]
    fn test_item_anchor_returns_supporting_actions() {
        let catalog = test_catalog();
        let song = catalog.get("file.song").unwrap().clone();
        let results = catalog
            .search("", &kinds(&[ElementKind::Action]), None, Some(&song))
            .unwrap();
        assert_eq!(ids(&results), vec!["act.open", "act.email", "act.rename"]);
    }

    #[test]
    fn test_action_anchor_returns_supported_items() {
        let catalog = test_catalog();
        let run = catalog.get("act.run").unwrap().clone();
        let results = catalog
            .search("", &kinds(&[ElementKind::Item]), None, Some(&run))
            .unwrap();
        assert_eq!(ids(&results), vec!["app.calculator", "app.calendar", "app.call"]);
    }

    #[test]
    fn test_text_is_supported_through_text_category() {
        let catalog = test_catalog();
        let search = catalog.get("act.search").unwrap().clone();
        let run = catalog.get("act.run").unwrap().clone();
        let text = Element::text("rust borrow checker");
        assert!(catalog.supports_item(&search, &text));
        assert!(!catalog.supports_item(&run, &text));
    }

    #[test]
    fn test_children() {
        let catalog = test_catalog();
        let music = catalog.get("dir.music").unwrap().clone();
        assert_eq!(ids(&catalog.children(&music)), vec!["file.song", "file.album"]);
        let song = catalog.get("file.song").unwrap().clone();
        assert!(catalog.children(&song).is_empty());
    }

    #[test]
    fn test_modifier_rules() {
        let catalog = test_catalog();
        let email = catalog.get("act.email").unwrap().clone();
        let song = catalog.get("file.song").unwrap().clone();
        let ann = catalog.get("contact.ann").unwrap().clone();
        let album = catalog.get("file.album").unwrap().clone();

        assert_eq!(catalog.modifier_kinds(&email), kinds(&[ElementKind::Item]));
        assert!(catalog.supports_modifier_item_for_items(&email, &[song.clone()], &ann));
        assert!(!catalog.supports_modifier_item_for_items(&email, &[song.clone()], &album));
        assert!(!catalog.supports_modifier_item_for_items(&email, &[ann.clone()], &ann));

        let run = catalog.get("act.run").unwrap().clone();
        assert!(catalog.modifier_kinds(&run).is_empty());
    }

    #[test]
    fn test_dynamic_modifiers() {
        let catalog = test_catalog();
        let rename = catalog.get("act.rename").unwrap().clone();
        let dynamic = catalog.dynamic_modifier_items(&rename, &[]);
        assert_eq!(dynamic.len(), 1);
        assert_eq!(dynamic[0].name, "New Name");
        assert!(dynamic[0].is_text());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = Catalog::from_entries(vec![
            CatalogEntry::item("a", "A", &[]),
            CatalogEntry::item("a", "Again", &[]),
        ]);
        assert!(matches!(result, Err(TrisearchError::Catalog(_))));
    }

    #[test]
    fn test_dangling_child_rejected() {
        let result = Catalog::from_entries(vec![
            CatalogEntry::item("a", "A", &[]).with_children(&["missing"]),
        ]);
        assert!(matches!(result, Err(TrisearchError::Catalog(_))));
    }

    #[test]
    fn test_json_catalog() {
        let json = r#"{
            "elements": [
                { "id": "app.term", "name": "Terminal", "kind": "item", "categories": ["application"] },
                { "id": "act.run", "name": "Run", "kind": "action", "supports": ["*"] }
            ]
        }"#;
        let catalog = Catalog::from_json(json).unwrap();
        assert_eq!(catalog.len(), 2);
        let run = catalog.get("act.run").unwrap().clone();
        let term = catalog.get("app.term").unwrap().clone();
        assert!(catalog.supports_item(&run, &term));
    }

    #[test]
    fn test_sample_catalog_loads() {
        let catalog = Catalog::sample().unwrap();
        assert!(!catalog.is_empty());
    }
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// The closed set of object kinds a pane can search for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Item,
    Action,
    Text,
}

impl ElementKind {
    /// Items and text can be acted upon.
    pub fn is_item_like(self) -> bool {
        matches!(self, ElementKind::Item | ElementKind::Text)
    }

    pub fn is_action(self) -> bool {
        self == ElementKind::Action
    }

    /// Only items may carry secondary cursors.
    pub fn can_multi_select(self) -> bool {
        self == ElementKind::Item
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Item => write!(f, "item"),
            ElementKind::Action => write!(f, "action"),
            ElementKind::Text => write!(f, "text"),
        }
    }
}

pub type KindSet = BTreeSet<ElementKind>;

/// Build a kind set from a slice.
pub fn kinds(list: &[ElementKind]) -> KindSet {
    list.iter().copied().collect()
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub String);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An object handle supplied by the universe.
///
/// Elements are treated as immutable values for the duration of a search;
/// two elements are the same object when their ids match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: ElementKind,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl Element {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            id: ElementId(id.into()),
            name: name.into(),
            description: String::new(),
            kind,
            categories: Vec::new(),
        }
    }

    /// A free-text pseudo-object carrying `text` as its name.
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut element = Self::new(format!("text:{}", text), text, ElementKind::Text);
        element.description = "Text".to_string();
        element
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_categories(mut self, categories: &[&str]) -> Self {
        self.categories = categories.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn is_text(&self) -> bool {
        self.kind == ElementKind::Text
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Element {}

impl std::hash::Hash for Element {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreeset;

    #[test]
    fn test_identity_is_by_id() {
        let a = Element::new("app.term", "Terminal", ElementKind::Item);
        let b = Element::new("app.term", "Renamed", ElementKind::Item);
        let c = Element::new("app.other", "Terminal", ElementKind::Item);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_text_element() {
        let text = Element::text("hello world");
        assert!(text.is_text());
        assert_eq!(text.name, "hello world");
        assert_eq!(text.id, ElementId("text:hello world".to_string()));
    }

    #[test]
    fn test_kind_capabilities() {
        assert!(ElementKind::Item.is_item_like());
        assert!(ElementKind::Text.is_item_like());
        assert!(!ElementKind::Action.is_item_like());
        assert!(ElementKind::Action.is_action());
        assert!(ElementKind::Item.can_multi_select());
        assert!(!ElementKind::Text.can_multi_select());
    }

    #[test]
    fn test_kinds_builds_set() {
        let set = kinds(&[ElementKind::Text, ElementKind::Item, ElementKind::Text]);
        assert_eq!(set, btreeset! {ElementKind::Item, ElementKind::Text});
    }

    #[test]
    fn test_kind_serde_names() {
        let json = serde_json::to_string(&ElementKind::Action).unwrap();
        assert_eq!(json, "\"action\"");
        let kind: ElementKind = serde_json::from_str("\"text\"").unwrap();
        assert_eq!(kind, ElementKind::Text);
    }
}

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;
use trisearch::error::UniverseError;
use trisearch::{Catalog, CatalogEntry, Element, ElementKind, KindSet, SearchConfig, Session, Universe};

/// Apps, a folder with two files, a contact, and actions over them.
pub fn catalog() -> Catalog {
    Catalog::from_entries(vec![
        CatalogEntry::item("app.calculator", "Calculator", &["application"]),
        CatalogEntry::item("app.calendar", "Calendar", &["application"]),
        CatalogEntry::item("app.call", "Call Waiting", &["application"]),
        CatalogEntry::item("dir.music", "Music", &["folder"]).with_children(&["file.song", "file.album"]),
        CatalogEntry::item("file.song", "Song.ogg", &["file"]),
        CatalogEntry::item("file.album", "Album Cover.png", &["file"]),
        CatalogEntry::item("contact.ann", "Ann Smith", &["contact"]),
        CatalogEntry::action("act.run", "Run", &["application"]),
        CatalogEntry::action("act.open", "Open", &["file", "folder"]),
        CatalogEntry::action("act.email", "Email To", &["file"]).with_modifiers(&[ElementKind::Item], &["contact"]),
        CatalogEntry::action("act.rename", "Rename", &["file", "folder"])
            .with_modifiers(&[ElementKind::Text], &[])
            .with_dynamic_modifiers(&["New Name"]),
        CatalogEntry::action("act.search", "Search Web", &["text"]),
    ])
    .expect("test catalog is valid")
}

pub fn session() -> Session {
    Session::new(Arc::new(catalog()), SearchConfig::default())
}

pub fn session_with(config: SearchConfig) -> Session {
    Session::new(Arc::new(catalog()), config)
}

pub fn names(elements: &[Element]) -> Vec<String> {
    elements.iter().map(|e| e.name.clone()).collect()
}

/// The test catalog, but every anchored search blocks for `delay`.
pub struct SlowUniverse {
    pub catalog: Catalog,
    pub delay: Duration,
}

impl Universe for SlowUniverse {
    fn search(
        &self,
        query: &str,
        kinds: &KindSet,
        candidates: Option<&[Element]>,
        anchor: Option<&Element>,
    ) -> Result<Vec<Element>, UniverseError> {
        if anchor.is_some() {
            std::thread::sleep(self.delay);
        }
        self.catalog.search(query, kinds, candidates, anchor)
    }

    fn children(&self, element: &Element) -> Vec<Element> {
        self.catalog.children(element)
    }

    fn supports_item(&self, action: &Element, item: &Element) -> bool {
        self.catalog.supports_item(action, item)
    }

    fn modifier_kinds(&self, action: &Element) -> KindSet {
        self.catalog.modifier_kinds(action)
    }

    fn supports_modifier_item_for_items(&self, action: &Element, items: &[Element], modifier: &Element) -> bool {
        self.catalog.supports_modifier_item_for_items(action, items, modifier)
    }

    fn dynamic_modifier_items(&self, action: &Element, items: &[Element]) -> Vec<Element> {
        self.catalog.dynamic_modifier_items(action, items)
    }
}

pub fn slow_session(delay: Duration) -> Session {
    let universe = SlowUniverse {
        catalog: catalog(),
        delay,
    };
    Session::new(Arc::new(universe), SearchConfig::default())
}

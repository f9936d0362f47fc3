//! Three-pane incremental search.
//!
//! The item pane searches objects as the user types, the action pane
//! offers what can be done with the selection, and the modifier pane
//! offers the extra argument the chosen action takes. A [`Session`]
//! coordinates the three over a pluggable [`Universe`].

pub mod cli;
pub mod command;
pub mod config;
pub mod context;
pub mod element;
pub mod error;
pub mod pane;
pub mod scorer;
pub mod script;
pub mod session;
pub mod timer;
pub mod universe;

pub use config::SearchConfig;
pub use element::{Element, ElementId, ElementKind, KindSet};
pub use error::{Result, TrisearchError};
pub use pane::Pane;
pub use session::{Notification, Session};
pub use universe::{Catalog, CatalogEntry, Universe};

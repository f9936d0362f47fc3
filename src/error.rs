use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrisearchError>;

#[derive(Debug, Error)]
pub enum TrisearchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Catalog error: {0}")]
    Catalog(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Command error: {0}")]
    Command(String),
    #[error("Script error: {0}")]
    Script(String),
}

/// Failure reported by a [`crate::universe::Universe`] implementation.
///
/// The search core never surfaces this to callers; a failed search is
/// treated as an empty result set.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UniverseError {
    #[error("universe unavailable: {0}")]
    Unavailable(String),
    #[error("search failed: {0}")]
    Failed(String),
}

impl From<String> for TrisearchError {
    fn from(error: String) -> Self {
        TrisearchError::Script(error)
    }
}

impl From<&str> for TrisearchError {
    fn from(error: &str) -> Self {
        TrisearchError::Script(error.to_string())
    }
}

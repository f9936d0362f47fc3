use crate::error::{Result, TrisearchError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Timing and behaviour knobs for a search session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Quiet period after an upstream change before the action pane
    /// recomputes.
    pub second_pane_debounce_ms: u64,
    /// Upper bound, measured from the upstream change, before the action
    /// pane announces its results.
    pub second_pane_ceiling_ms: u64,
    /// Fixed delay before the modifier pane recomputes.
    pub third_pane_delay_ms: u64,
    /// Character that switches the focused pane into text mode in
    /// interactive sessions.
    pub text_mode_trigger: char,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            second_pane_debounce_ms: 200,
            second_pane_ceiling_ms: 300,
            third_pane_delay_ms: 60,
            text_mode_trigger: '.',
        }
    }
}

impl SearchConfig {
    /// Load from a JSON file, or return the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path)?;
        let config: SearchConfig = serde_json::from_str(&content)?;
        config.validate()?;
        log::debug!("Config: loaded {:?} from {}", config, path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.second_pane_ceiling_ms < self.second_pane_debounce_ms {
            return Err(TrisearchError::Config(format!(
                "second_pane_ceiling_ms ({}) must not be below second_pane_debounce_ms ({})",
                self.second_pane_ceiling_ms, self.second_pane_debounce_ms
            )));
        }
        Ok(())
    }

    pub fn second_pane_debounce(&self) -> Duration {
        Duration::from_millis(self.second_pane_debounce_ms)
    }

    pub fn second_pane_ceiling(&self) -> Duration {
        Duration::from_millis(self.second_pane_ceiling_ms)
    }

    pub fn third_pane_delay(&self) -> Duration {
        Duration::from_millis(self.third_pane_delay_ms)
    }
}

use crate::pane::Pane;
use serde::{Deserialize, Serialize};

/// Operations a user can apply to the focused pane
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    // Focus
    NextPane,
    PreviousPane,
    FocusPane(Pane),

    // Query editing
    Input(char),
    Backspace,
    TextModeOn,
    TextModeOff,
    ToggleTextMode,

    // Selection
    Up,
    Down,
    Select(usize),
    ToggleSecondary,
    ToggleSecondaryAt(usize),

    // Hierarchy
    DrillIn,
    DrillOut,
    Reset,

    // Multi-step commands for testing
    Sequence(Vec<Command>),
}

impl Command {
    /// Parse a command from a string representation
    pub fn from_string(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "next_pane" | "tab" => Ok(Command::NextPane),
            "previous_pane" | "shift_tab" => Ok(Command::PreviousPane),

            "backspace" => Ok(Command::Backspace),
            "text_mode_on" => Ok(Command::TextModeOn),
            "text_mode_off" => Ok(Command::TextModeOff),
            "toggle_text_mode" => Ok(Command::ToggleTextMode),

            "up" => Ok(Command::Up),
            "down" => Ok(Command::Down),
            "toggle_secondary" | "space" => Ok(Command::ToggleSecondary),

            "drill_in" | "right" => Ok(Command::DrillIn),
            "drill_out" | "left" => Ok(Command::DrillOut),
            "reset" | "escape" => Ok(Command::Reset),

            _ => {
                if let Some(char_str) = s.strip_prefix("char:") {
                    let mut chars = char_str.chars();
                    if let (Some(ch), None) = (chars.next(), chars.next()) {
                        return Ok(Command::Input(ch));
                    }
                    return Err(format!("char: expects exactly one character, got '{}'", char_str));
                }

                if let Some(pane_str) = s.strip_prefix("pane:") {
                    return Pane::from_string(pane_str).map(Command::FocusPane);
                }

                if let Some(index_str) = s.strip_prefix("select:") {
                    return index_str
                        .parse::<usize>()
                        .map(Command::Select)
                        .map_err(|_| format!("Invalid index in '{}'", s));
                }

                if let Some(index_str) = s.strip_prefix("toggle_secondary:") {
                    return index_str
                        .parse::<usize>()
                        .map(Command::ToggleSecondaryAt)
                        .map_err(|_| format!("Invalid index in '{}'", s));
                }

                if s.starts_with("sequence:[") && s.ends_with(']') {
                    // Parse sequence: sequence:[cmd1,cmd2,cmd3]
                    let inner = &s[10..s.len() - 1];
                    if inner.is_empty() {
                        return Ok(Command::Sequence(vec![]));
                    }

                    let mut commands = Vec::new();
                    for cmd_str in inner.split(',') {
                        let cmd_str = cmd_str.trim();
                        match Command::from_string(cmd_str) {
                            Ok(cmd) => commands.push(cmd),
                            Err(e) => {
                                return Err(format!(
                                    "Invalid command in sequence '{}': {}",
                                    cmd_str, e
                                ))
                            }
                        }
                    }

                    return Ok(Command::Sequence(commands));
                }

                Err(format!("Unknown command: {}", s))
            }
        }
    }

    /// Convert command to string representation
    pub fn to_string(&self) -> String {
        match self {
            Command::NextPane => "next_pane".to_string(),
            Command::PreviousPane => "previous_pane".to_string(),
            Command::FocusPane(pane) => format!("pane:{}", pane.number()),

            Command::Input(ch) => format!("char:{}", ch),
            Command::Backspace => "backspace".to_string(),
            Command::TextModeOn => "text_mode_on".to_string(),
            Command::TextModeOff => "text_mode_off".to_string(),
            Command::ToggleTextMode => "toggle_text_mode".to_string(),

            Command::Up => "up".to_string(),
            Command::Down => "down".to_string(),
            Command::Select(index) => format!("select:{}", index),
            Command::ToggleSecondary => "toggle_secondary".to_string(),
            Command::ToggleSecondaryAt(index) => format!("toggle_secondary:{}", index),

            Command::DrillIn => "drill_in".to_string(),
            Command::DrillOut => "drill_out".to_string(),
            Command::Reset => "reset".to_string(),

            Command::Sequence(commands) => {
                format!(
                    "sequence:[{}]",
                    commands
                        .iter()
                        .map(|c| c.to_string())
                        .collect::<Vec<_>>()
                        .join(",")
                )
            }
        }
    }
}

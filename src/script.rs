use crate::command::Command;
use crate::error::{Result, TrisearchError};
use crate::pane::Pane;
use crate::session::Session;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};

/// Script file format for headless sessions
///
/// Format is a simple text file where each line represents a command:
/// - `pane:<n>` - Focus pane 1, 2 or 3
/// - `char:<c>` - Type a character into the focused pane
/// - `type:<text>` - Type every character of `text`
/// - `cmd:<command>` - Any command `Command::from_string` accepts
/// - `wait` - Let all pending timers run
/// - `wait:<ms>` - Let time pass, applying timers that fire meanwhile
/// - `assert:<pane>.<property>:<value>` - Assert pane state
/// - `# comment` - Comments (ignored)
/// - `immediate` - Don't settle timers between commands
/// - `settle_mode` - Settle timers after every command (default)
///
/// Assertion properties: `selection`, `query`, `count`, `results`
/// (comma separated names), `text_mode`, `secondary` (count), `pending`.
/// Reading `selection`, `count` or `results` forces a pending pane to
/// recompute, exactly as any other reader would; `pending` does not.
///
/// Examples:
/// ```text
/// # Pick an action for a file
/// type:song
/// assert:1.selection:Song.ogg
/// pane:2
/// cmd:down
/// assert:2.selection:Email To
/// assert:3.results:Ann Smith
/// ```

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptCommand {
    pub command_type: CommandType,
    pub value: String,
    pub immediate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandType {
    Focus,
    Char,
    Type,
    Command,
    Wait,
    Assert,
}

#[derive(Debug, Clone)]
pub struct Script {
    pub commands: Vec<ScriptCommand>,
}

#[derive(Debug, Clone)]
pub struct ScriptRunner {
    pub script: Script,
    pub current_command: usize,
    pub max_settle_time: Duration,
}

impl ScriptRunner {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_string(&content)
    }

    pub fn from_string(content: &str) -> Result<Self> {
        let mut commands = Vec::new();
        let mut immediate_mode = false;

        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if line == "immediate" {
                immediate_mode = true;
                continue;
            }
            if line == "settle_mode" {
                immediate_mode = false;
                continue;
            }

            let (command_type, value) = if let Some(value) = line.strip_prefix("pane:") {
                (CommandType::Focus, value)
            } else if let Some(value) = line.strip_prefix("char:") {
                (CommandType::Char, value)
            } else if let Some(value) = line.strip_prefix("type:") {
                (CommandType::Type, value)
            } else if let Some(value) = line.strip_prefix("cmd:") {
                (CommandType::Command, value)
            } else if line == "wait" || line == "settle" {
                (CommandType::Wait, "")
            } else if let Some(value) = line.strip_prefix("wait:") {
                (CommandType::Wait, value)
            } else if let Some(value) = line.strip_prefix("assert:") {
                (CommandType::Assert, value)
            } else {
                return Err(TrisearchError::Script(format!(
                    "Invalid command on line {}: {}",
                    line_num + 1,
                    line
                )));
            };

            // Wait commands always wait
            let immediate = immediate_mode && command_type != CommandType::Wait;
            commands.push(ScriptCommand {
                command_type,
                value: value.to_string(),
                immediate,
            });
        }

        Ok(ScriptRunner {
            script: Script { commands },
            current_command: 0,
            max_settle_time: Duration::from_secs(5),
        })
    }

    pub async fn run(&mut self, session: &mut Session) -> Result<ScriptResult> {
        let start_time = Instant::now();
        let mut events_processed = 0;
        let mut assertions_passed = 0;
        let mut assertions_failed = 0;
        let mut errors = Vec::new();

        log::info!(
            "🧪 Starting script run with {} commands",
            self.script.commands.len()
        );

        for (index, command) in self.script.commands.iter().enumerate() {
            self.current_command = index;
            log::debug!("🧪 Executing command {}: {:?}", index, command);

            match &command.command_type {
                CommandType::Focus => {
                    let pane = Pane::from_string(&command.value).map_err(TrisearchError::Script)?;
                    session.focus(pane);
                    events_processed += 1;
                }
                CommandType::Char => {
                    let ch = command
                        .value
                        .chars()
                        .next()
                        .ok_or_else(|| TrisearchError::Script("Empty character command".into()))?;
                    if !session.execute(&Command::Input(ch)) {
                        errors.push(format!("Character '{}' rejected", ch));
                    }
                    events_processed += 1;
                }
                CommandType::Type => {
                    for ch in command.value.chars() {
                        session.execute(&Command::Input(ch));
                        events_processed += 1;
                    }
                }
                CommandType::Command => {
                    let parsed = Command::from_string(&command.value).map_err(TrisearchError::Command)?;
                    if !session.execute(&parsed) {
                        log::debug!("🧪 Command had no effect: {}", command.value);
                    }
                    events_processed += 1;
                }
                CommandType::Wait => {
                    if command.value.is_empty() {
                        if let Err(e) = self.wait_for_settlement(session).await {
                            errors.push(format!("Settlement wait failed: {}", e));
                        }
                    } else {
                        let ms: u64 = command.value.parse().map_err(|_| {
                            TrisearchError::Script(format!("Invalid wait duration: {}", command.value))
                        })?;
                        session.run_for(Duration::from_millis(ms)).await;
                    }
                }
                CommandType::Assert => match self.evaluate_assertion(session, &command.value) {
                    Ok(true) => {
                        assertions_passed += 1;
                        log::debug!("🧪 Assertion passed: {}", command.value);
                    }
                    Ok(false) => {
                        assertions_failed += 1;
                        errors.push(format!(
                            "Assertion failed: {} (actual: {})",
                            command.value,
                            self.describe(session, &command.value)
                        ));
                    }
                    Err(e) => {
                        assertions_failed += 1;
                        errors.push(format!("Assertion error: {}", e));
                    }
                },
            }

            // Settle unless in immediate mode or this is a wait/assert command
            let settles = !matches!(command.command_type, CommandType::Wait | CommandType::Assert);
            if !command.immediate && settles {
                if let Err(e) = self.wait_for_settlement(session).await {
                    errors.push(format!("Post-command settlement failed: {}", e));
                }
            }
        }

        let duration = start_time.elapsed();
        log::info!("🧪 Script run completed in {:?}", duration);

        let success = assertions_failed == 0 && errors.is_empty();
        Ok(ScriptResult {
            duration,
            events_processed,
            assertions_passed,
            assertions_failed,
            errors,
            success,
        })
    }

    async fn wait_for_settlement(&self, session: &mut Session) -> std::result::Result<(), String> {
        tokio::time::timeout(self.max_settle_time, session.settle())
            .await
            .map_err(|_| "Settlement timeout: timers still pending".to_string())
    }

    fn parse_assertion(assertion: &str) -> std::result::Result<(Pane, &str, &str), String> {
        let (target, expected) = assertion
            .split_once(':')
            .ok_or("Assertion must be in format 'pane.property:value'")?;
        let (pane, property) = target
            .split_once('.')
            .ok_or("Assertion target must be in format 'pane.property'")?;
        Ok((Pane::from_string(pane)?, property, expected))
    }

    fn evaluate_assertion(
        &self,
        session: &mut Session,
        assertion: &str,
    ) -> std::result::Result<bool, String> {
        let (pane, property, expected) = Self::parse_assertion(assertion)?;

        match property {
            "selection" => match session.selection(pane) {
                Some(element) => Ok(element.name == expected),
                None => Ok(expected == "none" || expected.is_empty()),
            },
            "query" => Ok(session.query(pane) == expected),
            "count" => {
                let expected_count = expected
                    .parse::<usize>()
                    .map_err(|_| "count expects numeric value")?;
                Ok(session.results(pane).len() == expected_count)
            }
            "results" => {
                let actual: Vec<String> = session.results(pane).into_iter().map(|e| e.name).collect();
                let expected: Vec<&str> = if expected.is_empty() {
                    Vec::new()
                } else {
                    expected.split(',').map(str::trim).collect()
                };
                Ok(actual == expected)
            }
            "text_mode" => {
                let expected_bool = expected
                    .parse::<bool>()
                    .map_err(|_| "text_mode expects boolean value")?;
                Ok(session.text_mode(pane) == expected_bool)
            }
            "secondary" => {
                let expected_count = expected
                    .parse::<usize>()
                    .map_err(|_| "secondary expects numeric value")?;
                Ok(session.secondary(pane).len() == expected_count)
            }
            "pending" => {
                let expected_bool = expected
                    .parse::<bool>()
                    .map_err(|_| "pending expects boolean value")?;
                Ok(session.is_pending(pane) == expected_bool)
            }
            _ => Err(format!("Unknown assertion property: {}", property)),
        }
    }

    /// The value a failed assertion actually saw.
    fn describe(&self, session: &Session, assertion: &str) -> String {
        let Ok((pane, property, _)) = Self::parse_assertion(assertion) else {
            return String::new();
        };
        match property {
            "selection" => session
                .context(pane)
                .selection()
                .map(|e| e.name.clone())
                .unwrap_or_else(|| "none".to_string()),
            "query" => session.query(pane).to_string(),
            "count" => session.peek_results(pane).len().to_string(),
            "results" => session
                .peek_results(pane)
                .iter()
                .map(|e| e.name.as_str())
                .collect::<Vec<_>>()
                .join(","),
            "text_mode" => session.text_mode(pane).to_string(),
            "secondary" => session.secondary(pane).len().to_string(),
            "pending" => session.is_pending(pane).to_string(),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScriptResult {
    pub duration: Duration,
    pub events_processed: usize,
    pub assertions_passed: usize,
    pub assertions_failed: usize,
    pub errors: Vec<String>,
    pub success: bool,
}

impl ScriptResult {
    pub fn print_summary(&self) {
        println!("🧪 Script Results:");
        println!("   Duration: {:?}", self.duration);
        println!("   Events processed: {}", self.events_processed);
        println!("   Assertions passed: {}", self.assertions_passed);
        println!("   Assertions failed: {}", self.assertions_failed);

        if !self.errors.is_empty() {
            println!("   Errors:");
            for error in &self.errors {
                println!("     - {}", error);
            }
        }

        if self.success {
            println!("   Status: ✅ PASSED");
        } else {
            println!("   Status: ❌ FAILED");
        }
    }
}

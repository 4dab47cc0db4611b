/// Data models for store entities
///
/// All models map to database tables and use sqlx for type-safe queries.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A curated command as held in the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Command {
    pub full_command: String,
    pub count_seen: i64,
    pub last_used: f64, // seconds since the epoch
    pub command_info: String,
    /// Set only on results of a directory query
    #[sqlx(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory_context: Option<String>,
    /// How often the command ran in `directory_context`
    #[sqlx(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_occurrences: Option<i64>,
}

impl Command {
    pub fn has_info(&self) -> bool {
        !self.command_info.is_empty()
    }
}

/// Input for recording one observation of a command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandInput {
    /// Already curated command text
    pub full_command: String,
    pub last_used: f64,
    pub directory_context: Option<String>,
}

impl CommandInput {
    /// Observation of `full_command` right now, without directory context
    pub fn new(full_command: impl Into<String>) -> Self {
        Self {
            full_command: full_command.into(),
            last_used: now_epoch_seconds(),
            directory_context: None,
        }
    }

    pub fn at(mut self, last_used: f64) -> Self {
        self.last_used = last_used;
        self
    }

    pub fn in_directory(mut self, directory: impl Into<String>) -> Self {
        self.directory_context = Some(directory.into());
        self
    }
}

/// Current time as fractional epoch seconds
pub fn now_epoch_seconds() -> f64 {
    Utc::now().timestamp_millis() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(text: &str) -> Command {
        Command {
            full_command: text.to_string(),
            count_seen: 1,
            last_used: 0.0,
            command_info: String::new(),
            directory_context: None,
            num_occurrences: None,
        }
    }

    #[test]
    fn test_command_input_builder() {
        let input = CommandInput::new("make").at(42.0).in_directory("/src");
        assert_eq!(input.full_command, "make");
        assert_eq!(input.last_used, 42.0);
        assert_eq!(input.directory_context.as_deref(), Some("/src"));
    }

    #[test]
    fn test_serialize_skips_missing_context() {
        let json = serde_json::to_string(&command("ls")).unwrap();
        assert!(!json.contains("directory_context"));
        assert!(json.contains("\"full_command\":\"ls\""));
    }
}

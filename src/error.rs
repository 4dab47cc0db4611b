/// Errors raised by the remember library
///
/// Missing ignore rules and undecodable history lines are recovered from
/// where they happen and never show up here.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RememberError {
    /// The SQLite store failed
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    /// A history file could not be read or rewritten
    #[error("History file {}: {source}", .path.display())]
    HistoryFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Rule, last-results or directory I/O
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    /// A 1-based pick outside the last search results
    #[error("No result #{index} in the last search ({available} saved)")]
    NoSuchResult { index: usize, available: usize },

    /// Curation left nothing to store
    #[error("Refusing to store an empty command")]
    EmptyCommand,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, RememberError>;

impl RememberError {
    /// One line suitable for the terminal
    pub fn user_message(&self) -> String {
        match self {
            RememberError::Store(e) => {
                format!("Could not read or write the command store ({})", e)
            }
            RememberError::HistoryFile { path, source } => {
                format!("Could not use history file {}: {}", path.display(), source)
            }
            RememberError::Io(e) => format!("File system error: {}", e),
            RememberError::CommandNotFound(cmd) => {
                format!("'{}' is not in the store", cmd)
            }
            RememberError::NoSuchResult { index, available } => {
                if *available == 0 {
                    format!("No saved search results, can't pick #{}", index)
                } else {
                    format!("Pick a number between 1 and {} (got {})", available, index)
                }
            }
            RememberError::EmptyCommand => "Nothing to store, the command is empty".to_string(),
            RememberError::Config(msg) => format!("Setup problem: {}", msg),
        }
    }
}

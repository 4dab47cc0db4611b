/// remember library
///
/// Personal command-history store: ingests shell history, deduplicates
/// commands, remembers which directory they ran in and searches them.

pub mod config;
pub mod core;
pub mod db;
pub mod display;
pub mod error;

// Re-exports for convenience
pub use config::RememberPaths;
pub use db::{Command, CommandInput, Store};
pub use error::{RememberError, Result};

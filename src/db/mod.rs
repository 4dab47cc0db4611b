/// Store module for remember
///
/// Handles all persistence using SQLite and sqlx: commands, the directories
/// they ran in, and the pairing between the two.

pub mod connection;
pub mod models;
pub mod queries;

pub use connection::{Store, StoreStats};
pub use models::*;

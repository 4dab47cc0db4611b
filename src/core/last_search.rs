// The last search results, one command per line
//
// Lets a follow-up invocation pick a result by its displayed number.

use crate::db::Command;
use crate::error::{RememberError, Result};
use std::fs;
use std::path::Path;

/// Overwrite the file with the given results
///
/// An empty result list leaves the previous file alone.
pub fn save_last_search<P: AsRef<Path>>(path: P, results: &[Command]) -> Result<()> {
    if results.is_empty() {
        return Ok(());
    }

    let mut contents = String::new();
    for command in results {
        contents.push_str(&command.full_command);
        contents.push('\n');
    }
    fs::write(path, contents)?;

    Ok(())
}

pub fn read_last_search<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let contents = fs::read_to_string(path)?;
    Ok(contents.lines().map(|line| line.trim().to_string()).collect())
}

/// The result shown as number `index` (1-based)
pub fn command_at<P: AsRef<Path>>(path: P, index: usize) -> Result<String> {
    let results = read_last_search(path)?;
    index
        .checked_sub(1)
        .and_then(|i| results.get(i))
        .cloned()
        .ok_or(RememberError::NoSuchResult {
            index,
            available: results.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

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
    fn test_save_and_read() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("last_saved_results.txt");

        save_last_search(&path, &[command("git pull"), command("cargo test")]).unwrap();
        assert_eq!(read_last_search(&path).unwrap(), vec!["git pull", "cargo test"]);

        // Overwritten, not appended
        save_last_search(&path, &[command("ls")]).unwrap();
        assert_eq!(read_last_search(&path).unwrap(), vec!["ls"]);
    }

    #[test]
    fn test_empty_results_keep_previous_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("last_saved_results.txt");

        save_last_search(&path, &[command("make")]).unwrap();
        save_last_search(&path, &[]).unwrap();
        assert_eq!(read_last_search(&path).unwrap(), vec!["make"]);
    }

    #[test]
    fn test_command_at() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("last_saved_results.txt");
        save_last_search(&path, &[command("first"), command("second")]).unwrap();

        assert_eq!(command_at(&path, 2).unwrap(), "second");
        assert!(matches!(
            command_at(&path, 0),
            Err(RememberError::NoSuchResult { index: 0, available: 2 })
        ));
        assert!(matches!(
            command_at(&path, 3),
            Err(RememberError::NoSuchResult { index: 3, available: 2 })
        ));
    }

    #[test]
    fn test_read_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = read_last_search(temp.path().join("nothing.txt"));
        assert!(matches!(result, Err(RememberError::Io(_))));
    }
}

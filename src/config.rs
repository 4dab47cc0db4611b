/// File locations for remember
///
/// Everything lives in one save directory, `~/.remember3` unless the
/// caller picks another one.

use crate::error::{RememberError, Result};
use std::path::{Path, PathBuf};

pub const DEFAULT_SAVE_DIR_NAME: &str = ".remember3";
pub const REMEMBER_DB_FILE_NAME: &str = "remember.db";
pub const IGNORE_RULE_FILE_NAME: &str = "ignore_rules.txt";
pub const DEFAULT_LAST_SAVE_FILE_NAME: &str = "last_saved_results.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RememberPaths {
    save_dir: PathBuf,
}

impl RememberPaths {
    pub fn new<P: AsRef<Path>>(save_dir: P) -> Self {
        Self {
            save_dir: save_dir.as_ref().to_path_buf(),
        }
    }

    /// `~/.remember3`
    pub fn default_save_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| {
            RememberError::Config("Could not determine home directory".to_string())
        })?;
        Ok(home.join(DEFAULT_SAVE_DIR_NAME))
    }

    /// Use the given directory, or the default one
    pub fn resolve(save_dir: Option<PathBuf>) -> Result<Self> {
        match save_dir {
            Some(dir) => Ok(Self::new(dir)),
            None => Ok(Self::new(Self::default_save_dir()?)),
        }
    }

    pub fn save_dir(&self) -> &Path {
        &self.save_dir
    }

    pub fn db_path(&self) -> PathBuf {
        self.save_dir.join(REMEMBER_DB_FILE_NAME)
    }

    pub fn ignore_rules_path(&self) -> PathBuf {
        self.save_dir.join(IGNORE_RULE_FILE_NAME)
    }

    pub fn last_results_path(&self) -> PathBuf {
        self.save_dir.join(DEFAULT_LAST_SAVE_FILE_NAME)
    }
}

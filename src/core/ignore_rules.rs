// Ignore rules for history ingestion
//
// Rule file lines look like `<kind>:<value>`:
//   s:vim         ignore anything starting with "vim"
//   c:commit -a   ignore anything containing "commit -a"
//   m:ls          ignore exactly "ls"

use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    starts_with: Vec<String>,
    contains: Vec<String>,
    matches: HashSet<String>,
}

impl IgnoreRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load rules from a rule file
    ///
    /// A missing or unreadable file gives an empty rule set, which still
    /// ignores the empty command.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no ignore rule file");
                Self::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read ignore rules");
                Self::new()
            }
        }
    }

    /// Parse rule file contents, skipping lines that aren't rules
    pub fn parse(contents: &str) -> Self {
        let mut rules = Self::new();

        for line in contents.lines() {
            let Some((kind, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match kind.trim() {
                "s" => rules.add_starts_with(value),
                "c" => rules.add_contains(value),
                "m" => rules.add_matches(value),
                other => debug!(kind = other, "skipping unknown ignore rule kind"),
            }
        }

        rules
    }

    /// True if the command should not be stored
    pub fn is_match(&self, command: &str) -> bool {
        if command.is_empty() {
            return true;
        }

        self.matches.contains(command)
            || self.starts_with.iter().any(|p| command.starts_with(p.as_str()))
            || self.contains.iter().any(|s| command.contains(s.as_str()))
    }

    pub fn add_starts_with(&mut self, prefix: impl Into<String>) {
        self.starts_with.push(prefix.into());
    }

    pub fn add_contains(&mut self, fragment: impl Into<String>) {
        self.contains.push(fragment.into());
    }

    pub fn add_matches(&mut self, command: impl Into<String>) {
        self.matches.insert(command.into());
    }

    /// Total number of rules across all kinds
    pub fn len(&self) -> usize {
        self.starts_with.len() + self.contains.len() + self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

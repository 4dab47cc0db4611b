// Reads shell history files into the store
//
// Two dialects:
// - standard: one command per line (bash HISTFILE, zsh with or without
//   extended history). After ingesting we append a marker line and the next
//   run reads backwards only until that marker.
// - custom: written by the shell hook as `<dir><<!>><command>` under a fixed
//   header. It's a capture buffer, so after ingesting it's reset to the header.

use crate::config::RememberPaths;
use crate::core::curator::curate;
use crate::core::ignore_rules::IgnoreRules;
use crate::db::{now_epoch_seconds, CommandInput, Store};
use crate::error::{RememberError, Result};
use regex::Regex;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Line appended to a standard history file once its entries are stored
pub const PROCESSED_TO_TAG: &str = "****** previous commands read *******";

/// First line of a custom history file
pub const CUSTOM_HIST_HEAD: &str = "## remember command custom history file ##";

/// Separates directory and command in a custom history line
pub const CUSTOM_HIST_SEPARATOR: &str = "<<!>>";

/// Threshold for background runs. Small deltas wait for the next run.
pub const DEFAULT_THRESHOLD: usize = 100;

/// Threshold for runs triggered by the user
pub const INTERACTIVE_THRESHOLD: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryFileType {
    Standard,
    Custom,
}

impl std::fmt::Display for HistoryFileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            HistoryFileType::Standard => "standard",
            HistoryFileType::Custom => "custom",
        };
        write!(f, "{}", s)
    }
}

/// One not-yet-ingested history entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub command_line: String,
    pub directory_context: Option<String>,
}

/// What a processing run did
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub file_type: HistoryFileType,
    pub extracted: usize,
    pub stored: usize,
    pub ignored: usize,
    pub marked: bool,
}

pub struct HistoryProcessor {
    store: Arc<Store>,
    history_file_path: PathBuf,
    ignore_rule_file: PathBuf,
    threshold: usize,
    file_type: Option<HistoryFileType>,
    lines_processed: bool,
}

impl HistoryProcessor {
    pub fn new<P: AsRef<Path>>(
        store: Arc<Store>,
        history_file_path: P,
        paths: &RememberPaths,
        threshold: usize,
    ) -> Self {
        Self {
            store,
            history_file_path: history_file_path.as_ref().to_path_buf(),
            ignore_rule_file: paths.ignore_rules_path(),
            threshold,
            file_type: None,
            lines_processed: false,
        }
    }

    /// Dialect of the history file, known once it has been read
    pub fn file_type(&self) -> Option<HistoryFileType> {
        self.file_type
    }

    /// Read the history file and store the entries not seen before
    ///
    /// Nothing is stored unless there are more than `threshold` new entries.
    /// Returns the report with `marked` still false; call
    /// [`update_history_file`](Self::update_history_file) afterwards, also
    /// after an error, since entries stored before a failure are kept.
    pub async fn process_history_file(&mut self) -> Result<IngestReport> {
        debug!(path = %self.history_file_path.display(), "reading history file");
        let start = Instant::now();

        let lines = read_history_lines(&self.history_file_path)?;
        let file_type = detect_file_type(&lines);
        self.file_type = Some(file_type);

        let entries = get_unread_commands(&lines, file_type);
        let mut report = IngestReport {
            file_type,
            extracted: entries.len(),
            stored: 0,
            ignored: 0,
            marked: false,
        };

        if entries.len() <= self.threshold {
            debug!(
                entries = entries.len(),
                threshold = self.threshold,
                "not enough new history entries to ingest"
            );
            return Ok(report);
        }

        let rules = IgnoreRules::load(&self.ignore_rule_file);
        let (stored, ignored) = match self.store_entries(&entries, &rules).await {
            Ok(counts) => counts,
            Err((stored, e)) => {
                // Stored entries stay, so the file still has to be marked
                // or the next run would count them again
                if stored > 0 {
                    self.lines_processed = true;
                }
                warn!(stored, error = %e, "history ingestion stopped early");
                return Err(e);
            }
        };
        report.stored = stored;
        report.ignored = ignored;
        self.lines_processed = true;

        info!(
            file_type = %file_type,
            stored,
            ignored,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "ingested history"
        );

        Ok(report)
    }

    /// Store the entries one by one. On failure returns how many made it.
    async fn store_entries(
        &self,
        entries: &[HistoryEntry],
        rules: &IgnoreRules,
    ) -> std::result::Result<(usize, usize), (usize, RememberError)> {
        // Keep relative order even though the log has no timestamps
        let base_time = now_epoch_seconds();
        let mut stored = 0;
        let mut ignored = 0;

        for (i, entry) in entries.iter().enumerate() {
            let command = curate(&entry.command_line);
            if rules.is_match(&command) {
                ignored += 1;
                continue;
            }

            let mut input = CommandInput::new(command).at(base_time + (i + 1) as f64);
            if let Some(directory) = &entry.directory_context {
                input = input.in_directory(directory.clone());
            }
            self.store.add_command(input).await.map_err(|e| (stored, e))?;
            stored += 1;
        }

        Ok((stored, ignored))
    }

    /// Move the "already read" boundary past what was just stored
    ///
    /// Does nothing unless the last `process_history_file` stored a batch.
    /// Returns whether the file was changed.
    pub fn update_history_file(&mut self) -> Result<bool> {
        if !self.lines_processed {
            return Ok(false);
        }

        let path = &self.history_file_path;
        let written = match self.file_type {
            Some(HistoryFileType::Standard) => append_line(path, PROCESSED_TO_TAG),
            Some(HistoryFileType::Custom) => fs::write(path, format!("{}\n", CUSTOM_HIST_HEAD)),
            None => return Ok(false),
        };
        written.map_err(history_error(path))?;
        debug!(path = %path.display(), "marked history file as read");

        self.lines_processed = false;
        Ok(true)
    }
}

/// Process a history file and mark it, in one go
pub async fn start_history_processing<P: AsRef<Path>>(
    store: Arc<Store>,
    history_file_path: P,
    paths: &RememberPaths,
    threshold: usize,
) -> Result<IngestReport> {
    let mut processor = HistoryProcessor::new(store, history_file_path, paths, threshold);
    let outcome = processor.process_history_file().await;
    // Marks after a partial failure too
    let marked = processor.update_history_file()?;
    let mut report = outcome?;
    report.marked = marked;
    Ok(report)
}

/// Read all lines of a history file
///
/// Lines that aren't valid UTF-8 are dropped, the rest of the file still counts.
pub fn read_history_lines<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(history_error(path))?;

    let mut segments: Vec<&[u8]> = bytes.split(|b| *b == b'\n').collect();
    if bytes.ends_with(b"\n") || bytes.is_empty() {
        segments.pop();
    }

    let lines = segments
        .into_iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            match std::str::from_utf8(raw) {
                Ok(line) => Some(line.to_string()),
                Err(_) => {
                    debug!(line = index + 1, "skipping undecodable history line");
                    None
                }
            }
        })
        .collect();

    Ok(lines)
}

pub fn detect_file_type(lines: &[String]) -> HistoryFileType {
    match lines.first() {
        Some(first) if first == CUSTOM_HIST_HEAD => HistoryFileType::Custom,
        _ => HistoryFileType::Standard,
    }
}

/// Entries of the history file that haven't been ingested yet, oldest first
pub fn get_unread_commands(lines: &[String], file_type: HistoryFileType) -> Vec<HistoryEntry> {
    match file_type {
        HistoryFileType::Standard => {
            let mut unread: Vec<HistoryEntry> = lines
                .iter()
                .rev()
                .take_while(|line| !line.contains(PROCESSED_TO_TAG))
                .map(|line| HistoryEntry {
                    command_line: line.trim().to_string(),
                    directory_context: None,
                })
                .collect();
            unread.reverse();
            unread
        }
        HistoryFileType::Custom => lines
            .iter()
            .skip(1)
            .filter_map(|line| match line.split_once(CUSTOM_HIST_SEPARATOR) {
                Some((directory, command)) => Some(HistoryEntry {
                    command_line: command.trim().to_string(),
                    directory_context: Some(directory.trim().to_string())
                        .filter(|d| !d.is_empty()),
                }),
                None => {
                    debug!(line = %line, "skipping custom history line without separator");
                    None
                }
            })
            .collect(),
    }
}

/// Append a command to a history file so it shows up like a typed one
///
/// If the file is in zsh extended format the line gets a timestamp one
/// second after the last entry.
pub fn append_to_history<P: AsRef<Path>>(history_file_path: P, command: &str) -> Result<()> {
    let path = history_file_path.as_ref();

    let last_line = if path.exists() {
        read_history_lines(path)?
            .into_iter()
            .rev()
            .find(|line| !line.trim().is_empty())
    } else {
        None
    };

    let line = match last_line.as_deref().and_then(extended_history_time) {
        Some(time) => format!(": {}:0;{}", time + 1, command),
        None => command.to_string(),
    };

    append_line(path, &line).map_err(history_error(path))?;
    Ok(())
}

/// Append `line`, first ending the previous line if the file lacks a newline
fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let needs_newline = path.exists() && !ends_with_newline(path)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if needs_newline {
        writeln!(file)?;
    }
    writeln!(file, "{}", line)
}

fn history_error(path: &Path) -> impl FnOnce(std::io::Error) -> RememberError {
    let path = path.to_path_buf();
    move |source| RememberError::HistoryFile { path, source }
}

/// Epoch seconds of a zsh extended history line
fn extended_history_time(line: &str) -> Option<i64> {
    let pattern = Regex::new(r"^:\s*(\d+):\d+;").ok()?;
    let captures = pattern.captures(line)?;
    captures[1].parse().ok()
}

fn ends_with_newline(path: &Path) -> std::io::Result<bool> {
    let mut file = fs::File::open(path)?;
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Terminal formatting for command lists
///
/// Stateless helpers. Callers decide whether color is wanted; with color
/// off the output is plain text.

use crate::db::Command;
use colored::Colorize;

/// Format a numbered list of commands, highlighting search terms
pub fn format_commands<S: AsRef<str>>(commands: &[Command], terms: &[S], color: bool) -> String {
    commands
        .iter()
        .enumerate()
        .map(|(i, command)| format_command(i + 1, command, terms, color))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn print_commands<S: AsRef<str>>(commands: &[Command], terms: &[S], color: bool) {
    if !commands.is_empty() {
        println!("{}", format_commands(commands, terms, color));
    }
}

/// `(n): <command> --count:<n>` plus an info line when annotated
pub fn format_command<S: AsRef<str>>(index: usize, command: &Command, terms: &[S], color: bool) -> String {
    let count = command.num_occurrences.unwrap_or(command.count_seen);

    let mut out = if color {
        format!(
            "{} {} {}",
            format!("({}):", index).magenta(),
            highlight(&command.full_command, terms),
            format!("--count:{}", count).blue()
        )
    } else {
        format!("({}): {} --count:{}", index, command.full_command, count)
    };

    if command.has_info() {
        let info = format!("Command context/info: {}", command.command_info);
        out.push('\n');
        if color {
            out.push_str(&info.red().to_string());
        } else {
            out.push_str(&info);
        }
    }

    out
}

/// Color `text` yellow with every term occurrence in green
fn highlight<S: AsRef<str>>(text: &str, terms: &[S]) -> String {
    let mut out = String::new();
    let mut pos = 0;
    for (start, end) in highlight_ranges(text, terms) {
        if start > pos {
            out.push_str(&text[pos..start].yellow().to_string());
        }
        out.push_str(&text[start..end].green().to_string());
        pos = end;
    }
    if pos < text.len() {
        out.push_str(&text[pos..].yellow().to_string());
    }
    out
}

/// Byte ranges of term occurrences, sorted and merged
pub fn highlight_ranges<S: AsRef<str>>(text: &str, terms: &[S]) -> Vec<(usize, usize)> {
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for term in terms {
        let term: &str = term.as_ref();
        if term.is_empty() {
            continue;
        }
        for (start, _) in text.match_indices(term) {
            ranges.push((start, start + term.len()));
        }
    }
    ranges.sort_unstable();

    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

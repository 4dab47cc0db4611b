// Turns raw history lines into the canonical command text used as identity
//
// zsh with EXTENDED_HISTORY writes lines like `: 1503848943:0;git status`,
// bash writes the bare command. Both curate to `git status`.

/// Normalize a raw history line
///
/// - Collapses whitespace runs to one space and trims the ends
/// - Strips the `: <epoch>:<duration>;` prefix of zsh extended history when
///   something follows the `;`. Otherwise the line is returned as is.
pub fn curate(raw: &str) -> String {
    let mut curated = collapse_whitespace(raw);

    // Loop so a nested prefix can't survive the first pass
    while let Some(stripped) = strip_extended_prefix(&curated) {
        curated = stripped;
    }

    curated
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_extended_prefix(command: &str) -> Option<String> {
    if !command.starts_with(':') {
        return None;
    }

    let (_, rest) = command.split_once(';')?;
    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }

    Some(rest.to_string())
}

use gitscribe_git::RepositoryState;

/// Render the staged half of the state into a generation prompt.
///
/// Unstaged records are deliberately absent: they are not part of the commit
/// being described.
pub fn build_commit_prompt(state: &RepositoryState) -> String {
    let mut files = String::new();
    for record in &state.staged {
        files.push_str(&format!("- {}: {}\n", record.status.label(), record.path));
    }

    let mut changes = String::new();
    for record in &state.staged {
        changes.push_str(&format!("### {}\n", record.path));
        if record.diff.is_empty() {
            changes.push_str("(no diff available: binary or unreadable)\n");
        } else {
            changes.push_str(&record.diff);
            if !record.diff.ends_with('\n') {
                changes.push('\n');
            }
        }
        changes.push('\n');
    }

    format!(
        r#"Write a git commit message for the staged changes below.

## Staged files
{files}
## Changes
{changes}Respond with ONLY the commit message. Use an imperative subject line of at
most 72 characters; add a short body after a blank line only when the change
needs explanation. No code fences, no quotes, no commentary."#
    )
}

/// Scrub a model reply down to the bare commit message.
///
/// Models wrap replies in fences, quotes, or "Commit message:" lead-ins no
/// matter how firmly the prompt forbids it.
pub fn clean_message(raw: &str) -> String {
    let mut text = raw.trim().to_string();

    // Wrapping code fence, language tag included
    if text.starts_with("```") {
        let mut lines: Vec<&str> = text.lines().collect();
        lines.remove(0);
        while matches!(lines.last(), Some(l) if l.trim().is_empty()) {
            lines.pop();
        }
        if matches!(lines.last(), Some(l) if l.trim() == "```") {
            lines.pop();
        }
        text = lines.join("\n");
    }

    // "Commit message:" style lead-in line
    if let Some((first, rest)) = text.trim().split_once('\n') {
        let lowered = first.trim().to_lowercase();
        if lowered.ends_with(':')
            && (lowered.starts_with("commit message")
                || lowered.starts_with("here is")
                || lowered.starts_with("here's"))
        {
            text = rest.trim_start().to_string();
        }
    }

    // Fully quoted single-line message
    let trimmed = text.trim();
    if trimmed.len() >= 2 && !trimmed.contains('\n') {
        let bytes = trimmed.as_bytes();
        let quoted = (bytes[0] == b'"' && bytes[bytes.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[bytes.len() - 1] == b'\'');
        if quoted {
            text = trimmed[1..trimmed.len() - 1].to_string();
        }
    }

    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

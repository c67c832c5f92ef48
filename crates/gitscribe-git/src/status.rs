use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Change classification for a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Unmodified,
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
    Unmerged,
}

impl FileStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FileStatus::Unmodified => "unmodified",
            FileStatus::Added => "added",
            FileStatus::Modified => "modified",
            FileStatus::Deleted => "deleted",
            FileStatus::Renamed => "renamed",
            FileStatus::Copied => "copied",
            FileStatus::Unmerged => "unmerged",
        }
    }
}

/// One changed path. `diff` is filled in later by the diff engine, and only
/// for staged records; unstaged records always carry an empty diff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub status: FileStatus,
    pub diff: String,
}

impl FileRecord {
    pub fn new(path: impl Into<String>, status: FileStatus) -> Self {
        Self {
            path: path.into(),
            status,
            diff: String::new(),
        }
    }
}

/// Everything pending in the working tree, split by staging membership.
/// Ordering follows the status output, so results are deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryState {
    pub staged: Vec<FileRecord>,
    pub unstaged: Vec<FileRecord>,
}

impl RepositoryState {
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty()
    }

    pub fn total_changes(&self) -> usize {
        self.staged.len() + self.unstaged.len()
    }

    pub fn staged_paths(&self) -> BTreeSet<String> {
        self.staged.iter().map(|r| r.path.clone()).collect()
    }
}

/// One parsed `git status --porcelain` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StatusEntry {
    pub index: u8,
    pub worktree: u8,
    pub path: String,
    pub orig_path: Option<String>,
}

/// Every status character git can emit in either column.
const CODE_ALPHABET: &[u8] = b" MADRCU?!";

/// Parse porcelain status output into staged/unstaged record listings.
pub fn parse_status(raw: &str) -> RepositoryState {
    build_state(parse_porcelain(raw))
}

pub(crate) fn parse_porcelain(raw: &str) -> Vec<StatusEntry> {
    raw.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<StatusEntry> {
    let bytes = line.as_bytes();

    // XY<space>path is the shortest well-formed line. Anything else (summary
    // chatter, blank lines) is dropped rather than guessed at.
    if bytes.len() < 4 || bytes[2] != b' ' {
        return None;
    }

    let index = bytes[0];
    let worktree = bytes[1];
    if !CODE_ALPHABET.contains(&index) || !CODE_ALPHABET.contains(&worktree) {
        // Unknown code (git grows these occasionally, e.g. `T`): skip the
        // line instead of failing the whole parse.
        debug!(line = %line, "skipping status line with unrecognized code");
        return None;
    }

    // First three bytes are ASCII, so slicing here is safe.
    let rest = &line[3..];
    let (orig_path, path) = match rest.split_once(" -> ") {
        Some((from, to)) => (Some(unquote_path(from)), unquote_path(to)),
        None => (None, unquote_path(rest)),
    };

    Some(StatusEntry {
        index,
        worktree,
        path,
        orig_path,
    })
}

/// Undo git's C-style path quoting (`"pfad \303\244"` and friends).
pub(crate) fn unquote_path(raw: &str) -> String {
    let raw = raw.trim_end_matches('\r');
    if raw.len() < 2 || !raw.starts_with('"') || !raw.ends_with('"') {
        return raw.to_string();
    }

    let inner = &raw[1..raw.len() - 1];
    let mut bytes = Vec::with_capacity(inner.len());
    let mut chars = inner.bytes().peekable();

    while let Some(b) = chars.next() {
        if b != b'\\' {
            bytes.push(b);
            continue;
        }
        match chars.next() {
            Some(b'n') => bytes.push(b'\n'),
            Some(b't') => bytes.push(b'\t'),
            Some(b'r') => bytes.push(b'\r'),
            Some(b'"') => bytes.push(b'"'),
            Some(b'\\') => bytes.push(b'\\'),
            Some(d @ b'0'..=b'7') => {
                let mut value = (d - b'0') as u32;
                for _ in 0..2 {
                    match chars.peek() {
                        Some(d @ b'0'..=b'7') => {
                            value = value * 8 + (*d - b'0') as u32;
                            chars.next();
                        }
                        _ => break,
                    }
                }
                bytes.push(value as u8);
            }
            Some(other) => {
                bytes.push(b'\\');
                bytes.push(other);
            }
            None => bytes.push(b'\\'),
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}

/// A path is staged iff its index column holds a real change code.
fn is_staged_code(code: u8) -> bool {
    !matches!(code, b' ' | b'?' | b'!')
}

/// Conflict pairs per git-status(1): any `U`, plus `AA` and `DD`.
fn is_conflict(index: u8, worktree: u8) -> bool {
    index == b'U' || worktree == b'U' || (index == worktree && matches!(index, b'A' | b'D'))
}

fn status_from_code(code: u8) -> FileStatus {
    match code {
        b'M' => FileStatus::Modified,
        b'A' => FileStatus::Added,
        b'D' => FileStatus::Deleted,
        b'R' => FileStatus::Renamed,
        b'C' => FileStatus::Copied,
        b'U' => FileStatus::Unmerged,
        _ => FileStatus::Unmodified,
    }
}

fn build_state(entries: Vec<StatusEntry>) -> RepositoryState {
    let mut state = RepositoryState::default();

    for entry in entries {
        // Ignored entries only show up under --ignored, which we never
        // pass; drop them if they appear anyway.
        if entry.index == b'!' || entry.worktree == b'!' {
            continue;
        }

        let conflicted = is_conflict(entry.index, entry.worktree);

        if is_staged_code(entry.index) {
            let status = if conflicted {
                FileStatus::Unmerged
            } else {
                status_from_code(entry.index)
            };
            state.staged.push(FileRecord::new(entry.path.clone(), status));
        }

        if entry.worktree != b' ' {
            let status = if conflicted {
                FileStatus::Unmerged
            } else if entry.worktree == b'?' {
                // Untracked: surfaced as an addition in the unstaged listing
                FileStatus::Added
            } else {
                status_from_code(entry.worktree)
            };
            state.unstaged.push(FileRecord::new(entry.path, status));
        }
    }

    state
}

/// Paths currently staged, by rename-target identity.
pub(crate) fn staged_path_set(raw: &str) -> BTreeSet<String> {
    parse_porcelain(raw)
        .into_iter()
        .filter(|e| e.index != b'!' && is_staged_code(e.index))
        .map(|e| e.path)
        .collect()
}

/// Paths with worktree-side changes, in status order. Untracked files are
/// included only on request; ignored entries never are.
pub(crate) fn worktree_candidate_paths(raw: &str, include_untracked: bool) -> Vec<String> {
    parse_porcelain(raw)
        .into_iter()
        .filter(|e| {
            if e.index == b'!' || e.worktree == b'!' {
                return false;
            }
            if e.worktree == b'?' {
                return include_untracked;
            }
            e.worktree != b' '
        })
        .map(|e| e.path)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staged_modification() {
        let state = parse_status("M  src/a.go\n");
        assert_eq!(state.staged.len(), 1);
        assert_eq!(state.staged[0].path, "src/a.go");
        assert_eq!(state.staged[0].status, FileStatus::Modified);
        assert!(state.unstaged.is_empty());
    }

    #[test]
    fn test_unstaged_modification() {
        let state = parse_status(" M src/a.go\n");
        assert!(state.staged.is_empty());
        assert_eq!(state.unstaged.len(), 1);
        assert_eq!(state.unstaged[0].status, FileStatus::Modified);
    }

    #[test]
    fn test_both_columns_produce_two_records() {
        let state = parse_status("MM src/a.go\n");
        assert_eq!(state.staged.len(), 1);
        assert_eq!(state.unstaged.len(), 1);
        assert_eq!(state.staged[0].path, "src/a.go");
        assert_eq!(state.unstaged[0].path, "src/a.go");
    }

    #[test]
    fn test_rename_uses_target_path() {
        let state = parse_status("R  old.go -> new.go\n");
        assert_eq!(state.staged.len(), 1);
        assert_eq!(state.staged[0].path, "new.go");
        assert_eq!(state.staged[0].status, FileStatus::Renamed);
    }

    #[test]
    fn test_untracked_is_unstaged_added() {
        let state = parse_status("?? notes.txt\n");
        assert!(state.staged.is_empty());
        assert_eq!(state.unstaged.len(), 1);
        assert_eq!(state.unstaged[0].status, FileStatus::Added);
    }

    #[test]
    fn test_conflict_maps_to_unmerged_on_both_sides() {
        for line in ["UU merge.go\n", "AA merge.go\n", "DD merge.go\n"] {
            let state = parse_status(line);
            assert_eq!(state.staged.len(), 1, "line {line:?}");
            assert_eq!(state.staged[0].status, FileStatus::Unmerged);
            assert_eq!(state.unstaged.len(), 1);
            assert_eq!(state.unstaged[0].status, FileStatus::Unmerged);
        }
    }

    #[test]
    fn test_short_lines_are_skipped() {
        let state = parse_status("M\n\nok\n");
        assert!(state.is_clean());
    }

    #[test]
    fn test_missing_separator_is_skipped() {
        let state = parse_status("MMMsrc/a.go\n");
        assert!(state.is_clean());
    }

    #[test]
    fn test_unknown_code_is_skipped() {
        let state = parse_status("T  types.go\nM  kept.go\n");
        assert_eq!(state.staged.len(), 1);
        assert_eq!(state.staged[0].path, "kept.go");
    }

    #[test]
    fn test_input_order_is_preserved() {
        let state = parse_status("M  b.go\nA  a.go\nD  c.go\n");
        let paths: Vec<&str> = state.staged.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["b.go", "a.go", "c.go"]);
    }

    #[test]
    fn test_new_records_have_empty_diff() {
        let state = parse_status("M  a.go\n M b.go\n");
        assert_eq!(state.staged[0].diff, "");
        assert_eq!(state.unstaged[0].diff, "");
    }

    #[test]
    fn test_quoted_path_is_unescaped() {
        let state = parse_status("?? \"weird\\tname.txt\"\n");
        assert_eq!(state.unstaged[0].path, "weird\tname.txt");
    }

    #[test]
    fn test_octal_escapes_decode_to_utf8() {
        let state = parse_status("A  \"caf\\303\\251.txt\"\n");
        assert_eq!(state.staged[0].path, "café.txt");
    }

    #[test]
    fn test_staged_path_set_uses_rename_target() {
        let set = staged_path_set("R  old.go -> new.go\nM  lib.go\n?? x.txt\n");
        assert!(set.contains("new.go"));
        assert!(set.contains("lib.go"));
        assert!(!set.contains("old.go"));
        assert!(!set.contains("x.txt"));
    }

    #[test]
    fn test_worktree_candidates_exclude_untracked_by_default() {
        let raw = " M a.go\n?? b.txt\nM  staged_only.go\n";
        assert_eq!(worktree_candidate_paths(raw, false), vec!["a.go"]);
        assert_eq!(worktree_candidate_paths(raw, true), vec!["a.go", "b.txt"]);
    }

    #[test]
    fn test_paths_with_spaces_survive() {
        let state = parse_status("M  my docs/read me.md\n");
        assert_eq!(state.staged[0].path, "my docs/read me.md");
    }
}

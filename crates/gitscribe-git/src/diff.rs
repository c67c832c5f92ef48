use lazy_static::lazy_static;
use std::collections::{HashMap, HashSet};
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use crate::error::GitError;
use crate::runner::GitRunner;
use crate::status::{unquote_path, FileRecord, FileStatus, RepositoryState};

/// Per-file cap on diff text. Oversized diffs collapse into a metadata block.
pub const MAX_DIFF_CHARS: usize = 5000;

/// git's well-known hash of the tree with no entries, used as the diff base
/// before the first commit exists.
pub const EMPTY_TREE_OID: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

const BINARY_SNIFF_BYTES: usize = 512;

lazy_static! {
    static ref BINARY_EXTENSIONS: HashSet<&'static str> = [
        // images
        "png", "jpg", "jpeg", "gif", "bmp", "ico", "tiff", "webp",
        // archives
        "zip", "tar", "gz", "tgz", "bz2", "xz", "7z", "rar", "jar",
        // executables and objects
        "exe", "dll", "so", "dylib", "bin", "o", "a", "class", "pyc", "wasm",
        // fonts
        "woff", "woff2", "ttf", "otf", "eot",
        // documents
        "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
        // media
        "mp3", "mp4", "avi", "mov", "wmv", "flv", "wav", "ogg", "webm", "mkv",
        // data blobs
        "db", "sqlite", "parquet",
    ]
    .iter()
    .copied()
    .collect();
}

/// Counters from one annotation pass, for logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiffStats {
    pub annotated: usize,
    pub binary: usize,
    pub truncated: usize,
    pub failed: usize,
}

enum Computed {
    Diff(String),
    Oversize(String),
    Binary,
    Skipped,
}

struct RenameInfo {
    copy: bool,
    from: String,
    similarity: Option<u32>,
}

/// Computes bounded diffs for staged records.
///
/// Unstaged records are never touched; the call site guarantees that by
/// only handing over the staged half of the state.
pub struct DiffEngine<'a> {
    runner: &'a GitRunner,
    max_chars: usize,
}

impl<'a> DiffEngine<'a> {
    pub fn new(runner: &'a GitRunner) -> Self {
        Self {
            runner,
            max_chars: MAX_DIFF_CHARS,
        }
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    /// Fill in `diff` for every staged record.
    ///
    /// Individual failures degrade to an empty diff with a logged warning;
    /// they never abort the remaining files.
    pub async fn annotate(&self, state: &mut RepositoryState) -> DiffStats {
        let mut stats = DiffStats::default();
        if state.staged.is_empty() {
            return stats;
        }

        let base = match self.comparison_base().await {
            Ok(base) => base,
            Err(e) => {
                warn!(error = %e, "could not resolve diff base, assuming HEAD");
                "HEAD"
            }
        };

        let wants_renames = state
            .staged
            .iter()
            .any(|r| matches!(r.status, FileStatus::Renamed | FileStatus::Copied));
        let renames = if wants_renames && base == "HEAD" {
            match self.rename_map().await {
                Ok(map) => map,
                Err(e) => {
                    warn!(error = %e, "rename detection query failed");
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        for record in state.staged.iter_mut() {
            match self.staged_diff(record, base, &renames).await {
                Ok(Computed::Diff(text)) => {
                    record.diff = text;
                    stats.annotated += 1;
                }
                Ok(Computed::Oversize(summary)) => {
                    record.diff = summary;
                    stats.truncated += 1;
                }
                Ok(Computed::Binary) => {
                    debug!(path = %record.path, "binary file, omitting diff");
                    stats.binary += 1;
                }
                Ok(Computed::Skipped) => {
                    stats.failed += 1;
                }
                Err(e) => {
                    warn!(path = %record.path, error = %e, "diff computation failed, continuing");
                    stats.failed += 1;
                }
            }
        }

        stats
    }

    async fn staged_diff(
        &self,
        record: &FileRecord,
        base: &str,
        renames: &HashMap<String, RenameInfo>,
    ) -> Result<Computed, GitError> {
        if self.worktree_is_binary(&record.path).await {
            return Ok(Computed::Binary);
        }

        match record.status {
            FileStatus::Renamed | FileStatus::Copied => match renames.get(&record.path) {
                Some(info) => Ok(Computed::Diff(rename_summary(info, &record.path))),
                None => {
                    warn!(path = %record.path, "rename details unavailable, omitting diff");
                    Ok(Computed::Skipped)
                }
            },
            FileStatus::Unmerged => {
                // Conflicted index entries cannot be diffed against a base;
                // fall back to the worktree-vs-index view, best effort.
                let output = self.runner.run(&["diff", "-U0", "--", &record.path]).await?;
                if !output.success() {
                    warn!(path = %record.path, "diff of unmerged path failed, omitting");
                    return Ok(Computed::Skipped);
                }
                Ok(self.bounded(&record.path, output.stdout).await)
            }
            _ => {
                let output = self
                    .runner
                    .run_checked(&["diff", "--cached", "-U0", base, "--", &record.path])
                    .await?;
                Ok(self.bounded(&record.path, output.stdout).await)
            }
        }
    }

    /// Apply the per-file size cap, substituting the metadata block when the
    /// raw diff is too large.
    async fn bounded(&self, path: &str, raw: String) -> Computed {
        if raw.chars().count() <= self.max_chars {
            return Computed::Diff(raw);
        }
        let (size, lines) = self.file_stats(path).await;
        Computed::Oversize(oversize_summary(path, &raw, size, lines))
    }

    /// `HEAD` when at least one commit exists, the empty tree otherwise.
    async fn comparison_base(&self) -> Result<&'static str, GitError> {
        let output = self
            .runner
            .run(&["rev-parse", "--verify", "--quiet", "HEAD"])
            .await?;
        if output.success() {
            Ok("HEAD")
        } else {
            Ok(EMPTY_TREE_OID)
        }
    }

    /// One rename/copy query shared by every renamed record in the pass.
    async fn rename_map(&self) -> Result<HashMap<String, RenameInfo>, GitError> {
        let output = self
            .runner
            .run_checked(&["diff", "--cached", "--name-status", "--find-renames"])
            .await?;
        Ok(parse_name_status(&output.stdout))
    }

    async fn worktree_is_binary(&self, path: &str) -> bool {
        if has_binary_extension(path) {
            return true;
        }

        let full = self.runner.repo_root().join(path);
        let mut file = match tokio::fs::File::open(&full).await {
            Ok(f) => f,
            Err(_) => return false,
        };
        let mut buf = [0u8; BINARY_SNIFF_BYTES];
        match file.read(&mut buf).await {
            Ok(n) => buf[..n].contains(&0),
            Err(_) => false,
        }
    }

    async fn file_stats(&self, path: &str) -> (u64, usize) {
        let full = self.runner.repo_root().join(path);
        match tokio::fs::read(&full).await {
            Ok(bytes) => (bytes.len() as u64, count_lines(&bytes)),
            Err(_) => (0, 0),
        }
    }
}

fn has_binary_extension(path: &str) -> bool {
    match path.rsplit_once('.') {
        Some((_, ext)) => BINARY_EXTENSIONS.contains(ext.to_lowercase().as_str()),
        None => false,
    }
}

fn count_lines(bytes: &[u8]) -> usize {
    let newlines = bytes.iter().filter(|&&b| b == b'\n').count();
    if bytes.is_empty() || bytes.ends_with(b"\n") {
        newlines
    } else {
        newlines + 1
    }
}

/// Added/removed line counts from raw diff text, skipping file headers.
fn count_changes(raw: &str) -> (usize, usize) {
    let mut additions = 0;
    let mut deletions = 0;
    for line in raw.lines() {
        if line.starts_with("+++") || line.starts_with("---") {
            continue;
        }
        if line.starts_with('+') {
            additions += 1;
        } else if line.starts_with('-') {
            deletions += 1;
        }
    }
    (additions, deletions)
}

/// Fixed-format stand-in for a diff that blew the size cap.
fn oversize_summary(path: &str, raw: &str, size: u64, lines: usize) -> String {
    let (additions, deletions) = count_changes(raw);
    format!(
        "File: {path}\nSize: {size} bytes\nLines: {lines}\nChanges: +{additions} -{deletions}"
    )
}

fn rename_summary(info: &RenameInfo, path: &str) -> String {
    let verb = if info.copy { "copy" } else { "rename" };
    match info.similarity {
        Some(pct) => format!(
            "{verb} from {}\n{verb} to {}\nsimilarity {pct}%",
            info.from, path
        ),
        None => format!("{verb} from {}\n{verb} to {}", info.from, path),
    }
}

/// Parse `--name-status --find-renames` output into target-path lookups.
fn parse_name_status(raw: &str) -> HashMap<String, RenameInfo> {
    let mut map = HashMap::new();
    for line in raw.lines() {
        let mut fields = line.split('\t');
        let code = match fields.next() {
            Some(c) if !c.is_empty() => c,
            _ => continue,
        };
        let kind = code.as_bytes()[0];
        if kind != b'R' && kind != b'C' {
            continue;
        }
        let (from, to) = match (fields.next(), fields.next()) {
            (Some(from), Some(to)) => (unquote_path(from), unquote_path(to)),
            _ => continue,
        };
        map.insert(
            to,
            RenameInfo {
                copy: kind == b'C',
                from,
                similarity: code[1..].parse().ok(),
            },
        );
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_extension_lookup() {
        assert!(has_binary_extension("logo.png"));
        assert!(has_binary_extension("assets/FONT.WOFF2"));
        assert!(has_binary_extension("release.tar.gz"));
        assert!(!has_binary_extension("main.rs"));
        assert!(!has_binary_extension("Makefile"));
        assert!(!has_binary_extension(".gitignore"));
    }

    #[test]
    fn test_count_changes_skips_file_headers() {
        let raw = "diff --git a/x b/x\n--- a/x\n+++ b/x\n@@ -1 +1,2 @@\n-old\n+new\n+more\n";
        assert_eq!(count_changes(raw), (2, 1));
    }

    #[test]
    fn test_count_lines_handles_missing_trailing_newline() {
        assert_eq!(count_lines(b""), 0);
        assert_eq!(count_lines(b"one\ntwo\n"), 2);
        assert_eq!(count_lines(b"one\ntwo"), 2);
    }

    #[test]
    fn test_oversize_summary_shape() {
        let mut raw = String::from("diff --git a/big.go b/big.go\n+++ b/big.go\n");
        for _ in 0..350 {
            raw.push_str("+added line of content\n");
        }
        assert!(raw.chars().count() > MAX_DIFF_CHARS);

        let summary = oversize_summary("big.go", &raw, 9001, 420);
        assert_eq!(
            summary,
            "File: big.go\nSize: 9001 bytes\nLines: 420\nChanges: +350 -0"
        );
    }

    #[test]
    fn test_rename_summary_with_similarity() {
        let info = RenameInfo {
            copy: false,
            from: "old.go".into(),
            similarity: Some(97),
        };
        assert_eq!(
            rename_summary(&info, "new.go"),
            "rename from old.go\nrename to new.go\nsimilarity 97%"
        );
    }

    #[test]
    fn test_rename_summary_without_similarity() {
        let info = RenameInfo {
            copy: true,
            from: "a.rs".into(),
            similarity: None,
        };
        assert_eq!(rename_summary(&info, "b.rs"), "copy from a.rs\ncopy to b.rs");
    }

    #[test]
    fn test_parse_name_status_picks_renames_and_copies() {
        let raw = "M\tkept.go\nR100\told.go\tnew.go\nC075\tbase.rs\tcopy.rs\n";
        let map = parse_name_status(raw);

        assert_eq!(map.len(), 2);
        let rename = &map["new.go"];
        assert!(!rename.copy);
        assert_eq!(rename.from, "old.go");
        assert_eq!(rename.similarity, Some(100));

        let copy = &map["copy.rs"];
        assert!(copy.copy);
        assert_eq!(copy.similarity, Some(75));
    }

    #[test]
    fn test_parse_name_status_tolerates_scoreless_codes() {
        let map = parse_name_status("R\ta\tb\n");
        assert_eq!(map["b"].similarity, None);
    }
}

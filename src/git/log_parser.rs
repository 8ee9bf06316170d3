use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

use crate::error::{Error, Result};
use crate::types::{AnalysisInput, RawBranch, RawCommit, RawFileChange, RawTimestamp};

// Unit separator: cannot appear in names, emails or subjects
const FIELD_SEP: char = '\u{1f}';
const COMMIT_MARKER: &str = "COMMIT\u{1f}";

/// Builds an [`AnalysisInput`] from a local repository: the newest
/// `max_commits` commits with per-file numstat, plus local branches.
/// Local branches carry no protection flag, so they are all unprotected.
pub fn read_repository(cwd: &Path, max_commits: usize) -> Result<AnalysisInput> {
    let commits = parse_log(cwd, max_commits)?;
    let branches = list_branches(cwd)?;
    let current_branch = current_branch(cwd)?;
    Ok(AnalysisInput { commits, branches, current_branch, load_warnings: Vec::new() })
}

/// Runs a single `git log --numstat` and returns one raw commit per entry
/// with its file-level line counts.
pub fn parse_log(cwd: &Path, max_commits: usize) -> Result<Vec<RawCommit>> {
    // quotePath=false keeps non-ASCII names as UTF-8 instead of octal escapes
    let args: Vec<String> = vec![
        "-c".into(),
        "core.quotePath=false".into(),
        "log".into(),
        format!("--max-count={max_commits}"),
        "--format=COMMIT\u{1f}%H\u{1f}%an\u{1f}%ae\u{1f}%aI\u{1f}%cI\u{1f}%s".into(),
        "--numstat".into(),
    ];

    let mut child = Command::new("git")
        .args(&args)
        .current_dir(cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::Git(format!("Failed to run git: {e}")))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| Error::Git("Failed to capture git stdout".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| Error::Git("Failed to capture git stderr".to_string()))?;

    let stderr_reader = thread::spawn(move || {
        let mut stderr_text = String::new();
        let mut reader = BufReader::new(stderr);
        let _ = reader.read_to_string(&mut stderr_text);
        stderr_text
    });

    let mut commits: Vec<RawCommit> = Vec::new();
    let mut current: Option<RawCommit> = None;

    for line in BufReader::new(stdout).lines() {
        let line = line.map_err(|e| Error::Git(format!("Failed reading git output: {e}")))?;
        parse_log_line(&line, &mut commits, &mut current);
    }

    if let Some(c) = current.take() {
        commits.push(c);
    }

    let status = child
        .wait()
        .map_err(|e| Error::Git(format!("Failed to wait for git process: {e}")))?;

    if !status.success() {
        let stderr_text = stderr_reader.join().unwrap_or_default();
        return Err(Error::Git(format!("git log failed: {}", stderr_text.trim())));
    }

    let _ = stderr_reader.join();

    tracing::debug!(commits = commits.len(), path = %cwd.display(), "parsed git log");
    Ok(commits)
}

fn parse_log_line(line: &str, commits: &mut Vec<RawCommit>, current: &mut Option<RawCommit>) {
    if let Some(rest) = line.strip_prefix(COMMIT_MARKER) {
        if let Some(c) = current.take() {
            commits.push(c);
        }
        let mut parts = rest.splitn(6, FIELD_SEP);
        let mut next = || parts.next().map(str::to_string).filter(|s| !s.is_empty());
        *current = Some(RawCommit {
            hash: next(),
            author_name: next(),
            author_email: next(),
            author_date: next().map(RawTimestamp::Text),
            committer_date: next().map(RawTimestamp::Text),
            message: next(),
            files: Some(Vec::new()),
            stats: None,
        });
        return;
    }

    let trimmed = line.trim();
    if trimmed.is_empty() {
        return;
    }

    // numstat: <additions>\t<deletions>\t<path>; binary files show '-'
    let mut parts = trimmed.splitn(3, '\t');
    if let (Some(added_raw), Some(deleted_raw), Some(raw_name)) = (parts.next(), parts.next(), parts.next()) {
        let Some(path) = normalize_filename(raw_name) else { return };
        let Some(c) = current.as_mut() else { return };
        c.files.get_or_insert_with(Vec::new).push(RawFileChange {
            path: Some(path),
            status: None,
            additions: Some(added_raw.parse().unwrap_or(0)),
            deletions: Some(deleted_raw.parse().unwrap_or(0)),
            changes: None,
        });
    }
}

/// Normalizes git rename notations to the new path:
///   "src/{old => new}/file.js" → "src/new/file.js"
///   "old-name => new-name"     → "new-name"
fn normalize_filename(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let path = if raw.contains('{') && raw.contains("=>") {
        let result = RENAME_RE.replace(&unquote_path(raw), "$2").replace("//", "/");
        if result.contains('{') {
            return None;
        }
        result
    } else if raw.contains(" => ") {
        // Each side may be quoted on its own: "old" => "new"
        raw.rsplit(" => ").next().map(|s| unquote_path(s.trim()))?
    } else {
        unquote_path(raw)
    };
    let t = path.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

static RENAME_RE: once_cell::sync::Lazy<regex::Regex> = once_cell::sync::Lazy::new(|| {
    regex::Regex::new(r"\{([^}]*) => ([^}]*)\}").expect("rename regex")
});

/// Undoes git's C-style quoting of unusual paths, e.g. `"tab\there.rs"` or
/// octal-escaped UTF-8. Unquoted input is returned as is.
fn unquote_path(raw: &str) -> String {
    let Some(inner) = raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) else {
        return raw.to_string();
    };
    let mut bytes: Vec<u8> = Vec::with_capacity(inner.len());
    let mut iter = inner.bytes().peekable();
    while let Some(b) = iter.next() {
        if b != b'\\' {
            bytes.push(b);
            continue;
        }
        match iter.next() {
            Some(b'n') => bytes.push(b'\n'),
            Some(b't') => bytes.push(b'\t'),
            Some(b'r') => bytes.push(b'\r'),
            Some(b'a') => bytes.push(0x07),
            Some(b'b') => bytes.push(0x08),
            Some(b'f') => bytes.push(0x0c),
            Some(b'v') => bytes.push(0x0b),
            Some(d @ b'0'..=b'7') => {
                let mut value = u32::from(d - b'0');
                for _ in 0..2 {
                    match iter.peek() {
                        Some(&n @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(n - b'0');
                            iter.next();
                        }
                        _ => break,
                    }
                }
                bytes.push((value & 0xff) as u8);
            }
            Some(other) => bytes.push(other),
            None => bytes.push(b'\\'),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

fn run_git(cwd: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .output()
        .map_err(|e| Error::Git(format!("Failed to run git {}: {e}", args.join(" "))))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Git(format!("git {} failed: {}", args.join(" "), stderr.trim())));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn list_branches(cwd: &Path) -> Result<Vec<RawBranch>> {
    let out = run_git(cwd, &["for-each-ref", "--format=%(refname:short)", "refs/heads"])?;
    Ok(out
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|name| RawBranch { name: name.to_string(), ..Default::default() })
        .collect())
}

fn current_branch(cwd: &Path) -> Result<Option<String>> {
    let out = run_git(cwd, &["rev-parse", "--abbrev-ref", "HEAD"])?;
    let name = out.trim();
    // Detached HEAD reports the literal "HEAD"
    Ok((!name.is_empty() && name != "HEAD").then(|| name.to_string()))
}

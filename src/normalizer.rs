use chrono::{DateTime, Utc};
use tracing::debug;

use crate::analyzers::saturating_sum;
use crate::types::{
    AuthorIdentity, CommitRecord, CommitStats, FileChange, FileStatus, RawCommit, RawFileChange,
    RawTimestamp,
};

/// Normalized commits plus counts of what had to be repaired on the way.
#[derive(Debug, Clone, Default)]
pub struct NormalizedCommits {
    /// Newest first; commits without a timestamp last.
    pub commits: Vec<CommitRecord>,
    pub source_commits: usize,
    pub truncated: usize,
    pub unknown_authors: usize,
    pub missing_timestamps: usize,
    pub dropped_file_entries: usize,
}

impl NormalizedCommits {
    /// One human-readable line per kind of repair applied.
    pub fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.truncated > 0 {
            out.push(format!(
                "{} older commits skipped (max_commits = {})",
                self.truncated,
                self.commits.len()
            ));
        }
        if self.unknown_authors > 0 {
            out.push(format!("{} commits had no author; counted as \"Unknown\"", self.unknown_authors));
        }
        if self.missing_timestamps > 0 {
            out.push(format!(
                "{} commits had no parsable timestamp; excluded from time-based metrics",
                self.missing_timestamps
            ));
        }
        if self.dropped_file_entries > 0 {
            out.push(format!("{} file entries without a path were ignored", self.dropped_file_entries));
        }
        out
    }
}

/// Normalizes every raw commit and keeps the `max_commits` most recent.
pub fn normalize_commits(raw: &[RawCommit], max_commits: usize) -> NormalizedCommits {
    let mut out = NormalizedCommits { source_commits: raw.len(), ..Default::default() };

    let mut commits: Vec<CommitRecord> = raw
        .iter()
        .map(|r| {
            out.dropped_file_entries += r
                .files
                .as_ref()
                .map_or(0, |files| files.iter().filter(|f| file_path(f).is_none()).count());
            normalize_commit(r)
        })
        .collect();

    // Newest first; ties broken by hash so truncation does not depend on caller order.
    commits.sort_by(|a, b| match (a.timestamp(), b.timestamp()) {
        (Some(x), Some(y)) => y.cmp(&x).then_with(|| a.hash.cmp(&b.hash)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.hash.cmp(&b.hash),
    });

    if commits.len() > max_commits {
        out.truncated = commits.len() - max_commits;
        commits.truncate(max_commits);
    }

    out.unknown_authors = commits.iter().filter(|c| c.author.name == AuthorIdentity::UNKNOWN && c.author.email.is_empty()).count();
    out.missing_timestamps = commits.iter().filter(|c| c.timestamp().is_none()).count();
    out.commits = commits;

    debug!(
        source = out.source_commits,
        kept = out.commits.len(),
        truncated = out.truncated,
        "normalized commits"
    );
    out
}

/// Turns one raw record into a [`CommitRecord`]. Never fails: missing pieces
/// get defaults.
pub fn normalize_commit(raw: &RawCommit) -> CommitRecord {
    let files: Vec<FileChange> = raw
        .files
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter_map(normalize_file)
        .collect();

    let stats = match &raw.stats {
        Some(s) => {
            let additions = s.additions.unwrap_or(0);
            let deletions = s.deletions.unwrap_or(0);
            CommitStats { additions, deletions, total: s.total.unwrap_or(additions.saturating_add(deletions)) }
        }
        None => {
            let additions = saturating_sum(files.iter().map(|f| f.additions));
            let deletions = saturating_sum(files.iter().map(|f| f.deletions));
            CommitStats { additions, deletions, total: additions.saturating_add(deletions) }
        }
    };

    CommitRecord {
        hash: raw.hash.as_deref().map(str::trim).unwrap_or_default().to_string(),
        author: normalize_author(raw.author_name.as_deref(), raw.author_email.as_deref()),
        authored_at: raw.author_date.as_ref().and_then(parse_timestamp),
        committed_at: raw.committer_date.as_ref().and_then(parse_timestamp),
        message: raw.message.clone().unwrap_or_default(),
        files,
        stats,
    }
}

fn normalize_author(name: Option<&str>, email: Option<&str>) -> AuthorIdentity {
    let name = name.map(str::trim).unwrap_or_default();
    let email = email.map(str::trim).unwrap_or_default();
    let display = match (name.is_empty(), email.is_empty()) {
        (false, _) => name,
        (true, false) => email,
        (true, true) => AuthorIdentity::UNKNOWN,
    };
    AuthorIdentity { name: display.to_string(), email: email.to_string() }
}

fn file_path(raw: &RawFileChange) -> Option<&str> {
    raw.path.as_deref().filter(|p| !p.trim().is_empty())
}

fn normalize_file(raw: &RawFileChange) -> Option<FileChange> {
    // Paths are opaque: no trimming beyond emptiness, no decoding.
    let path = file_path(raw)?;
    let additions = raw.additions.unwrap_or(0);
    let deletions = raw.deletions.unwrap_or(0);
    Some(FileChange {
        path: path.to_string(),
        status: raw.status.as_deref().map_or(FileStatus::Modified, FileStatus::parse),
        additions,
        deletions,
        changes: raw.changes.unwrap_or(additions.saturating_add(deletions)),
    })
}

/// Accepts RFC 3339, git's default `%Y-%m-%d %H:%M:%S %z`, and Unix seconds
/// (integral or fractional).
pub fn parse_timestamp(raw: &RawTimestamp) -> Option<DateTime<Utc>> {
    match raw {
        RawTimestamp::Unix(secs) => DateTime::from_timestamp(*secs, 0),
        RawTimestamp::Float(secs) => {
            if !secs.is_finite() {
                return None;
            }
            let whole = secs.floor();
            let nanos = ((secs - whole) * 1e9) as u32;
            DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
        }
        RawTimestamp::Text(text) => {
            let t = text.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(dt) = DateTime::parse_from_str(t, "%Y-%m-%d %H:%M:%S %z") {
                return Some(dt.with_timezone(&Utc));
            }
            t.parse::<i64>().ok().and_then(|secs| DateTime::from_timestamp(secs, 0))
        }
    }
}

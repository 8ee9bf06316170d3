use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{AnalysisInput, RawBranch, RawCommit, RawCommitStats, RawFileChange, RawTimestamp};

/// The document shape, with each record kept loose until it is checked.
#[derive(Deserialize)]
struct SnapshotDocument {
    #[serde(default)]
    commits: Vec<Value>,
    #[serde(default)]
    branches: Vec<Value>,
    #[serde(default)]
    current_branch: Value,
}

#[derive(Default)]
struct Repairs {
    commits: usize,
    branches: usize,
    dropped_branches: usize,
}

impl Repairs {
    fn warnings(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.commits > 0 {
            out.push(format!("{} commit records had malformed fields; unreadable values were ignored", self.commits));
        }
        if self.branches > 0 {
            out.push(format!("{} branch records had malformed fields; unreadable values were ignored", self.branches));
        }
        if self.dropped_branches > 0 {
            out.push(format!("{} branch records without a name were dropped", self.dropped_branches));
        }
        out
    }
}

/// Reads an already-fetched history dump:
/// `{ "commits": [...], "branches": [...], "current_branch": "main" }`.
///
/// Only an unreadable file or a document that is not this shape is an error.
/// A record with a wrongly-typed field keeps its readable fields, and the
/// repair is reported through [`AnalysisInput::load_warnings`].
pub fn load_input(path: &Path) -> Result<AnalysisInput> {
    let file = File::open(path).map_err(|source| Error::Input { path: path.to_path_buf(), source })?;
    let doc: SnapshotDocument = serde_json::from_reader(BufReader::new(file))?;

    let mut repairs = Repairs::default();
    let commits: Vec<RawCommit> = doc.commits.into_iter().map(|v| commit_from_value(v, &mut repairs)).collect();
    let branches: Vec<RawBranch> = doc
        .branches
        .into_iter()
        .filter_map(|v| branch_from_value(v, &mut repairs))
        .collect();
    let current_branch = doc.current_branch.as_str().map(str::to_string);

    let load_warnings = repairs.warnings();
    for w in &load_warnings {
        tracing::warn!(path = %path.display(), "{w}");
    }
    tracing::debug!(
        path = %path.display(),
        commits = commits.len(),
        branches = branches.len(),
        "loaded input snapshot"
    );
    Ok(AnalysisInput { commits, branches, current_branch, load_warnings })
}

// ─── Record repair ────────────────────────────────────────────────────────────

fn commit_from_value(value: Value, repairs: &mut Repairs) -> RawCommit {
    if let Ok(commit) = RawCommit::deserialize(&value) {
        return commit;
    }
    repairs.commits += 1;
    let Some(obj) = value.as_object() else {
        return RawCommit::default();
    };
    RawCommit {
        hash: text(obj, "hash").or_else(|| text(obj, "sha")),
        author_name: text(obj, "author_name"),
        author_email: text(obj, "author_email"),
        author_date: obj.get("author_date").and_then(timestamp),
        committer_date: obj.get("committer_date").and_then(timestamp),
        message: text(obj, "message"),
        files: obj.get("files").and_then(Value::as_array).map(|files| {
            files.iter().filter_map(Value::as_object).map(file_from_object).collect()
        }),
        stats: obj.get("stats").and_then(Value::as_object).map(|s| RawCommitStats {
            additions: count(s, "additions"),
            deletions: count(s, "deletions"),
            total: count(s, "total"),
        }),
    }
}

fn file_from_object(obj: &Map<String, Value>) -> RawFileChange {
    RawFileChange {
        path: text(obj, "path").or_else(|| text(obj, "filename")),
        status: text(obj, "status"),
        additions: count(obj, "additions"),
        deletions: count(obj, "deletions"),
        changes: count(obj, "changes"),
    }
}

fn branch_from_value(value: Value, repairs: &mut Repairs) -> Option<RawBranch> {
    if let Ok(branch) = RawBranch::deserialize(&value) {
        return Some(branch);
    }
    let Some(name) = value.as_object().and_then(|obj| text(obj, "name")) else {
        repairs.dropped_branches += 1;
        return None;
    };
    repairs.branches += 1;
    let obj = value.as_object()?;
    Some(RawBranch {
        name,
        protected: obj.get("protected").and_then(Value::as_bool).unwrap_or(false),
        ahead: count(obj, "ahead"),
        behind: count(obj, "behind"),
    })
}

fn text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Non-negative integers, non-negative finite floats (truncated) and numeric
/// strings; anything else is unreadable.
fn count(obj: &Map<String, Value>, key: &str) -> Option<u64> {
    match obj.get(key)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn timestamp(value: &Value) -> Option<RawTimestamp> {
    match value {
        Value::Number(n) => n.as_i64().map(RawTimestamp::Unix).or_else(|| n.as_f64().map(RawTimestamp::Float)),
        Value::String(s) => Some(RawTimestamp::Text(s.clone())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_snapshot(json: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("history.json");
        std::fs::write(&path, json).expect("write");
        (dir, path)
    }

    #[test]
    fn test_loads_hosting_api_spelling() {
        let (_dir, path) = write_snapshot(
            r#"{
                "commits": [
                    {
                        "sha": "abc123",
                        "author_name": "Ada",
                        "author_date": "2024-05-01T10:00:00Z",
                        "files": [{ "filename": "src/lib.rs", "status": "modified", "additions": 3, "deletions": 1 }]
                    },
                    { "author_date": 1714557600 },
                    {}
                ],
                "branches": [{ "name": "main", "protected": true }],
                "current_branch": "main"
            }"#,
        );

        let input = load_input(&path).expect("should load");
        assert_eq!(input.commits.len(), 3);
        assert_eq!(input.commits[0].hash.as_deref(), Some("abc123"));
        let files = input.commits[0].files.as_ref().expect("files present");
        assert_eq!(files[0].path.as_deref(), Some("src/lib.rs"));
        assert_eq!(input.commits[1].author_date, Some(RawTimestamp::Unix(1_714_557_600)));
        assert!(input.commits[2].files.is_none(), "missing files stay None");
        assert!(input.branches[0].protected);
        assert_eq!(input.current_branch.as_deref(), Some("main"));
        assert!(input.load_warnings.is_empty(), "clean input needs no repairs");
    }

    #[test]
    fn test_fractional_timestamp_parses_without_repair() {
        let (_dir, path) = write_snapshot(r#"{ "commits": [{ "author_date": 1700000000.5 }] }"#);
        let input = load_input(&path).expect("should load");
        assert_eq!(input.commits[0].author_date, Some(RawTimestamp::Float(1_700_000_000.5)));
        assert!(input.load_warnings.is_empty());
    }

    #[test]
    fn test_malformed_fields_are_repaired_not_fatal() {
        let (_dir, path) = write_snapshot(
            r#"{
                "commits": [
                    { "sha": "ok", "author_name": "Ada", "files": [{ "path": "a.rs", "additions": 1 }] },
                    {
                        "sha": "bad",
                        "author_name": 42,
                        "author_date": 1700000000.5,
                        "files": [
                            { "path": "b.rs", "additions": -1, "deletions": "7" },
                            "not-an-object",
                            { "filename": "c.rs", "changes": 2.9 }
                        ],
                        "stats": { "additions": true }
                    },
                    "garbage"
                ],
                "branches": [{ "name": "main", "protected": "yes" }, { "protected": true }],
                "current_branch": 7
            }"#,
        );

        let input = load_input(&path).expect("bad records must not fail the load");
        assert_eq!(input.commits.len(), 3, "every record is kept");
        assert_eq!(input.commits[0].hash.as_deref(), Some("ok"));

        let bad = &input.commits[1];
        assert_eq!(bad.hash.as_deref(), Some("bad"));
        assert!(bad.author_name.is_none(), "non-string author is dropped");
        assert_eq!(bad.author_date, Some(RawTimestamp::Float(1_700_000_000.5)));
        let files = bad.files.as_ref().expect("files kept");
        assert_eq!(files.len(), 2, "non-object file entries are skipped");
        assert_eq!(files[0].additions, None, "negative count is unreadable");
        assert_eq!(files[0].deletions, Some(7), "numeric strings are read");
        assert_eq!(files[1].path.as_deref(), Some("c.rs"));
        assert_eq!(files[1].changes, Some(2));
        assert_eq!(bad.stats.as_ref().and_then(|s| s.additions), None);

        assert_eq!(input.commits[2], RawCommit::default(), "non-object record becomes an empty commit");

        assert_eq!(input.branches.len(), 1);
        assert!(!input.branches[0].protected);
        assert!(input.current_branch.is_none());

        assert_eq!(input.load_warnings.len(), 3, "{:?}", input.load_warnings);
        assert!(input.load_warnings[0].starts_with("2 commit records"), "{:?}", input.load_warnings);
    }

    #[test]
    fn test_missing_file_is_input_error_naming_the_path() {
        let err = load_input(Path::new("/nonexistent/history.json")).unwrap_err();
        assert!(matches!(err, Error::Input { .. }), "got {err:?}");
        assert!(err.to_string().contains("history.json"), "{err}");
    }

    #[test]
    fn test_non_object_document_is_an_error() {
        let (_dir, path) = write_snapshot("[1, 2, 3]");
        assert!(matches!(load_input(&path), Err(Error::Json(_))));
    }
}

use std::collections::{BTreeMap, BTreeSet};

use crate::types::CommitRecord;

// Skip files touched by more authors than this (changelogs, lockfiles)
const MAX_AUTHORS_PER_FILE: usize = 50;

/// Counts, for every pair of authors, how many distinct files both touched.
/// Authors are identified by [`AuthorIdentity::key`]; map keys are
/// `"<a> & <b>"` with `a < b`.
///
/// [`AuthorIdentity::key`]: crate::types::AuthorIdentity::key
pub fn analyze_collaboration(commits: &[CommitRecord]) -> BTreeMap<String, usize> {
    // path → author keys
    let mut file_authors: BTreeMap<&str, BTreeSet<String>> = BTreeMap::new();
    for commit in commits {
        if commit.files.is_empty() {
            continue;
        }
        let author = commit.author.key();
        for file in &commit.files {
            file_authors.entry(file.path.as_str()).or_default().insert(author.clone());
        }
    }

    let mut pair_counts: BTreeMap<String, usize> = BTreeMap::new();
    for authors in file_authors.values() {
        if authors.len() < 2 || authors.len() > MAX_AUTHORS_PER_FILE {
            continue;
        }
        // BTreeSet iterates sorted, so each pair comes out as (a, b) with a < b
        let names: Vec<&str> = authors.iter().map(String::as_str).collect();
        for i in 0..names.len() {
            for j in (i + 1)..names.len() {
                *pair_counts.entry(format!("{} & {}", names[i], names[j])).or_insert(0) += 1;
            }
        }
    }
    pair_counts
}

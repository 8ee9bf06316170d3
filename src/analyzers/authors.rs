use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};

use super::round_to;
use crate::types::{AuthorVelocity, CommitRecord};

// productivity = volume + spread + size, each saturating at its cap
const VOLUME_WEIGHT: f64 = 45.0;
const SPREAD_WEIGHT: f64 = 40.0;
const SIZE_WEIGHT:   f64 = 15.0;

const VOLUME_SATURATION_COMMITS: f64 = 50.0;
const SPREAD_SATURATION_DAYS:    f64 = 20.0;
const SIZE_SATURATION_LINES:     f64 = 50.0;

#[derive(Default)]
struct AuthorAccumulator {
    name: String,
    email: String,
    commits: usize,
    additions: u64,
    deletions: u64,
    files: HashSet<String>,
    days: HashSet<NaiveDate>,
}

/// Folds commits into one velocity record per author identity.
/// Sorted by commit count descending, then name.
pub fn analyze_authors(commits: &[CommitRecord]) -> Vec<AuthorVelocity> {
    // identity key → accumulator
    let mut by_author: BTreeMap<String, AuthorAccumulator> = BTreeMap::new();

    for commit in commits {
        let acc = by_author.entry(commit.author.key()).or_insert_with(|| AuthorAccumulator {
            name: commit.author.name.clone(),
            email: commit.author.email.clone(),
            ..Default::default()
        });
        acc.commits += 1;
        acc.additions = acc.additions.saturating_add(commit.stats.additions);
        acc.deletions = acc.deletions.saturating_add(commit.stats.deletions);
        acc.files.extend(commit.files.iter().map(|f| f.path.clone()));
        if let Some(day) = commit.day() {
            acc.days.insert(day);
        }
    }

    let mut authors: Vec<AuthorVelocity> = by_author.into_values().map(finalize).collect();
    authors.sort_by(|a, b| {
        b.commits
            .cmp(&a.commits)
            .then_with(|| a.author.cmp(&b.author))
            .then_with(|| a.email.cmp(&b.email))
    });
    authors
}

fn finalize(acc: AuthorAccumulator) -> AuthorVelocity {
    let avg_commit_size = if acc.commits > 0 {
        acc.additions.saturating_add(acc.deletions) as f64 / acc.commits as f64
    } else {
        0.0
    };
    AuthorVelocity {
        productivity_score: productivity_score(acc.commits, acc.days.len(), avg_commit_size),
        author: acc.name,
        email: acc.email,
        commits: acc.commits,
        additions: acc.additions,
        deletions: acc.deletions,
        files_changed: acc.files.len(),
        avg_commit_size: round_to(avg_commit_size, 2),
        active_days: acc.days.len(),
    }
}

/// Composite of commit volume, active-day spread and average commit size,
/// clamped to 0–100.
pub fn productivity_score(commits: usize, active_days: usize, avg_commit_size: f64) -> f64 {
    let volume = (commits as f64 / VOLUME_SATURATION_COMMITS).min(1.0);
    let spread = (active_days as f64 / SPREAD_SATURATION_DAYS).min(1.0);
    let size   = (avg_commit_size.max(0.0) / SIZE_SATURATION_LINES).min(1.0);
    let score = volume * VOLUME_WEIGHT + spread * SPREAD_WEIGHT + size * SIZE_WEIGHT;
    round_to(score.clamp(0.0, 100.0), 1)
}

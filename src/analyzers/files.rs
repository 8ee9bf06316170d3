use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

use super::round_to;
use crate::types::{CodeChurnEntry, CommitRecord, HotFile, ImpactTier, RiskTier};

pub const MAX_HOT_FILES: usize = 20;

// Impact: relative share of the busiest file's changes (percent)...
const IMPACT_RELATIVE_CRITICAL: f64 = 75.0;
const IMPACT_RELATIVE_HIGH:     f64 = 50.0;
const IMPACT_RELATIVE_MEDIUM:   f64 = 25.0;
// ...capped by absolute line counts so a tiny repo has no critical files.
const IMPACT_ABSOLUTE_CRITICAL: u64 = 1000;
const IMPACT_ABSOLUTE_HIGH:     u64 = 300;
const IMPACT_ABSOLUTE_MEDIUM:   u64 = 50;

const CHURN_VERY_HIGH:     u64 = 1000;
const CHURN_HIGH:          u64 = 200;
const YOUNG_FILE_DAYS:     i64 = 30;
const AUTHOR_COMPLEXITY_STEP: f64 = 0.25;

const SECS_PER_WEEK: f64 = 7.0 * 86_400.0;

#[derive(Default)]
struct FileAccumulator {
    changes: u64,
    additions: u64,
    deletions: u64,
    touches: usize,
    authors: BTreeSet<String>,
    first_seen: Option<DateTime<Utc>>,
    last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct FileAnalysis {
    /// Top [`MAX_HOT_FILES`] by total changes.
    pub hot_files: Vec<HotFile>,
    /// Every touched file, highest churn first.
    pub code_churn: Vec<CodeChurnEntry>,
    pub total_files: usize,
}

/// Accumulates per-path statistics across all commits, then ranks hot files
/// and scores churn risk. `now` anchors file ages.
pub fn analyze_files(
    commits: &[CommitRecord],
    complexity_threshold: f64,
    now: DateTime<Utc>,
) -> FileAnalysis {
    // path → accumulator
    let mut by_path: BTreeMap<String, FileAccumulator> = BTreeMap::new();

    for commit in commits {
        let ts = commit.timestamp();
        for file in &commit.files {
            let acc = by_path.entry(file.path.clone()).or_default();
            acc.changes = acc.changes.saturating_add(file.changes);
            acc.additions = acc.additions.saturating_add(file.additions);
            acc.deletions = acc.deletions.saturating_add(file.deletions);
            acc.touches += 1;
            acc.authors.insert(commit.author.key());
            if let Some(t) = ts {
                acc.first_seen = Some(acc.first_seen.map_or(t, |f| f.min(t)));
                acc.last_seen = Some(acc.last_seen.map_or(t, |l| l.max(t)));
            }
        }
    }

    let max_changes = by_path.values().map(|a| a.changes).max().unwrap_or(0);

    let mut hot_files: Vec<HotFile> = by_path
        .iter()
        .map(|(path, acc)| HotFile {
            path: path.clone(),
            changes: acc.changes,
            additions: acc.additions,
            deletions: acc.deletions,
            last_modified: acc.last_seen,
            authors: acc.authors.iter().cloned().collect(),
            change_frequency: change_frequency(acc.changes, acc.first_seen, acc.last_seen),
            impact: impact_tier(acc.changes, max_changes),
        })
        .collect();
    hot_files.sort_by(|a, b| b.changes.cmp(&a.changes).then_with(|| a.path.cmp(&b.path)));
    hot_files.truncate(MAX_HOT_FILES);

    let mut code_churn: Vec<CodeChurnEntry> = by_path
        .iter()
        .map(|(path, acc)| {
            let churn = acc.additions.saturating_add(acc.deletions);
            let age_days = acc.first_seen.map_or(0, |f| (now - f).num_days().max(0));
            let complexity = complexity(churn, acc.touches, acc.authors.len());
            CodeChurnEntry {
                path: path.clone(),
                churn,
                age_days,
                complexity,
                risk: risk_tier(churn, age_days, complexity, complexity_threshold),
            }
        })
        .collect();
    code_churn.sort_by(|a, b| b.churn.cmp(&a.churn).then_with(|| a.path.cmp(&b.path)));

    FileAnalysis { hot_files, code_churn, total_files: by_path.len() }
}

/// Changes per week of activity on the file, with at least one week.
fn change_frequency(
    changes: u64,
    first: Option<DateTime<Utc>>,
    last: Option<DateTime<Utc>>,
) -> f64 {
    let weeks = match (first, last) {
        (Some(f), Some(l)) => (l - f).num_seconds() as f64 / SECS_PER_WEEK,
        _ => 0.0,
    };
    round_to(changes as f64 / weeks.max(1.0), 2)
}

/// Lower of the relative tier (share of the busiest file) and the absolute tier.
pub fn impact_tier(changes: u64, max_changes: u64) -> ImpactTier {
    let relative = if max_changes == 0 {
        ImpactTier::Low
    } else {
        let pct = changes as f64 / max_changes as f64 * 100.0;
        if pct >= IMPACT_RELATIVE_CRITICAL { ImpactTier::Critical }
        else if pct >= IMPACT_RELATIVE_HIGH { ImpactTier::High }
        else if pct >= IMPACT_RELATIVE_MEDIUM { ImpactTier::Medium }
        else { ImpactTier::Low }
    };
    let absolute = if changes >= IMPACT_ABSOLUTE_CRITICAL { ImpactTier::Critical }
        else if changes >= IMPACT_ABSOLUTE_HIGH { ImpactTier::High }
        else if changes >= IMPACT_ABSOLUTE_MEDIUM { ImpactTier::Medium }
        else { ImpactTier::Low };
    relative.min(absolute)
}

/// Coarse heuristic: lines per touch, inflated by each extra author.
pub fn complexity(churn: u64, touches: usize, authors: usize) -> f64 {
    if touches == 0 {
        return 0.0;
    }
    let per_touch = churn as f64 / touches as f64;
    let author_factor = 1.0 + AUTHOR_COMPLEXITY_STEP * authors.saturating_sub(1) as f64;
    round_to(per_touch * author_factor, 2)
}

/// Points for churn magnitude, youth and complexity; 3+ is high, 2 medium.
pub fn risk_tier(churn: u64, age_days: i64, complexity: f64, complexity_threshold: f64) -> RiskTier {
    let mut points = 0;
    if churn >= CHURN_VERY_HIGH {
        points += 2;
    } else if churn >= CHURN_HIGH {
        points += 1;
    }
    if age_days < YOUNG_FILE_DAYS {
        points += 1;
    }
    if complexity > complexity_threshold {
        points += 1;
    }
    match points {
        3.. => RiskTier::High,
        2 => RiskTier::Medium,
        _ => RiskTier::Low,
    }
}

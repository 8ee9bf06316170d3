use chrono::{Datelike, NaiveDate, Timelike};
use std::collections::{BTreeMap, HashSet};

use super::collaboration::analyze_collaboration;
use super::{round_to, saturating_sum};
use crate::types::{
    CommitPattern, CommitRecord, DevelopmentVelocity, IntensityTier, PeakDay, SizeDistribution,
    TimeRange,
};

// Commit size buckets (additions + deletions), upper bounds inclusive
const SMALL_MAX_LINES:  u64 = 10;
const MEDIUM_MAX_LINES: u64 = 50;
const LARGE_MAX_LINES:  u64 = 200;

// Intensity by average commits per day
const INTENSITY_MEDIUM:    f64 = 1.0;
const INTENSITY_HIGH:      f64 = 3.0;
const INTENSITY_VERY_HIGH: f64 = 8.0;

const PEAK_PERCENTILE: f64 = 0.9;
const MAX_PEAK_DAYS: usize = 10;

const NO_EXTENSION: &str = "(none)";

/// Hour/weekday/size histograms plus collaboration and file-type maps.
/// Commits without a timestamp are left out of the three histograms.
pub fn analyze_patterns(commits: &[CommitRecord]) -> CommitPattern {
    let mut pattern = CommitPattern::default();

    for commit in commits {
        for file in &commit.files {
            *pattern.file_types.entry(file_extension(&file.path)).or_insert(0) += 1;
        }

        let Some(ts) = commit.timestamp() else { continue };
        pattern.hour_of_day[ts.hour() as usize] += 1;
        pattern.day_of_week[ts.weekday().num_days_from_sunday() as usize] += 1;
        record_size(&mut pattern.size_distribution, commit.lines_changed());
    }

    pattern.author_collaboration = analyze_collaboration(commits);
    pattern
}

fn record_size(dist: &mut SizeDistribution, lines: u64) {
    if lines <= SMALL_MAX_LINES {
        dist.small += 1;
    } else if lines <= MEDIUM_MAX_LINES {
        dist.medium += 1;
    } else if lines <= LARGE_MAX_LINES {
        dist.large += 1;
    } else {
        dist.huge += 1;
    }
}

/// Lowercased extension of the last path segment; dotfiles have none.
pub fn file_extension(path: &str) -> String {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => name[idx + 1..].to_lowercase(),
        _ => NO_EXTENSION.to_string(),
    }
}

/// Repository-wide throughput over the whole commit set.
pub fn analyze_velocity(commits: &[CommitRecord]) -> DevelopmentVelocity {
    let total_commits = commits.len();
    let active_authors = commits.iter().map(|c| c.author.key()).collect::<HashSet<_>>().len();

    // day → commits
    let mut per_day: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for day in commits.iter().filter_map(|c| c.day()) {
        *per_day.entry(day).or_insert(0) += 1;
    }

    let days_active = match (per_day.keys().next(), per_day.keys().next_back()) {
        (Some(first), Some(last)) => (*last - *first).num_days() + 1,
        _ => 1,
    }
    .max(1);

    let total_lines = saturating_sum(commits.iter().map(|c| c.lines_changed()));
    let avg_commits_per_day = total_commits as f64 / days_active as f64;

    DevelopmentVelocity {
        total_commits,
        active_authors,
        days_active,
        commit_days: per_day.len(),
        avg_commits_per_day: round_to(avg_commits_per_day, 2),
        avg_lines_per_day: round_to(total_lines as f64 / days_active as f64, 2),
        peak_development_days: peak_days(&per_day),
        intensity: intensity_tier(avg_commits_per_day),
    }
}

/// Days at or above the 90th-percentile daily commit count (linear
/// interpolation). Days at the minimum count never qualify, so a uniform
/// history has no peaks.
fn peak_days(per_day: &BTreeMap<NaiveDate, usize>) -> Vec<PeakDay> {
    if per_day.is_empty() {
        return Vec::new();
    }
    let mut counts: Vec<usize> = per_day.values().copied().collect();
    counts.sort_unstable();
    let pos = PEAK_PERCENTILE * (counts.len() - 1) as f64;
    let (lo, hi) = (pos.floor() as usize, pos.ceil() as usize);
    let threshold = counts[lo] as f64 + (counts[hi] as f64 - counts[lo] as f64) * (pos - lo as f64);
    let min = counts[0];

    let mut peaks: Vec<PeakDay> = per_day
        .iter()
        .filter(|(_, &n)| n > min && n as f64 >= threshold)
        .map(|(&date, &commits)| PeakDay { date, commits })
        .collect();
    peaks.sort_by(|a, b| b.commits.cmp(&a.commits).then_with(|| a.date.cmp(&b.date)));
    peaks.truncate(MAX_PEAK_DAYS);
    peaks
}

pub fn intensity_tier(avg_commits_per_day: f64) -> IntensityTier {
    if avg_commits_per_day >= INTENSITY_VERY_HIGH { IntensityTier::VeryHigh }
    else if avg_commits_per_day >= INTENSITY_HIGH { IntensityTier::High }
    else if avg_commits_per_day >= INTENSITY_MEDIUM { IntensityTier::Medium }
    else { IntensityTier::Low }
}

/// Earliest and latest commit timestamps, ignoring undated commits.
pub fn time_range(commits: &[CommitRecord]) -> TimeRange {
    let stamps = commits.iter().filter_map(|c| c.timestamp());
    TimeRange {
        start: stamps.clone().min(),
        end: stamps.max(),
    }
}

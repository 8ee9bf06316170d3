//! The analysis pipeline: normalize, aggregate, score, recommend, assemble.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::analyzers::authors::analyze_authors;
use crate::analyzers::files::{analyze_files, FileAnalysis};
use crate::analyzers::saturating_sum;
use crate::analyzers::temporal::{analyze_patterns, analyze_velocity, time_range};
use crate::config::AnalysisOptions;
use crate::normalizer::{normalize_commits, NormalizedCommits};
use crate::recommendations::{build_recommendations, RecommendationInputs};
use crate::scoring::score_health;
use crate::types::*;

/// Runs the engine against the current wall clock.
pub fn analyze(input: &AnalysisInput, options: &AnalysisOptions) -> AnalysisReport {
    analyze_at(input, options, Utc::now())
}

/// Runs the engine with `now` as the reference time for file ages and
/// `last_updated`. Identical inputs and `now` give identical `data`.
///
/// Never fails: malformed records are repaired during normalization and
/// reported through `metadata.warnings`.
pub fn analyze_at(input: &AnalysisInput, options: &AnalysisOptions, now: DateTime<Utc>) -> AnalysisReport {
    let started = Instant::now();
    info!(
        commits = input.commits.len(),
        branches = input.branches.len(),
        max_commits = options.max_commits,
        "starting commit analysis"
    );

    let normalized = normalize_commits(&input.commits, options.max_commits);
    let commits = normalized.commits.as_slice();

    // The aggregators only read the normalized commits, so they run side by side.
    let (authors, (files, (patterns, velocity))) = rayon::join(
        || analyze_authors(commits),
        || rayon::join(
            || analyze_files(commits, options.complexity_threshold, now),
            || rayon::join(
                || analyze_patterns(commits),
                || analyze_velocity(commits),
            ),
        ),
    );
    debug!(
        authors = authors.len(),
        files = files.total_files,
        days_active = velocity.days_active,
        "aggregation complete"
    );

    let branches: Vec<BranchInfo> = input
        .branches
        .iter()
        .map(|b| BranchInfo { name: b.name.clone(), protected: b.protected })
        .collect();

    let health = score_health(&velocity, &authors, &files.code_churn, &branches, &options.weights);
    let recommendations = build_recommendations(&RecommendationInputs {
        velocity: &velocity,
        authors: &authors,
        hot_files: &files.hot_files,
        churn: &files.code_churn,
        patterns: &patterns,
        health: &health,
    });
    debug!(
        overall = %health.overall_health,
        score = health.overall_score,
        recommendations = recommendations.len(),
        "health scored"
    );

    let data = assemble_result(
        &normalized,
        Aggregates { authors, files, patterns, velocity },
        branch_analysis(input, branches),
        health,
        recommendations,
        options,
    );

    let mut warnings = input.load_warnings.clone();
    warnings.extend(normalized.warnings());
    for w in &warnings {
        warn!("{w}");
    }

    let analysis_time = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!(
        analyzed = normalized.commits.len(),
        elapsed_ms = analysis_time,
        "commit analysis finished"
    );

    AnalysisReport {
        success: true,
        error: None,
        metadata: AnalysisMetadata {
            analyzed_commits: normalized.commits.len(),
            source_commits: normalized.source_commits,
            analysis_time,
            last_updated: now,
            degraded: !warnings.is_empty(),
            warnings,
        },
        data,
    }
}

struct Aggregates {
    authors: Vec<AuthorVelocity>,
    files: FileAnalysis,
    patterns: CommitPattern,
    velocity: DevelopmentVelocity,
}

fn branch_analysis(input: &AnalysisInput, branches: Vec<BranchInfo>) -> BranchAnalysis {
    let divergence: BTreeMap<String, BranchDivergence> = input
        .branches
        .iter()
        .filter(|b| b.ahead.is_some() || b.behind.is_some())
        .map(|b| {
            (
                b.name.clone(),
                BranchDivergence { ahead: b.ahead.unwrap_or(0), behind: b.behind.unwrap_or(0) },
            )
        })
        .collect();
    BranchAnalysis {
        current_branch: input.current_branch.clone(),
        branches,
        divergence,
    }
}

/// Packages the aggregates, dropping sections the options turn off.
fn assemble_result(
    normalized: &NormalizedCommits,
    aggregates: Aggregates,
    branches: BranchAnalysis,
    health: RepositoryHealth,
    recommendations: Vec<String>,
    options: &AnalysisOptions,
) -> AnalysisResult {
    let commits = &normalized.commits;
    let Aggregates { authors, files, patterns, velocity } = aggregates;

    let commit_history = CommitHistory {
        total_commits: commits.len(),
        total_additions: saturating_sum(commits.iter().map(|c| c.stats.additions)),
        total_deletions: saturating_sum(commits.iter().map(|c| c.stats.deletions)),
        total_files: files.total_files,
        time_range: time_range(commits),
        authors: options.include_author_analysis.then_some(authors),
        hot_files: options.include_file_analysis.then_some(files.hot_files),
        code_churn: options.include_file_analysis.then_some(files.code_churn),
        velocity,
        patterns,
    };

    AnalysisResult {
        commit_history,
        branch_analysis: options.include_branches.then_some(branches),
        repository_health: health,
        recommendations,
    }
}

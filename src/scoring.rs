use crate::analyzers::round_to;
use crate::types::*;

/// Ordered (minimum overall score, category) pairs; below the last is Poor.
const HEALTH_LADDER: [(f64, OverallHealth); 3] = [
    (85.0, OverallHealth::Excellent),
    (70.0, OverallHealth::Good),
    (50.0, OverallHealth::Fair),
];

// Commit frequency: rate + day coverage
const FREQUENCY_RATE_WEIGHT:     f64 = 40.0;
const FREQUENCY_COVERAGE_WEIGHT: f64 = 60.0;
const TARGET_COMMITS_PER_DAY:    f64 = 1.0;
const TARGET_COMMIT_DAYS:        f64 = 30.0;

// Contributor diversity: significant authors + evenness
const SIGNIFICANT_SHARE:          f64 = 0.05;
const TARGET_SIGNIFICANT_AUTHORS: f64 = 5.0;
const DOMINANT_SHARE:             f64 = 0.8;
const DOMINANT_CAP:               f64 = 30.0;

/// Combines the four independent sub-scores into [`RepositoryHealth`].
pub fn score_health(
    velocity: &DevelopmentVelocity,
    authors:  &[AuthorVelocity],
    churn:    &[CodeChurnEntry],
    branches: &[BranchInfo],
    weights:  &HealthWeights,
) -> RepositoryHealth {
    let w = weights.normalized();

    let commit_frequency_score      = commit_frequency_score(velocity);
    let contributor_diversity_score = contributor_diversity_score(authors);
    let code_churn_score            = code_churn_score(churn);
    let branch_management_score     = branch_management_score(branches);

    let overall_score = round_to(
        commit_frequency_score      * w.commit_frequency      +
        contributor_diversity_score * w.contributor_diversity +
        code_churn_score            * w.code_churn            +
        branch_management_score     * w.branch_management,
        1,
    );

    RepositoryHealth {
        commit_frequency_score,
        contributor_diversity_score,
        code_churn_score,
        branch_management_score,
        overall_score,
        overall_health: overall_health(overall_score),
    }
}

/// High when commits are both frequent and spread over many days.
pub fn commit_frequency_score(velocity: &DevelopmentVelocity) -> f64 {
    let rate     = (velocity.avg_commits_per_day / TARGET_COMMITS_PER_DAY).min(1.0);
    let coverage = (velocity.commit_days as f64 / TARGET_COMMIT_DAYS).min(1.0);
    round_to(rate * FREQUENCY_RATE_WEIGHT + coverage * FREQUENCY_COVERAGE_WEIGHT, 1)
}

/// High when several authors each carry a real share of the commits.
/// A dominant author caps the score regardless of head count.
pub fn contributor_diversity_score(authors: &[AuthorVelocity]) -> f64 {
    let total: usize = authors.iter().map(|a| a.commits).sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    let top_share = authors.iter().map(|a| a.commits).max().unwrap_or(0) as f64 / total;
    let significant = authors
        .iter()
        .filter(|a| a.commits as f64 / total >= SIGNIFICANT_SHARE)
        .count() as f64;

    let score = (significant / TARGET_SIGNIFICANT_AUTHORS).min(1.0) * 50.0 + (1.0 - top_share) * 50.0;
    let score = if top_share >= DOMINANT_SHARE { score.min(DOMINANT_CAP) } else { score };
    round_to(score, 1)
}

/// 100 minus the percentage of high-risk churn entries; 100 when there are none.
pub fn code_churn_score(churn: &[CodeChurnEntry]) -> f64 {
    if churn.is_empty() {
        return 100.0;
    }
    let high = churn.iter().filter(|c| c.risk == RiskTier::High).count() as f64;
    round_to(100.0 * (1.0 - high / churn.len() as f64), 1)
}

/// Percentage of protected branches; 0 when there are no branches.
pub fn branch_management_score(branches: &[BranchInfo]) -> f64 {
    if branches.is_empty() {
        return 0.0;
    }
    let protected = branches.iter().filter(|b| b.protected).count() as f64;
    round_to(100.0 * protected / branches.len() as f64, 1)
}

pub fn overall_health(score: f64) -> OverallHealth {
    HEALTH_LADDER
        .iter()
        .find(|(min, _)| score >= *min)
        .map_or(OverallHealth::Poor, |(_, category)| *category)
}

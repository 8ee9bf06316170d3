use crate::types::*;

pub const MAX_RECOMMENDATIONS: usize = 8;

const WEAK_FREQUENCY:  f64 = 60.0;
const WEAK_DIVERSITY:  f64 = 60.0;
const WEAK_CHURN:      f64 = 70.0;
const WEAK_BRANCHES:   f64 = 50.0;
const DOMINANT_SHARE:  f64 = 0.8;
const HUGE_COMMIT_SHARE: f64 = 0.25;
const OFF_HOURS_SHARE:   f64 = 0.30;
const HOT_FILES_NAMED: usize = 3;

/// Everything the rules look at, borrowed from one analysis run.
pub struct RecommendationInputs<'a> {
    pub velocity:  &'a DevelopmentVelocity,
    pub authors:   &'a [AuthorVelocity],
    pub hot_files: &'a [HotFile],
    pub churn:     &'a [CodeChurnEntry],
    pub patterns:  &'a CommitPattern,
    pub health:    &'a RepositoryHealth,
}

type Rule = fn(&RecommendationInputs<'_>) -> Option<String>;

/// Rule order is output order.
const RULES: [Rule; 8] = [
    commit_frequency,
    contributor_diversity,
    hot_files,
    code_churn,
    branch_protection,
    commit_size,
    off_hours,
    development_velocity,
];

/// Evaluates each rule in a fixed order (frequency, contributors, hot files,
/// churn, branches, commit size, timing, velocity). Rules are independent;
/// the list is capped at [`MAX_RECOMMENDATIONS`].
pub fn build_recommendations(input: &RecommendationInputs<'_>) -> Vec<String> {
    apply_rules(&RULES, input, MAX_RECOMMENDATIONS)
}

/// Runs `rules` in order and keeps the first `limit` that fire.
fn apply_rules(rules: &[Rule], input: &RecommendationInputs<'_>, limit: usize) -> Vec<String> {
    let mut recs: Vec<String> = rules.iter().filter_map(|rule| rule(input)).collect();
    if recs.len() > limit {
        tracing::debug!(fired = recs.len(), limit, "recommendation list truncated");
        recs.truncate(limit);
    }
    recs
}

fn commit_frequency(input: &RecommendationInputs<'_>) -> Option<String> {
    let velocity = input.velocity;
    (input.health.commit_frequency_score < WEAK_FREQUENCY).then(|| {
        format!(
            "Improve commit frequency: {:.2} commits/day with activity on {} of {} days; \
             commit smaller changes more often",
            velocity.avg_commits_per_day, velocity.commit_days, velocity.days_active
        )
    })
}

fn contributor_diversity(input: &RecommendationInputs<'_>) -> Option<String> {
    if input.health.contributor_diversity_score >= WEAK_DIVERSITY {
        return None;
    }
    let total: usize = input.authors.iter().map(|a| a.commits).sum();
    match input.authors.first() {
        Some(top) if total > 0 && top.commits as f64 / total as f64 >= DOMINANT_SHARE => Some(format!(
            "Broaden contributor base: {} authored {}% of commits; \
             pair on or rotate ownership of core areas",
            top.author,
            (top.commits as f64 / total as f64 * 100.0).round()
        )),
        _ => Some(format!(
            "Broaden contributor base: {} active contributor{}; \
             spread reviews and changes across more people",
            input.authors.len(),
            if input.authors.len() == 1 { "" } else { "s" }
        )),
    }
}

fn hot_files(input: &RecommendationInputs<'_>) -> Option<String> {
    let impactful: Vec<&str> = input
        .hot_files
        .iter()
        .filter(|h| h.impact >= ImpactTier::High)
        .map(|h| h.path.as_str())
        .collect();
    if impactful.is_empty() {
        return None;
    }
    let named = impactful.iter().take(HOT_FILES_NAMED).copied().collect::<Vec<_>>().join(", ");
    Some(format!(
        "Review hot files: {} file{} with high change impact ({}); \
         consider refactoring or adding tests",
        impactful.len(),
        if impactful.len() == 1 { "" } else { "s" },
        named
    ))
}

fn code_churn(input: &RecommendationInputs<'_>) -> Option<String> {
    (input.health.code_churn_score < WEAK_CHURN).then(|| {
        let high = input.churn.iter().filter(|c| c.risk == RiskTier::High).count();
        format!(
            "Reduce code churn: {high} of {} files are high-risk (young, heavily rewritten or complex)",
            input.churn.len()
        )
    })
}

fn branch_protection(input: &RecommendationInputs<'_>) -> Option<String> {
    let score = input.health.branch_management_score;
    (score < WEAK_BRANCHES).then(|| {
        format!(
            "Enable branch protection: only {score:.0}% of branches are protected; \
             protect the default and release branches"
        )
    })
}

fn commit_size(input: &RecommendationInputs<'_>) -> Option<String> {
    let sizes = &input.patterns.size_distribution;
    let sized = sizes.total();
    if sized == 0 {
        return None;
    }
    let huge_share = sizes.huge as f64 / sized as f64;
    (huge_share > HUGE_COMMIT_SHARE).then(|| {
        format!(
            "Split large commits: {}% of commits change more than 200 lines",
            (huge_share * 100.0).round()
        )
    })
}

fn off_hours(input: &RecommendationInputs<'_>) -> Option<String> {
    let sized = input.patterns.size_distribution.total();
    if sized == 0 {
        return None;
    }
    let hours = &input.patterns.hour_of_day;
    let off_hours: usize = hours[22..24].iter().sum::<usize>() + hours[0..6].iter().sum::<usize>();
    let off_share = off_hours as f64 / sized as f64;
    (off_share > OFF_HOURS_SHARE).then(|| {
        format!(
            "Watch off-hours work: {}% of commits land between 22:00 and 06:00 UTC",
            (off_share * 100.0).round()
        )
    })
}

fn development_velocity(input: &RecommendationInputs<'_>) -> Option<String> {
    let velocity = input.velocity;
    (velocity.total_commits > 0 && velocity.intensity == IntensityTier::Low).then(|| {
        format!(
            "Raise development velocity: {:.2} commits/day is a low pace for an active project",
            velocity.avg_commits_per_day
        )
    })
}

use chrono::{DateTime, Utc};
use pretty_assertions::assert_eq;

use commit_insights::types::*;
use commit_insights::{analyze_at, logging, AnalysisOptions};

const DAY: i64 = 86_400;
// 2024-01-01T00:00:00Z, a Monday
const BASE: i64 = 1_704_067_200;

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

fn commit(hash: &str, author: &str, secs: i64, files: &[(&str, u64, u64)]) -> RawCommit {
    RawCommit {
        hash: Some(hash.to_string()),
        author_name: Some(author.to_string()),
        author_email: Some(format!("{author}@example.com")),
        author_date: Some(RawTimestamp::Unix(secs)),
        message: Some(format!("change by {author}")),
        files: Some(
            files
                .iter()
                .map(|(path, additions, deletions)| RawFileChange {
                    path: Some(path.to_string()),
                    additions: Some(*additions),
                    deletions: Some(*deletions),
                    ..Default::default()
                })
                .collect(),
        ),
        ..Default::default()
    }
}

fn branch(name: &str, protected: bool) -> RawBranch {
    RawBranch { name: name.to_string(), protected, ..Default::default() }
}

/// Five authors, two small daytime commits a day for 60 days, every
/// branch protected.
fn healthy_input() -> AnalysisInput {
    let authors = ["alice", "bob", "carol", "dave", "erin"];
    let mut commits = Vec::new();
    for day in 0..60 {
        for (slot, hour) in [10, 14].into_iter().enumerate() {
            let author = authors[(day as usize * 2 + slot) % authors.len()];
            let file = format!("src/{author}.rs");
            commits.push(commit(
                &format!("h{day:02}{slot}"),
                author,
                BASE + day * DAY + hour * 3600,
                &[(file.as_str(), 2, 1)],
            ));
        }
    }
    AnalysisInput {
        commits,
        branches: vec![branch("main", true), branch("release", true)],
        current_branch: Some("main".to_string()),
        ..Default::default()
    }
}

/// One author, ten heavy commits to the same file spread over 300 days,
/// no branches.
fn poor_input() -> AnalysisInput {
    let commits = (0..10)
        .map(|i| commit(&format!("p{i}"), "solo", BASE + i * 30 * DAY + 12 * 3600, &[("src/core.rs", 40, 10)]))
        .collect();
    AnalysisInput { commits, ..Default::default() }
}

fn mixed_input() -> AnalysisInput {
    let mut commits = vec![
        commit("a1", "alice", BASE + 3600, &[("src/lib.rs", 120, 30), ("README.md", 5, 0)]),
        commit("b1", "bob", BASE + DAY + 23 * 3600, &[("src/lib.rs", 4, 4), ("Cargo.toml", 1, 1)]),
        commit("a2", "alice", BASE + 2 * DAY, &[("src/main.rs", 300, 0)]),
        commit("c1", "carol", BASE + 5 * DAY, &[]),
    ];
    commits.push(RawCommit {
        hash: Some("nodate".to_string()),
        author_name: Some("bob".to_string()),
        files: Some(vec![RawFileChange { path: Some("docs/guide.md".to_string()), additions: Some(7), ..Default::default() }]),
        ..Default::default()
    });
    AnalysisInput {
        commits,
        branches: vec![branch("main", true), branch("wip", false)],
        ..Default::default()
    }
}

fn now() -> DateTime<Utc> {
    at(BASE + 400 * DAY)
}

// ─── Aggregate consistency ────────────────────────────────────────────────────

#[test]
fn test_author_commits_sum_to_total() {
    logging::init_test();
    let report = analyze_at(&mixed_input(), &AnalysisOptions::default(), now());
    let history = &report.data.commit_history;
    let authors = history.authors.as_ref().expect("authors included by default");
    let sum: usize = authors.iter().map(|a| a.commits).sum();
    assert_eq!(sum, history.total_commits);
    assert_eq!(history.total_commits, 5);
}

#[test]
fn test_hot_file_and_churn_totals_are_consistent() {
    let report = analyze_at(&mixed_input(), &AnalysisOptions::default(), now());
    let history = &report.data.commit_history;
    for hot in history.hot_files.as_ref().unwrap() {
        assert_eq!(hot.changes, hot.additions + hot.deletions, "{}", hot.path);
        assert!(!hot.authors.is_empty(), "{} has no authors", hot.path);
    }
    let churn_sum: u64 = history.code_churn.as_ref().unwrap().iter().map(|c| c.churn).sum();
    assert_eq!(churn_sum, history.total_additions + history.total_deletions);
    assert_eq!(history.total_files, 5);
}

#[test]
fn test_histograms_count_dated_commits() {
    let report = analyze_at(&mixed_input(), &AnalysisOptions::default(), now());
    let patterns = &report.data.commit_history.patterns;
    let dated = 4;
    assert_eq!(patterns.hour_of_day.iter().sum::<usize>(), dated);
    assert_eq!(patterns.day_of_week.iter().sum::<usize>(), dated);
    assert_eq!(patterns.size_distribution.total(), dated);
    assert_eq!(patterns.hour_of_day[23], 1, "bob's late commit lands in hour 23");
    assert_eq!(patterns.day_of_week[1], 1, "2024-01-01 is a Monday");
    assert_eq!(report.metadata.warnings.len(), 1, "{:?}", report.metadata.warnings);
    assert!(report.metadata.degraded);
}

#[test]
fn test_hot_files_are_capped_at_twenty() {
    let files: Vec<(String, u64, u64)> = (0..100).map(|i| (format!("src/f{i:03}.rs"), i + 1, 0)).collect();
    let refs: Vec<(&str, u64, u64)> = files.iter().map(|(p, a, d)| (p.as_str(), *a, *d)).collect();
    let input = AnalysisInput { commits: vec![commit("big", "alice", BASE, &refs)], ..Default::default() };

    let report = analyze_at(&input, &AnalysisOptions::default(), now());
    let history = &report.data.commit_history;
    let hot = history.hot_files.as_ref().unwrap();
    assert_eq!(hot.len(), 20);
    assert_eq!(hot[0].path, "src/f099.rs", "busiest file first");
    assert_eq!(history.code_churn.as_ref().unwrap().len(), 100, "churn keeps every file");
    assert_eq!(history.total_files, 100);
    assert_eq!(history.patterns.size_distribution.huge, 1);
}

#[test]
fn test_commits_without_files_still_count() {
    let input = AnalysisInput {
        commits: vec![
            RawCommit { files: None, ..commit("x", "alice", BASE, &[]) },
            commit("y", "alice", BASE + DAY, &[]),
        ],
        ..Default::default()
    };
    let report = analyze_at(&input, &AnalysisOptions::default(), now());
    let history = &report.data.commit_history;
    assert_eq!(history.total_commits, 2);
    assert_eq!(history.total_files, 0);
    assert_eq!(history.authors.as_ref().unwrap()[0].commits, 2);
    assert_eq!(history.velocity.commit_days, 2);
    assert_eq!(history.patterns.size_distribution.small, 2);
}

#[test]
fn test_empty_input() {
    let report = analyze_at(&AnalysisInput::default(), &AnalysisOptions::default(), now());
    assert!(report.success);
    assert!(!report.metadata.degraded);
    let history = &report.data.commit_history;
    assert_eq!(history.total_commits, 0);
    assert_eq!(history.time_range, TimeRange { start: None, end: None });
    assert!(history.patterns.author_collaboration.is_empty());
    assert_eq!(report.data.repository_health.overall_health, OverallHealth::Poor);
}

// ─── Scenarios ────────────────────────────────────────────────────────────────

#[test]
fn test_single_author_sparse_history_is_not_healthy() {
    let report = analyze_at(&poor_input(), &AnalysisOptions::default(), now());
    let health = &report.data.repository_health;
    assert!(health.commit_frequency_score < 50.0, "frequency {}", health.commit_frequency_score);
    assert!(health.contributor_diversity_score < 50.0, "diversity {}", health.contributor_diversity_score);
    assert_eq!(health.branch_management_score, 0.0);
    assert_ne!(health.overall_health, OverallHealth::Excellent);
    assert!(health.overall_health <= OverallHealth::Fair);

    let recs = report.data.recommendations.join("\n");
    for keyword in ["commit frequency", "contributor", "hot files"] {
        assert!(recs.contains(keyword), "missing '{keyword}' in {recs}");
    }
}

#[test]
fn test_balanced_team_is_excellent() {
    let report = analyze_at(&healthy_input(), &AnalysisOptions::default(), now());
    let health = &report.data.repository_health;
    assert!(health.commit_frequency_score > 80.0, "frequency {}", health.commit_frequency_score);
    assert!(health.contributor_diversity_score > 80.0, "diversity {}", health.contributor_diversity_score);
    assert!(health.code_churn_score > 80.0, "churn {}", health.code_churn_score);
    assert!(health.branch_management_score > 80.0, "branches {}", health.branch_management_score);
    assert_eq!(health.overall_health, OverallHealth::Excellent);

    let velocity = &report.data.commit_history.velocity;
    assert_eq!(velocity.days_active, 60);
    assert_eq!(velocity.commit_days, 60);
    assert!(velocity.peak_development_days.is_empty(), "uniform history has no peaks");
}

#[test]
fn test_healthy_repo_gets_fewer_recommendations() {
    let healthy = analyze_at(&healthy_input(), &AnalysisOptions::default(), now());
    let poor = analyze_at(&poor_input(), &AnalysisOptions::default(), now());
    assert!(
        healthy.data.recommendations.len() < poor.data.recommendations.len(),
        "healthy {:?} vs poor {:?}",
        healthy.data.recommendations,
        poor.data.recommendations
    );
    assert!(poor.data.recommendations.len() <= 8);
}

// ─── Determinism ──────────────────────────────────────────────────────────────

#[test]
fn test_same_input_same_data() {
    let input = mixed_input();
    let first = analyze_at(&input, &AnalysisOptions::default(), now());
    let second = analyze_at(&input, &AnalysisOptions::default(), now());
    assert_eq!(
        serde_json::to_value(&first.data).unwrap(),
        serde_json::to_value(&second.data).unwrap()
    );
}

#[test]
fn test_input_order_does_not_change_data() {
    let input = mixed_input();
    let mut reversed = input.clone();
    reversed.commits.reverse();
    let a = analyze_at(&input, &AnalysisOptions::default(), now());
    let b = analyze_at(&reversed, &AnalysisOptions::default(), now());
    assert_eq!(serde_json::to_value(&a.data).unwrap(), serde_json::to_value(&b.data).unwrap());
}

#[test]
fn test_hot_file_changes_sum_every_touch() {
    let report = analyze_at(&mixed_input(), &AnalysisOptions::default(), now());
    let hot = report.data.commit_history.hot_files.unwrap();
    let lib = hot.iter().find(|h| h.path == "src/lib.rs").expect("src/lib.rs is hot");
    assert_eq!(lib.changes, 120 + 30 + 4 + 4);
    assert_eq!(
        lib.authors,
        vec!["alice <alice@example.com>".to_string(), "bob <bob@example.com>".to_string()],
        "hot-file authors use the same identity key as author velocity"
    );
}

#[test]
fn test_unusual_paths_are_opaque() {
    let input = AnalysisInput {
        commits: vec![commit(
            "u1",
            "alice",
            BASE,
            &[("app/[id]/página.TSX", 3, 0), ("assets/logo.png", 0, 0), (".gitignore", 1, 0)],
        )],
        ..Default::default()
    };
    let report = analyze_at(&input, &AnalysisOptions::default(), now());
    let history = &report.data.commit_history;
    let paths: Vec<&str> = history.hot_files.as_ref().unwrap().iter().map(|h| h.path.as_str()).collect();
    assert!(paths.contains(&"app/[id]/página.TSX"), "{paths:?}");
    let types = &history.patterns.file_types;
    assert_eq!(types.get("tsx"), Some(&1));
    assert_eq!(types.get("png"), Some(&1));
    assert_eq!(types.get("(none)"), Some(&1), "dotfiles have no extension");
}

// ─── Robustness ───────────────────────────────────────────────────────────────

#[test]
fn test_oversized_line_counts_saturate_instead_of_panicking() {
    let input = AnalysisInput {
        commits: vec![
            commit("huge", "alice", BASE, &[("data/dump.sql", u64::MAX, 1)]),
            commit("small", "bob", BASE + DAY, &[("data/dump.sql", 5, 5)]),
        ],
        ..Default::default()
    };
    let report = analyze_at(&input, &AnalysisOptions::default(), now());
    assert!(report.success);
    let history = &report.data.commit_history;
    assert_eq!(history.total_additions, u64::MAX, "additions pin at the ceiling");
    assert_eq!(history.total_deletions, 6);
    let hot = &history.hot_files.as_ref().unwrap()[0];
    assert_eq!(hot.changes, u64::MAX);
    assert_eq!(history.code_churn.as_ref().unwrap()[0].churn, u64::MAX);
    assert_eq!(history.patterns.size_distribution.huge, 1);
}

#[test]
fn test_committer_time_dates_a_commit_without_author_time() {
    // 2024-01-02T09:00:00Z, a Tuesday
    let committed = BASE + DAY + 9 * 3600;
    let input = AnalysisInput {
        commits: vec![
            RawCommit {
                author_date: None,
                committer_date: Some(RawTimestamp::Unix(committed)),
                ..commit("c1", "alice", 0, &[("src/lib.rs", 1, 0)])
            },
            RawCommit {
                committer_date: Some(RawTimestamp::Unix(BASE + 3 * DAY)),
                ..commit("c2", "bob", BASE + 3 * DAY + 15 * 3600, &[("src/lib.rs", 1, 0)])
            },
        ],
        ..Default::default()
    };
    let report = analyze_at(&input, &AnalysisOptions::default(), now());
    let history = &report.data.commit_history;
    let patterns = &history.patterns;

    assert_eq!(patterns.hour_of_day[9], 1, "committer hour is used when author time is absent");
    assert_eq!(patterns.hour_of_day[15], 1, "author time wins when both are present");
    assert_eq!(patterns.hour_of_day.iter().sum::<usize>(), 2);
    assert_eq!(patterns.day_of_week[2], 1, "2024-01-02 is a Tuesday");
    assert_eq!(history.velocity.commit_days, 2);
    assert_eq!(history.time_range.start, Some(at(committed)));
    assert_eq!(history.time_range.end, Some(at(BASE + 3 * DAY + 15 * 3600)));
    assert!(report.metadata.warnings.is_empty(), "a committer date is not a repair: {:?}", report.metadata.warnings);
}

#[test]
fn test_load_repairs_surface_as_warnings() {
    let input = AnalysisInput {
        commits: vec![commit("a1", "alice", BASE, &[("src/lib.rs", 1, 0)])],
        load_warnings: vec!["1 commit records had malformed fields; unreadable values were ignored".to_string()],
        ..Default::default()
    };
    let report = analyze_at(&input, &AnalysisOptions::default(), now());
    assert!(report.success);
    assert!(report.metadata.degraded, "a repaired input is degraded");
    assert_eq!(report.metadata.warnings[0], input.load_warnings[0], "load repairs come first");
}

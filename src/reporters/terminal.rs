use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Color, Table};

use crate::types::*;

const TOP_AUTHORS:   usize = 10;
const TOP_HOT_FILES: usize = 10;
const PATH_WIDTH:    usize = 44;

pub fn report_terminal(report: &AnalysisReport) {
    let data = &report.data;
    let history = &data.commit_history;

    eprintln!();
    println!(
        "{} ({} commits, {} files, +{} / -{})",
        "📊 commit-insights".cyan().bold(),
        history.total_commits.to_string().bright_black(),
        history.total_files.to_string().bright_black(),
        history.total_additions.to_string().green(),
        history.total_deletions.to_string().red(),
    );
    if let (Some(start), Some(end)) = (history.time_range.start, history.time_range.end) {
        println!(
            "   {} {} → {}",
            "range:".bright_black(),
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
        );
    }
    println!();

    if report.metadata.degraded {
        println!("{}", "⚠️  Input was repaired during analysis:".yellow());
        for w in &report.metadata.warnings {
            println!("    {} {}", "•".yellow(), w);
        }
        println!();
    }

    print_health(&data.repository_health);
    print_velocity(&history.velocity);

    if history.total_commits == 0 {
        println!("{}", "  No commits to analyze.".yellow());
        println!();
        return;
    }

    if let Some(authors) = &history.authors {
        print_authors(authors);
    }
    if let Some(hot_files) = &history.hot_files {
        print_hot_files(hot_files);
    }
    if let Some(churn) = &history.code_churn {
        print_churn_summary(churn);
    }
    if let Some(branches) = &data.branch_analysis {
        print_branches(branches);
    }

    // ── Recommendations ────────────────────────────────────────────────────
    if !data.recommendations.is_empty() {
        println!();
        println!("{}", "💡 Recommendations:".cyan());
        for rec in &data.recommendations {
            println!("    {} {}", "•".white(), rec);
        }
    }

    println!();
}

// ─── Sections ─────────────────────────────────────────────────────────────────

fn print_health(health: &RepositoryHealth) {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["HEALTH", "SCORE"]);
    table.add_row(vec![Cell::new("Commit frequency"),      score_cell(health.commit_frequency_score)]);
    table.add_row(vec![Cell::new("Contributor diversity"), score_cell(health.contributor_diversity_score)]);
    table.add_row(vec![Cell::new("Code churn"),            score_cell(health.code_churn_score)]);
    table.add_row(vec![Cell::new("Branch management"),     score_cell(health.branch_management_score)]);
    table.add_row(vec![
        Cell::new("Overall").add_attribute(Attribute::Bold),
        health_cell(health.overall_score, health.overall_health),
    ]);
    println!("{table}");
    println!();
}

fn print_velocity(v: &DevelopmentVelocity) {
    println!(
        "{} {:.2} commits/day, {:.1} lines/day over {} day{} ({} with commits), intensity {}",
        "🚀 Velocity:".cyan(),
        v.avg_commits_per_day,
        v.avg_lines_per_day,
        v.days_active,
        if v.days_active == 1 { "" } else { "s" },
        v.commit_days,
        intensity_label(v.intensity),
    );
    if !v.peak_development_days.is_empty() {
        let peaks = v
            .peak_development_days
            .iter()
            .map(|p| format!("{} ({})", p.date, p.commits))
            .collect::<Vec<_>>()
            .join(", ");
        println!("   {} {}", "peak days:".bright_black(), peaks);
    }
    println!();
}

fn print_authors(authors: &[AuthorVelocity]) {
    if authors.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["AUTHOR", "COMMITS", "+LINES", "-LINES", "FILES", "AVG SIZE", "DAYS", "SCORE"]);
    for a in authors.iter().take(TOP_AUTHORS) {
        table.add_row(vec![
            Cell::new(&a.author),
            Cell::new(a.commits),
            Cell::new(a.additions).fg(Color::Green),
            Cell::new(a.deletions).fg(Color::Red),
            Cell::new(a.files_changed),
            Cell::new(format!("{:.1}", a.avg_commit_size)),
            Cell::new(a.active_days),
            score_cell(a.productivity_score),
        ]);
    }
    println!("{}", "👥 Authors".cyan());
    println!("{table}");
    if authors.len() > TOP_AUTHORS {
        println!("{}", format!("   … and {} more", authors.len() - TOP_AUTHORS).bright_black());
    }
    println!();
}

fn print_hot_files(hot_files: &[HotFile]) {
    if hot_files.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["RANK", "FILE", "CHANGES", "PER WEEK", "AUTHORS", "IMPACT"]);
    for (i, h) in hot_files.iter().take(TOP_HOT_FILES).enumerate() {
        table.add_row(vec![
            Cell::new(format!("{:3}", i + 1)),
            Cell::new(truncate_path(&h.path, PATH_WIDTH)),
            Cell::new(h.changes),
            Cell::new(format!("{:.2}", h.change_frequency)),
            Cell::new(h.authors.len()),
            impact_cell(h.impact),
        ]);
    }
    println!("{}", "🔥 Hot files".cyan());
    println!("{table}");
    println!();
}

fn print_churn_summary(churn: &[CodeChurnEntry]) {
    let count = |tier: RiskTier| churn.iter().filter(|c| c.risk == tier).count();
    println!(
        "{} {} high, {} medium, {} low",
        "🌀 Churn risk:".cyan(),
        count(RiskTier::High).to_string().red(),
        count(RiskTier::Medium).to_string().yellow(),
        count(RiskTier::Low).to_string().green(),
    );
    for c in churn.iter().filter(|c| c.risk == RiskTier::High).take(5) {
        println!(
            "    {} {} {}",
            "⚠".red(),
            c.path.cyan(),
            format!("(churn {}, {} days old, complexity {:.1})", c.churn, c.age_days, c.complexity).bright_black(),
        );
    }
    println!();
}

fn print_branches(branches: &BranchAnalysis) {
    let protected = branches.branches.iter().filter(|b| b.protected).count();
    println!(
        "{} {} total, {} protected{}",
        "🌿 Branches:".cyan(),
        branches.branches.len(),
        protected,
        branches
            .current_branch
            .as_deref()
            .map(|b| format!(", on {}", b.bold()))
            .unwrap_or_default(),
    );
    for (name, d) in &branches.divergence {
        println!(
            "    {} {}",
            name.cyan(),
            format!("(+{} ahead, -{} behind)", d.ahead, d.behind).bright_black(),
        );
    }
}

// ─── Cell builders ────────────────────────────────────────────────────────────

/// 0–100 score with plain text so comfy-table measures the visible width.
fn score_cell(score: f64) -> Cell {
    let text = format!("{score:5.1}");
    match score {
        s if s >= 85.0 => Cell::new(text).fg(Color::Green).add_attribute(Attribute::Bold),
        s if s >= 70.0 => Cell::new(text).fg(Color::Green),
        s if s >= 50.0 => Cell::new(text).fg(Color::Yellow),
        _              => Cell::new(text).fg(Color::Red),
    }
}

fn health_cell(score: f64, health: OverallHealth) -> Cell {
    let text = format!("{score:5.1} {health}");
    match health {
        OverallHealth::Excellent => Cell::new(text).fg(Color::Green).add_attribute(Attribute::Bold),
        OverallHealth::Good      => Cell::new(text).fg(Color::Green),
        OverallHealth::Fair      => Cell::new(text).fg(Color::Yellow),
        OverallHealth::Poor      => Cell::new(text).fg(Color::Red).add_attribute(Attribute::Bold),
    }
}

fn impact_cell(impact: ImpactTier) -> Cell {
    match impact {
        ImpactTier::Critical => Cell::new("🔴 CRITICAL").fg(Color::Red),
        ImpactTier::High     => Cell::new("🟠 HIGH").fg(Color::Yellow),
        ImpactTier::Medium   => Cell::new("🟡 MEDIUM"),
        ImpactTier::Low      => Cell::new("🟢 LOW").fg(Color::Green),
    }
}

// ─── Other helpers ────────────────────────────────────────────────────────────

fn intensity_label(intensity: IntensityTier) -> colored::ColoredString {
    let label = intensity.to_string();
    match intensity {
        IntensityTier::VeryHigh | IntensityTier::High => label.green(),
        IntensityTier::Medium                          => label.yellow(),
        IntensityTier::Low                             => label.red(),
    }
}

fn truncate_path(s: &str, max: usize) -> String {
    let count = s.chars().count();
    if count <= max {
        return s.to_string();
    }
    let tail: String = s.chars().skip(count - (max - 1)).collect();
    format!("…{tail}")
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ─── Raw Input ────────────────────────────────────────────────────────────────

/// A timestamp as it arrives from the retrieval layer: either text
/// (RFC 3339 or git's `YYYY-MM-DD HH:MM:SS +ZZZZ`) or Unix seconds,
/// whole or fractional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Unix(i64),
    Float(f64),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCommitStats {
    #[serde(default)]
    pub additions: Option<u64>,
    #[serde(default)]
    pub deletions: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFileChange {
    #[serde(default, alias = "filename")]
    pub path: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub additions: Option<u64>,
    #[serde(default)]
    pub deletions: Option<u64>,
    #[serde(default)]
    pub changes: Option<u64>,
}

/// Commit record before normalization. Every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCommit {
    #[serde(default, alias = "sha")]
    pub hash: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_email: Option<String>,
    #[serde(default)]
    pub author_date: Option<RawTimestamp>,
    #[serde(default)]
    pub committer_date: Option<RawTimestamp>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub files: Option<Vec<RawFileChange>>,
    #[serde(default)]
    pub stats: Option<RawCommitStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawBranch {
    pub name: String,
    #[serde(default)]
    pub protected: bool,
    /// Commits on this branch not on the default branch, when the source knows it.
    #[serde(default)]
    pub ahead: Option<u64>,
    #[serde(default)]
    pub behind: Option<u64>,
}

/// Everything the engine consumes for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisInput {
    #[serde(default)]
    pub commits: Vec<RawCommit>,
    #[serde(default)]
    pub branches: Vec<RawBranch>,
    #[serde(default)]
    pub current_branch: Option<String>,
    /// Repairs made while reading the input, carried into `metadata.warnings`.
    #[serde(skip)]
    pub load_warnings: Vec<String>,
}

// ─── Normalized Commits ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Added,
    Removed,
    Modified,
    Renamed,
    Copied,
    Changed,
}

impl FileStatus {
    /// Maps hosting-API and git status spellings; anything unknown is `Modified`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "added" | "a" => FileStatus::Added,
            "removed" | "deleted" | "d" => FileStatus::Removed,
            "renamed" | "r" => FileStatus::Renamed,
            "copied" | "c" => FileStatus::Copied,
            "changed" | "t" => FileStatus::Changed,
            _ => FileStatus::Modified,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChange {
    pub path: String,
    pub status: FileStatus,
    pub additions: u64,
    pub deletions: u64,
    pub changes: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommitStats {
    pub additions: u64,
    pub deletions: u64,
    pub total: u64,
}

/// Author identity after normalization. `name` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AuthorIdentity {
    pub name: String,
    pub email: String,
}

impl AuthorIdentity {
    pub const UNKNOWN: &'static str = "Unknown";

    /// Grouping key: `(name, email)`, or the name alone when email is empty.
    pub fn key(&self) -> String {
        if self.email.is_empty() {
            self.name.clone()
        } else {
            format!("{} <{}>", self.name, self.email)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRecord {
    pub hash: String,
    pub author: AuthorIdentity,
    pub authored_at: Option<DateTime<Utc>>,
    pub committed_at: Option<DateTime<Utc>>,
    pub message: String,
    pub files: Vec<FileChange>,
    pub stats: CommitStats,
}

impl CommitRecord {
    /// Author time, falling back to committer time.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.authored_at.or(self.committed_at)
    }

    pub fn day(&self) -> Option<NaiveDate> {
        self.timestamp().map(|t| t.date_naive())
    }

    pub fn lines_changed(&self) -> u64 {
        self.stats.additions.saturating_add(self.stats.deletions)
    }
}

// ─── Aggregates ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorVelocity {
    pub author: String,
    pub email: String,
    pub commits: usize,
    pub additions: u64,
    pub deletions: u64,
    pub files_changed: usize,
    pub avg_commit_size: f64,
    pub active_days: usize,
    pub productivity_score: f64,
}

/// Ordered low → critical so tiers compare with `<` / `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactTier {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for ImpactTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImpactTier::Critical => write!(f, "CRITICAL"),
            ImpactTier::High     => write!(f, "HIGH"),
            ImpactTier::Medium   => write!(f, "MEDIUM"),
            ImpactTier::Low      => write!(f, "LOW"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskTier::High   => write!(f, "HIGH"),
            RiskTier::Medium => write!(f, "MEDIUM"),
            RiskTier::Low    => write!(f, "LOW"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotFile {
    pub path: String,
    pub changes: u64,
    pub additions: u64,
    pub deletions: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub authors: Vec<String>,
    pub change_frequency: f64,
    pub impact: ImpactTier,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeChurnEntry {
    pub path: String,
    pub churn: u64,
    pub age_days: i64,
    pub complexity: f64,
    pub risk: RiskTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensityTier {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl std::fmt::Display for IntensityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntensityTier::VeryHigh => write!(f, "very high"),
            IntensityTier::High     => write!(f, "high"),
            IntensityTier::Medium   => write!(f, "medium"),
            IntensityTier::Low      => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakDay {
    pub date: NaiveDate,
    pub commits: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DevelopmentVelocity {
    pub total_commits: usize,
    pub active_authors: usize,
    /// Inclusive calendar span between the first and last commit, at least 1.
    pub days_active: i64,
    /// Distinct calendar days with at least one commit.
    pub commit_days: usize,
    pub avg_commits_per_day: f64,
    pub avg_lines_per_day: f64,
    pub peak_development_days: Vec<PeakDay>,
    pub intensity: IntensityTier,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SizeDistribution {
    pub small: usize,
    pub medium: usize,
    pub large: usize,
    pub huge: usize,
}

impl SizeDistribution {
    pub fn total(&self) -> usize {
        self.small + self.medium + self.large + self.huge
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitPattern {
    pub hour_of_day: [usize; 24],
    /// Index 0 is Sunday.
    pub day_of_week: [usize; 7],
    pub size_distribution: SizeDistribution,
    pub author_collaboration: BTreeMap<String, usize>,
    pub file_types: BTreeMap<String, usize>,
}

impl Default for CommitPattern {
    fn default() -> Self {
        CommitPattern {
            hour_of_day: [0; 24],
            day_of_week: [0; 7],
            size_distribution: SizeDistribution::default(),
            author_collaboration: BTreeMap::new(),
            file_types: BTreeMap::new(),
        }
    }
}

// ─── Health ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallHealth {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl std::fmt::Display for OverallHealth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverallHealth::Excellent => write!(f, "EXCELLENT"),
            OverallHealth::Good      => write!(f, "GOOD"),
            OverallHealth::Fair      => write!(f, "FAIR"),
            OverallHealth::Poor      => write!(f, "POOR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryHealth {
    pub commit_frequency_score: f64,
    pub contributor_diversity_score: f64,
    pub code_churn_score: f64,
    pub branch_management_score: f64,
    pub overall_score: f64,
    pub overall_health: OverallHealth,
}

/// Relative influence of each sub-score on `overall_score`.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthWeights {
    pub commit_frequency: f64,
    pub contributor_diversity: f64,
    pub code_churn: f64,
    pub branch_management: f64,
}

impl Default for HealthWeights {
    fn default() -> Self {
        HealthWeights {
            commit_frequency:      0.30,
            contributor_diversity: 0.25,
            code_churn:            0.25,
            branch_management:     0.20,
        }
    }
}

impl HealthWeights {
    /// Scales the weights so they sum to 1.0.
    pub fn normalized(&self) -> HealthWeights {
        let sum = self.commit_frequency + self.contributor_diversity + self.code_churn + self.branch_management;
        if sum <= 0.0 || !sum.is_finite() {
            return HealthWeights::default();
        }
        HealthWeights {
            commit_frequency:      self.commit_frequency      / sum,
            contributor_diversity: self.contributor_diversity / sum,
            code_churn:            self.code_churn            / sum,
            branch_management:     self.branch_management     / sum,
        }
    }
}

// ─── Result ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitHistory {
    pub total_commits: usize,
    pub total_additions: u64,
    pub total_deletions: u64,
    pub total_files: usize,
    pub time_range: TimeRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<AuthorVelocity>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hot_files: Option<Vec<HotFile>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_churn: Option<Vec<CodeChurnEntry>>,
    pub velocity: DevelopmentVelocity,
    pub patterns: CommitPattern,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchInfo {
    pub name: String,
    pub protected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BranchDivergence {
    pub ahead: u64,
    pub behind: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchAnalysis {
    pub current_branch: Option<String>,
    pub branches: Vec<BranchInfo>,
    pub divergence: BTreeMap<String, BranchDivergence>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub commit_history: CommitHistory,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch_analysis: Option<BranchAnalysis>,
    pub repository_health: RepositoryHealth,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisMetadata {
    pub analyzed_commits: usize,
    pub source_commits: usize,
    /// Wall-clock milliseconds spent in the engine.
    pub analysis_time: u64,
    pub last_updated: DateTime<Utc>,
    pub degraded: bool,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metadata: AnalysisMetadata,
    pub data: AnalysisResult,
}

use serde::Deserialize;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::HealthWeights;

pub const DEFAULT_MAX_COMMITS: usize = 1000;
pub const DEFAULT_COMPLEXITY_THRESHOLD: f64 = 10.0;

/// All settings that can be placed in a .commit-insights.yml config file.
/// Every field is optional; omitted fields fall back to built-in defaults.
/// CLI flags always take precedence over values set here.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    // Analysis scope. Signed so a negative cap is reported by `validate`
    // with a readable message instead of a serde type error.
    pub max_commits: Option<i64>,
    pub include_branches: Option<bool>,
    pub include_file_analysis: Option<bool>,
    pub include_author_analysis: Option<bool>,
    pub complexity_threshold: Option<f64>,

    // Output
    pub format: Option<String>,
    pub output: Option<String>,

    // Health weight overrides
    pub weights: Option<ConfigWeights>,
}

/// Optional per-dimension weight overrides. All weights are normalized at runtime.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigWeights {
    pub commit_frequency: Option<f64>,
    pub contributor_diversity: Option<f64>,
    pub code_churn: Option<f64>,
    pub branch_management: Option<f64>,
}

/// Resolved engine settings, threaded into [`crate::analysis::analyze`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    /// Most-recent commits kept when the input is larger.
    pub max_commits: usize,
    pub include_branches: bool,
    pub include_file_analysis: bool,
    pub include_author_analysis: bool,
    /// Complexity above this counts toward a churn entry's risk.
    pub complexity_threshold: f64,
    pub weights: HealthWeights,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            max_commits: DEFAULT_MAX_COMMITS,
            include_branches: true,
            include_file_analysis: true,
            include_author_analysis: true,
            complexity_threshold: DEFAULT_COMPLEXITY_THRESHOLD,
            weights: HealthWeights::default(),
        }
    }
}

impl AnalysisOptions {
    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_commits == 0 {
            return Err(Error::Config(
                "Invalid 'max_commits' value: 0. Must be 1 or greater".to_string(),
            ));
        }
        check_positive("complexity_threshold", self.complexity_threshold)?;
        let w = &self.weights;
        for (name, v) in weight_fields(w) {
            check_positive(&format!("weights.{name}"), v)?;
        }
        Ok(())
    }
}

fn weight_fields(w: &HealthWeights) -> [(&'static str, f64); 4] {
    [
        ("commit_frequency", w.commit_frequency),
        ("contributor_diversity", w.contributor_diversity),
        ("code_churn", w.code_churn),
        ("branch_management", w.branch_management),
    ]
}

fn check_positive(name: &str, v: f64) -> Result<()> {
    if !v.is_finite() {
        return Err(Error::Config(format!(
            "Invalid '{name}': {v} is not a finite number"
        )));
    }
    if v <= 0.0 {
        return Err(Error::Config(format!(
            "Invalid '{name}': {v}. Must be greater than 0"
        )));
    }
    Ok(())
}

impl AnalysisConfig {
    /// Validates semantic constraints that serde cannot enforce.
    ///
    /// Called automatically by [`load_config`].
    pub fn validate(&self) -> Result<()> {
        if let Some(fmt) = &self.format {
            match fmt.as_str() {
                "terminal" | "json" => {}
                other => {
                    return Err(Error::Config(format!(
                        "Invalid 'format' value: \"{other}\". \
                         Expected one of: \"terminal\", \"json\""
                    )))
                }
            }
        }

        if let Some(n) = self.max_commits {
            if n < 1 {
                return Err(Error::Config(format!(
                    "Invalid 'max_commits' value: {n}. Must be 1 or greater"
                )));
            }
        }

        if let Some(t) = self.complexity_threshold {
            check_positive("complexity_threshold", t)?;
        }

        // Weights are normalized, so only the ratios matter; zero or negative
        // would drop or invert a dimension.
        if let Some(w) = &self.weights {
            let fields: &[(&str, Option<f64>)] = &[
                ("commit_frequency", w.commit_frequency),
                ("contributor_diversity", w.contributor_diversity),
                ("code_churn", w.code_churn),
                ("branch_management", w.branch_management),
            ];
            for (name, val) in fields {
                if let Some(v) = val {
                    check_positive(&format!("weights.{name}"), *v)?;
                }
            }
        }

        Ok(())
    }

    /// Resolves file values over the built-in defaults.
    pub fn to_options(&self) -> AnalysisOptions {
        let defaults = AnalysisOptions::default();
        let mut weights = defaults.weights.clone();
        if let Some(w) = &self.weights {
            weights.commit_frequency = w.commit_frequency.unwrap_or(weights.commit_frequency);
            weights.contributor_diversity = w.contributor_diversity.unwrap_or(weights.contributor_diversity);
            weights.code_churn = w.code_churn.unwrap_or(weights.code_churn);
            weights.branch_management = w.branch_management.unwrap_or(weights.branch_management);
        }
        AnalysisOptions {
            max_commits: self
                .max_commits
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(defaults.max_commits),
            include_branches: self.include_branches.unwrap_or(defaults.include_branches),
            include_file_analysis: self.include_file_analysis.unwrap_or(defaults.include_file_analysis),
            include_author_analysis: self.include_author_analysis.unwrap_or(defaults.include_author_analysis),
            complexity_threshold: self.complexity_threshold.unwrap_or(defaults.complexity_threshold),
            weights,
        }
    }
}

/// Reads, parses, and validates a YAML config file from `path`.
pub fn load_config(path: &Path) -> Result<AnalysisConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Cannot read config file '{}': {e}", path.display()))
    })?;
    let cfg: AnalysisConfig = serde_yaml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid config file '{}': {e}", path.display())))?;
    cfg.validate().map_err(|e| match e {
        Error::Config(msg) => Error::Config(format!("Config file '{}': {msg}", path.display())),
        other => other,
    })?;
    Ok(cfg)
}

/// Annotated YAML template printed by `--generate-config`.
pub static TEMPLATE: &str = r#"# commit-insights configuration file
# Generated by: commit-insights --generate-config
#
# All settings are optional. Omit any field to use the built-in default.
# CLI flags always take precedence over values in this file.

# ── Analysis scope ─────────────────────────────────────────────────────────────

# Maximum number of commits analyzed. When the history is longer, the most
# recent commits are kept.
# max_commits: 1000

# Toggle sections of the result. Health scores and recommendations are always
# computed from the full history.
# include_branches: true
# include_file_analysis: true
# include_author_analysis: true

# Average lines per touch (scaled by author count) above which a file's
# churn counts as complex.
# complexity_threshold: 10.0

# ── Output ─────────────────────────────────────────────────────────────────────

# Output format: terminal, json
# format: "terminal"

# Output file path (JSON only). Defaults to stdout.
# output: "insights.json"

# ── Health weights ─────────────────────────────────────────────────────────────
# All weights are normalized at runtime so they always sum to 1.0.

# weights:
#   commit_frequency:      0.30   # Regular commits spread over many days
#   contributor_diversity: 0.25   # Work shared across several authors
#   code_churn:            0.25   # Few high-risk churn files
#   branch_management:     0.20   # Share of protected branches
"#;

/// Prints the config template to stdout, or writes it to `output_path` if given.
pub fn print_template(output_path: Option<&Path>) -> Result<()> {
    match output_path {
        Some(path) => std::fs::write(path, TEMPLATE).map_err(|e| {
            Error::Config(format!(
                "Cannot write config template to '{}': {e}",
                path.display()
            ))
        }),
        None => {
            print!("{TEMPLATE}");
            Ok(())
        }
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

//! Commit-history analytics.
//!
//! Turns a list of raw commit records and a branch list into per-author
//! velocity, hot files, code churn, commit patterns, a repository health
//! score and a short list of recommendations.
//!
//! ```
//! use commit_insights::{analyze, AnalysisInput, AnalysisOptions};
//!
//! let report = analyze(&AnalysisInput::default(), &AnalysisOptions::default());
//! assert!(report.success);
//! assert_eq!(report.data.commit_history.total_commits, 0);
//! ```

pub mod analysis;
pub mod analyzers;
pub mod config;
pub mod error;
pub mod git;
pub mod logging;
pub mod normalizer;
pub mod recommendations;
pub mod reporters;
pub mod scoring;
pub mod types;

pub use analysis::{analyze, analyze_at};
pub use config::{AnalysisConfig, AnalysisOptions};
pub use error::{Error, Result};
pub use types::{AnalysisInput, AnalysisReport, AnalysisResult, RawBranch, RawCommit};

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use commit_insights::config::{self, AnalysisConfig};
use commit_insights::git::{log_parser, snapshot};
use commit_insights::reporters::{json, terminal};
use commit_insights::{analyze, logging, AnalysisInput, AnalysisOptions, Error, Result};

#[derive(Parser, Debug)]
#[command(
    name = "commit-insights",
    about = "📊 Analyze commit history: velocity, hot files, churn and repository health",
    version,
    long_about = "Analyzes a commit history and reports per-author velocity, hot files,\n\
                  code churn risk, commit patterns, a weighted repository health score\n\
                  and a short list of recommendations.\n\n\
                  Reads a JSON snapshot ({\"commits\": [...], \"branches\": [...]}) when\n\
                  INPUT is given, otherwise the local git repository at --repo."
)]
struct Args {
    /// JSON snapshot with commits, branches and current_branch.
    #[arg(value_name = "INPUT", conflicts_with = "repo")]
    input: Option<PathBuf>,

    /// Local git repository to read instead of a snapshot (defaults to ".").
    #[arg(long, value_name = "PATH")]
    repo: Option<PathBuf>,

    /// YAML config file. CLI flags override its values.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format: terminal, json
    #[arg(long)]
    format: Option<String>,

    /// Output file (JSON only). Defaults to stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long)]
    max_commits: Option<usize>,

    #[arg(long)]
    complexity_threshold: Option<f64>,

    #[arg(long)]
    no_branches: bool,

    #[arg(long)]
    no_files: bool,

    #[arg(long)]
    no_authors: bool,

    /// Print an annotated config template (to --output when given) and exit.
    #[arg(long)]
    generate_config: bool,

    /// Log filter used when RUST_LOG is unset, e.g. "info" or "commit_insights=debug".
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(&args.log_level);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    if args.generate_config {
        return config::print_template(args.output.as_deref());
    }

    let file_config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => AnalysisConfig::default(),
    };
    let options = resolve_options(&args, &file_config);
    options.validate()?;

    let format = args
        .format
        .clone()
        .or_else(|| file_config.format.clone())
        .unwrap_or_else(|| "terminal".to_string());
    let output = args.output.clone().or_else(|| file_config.output.as_ref().map(PathBuf::from));

    let pb = (format == "terminal").then(spinner);

    let input = load(&args, &options, pb.as_ref());
    let input = match input {
        Ok(input) => input,
        Err(e) => {
            if let Some(pb) = &pb {
                pb.finish_and_clear();
            }
            return Err(e);
        }
    };

    if let Some(pb) = &pb {
        pb.set_message(format!("Analyzing {} commits…", input.commits.len().min(options.max_commits)));
    }
    let report = analyze(&input, &options);
    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    match format.as_str() {
        "json"     => json::report_json(&report, output.as_deref()),
        "terminal" => {
            terminal::report_terminal(&report);
            Ok(())
        }
        other => Err(Error::Config(format!(
            "Unknown format '{other}'. Use terminal or json"
        ))),
    }
}

/// Layers CLI flags over the config file over built-in defaults.
fn resolve_options(args: &Args, file_config: &AnalysisConfig) -> AnalysisOptions {
    let mut options = file_config.to_options();
    if let Some(n) = args.max_commits {
        options.max_commits = n;
    }
    if let Some(t) = args.complexity_threshold {
        options.complexity_threshold = t;
    }
    if args.no_branches {
        options.include_branches = false;
    }
    if args.no_files {
        options.include_file_analysis = false;
    }
    if args.no_authors {
        options.include_author_analysis = false;
    }
    options
}

fn load(args: &Args, options: &AnalysisOptions, pb: Option<&ProgressBar>) -> Result<AnalysisInput> {
    if let Some(path) = &args.input {
        if let Some(pb) = pb {
            pb.set_message(format!("Reading {}…", path.display()));
        }
        return snapshot::load_input(path);
    }

    let repo = args.repo.clone().unwrap_or_else(|| PathBuf::from("."));
    if !repo.exists() {
        return Err(Error::Git(format!("path does not exist: {}", repo.display())));
    }
    if let Some(pb) = pb {
        pb.set_message(format!("Reading git history in {}…", repo.display()));
    }
    log_parser::read_repository(&repo, options.max_commits)
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    pb.set_style(style);
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

//! Command-line interface for reviewlens.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use globset::GlobSet;
use indicatif::{ProgressBar, ProgressStyle};
use walkdir::WalkDir;

use crate::aggregate::AggregateReport;
use crate::config::{self, Config};
use crate::language::Language;
use crate::narrative::{ChangeSet, GeminiClient, RequestBuilder};
use crate::record::FileRecord;
use crate::report;
use crate::runner::Runner;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Directories never descended into when expanding a directory argument.
const SKIPPED_DIRS: &[&str] = &["node_modules", "vendor", "__pycache__", "dist", "build"];

/// Change-set quality review.
///
/// Analyzes changed Python, JavaScript and TypeScript files for structure,
/// security risks, performance anti-patterns and dependencies, and can ask a
/// narrative service for a written review of the change.
#[derive(Parser)]
#[command(name = "reviewlens")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: auto-discover reviewlens.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze files or directories without contacting the narrative service
    Analyze(AnalyzeArgs),
    /// Analyze a change set and request a narrative review
    Review(ReviewArgs),
    /// Print the narrative request for a change set without sending it
    Prompt(PromptArgs),
    /// Write a commented config file
    Init(InitArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
}

#[derive(Args)]
pub struct OutputArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,

    /// Exit non-zero if the security risk score exceeds this value
    #[arg(long)]
    pub fail_over: Option<u32>,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Files or directories to analyze
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args)]
pub struct ChangeArgs {
    /// JSON file describing the change (metadata and files)
    pub change: PathBuf,

    /// Directory the changed filenames are relative to
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,
}

#[derive(Args)]
pub struct ReviewArgs {
    #[command(flatten)]
    pub change: ChangeArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Args)]
pub struct PromptArgs {
    #[command(flatten)]
    pub change: ChangeArgs,

    /// Leave the static analysis out of the request
    #[arg(long)]
    pub no_analysis: bool,
}

#[derive(Args)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = config::CONFIG_FILE_NAME)]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

/// Load the explicit config file, or discover one.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = explicit {
        return Ok(Config::parse_file(path)?);
    }
    let cwd = std::env::current_dir()?;
    let (config, path) = Config::discover(&cwd)?;
    match path {
        Some(p) => tracing::info!(path = %p.display(), "using config"),
        None => tracing::debug!("no config file found, using defaults"),
    }
    Ok(config)
}

/// Expand path arguments into supported source files.
pub fn collect_files(paths: &[PathBuf], exclude: &GlobSet) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        let metadata = fs::metadata(path)
            .with_context(|| format!("cannot access path {}", path.display()))?;
        if metadata.is_file() {
            files.push(path.clone());
            continue;
        }

        for entry in WalkDir::new(path)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.depth() == 0 || !e.file_type().is_dir() {
                    return true;
                }
                let name = e.file_name().to_string_lossy();
                !name.starts_with('.') && !SKIPPED_DIRS.contains(&name.as_ref())
            })
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let file = entry.path();
            if exclude.is_match(file) {
                tracing::debug!(file = %file.display(), "excluded by config");
                continue;
            }
            if Language::detect(&file.to_string_lossy()).is_some() {
                files.push(file.to_path_buf());
            }
        }
    }

    Ok(files)
}

/// Read files into records. Unreadable or non-UTF-8 files are skipped.
fn read_records(files: &[PathBuf]) -> Vec<FileRecord> {
    files
        .iter()
        .filter_map(|path| match fs::read_to_string(path) {
            Ok(content) => Some(FileRecord::new(path.to_string_lossy(), content)),
            Err(e) => {
                tracing::warn!(file = %path.display(), error = %e, "skipping unreadable file");
                None
            }
        })
        .collect()
}

fn load_change(path: &Path) -> anyhow::Result<ChangeSet> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading change file {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing change file {}", path.display()))
}

/// Records for the files of a change that still exist under `root`.
fn change_records(change: &ChangeSet, root: &Path) -> Vec<FileRecord> {
    change
        .files
        .iter()
        .filter(|f| f.status != "removed")
        .filter_map(|f| match fs::read_to_string(root.join(&f.filename)) {
            Ok(content) => {
                let record = FileRecord::new(f.filename.as_str(), content);
                Some(match &f.patch {
                    Some(patch) => record.with_diff(patch.as_str()),
                    None => record,
                })
            }
            Err(e) => {
                tracing::warn!(file = %f.filename, error = %e, "changed file not readable, skipping");
                None
            }
        })
        .collect()
}

fn exit_code(report: &AggregateReport, fail_over: Option<u32>) -> i32 {
    match fail_over {
        Some(limit) if report.security.overall_risk_score > limit => EXIT_FAILED,
        _ => EXIT_SUCCESS,
    }
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Run the analyze command.
pub fn run_analyze(args: &AnalyzeArgs, config: &Config) -> anyhow::Result<i32> {
    let exclude = config.analysis.exclude_set()?;
    let files = collect_files(&args.paths, &exclude)?;
    let records = read_records(&files);

    let report = Runner::from_config(&config.analysis).analyze(&records)?;

    match args.output.format {
        OutputFormat::Json => report::write_json(&report, None)?,
        OutputFormat::Pretty => report::write_pretty(&report, None),
    }

    Ok(exit_code(&report, args.output.fail_over))
}

/// Run the review command.
pub fn run_review(args: &ReviewArgs, config: &Config) -> anyhow::Result<i32> {
    let change = load_change(&args.change.change)?;
    let records = change_records(&change, &args.change.root);

    let client = GeminiClient::from_config(&config.narrative)?;
    let builder = RequestBuilder::new(
        config.narrative.diff_excerpt_chars,
        config.narrative.max_files,
    );
    let runner = Runner::from_config(&config.analysis);

    let runtime = tokio::runtime::Runtime::new()?;
    let bar = spinner(&format!(
        "Requesting narrative review for {}",
        change.metadata.identifier()
    ));
    let result = runtime.block_on(runner.review(
        &change.metadata,
        &change.files,
        &records,
        &builder,
        &client,
    ));
    bar.finish_and_clear();
    let review = result?;

    match args.output.format {
        OutputFormat::Json => report::write_json(&review.report, Some(&review.narrative))?,
        OutputFormat::Pretty => report::write_pretty(&review.report, Some(&review.narrative)),
    }

    Ok(exit_code(&review.report, args.output.fail_over))
}

/// Run the prompt command.
pub fn run_prompt(args: &PromptArgs, config: &Config) -> anyhow::Result<i32> {
    let change = load_change(&args.change.change)?;
    let builder = RequestBuilder::new(
        config.narrative.diff_excerpt_chars,
        config.narrative.max_files,
    );

    let report = if args.no_analysis {
        None
    } else {
        let records = change_records(&change, &args.change.root);
        if records.is_empty() {
            tracing::warn!("no changed files readable, building request without analysis");
            None
        } else {
            Some(Runner::from_config(&config.analysis).analyze(&records)?)
        }
    };

    print!("{}", builder.build(&change.metadata, &change.files, report.as_ref()));
    Ok(EXIT_SUCCESS)
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.output.exists() && !args.force {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Use --force to overwrite it");
        return Ok(EXIT_ERROR);
    }

    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
    }

    fs::write(&args.output, config::TEMPLATE)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Set {} in your environment", config::Config::default().narrative.api_key_env);
    println!("  2. Run: reviewlens analyze .");

    Ok(EXIT_SUCCESS)
}

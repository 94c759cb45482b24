//! repo-pulse - CLI entry point.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use repo_pulse::git::{
    ContributorOptions, LogOptions, commit_log_json, end_of_local_day, fetch_commit_log,
    fetch_contributors, open_repository, start_of_local_day,
};
use repo_pulse::github::{GitHubProvider, RepositoryProvider, get_github_token, origin_slug};
use repo_pulse::report::{ReportRequest, generate_report, parse_issue_feed};
use repo_pulse::{DEFAULT_CONFIG_PATH, IssueRecord};

/// Generate weekly activity reports from git history using Gemini.
#[derive(Parser, Debug)]
#[command(name = "repo-pulse")]
#[command(about = "Generate weekly activity reports from git history using Gemini")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate an AI activity report
    Report(ReportArgs),

    /// Print the commit feed as JSON
    Log {
        /// Path to the git repository
        repo: PathBuf,

        #[command(flatten)]
        window: WindowArgs,
    },

    /// Summarize commit authors
    Contributors {
        /// Path to the git repository
        repo: PathBuf,

        #[command(flatten)]
        window: WindowArgs,

        /// Include merge commits
        #[arg(short = 'm', long)]
        include_merges: bool,
    },

    /// Print GitHub issues (or pull requests) as JSON
    Issues {
        /// Path to the git repository
        repo: PathBuf,

        /// Fetch pull requests instead of issues
        #[arg(long)]
        pull_requests: bool,
    },
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// Path to the git repository
    repo: PathBuf,

    /// Path to the report config file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Write the report here instead of printing it
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    window: WindowArgs,

    /// Include the repository's GitHub issues
    #[arg(long, conflicts_with = "issues_file")]
    issues: bool,

    /// Read issues from a JSON file
    #[arg(long)]
    issues_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct WindowArgs {
    /// Start date filter (inclusive), format YYYY-MM-DD
    #[arg(long)]
    since: Option<NaiveDate>,

    /// End date filter (inclusive), format YYYY-MM-DD
    #[arg(long)]
    until: Option<NaiveDate>,
}

impl WindowArgs {
    fn bounds(&self) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
        let since = match self.since {
            Some(date) => Some(
                start_of_local_day(date)
                    .with_context(|| format!("{} has no local midnight", date))?,
            ),
            None => None,
        };
        let until = match self.until {
            Some(date) => Some(
                end_of_local_day(date)
                    .with_context(|| format!("{} has no local end of day", date))?,
            ),
            None => None,
        };

        if let (Some(since), Some(until)) = (since, until) {
            if since > until {
                bail!("--since must not be after --until");
            }
        }

        Ok((since, until))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Report(args) => run_report(args).await,
        Command::Log { repo, window } => run_log(&repo, &window),
        Command::Contributors {
            repo,
            window,
            include_merges,
        } => run_contributors(&repo, &window, include_merges),
        Command::Issues {
            repo,
            pull_requests,
        } => run_issues(&repo, pull_requests).await,
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "repo_pulse=debug"
    } else {
        "repo_pulse=info"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run_report(args: ReportArgs) -> Result<()> {
    let (since, until) = args.window.bounds()?;

    info!("Step 1: Fetching git logs for {}", args.repo.display());
    let repo = open_repository(&args.repo)
        .with_context(|| format!("Not a git repository: {}", args.repo.display()))?;
    let commits = fetch_commit_log(&repo, &LogOptions { since, until })
        .context("Failed to get git logs for report generation")?;
    let commit_feed = commit_log_json(&commits)?;

    let issues: Vec<IssueRecord> = if let Some(path) = &args.issues_file {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read issues file {}", path.display()))?;
        parse_issue_feed(&raw)?
    } else if args.issues {
        fetch_repository_issues(&repo).await?
    } else {
        Vec::new()
    };
    drop(repo);

    info!("Step 2: Generating AI activity report");
    let cancel = CancellationToken::new();
    let watcher = spawn_ctrl_c_watcher(cancel.clone());

    let request = ReportRequest {
        commit_feed,
        issues,
        destination: args.output.clone(),
    };
    let result = generate_report(&args.config, request, cancel).await;
    watcher.abort();

    let report = result.context("Error generating AI activity report")?;

    match &report.path {
        Some(path) => println!("Report saved to {}", path.display()),
        None => println!("{}", report.content),
    }

    Ok(())
}

fn spawn_ctrl_c_watcher(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Keyboard interrupt");
            cancel.cancel();
        }
    })
}

fn run_log(repo_path: &Path, window: &WindowArgs) -> Result<()> {
    let (since, until) = window.bounds()?;
    let repo = open_repository(repo_path)
        .with_context(|| format!("Not a git repository: {}", repo_path.display()))?;

    let commits =
        fetch_commit_log(&repo, &LogOptions { since, until }).context("Error getting git logs")?;
    println!("{}", commit_log_json(&commits)?);

    Ok(())
}

fn run_contributors(repo_path: &Path, window: &WindowArgs, include_merges: bool) -> Result<()> {
    let (since, until) = window.bounds()?;
    let repo = open_repository(repo_path)
        .with_context(|| format!("Not a git repository: {}", repo_path.display()))?;

    let contributors = fetch_contributors(
        &repo,
        &ContributorOptions {
            since,
            until,
            include_merges,
        },
    )
    .context("Error getting contributors")?;

    if contributors.is_empty() {
        println!("No contributors found in the selected range.");
        return Ok(());
    }

    println!(
        "{:<30} {:<35} {:>8}  {:<10}  {:<10}",
        "Name", "Email", "Commits", "First", "Last"
    );
    for c in &contributors {
        println!(
            "{:<30} {:<35} {:>8}  {:<10}  {:<10}",
            c.name,
            c.email,
            c.commits,
            c.first_commit.format("%Y-%m-%d"),
            c.last_commit.format("%Y-%m-%d"),
        );
    }

    Ok(())
}

async fn run_issues(repo_path: &Path, pull_requests: bool) -> Result<()> {
    let repo = open_repository(repo_path)
        .with_context(|| format!("Not a git repository: {}", repo_path.display()))?;
    let slug = origin_slug(&repo).context("Could not determine the GitHub repository")?;
    let token = get_github_token().context("GitHub authentication required")?;
    let provider = GitHubProvider::new(&token)?;

    let json = if pull_requests {
        serde_json::to_string_pretty(&provider.fetch_pull_requests(&slug).await?)?
    } else {
        serde_json::to_string_pretty(&provider.fetch_issues(&slug).await?)?
    };
    println!("{}", json);

    Ok(())
}

async fn fetch_repository_issues(repo: &git2::Repository) -> Result<Vec<IssueRecord>> {
    let slug = origin_slug(repo).context("Could not determine the GitHub repository")?;
    let token = get_github_token().context("GitHub authentication required for issues")?;
    let provider = GitHubProvider::new(&token)?;

    let issues = provider
        .fetch_issues(&slug)
        .await
        .with_context(|| format!("Error fetching issues for {}", slug))?;
    info!("Found {} issues for {}", issues.len(), slug);

    Ok(issues)
}

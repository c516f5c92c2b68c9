//! Command-line interface argument parsing.
//!
//! Jenkins passes most settings through the environment, so every
//! publishing option also reads its historical environment variable.

use clap::Parser;
use std::path::PathBuf;

/// prreport - pull request report for Jenkins CI
///
/// Collects pylint, pycodestyle, unit test, futurize and functional test
/// artifacts, writes one HTML report and posts a summary comment plus
/// commit statuses to GitHub.
///
/// Examples:
///   prreport
///   prreport --workdir $WORKSPACE --pull-id 1234
///   prreport --no-publish --summary-json summary.json
///   prreport --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Directory the artifact paths are relative to
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    pub workdir: PathBuf,

    /// Path to configuration file
    ///
    /// If not specified, looks for .prreport.toml in the working directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output file path for the HTML report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Also write the aggregated results as JSON
    #[arg(long, value_name = "FILE")]
    pub summary_json: Option<PathBuf>,

    /// GitHub token of the bot account
    #[arg(long, env = "DMWMBOT_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Code repository name
    #[arg(long, env = "CODE_REPO", value_name = "NAME")]
    pub code_repo: Option<String>,

    /// Organisation owning the code repository
    #[arg(long, env = "WMCORE_REPO", value_name = "NAME")]
    pub team: Option<String>,

    /// Pull request being tested (pull request mode, wins over --target-issue)
    #[arg(long, env = "ghprbPullId", value_name = "ID")]
    pub pull_id: Option<u64>,

    /// Issue receiving the report of a scheduled run (daily mode)
    #[arg(long, env = "TargetIssueID", value_name = "ID")]
    pub target_issue: Option<u64>,

    /// Jenkins build URL used to link to the published report
    #[arg(long, env = "BUILD_URL", value_name = "URL")]
    pub build_url: Option<String>,

    /// GitHub API base URL
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Write the report and print the summary without calling GitHub
    #[arg(long)]
    pub no_publish: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .prreport.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if !self.workdir.is_dir() {
            return Err(format!(
                "Working directory does not exist: {}",
                self.workdir.display()
            ));
        }

        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

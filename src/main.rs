//! prreport - pull request report for Jenkins CI
//!
//! A CLI tool that collects the artifacts of a WMCore pull request build
//! (pylint, pycodestyle, unit tests, futurize, CRABClient functional
//! tests), writes one HTML report and publishes the verdict to GitHub.
//!
//! Exit codes:
//!   0 - Report written and published (even if some checks failed)
//!   1 - Runtime error (missing pylint report, broken artifact, GitHub error, etc.)

mod analysis;
mod cli;
mod collectors;
mod config;
mod error;
mod models;
mod pipeline;
mod publish;
mod report;
mod scanner;

use analysis::Aggregate;
use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use pipeline::Pipeline;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config(&args.workdir);
    }

    init_logging(&args);

    info!("prreport v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_report(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Report failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .prreport.toml in the working directory.
fn handle_init_config(workdir: &Path) -> Result<()> {
    let path = match Config::write_default(workdir) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("⚠️  {:#}", e);
            std::process::exit(1);
        }
    };

    println!("✅ Created {} with default settings.", path.display());
    println!("   Edit it to customize artifact paths, pylint thresholds and GitHub settings.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete report workflow.
async fn run_report(args: Args) -> Result<()> {
    let start_time = Instant::now();

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let workdir = args.workdir.as_path();
    let inputs = config.inputs.rooted_at(workdir);

    // Step 1: collect every artifact
    if !args.quiet {
        println!("🔍 Collecting CI artifacts in {}", workdir.display());
    }
    let aggregate = Pipeline::new(inputs, config.lint.clone())
        .with_progress(!args.quiet)
        .run()?;

    // Step 2: write the report files
    let html_path = workdir.join(&config.output.html);
    write_file(&html_path, &aggregate.html_document())?;
    info!("Report written to {}", html_path.display());

    if let Some(ref json_path) = args.summary_json {
        write_file(json_path, &aggregate.to_json()?)?;
        info!("Summary written to {}", json_path.display());
    }

    if !args.quiet {
        print_summary(&aggregate);
    }

    // Step 3: publish
    if args.no_publish {
        println!("\n{}", aggregate.status_message());
    } else {
        publish_to_github(&args, &config, &aggregate).await?;
    }

    publish::print_markers(&aggregate);

    if !args.quiet {
        println!(
            "\n✅ Report complete in {:.1}s: {}",
            start_time.elapsed().as_secs_f64(),
            html_path.display()
        );
    }

    Ok(())
}

async fn publish_to_github(args: &Args, config: &Config, aggregate: &Aggregate) -> Result<()> {
    let token = args
        .token
        .as_deref()
        .ok_or_else(|| anyhow!("No GitHub token given (--token or DMWMBOT_TOKEN)"))?;
    let target = publish::Target::resolve(args.pull_id, args.target_issue).ok_or_else(|| {
        anyhow!("No pull request or target issue given (ghprbPullId or TargetIssueID)")
    })?;
    let build_url = args
        .build_url
        .as_deref()
        .ok_or_else(|| anyhow!("No build URL given (--build-url or BUILD_URL)"))?;

    let report_url = publish::report_url(build_url);
    let client = publish::GithubClient::new(&config.github, token)?;

    if !args.quiet {
        println!(
            "\n📤 Publishing to {} #{}",
            config.github.repo_name(),
            target.number()
        );
    }
    publish::publish(&client, aggregate, target, &report_url, Utc::now()).await
}

fn print_summary(aggregate: &Aggregate) {
    println!("\n📊 Check Summary:");
    for check in aggregate.statuses() {
        let icon = match check.state {
            models::CheckState::Success => "🟢",
            models::CheckState::Failure => "🔴",
        };
        println!(
            "   {} {}: {}",
            icon,
            check.kind,
            check.state.read_status()
        );
    }
    if aggregate.failed() {
        println!("\n⛔ Some checks failed. See the report for details.");
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default(&args.workdir) {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", DEFAULT_CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

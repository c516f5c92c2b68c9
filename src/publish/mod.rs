//! Publishing of the aggregated results.
//!
//! Two audiences: the Jenkins log scraper reads the `DMWM-*` marker lines
//! printed to stdout, and GitHub receives one comment plus one commit
//! status per check.

pub mod github;

pub use github::*;

use crate::analysis::{Aggregate, CheckResult};
use crate::models::CheckState;
use chrono::{DateTime, Utc};

const REPORT_ARTIFACT: &str = "artifact/artifacts/PullRequestReport.html";

/// Where the comment goes and whose commits receive the statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Pull request build (`ghprbPullId`).
    PullRequest(u64),
    /// Scheduled build reporting on a tracking issue (`TargetIssueID`).
    Daily(u64),
}

impl Target {
    /// Pick the target from the two job parameters. The pull request wins.
    pub fn resolve(pull_id: Option<u64>, target_issue: Option<u64>) -> Option<Self> {
        pull_id
            .map(Target::PullRequest)
            .or_else(|| target_issue.map(Target::Daily))
    }

    pub fn number(&self) -> u64 {
        match *self {
            Target::PullRequest(n) | Target::Daily(n) => n,
        }
    }
}

/// Public URL of the archived HTML report for a Jenkins build.
pub fn report_url(build_url: &str) -> String {
    format!(
        "{}{}",
        build_url.replace("jenkins/job", "jenkins/view/All/job"),
        REPORT_ARTIFACT
    )
}

/// Description attached to every commit status.
pub fn status_description(finished: DateTime<Utc>) -> String {
    format!("Finished at {}", finished.format("%d %b %Y %H:%M GMT"))
}

/// One `DMWM-*` marker line, or `None` for checks without a marker.
pub fn marker_line(check: &CheckResult) -> Option<String> {
    let verdict = match check.state {
        CheckState::Success => "SUCCEED",
        CheckState::Failure => "FAIL",
    };
    let token = check.kind.marker_token(check.state)?;
    Some(format!("Testing of python code. DMWM-{}-{}", verdict, token))
}

/// Print the marker lines consumed by the log scraper.
pub fn print_markers(aggregate: &Aggregate) {
    for line in aggregate.markers().iter().filter_map(marker_line) {
        println!("{}", line);
    }
}

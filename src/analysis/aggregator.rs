//! Aggregation of all collector results.
//!
//! The [`Aggregate`] is the single value threaded from the collectors to
//! the publisher: it owns every check's outcome and knows how to render
//! the final HTML document, the pull request comment and the list of
//! commit statuses.

use crate::collectors::CheckReport;
use crate::models::{
    CheckKind, CheckState, FunctionalTestBlock, FutureSummary, LintSummary, Py3kSummary,
    StyleSummary, UnitTestChanges,
};
use crate::report::generate_html_document;
use anyhow::Result;
use serde::Serialize;

/// Results of every collector for one run. `None` means the artifact was
/// absent and the check is left out of the report.
#[derive(Debug, Clone, Serialize)]
pub struct Aggregate {
    pub pylint: CheckReport<LintSummary>,
    pub pylint3k: Option<CheckReport<Py3kSummary>>,
    pub unit_tests: Option<CheckReport<UnitTestChanges>>,
    pub pycodestyle: Option<CheckReport<StyleSummary>>,
    pub future: CheckReport<FutureSummary>,
    pub functional: Option<CheckReport<Vec<FunctionalTestBlock>>>,
}

/// Outcome of one check as published to GitHub and the build log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub kind: CheckKind,
    pub state: CheckState,
}

impl CheckResult {
    fn new(kind: CheckKind, failed: bool) -> Self {
        Self {
            kind,
            state: CheckState::from_failed(failed),
        }
    }
}

impl Aggregate {
    fn unit_tests_failed(&self) -> bool {
        self.unit_tests.as_ref().map(|r| r.failed).unwrap_or(false)
    }

    fn functional_failed(&self) -> bool {
        self.functional.as_ref().map(|r| r.failed).unwrap_or(false)
    }

    /// Whether any check failed.
    pub fn failed(&self) -> bool {
        self.statuses()
            .iter()
            .any(|c| c.state == CheckState::Failure)
    }

    /// Commit statuses to post, in posting order.
    ///
    /// Pylint, unit tests and future compatibility are always posted; the
    /// others only when their report exists.
    pub fn statuses(&self) -> Vec<CheckResult> {
        let mut checks = vec![CheckResult::new(CheckKind::Pylint, self.pylint.failed)];

        if let Some(ref py3k) = self.pylint3k {
            checks.push(CheckResult::new(CheckKind::Pylint3k, py3k.failed));
        }
        checks.push(CheckResult::new(CheckKind::UnitTests, self.unit_tests_failed()));
        if let Some(ref style) = self.pycodestyle {
            checks.push(CheckResult::new(CheckKind::Pycodestyle, style.failed));
        }
        checks.push(CheckResult::new(CheckKind::FutureCompat, self.future.failed));
        if let Some(ref functional) = self.functional {
            checks.push(CheckResult::new(CheckKind::Functional, functional.failed));
        }

        checks
    }

    /// Checks announced with a `DMWM-*` marker line in the build log.
    ///
    /// The functional test marker is always printed; py3k only when its
    /// report exists.
    pub fn markers(&self) -> Vec<CheckResult> {
        let mut checks = vec![CheckResult::new(CheckKind::Pylint, self.pylint.failed)];

        if let Some(ref py3k) = self.pylint3k {
            checks.push(CheckResult::new(CheckKind::Pylint3k, py3k.failed));
        }
        checks.push(CheckResult::new(CheckKind::UnitTests, self.unit_tests_failed()));
        checks.push(CheckResult::new(CheckKind::FutureCompat, self.future.failed));
        checks.push(CheckResult::new(CheckKind::Functional, self.functional_failed()));

        checks
    }

    /// Concatenate the non-empty fragments into one HTML document.
    pub fn html_document(&self) -> String {
        let fragments = [
            self.unit_tests.as_ref().map(|r| r.html.as_str()),
            Some(self.pylint.html.as_str()),
            self.pylint3k.as_ref().map(|r| r.html.as_str()),
            self.pycodestyle.as_ref().map(|r| r.html.as_str()),
            Some(self.future.html.as_str()),
            self.functional.as_ref().map(|r| r.html.as_str()),
        ];

        generate_html_document(fragments.into_iter().flatten().filter(|f| !f.is_empty()))
    }

    /// Human readable summary of every check.
    pub fn status_message(&self) -> String {
        let mut message = String::from("Jenkins results:\n");

        if let Some(ref unit) = self.unit_tests {
            let summary = unit.summary.summary();
            push_status(&mut message, "Unit tests", unit.failed);
            push_count(&mut message, summary.new_failures, "new failures");
            push_count(&mut message, summary.deleted, "tests deleted");
            push_count(&mut message, summary.ok_changes, "tests no longer failing");
            push_count(&mut message, summary.added, "tests added");
            push_count(&mut message, summary.unstable_changes, "changes in unstable tests");
        }

        push_status(&mut message, "Pylint check", self.pylint.failed);
        push_count(
            &mut message,
            self.pylint.summary.failures,
            "warnings and errors that must be fixed",
        );
        push_count(&mut message, self.pylint.summary.warnings, "warnings");
        push_count(&mut message, self.pylint.summary.comments, "comments to review");

        if let Some(ref py3k) = self.pylint3k {
            push_status(&mut message, "Pylint py3k check", py3k.failed);
            message.push_str(&format!(
                "   * {} errors and warnings that should be fixed\n",
                py3k.summary.errors
            ));
            message.push_str(&format!("   * {} warnings\n", py3k.summary.warnings));
            message.push_str(&format!("   * {} comments to review\n", py3k.summary.comments));
        }

        let style = self
            .pycodestyle
            .as_ref()
            .map(|r| (r.failed, r.summary))
            .unwrap_or_default();
        push_status(&mut message, "Pycodestyle check", style.0);
        push_count(&mut message, style.1.comments, "comments to review");

        push_status(&mut message, "Python3 compatibility checks", self.future.failed);
        if self.future.failed {
            message.push_str("   * fails python3 compatibility test\n");
        }
        if self.future.summary.contains_key(crate::collectors::futurize::IDIOMS_PATCH) {
            message.push_str("   * there are suggested fixes for newer python3 idioms\n");
        }

        if let Some(ref functional) = self.functional {
            push_status(&mut message, "CRABClient functional tests", functional.failed);
        }

        message
    }

    /// Comment posted on the issue: the status message plus a report link.
    pub fn comment_body(&self, report_url: &str) -> String {
        format!("{}\nDetails at {}\n", self.status_message(), report_url)
    }

    /// Machine readable view of the run.
    pub fn to_json(&self) -> Result<String> {
        let value = serde_json::json!({
            "failed": self.failed(),
            "statuses": self.statuses(),
            "checks": self,
        });
        serde_json::to_string_pretty(&value).map_err(Into::into)
    }
}

fn push_status(message: &mut String, label: &str, failed: bool) {
    message.push_str(&format!(
        " * {}: {}\n",
        label,
        CheckState::from_failed(failed).read_status()
    ));
}

fn push_count(message: &mut String, count: usize, what: &str) {
    if count > 0 {
        message.push_str(&format!("   * {} {}\n", count, what));
    }
}

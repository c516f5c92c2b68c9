//! Data models for the pull request report.
//!
//! Everything here is rebuilt from the CI artifacts on each run; nothing
//! is persisted between invocations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The checks reported on a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Pylint,
    Pylint3k,
    UnitTests,
    Pycodestyle,
    FutureCompat,
    Functional,
}

impl CheckKind {
    /// Context label of the GitHub commit status.
    pub fn context(&self) -> &'static str {
        match self {
            CheckKind::Pylint => "Pylint",
            CheckKind::Pylint3k => "Pylint3k",
            CheckKind::UnitTests => "Unit tests",
            CheckKind::Pycodestyle => "Pycodestyle",
            CheckKind::FutureCompat => "Python3 compatibility",
            CheckKind::Functional => "CRABClient functional tests",
        }
    }

    /// Named anchor of the check's section in the HTML report.
    pub fn anchor(&self) -> &'static str {
        match self {
            CheckKind::Pylint => "pylint",
            CheckKind::Pylint3k => "pylint3k",
            CheckKind::UnitTests => "unittests",
            CheckKind::Pycodestyle => "pycodestyle",
            CheckKind::FutureCompat => "pyfuture",
            CheckKind::Functional => "CRABClientTests",
        }
    }

    /// Token used in the `DMWM-SUCCEED-*` / `DMWM-FAIL-*` log markers.
    ///
    /// The py3k success token keeps its historical lowercase `k`, which
    /// existing log scrapers match on. Pycodestyle has no marker.
    pub fn marker_token(&self, state: CheckState) -> Option<&'static str> {
        match (self, state) {
            (CheckKind::Pylint, _) => Some("PYLINT"),
            (CheckKind::Pylint3k, CheckState::Success) => Some("PYLINT3k"),
            (CheckKind::Pylint3k, CheckState::Failure) => Some("PYLINT3K"),
            (CheckKind::UnitTests, _) => Some("UNIT"),
            (CheckKind::Pycodestyle, _) => None,
            (CheckKind::FutureCompat, _) => Some("PY27"),
            (CheckKind::Functional, _) => Some("CRABClient"),
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.context())
    }
}

/// Pass/fail vocabulary shared by the comment and the commit statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Success,
    Failure,
}

impl CheckState {
    pub fn from_failed(failed: bool) -> Self {
        if failed {
            CheckState::Failure
        } else {
            CheckState::Success
        }
    }

    /// Word used in the human readable message.
    pub fn read_status(&self) -> &'static str {
        match self {
            CheckState::Success => "succeeded",
            CheckState::Failure => "failed",
        }
    }

    /// State accepted by the GitHub statuses API.
    pub fn gh_status(&self) -> &'static str {
        match self {
            CheckState::Success => "success",
            CheckState::Failure => "failure",
        }
    }
}

// ---------------------------------------------------------------------------
// Pylint
// ---------------------------------------------------------------------------

/// Line reference of a lint event; pylint emits numbers, older wrappers strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LineRef {
    Number(u64),
    Text(String),
}

impl fmt::Display for LineRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineRef::Number(n) => write!(f, "{}", n),
            LineRef::Text(s) => f.write_str(s),
        }
    }
}

/// A score that may have been serialized as a number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
    Number(f64),
    Text(String),
}

impl Score {
    pub fn value(&self) -> Option<f64> {
        match self {
            Score::Number(n) => Some(*n),
            Score::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// One `(line, severity, code, message)` event from the pylint report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LintEvent(pub LineRef, pub String, pub String, pub String);

impl LintEvent {
    pub fn line(&self) -> &LineRef {
        &self.0
    }

    pub fn severity(&self) -> &str {
        &self.1
    }

    pub fn code(&self) -> &str {
        &self.2
    }

    pub fn message(&self) -> &str {
        &self.3
    }

    /// Warnings and errors are the only severities that can fail a build.
    pub fn is_warning_or_error(&self) -> bool {
        matches!(self.severity(), "W" | "E")
    }
}

/// Results of one pylint pass over a file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LintRun {
    #[serde(default)]
    pub events: Vec<LintEvent>,
    #[serde(default)]
    pub score: Option<Score>,
}

/// Baseline and current pylint results of one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LintFileReport {
    #[serde(default)]
    pub test: Option<LintRun>,
    #[serde(default)]
    pub base: Option<LintRun>,
}

impl LintFileReport {
    pub fn test_score(&self) -> Option<f64> {
        self.test.as_ref()?.score.as_ref()?.value()
    }

    pub fn base_score(&self) -> Option<f64> {
        self.base.as_ref()?.score.as_ref()?.value()
    }
}

/// The whole `pylintReport.json`, keyed (and therefore sorted) by file name.
pub type LintReport = BTreeMap<String, LintFileReport>;

/// Counters of the pylint pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintSummary {
    pub failures: usize,
    pub warnings: usize,
    pub comments: usize,
}

// ---------------------------------------------------------------------------
// Pylint py3k
// ---------------------------------------------------------------------------

/// Per-file counters of the py3k pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Py3kCounts {
    #[serde(default)]
    pub errors: u64,
    #[serde(default)]
    pub warnings: u64,
    #[serde(default)]
    pub comments: u64,
}

impl Py3kCounts {
    pub fn total(&self) -> u64 {
        self.errors + self.warnings + self.comments
    }
}

/// One file of `pylint3kReport.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Py3kFileReport {
    pub test: Py3kCounts,
}

pub type Py3kReport = BTreeMap<String, Py3kFileReport>;

/// Totals of the py3k pass; any non-zero field is a failure.
pub type Py3kSummary = Py3kCounts;

// ---------------------------------------------------------------------------
// Pycodestyle
// ---------------------------------------------------------------------------

/// A single `file:line:[code] message` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleFinding {
    pub line: String,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleSummary {
    pub comments: usize,
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

/// Result of one xunit test case, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Success,
    Skipped,
    Failure,
    Error,
}

impl TestStatus {
    pub fn is_failing(&self) -> bool {
        matches!(self, TestStatus::Failure | TestStatus::Error)
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Success => write!(f, "success"),
            TestStatus::Skipped => write!(f, "skipped"),
            TestStatus::Failure => write!(f, "failure"),
            TestStatus::Error => write!(f, "error"),
        }
    }
}

/// Baseline and current status of one `classname:methodname`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub base_status: Option<TestStatus>,
    pub test_status: Option<TestStatus>,
}

/// Where a test whose status changed ends up in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeBucket {
    NewFailure,
    OkChange,
    UnstableChange,
    Added,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestChange {
    pub name: String,
    pub old: Option<TestStatus>,
    pub new: Option<TestStatus>,
}

/// Categorized unit-test differences between baseline and current run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTestChanges {
    pub new_failures: Vec<TestChange>,
    pub ok_changes: Vec<TestChange>,
    pub unstable_changes: Vec<TestChange>,
    pub added: Vec<TestChange>,
    pub deleted: Vec<TestChange>,
}

impl UnitTestChanges {
    pub fn bucket_mut(&mut self, bucket: ChangeBucket) -> &mut Vec<TestChange> {
        match bucket {
            ChangeBucket::NewFailure => &mut self.new_failures,
            ChangeBucket::OkChange => &mut self.ok_changes,
            ChangeBucket::UnstableChange => &mut self.unstable_changes,
            ChangeBucket::Added => &mut self.added,
            ChangeBucket::Deleted => &mut self.deleted,
        }
    }

    pub fn summary(&self) -> UnitTestSummary {
        UnitTestSummary {
            new_failures: self.new_failures.len(),
            added: self.added.len(),
            deleted: self.deleted.len(),
            ok_changes: self.ok_changes.len(),
            unstable_changes: self.unstable_changes.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTestSummary {
    pub new_failures: usize,
    pub added: usize,
    pub deleted: usize,
    pub ok_changes: usize,
    pub unstable_changes: usize,
}

// ---------------------------------------------------------------------------
// Future compatibility (futurize)
// ---------------------------------------------------------------------------

/// Captured futurize artifacts, keyed by file name. Absent or empty files
/// have no entry.
pub type FutureSummary = BTreeMap<String, Vec<String>>;

// ---------------------------------------------------------------------------
// Functional tests
// ---------------------------------------------------------------------------

/// One `TEST_*` block of a functional-test log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionalTestBlock {
    /// Key/value pairs in the order they appear in the log.
    pub fields: Vec<(String, String)>,
    pub failed: bool,
}

impl FunctionalTestBlock {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_state_vocabulary() {
        assert_eq!(CheckState::from_failed(false).read_status(), "succeeded");
        assert_eq!(CheckState::from_failed(true).read_status(), "failed");
        assert_eq!(CheckState::Failure.gh_status(), "failure");
        assert_eq!(CheckState::Success.gh_status(), "success");
    }

    #[test]
    fn test_lint_event_from_json_tuple() {
        let event: LintEvent = serde_json::from_str(r#"[12, "W", "0611", "Unused import os"]"#)
            .unwrap();
        assert_eq!(event.line(), &LineRef::Number(12));
        assert_eq!(event.code(), "0611");
        assert!(event.is_warning_or_error());

        let comment: LintEvent =
            serde_json::from_str(r#"["7", "C", "0103", "Invalid name"]"#).unwrap();
        assert_eq!(comment.line().to_string(), "7");
        assert!(!comment.is_warning_or_error());
    }

    #[test]
    fn test_score_accepts_strings() {
        assert_eq!(Score::Number(9.5).value(), Some(9.5));
        assert_eq!(Score::Text("8.25".to_string()).value(), Some(8.25));
        assert_eq!(Score::Text("n/a".to_string()).value(), None);
    }

    #[test]
    fn test_file_report_missing_sections() {
        let report: LintReport =
            serde_json::from_str(r#"{"a.py": {"base": {"score": 9.0}}}"#).unwrap();
        let file = &report["a.py"];
        assert!(file.test.is_none());
        assert_eq!(file.base_score(), Some(9.0));
        assert_eq!(file.test_score(), None);
    }

    #[test]
    fn test_status_failing() {
        assert!(TestStatus::Error.is_failing());
        assert!(TestStatus::Failure.is_failing());
        assert!(!TestStatus::Skipped.is_failing());
        assert!(!TestStatus::Success.is_failing());
    }

    #[test]
    fn test_functional_block_lookup() {
        let block = FunctionalTestBlock {
            fields: vec![
                ("TEST_COMMAND".to_string(), "crab submit".to_string()),
                ("TEST_RESULT".to_string(), "[OK]".to_string()),
            ],
            failed: false,
        };
        assert_eq!(block.get("TEST_RESULT"), Some("[OK]"));
        assert_eq!(block.get("TEST_MISSING"), None);
    }
}

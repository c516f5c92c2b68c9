//! Runs every collector in order and builds the [`Aggregate`].

use crate::analysis::Aggregate;
use crate::collectors::{functional, futurize, pycodestyle, pylint, pylint3k, unittests};
use crate::config::{InputsConfig, LintConfig};
use crate::error::{AbsencePolicy, CollectResult};
use crate::models::CheckKind;
use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// How each check treats a missing or unreadable artifact.
pub fn absence_policy(kind: CheckKind) -> AbsencePolicy {
    match kind {
        CheckKind::Pylint => AbsencePolicy::Required,
        CheckKind::Pylint3k => AbsencePolicy::Optional,
        CheckKind::UnitTests => AbsencePolicy::AbsentIsEmpty,
        CheckKind::Pycodestyle => AbsencePolicy::Lenient,
        CheckKind::FutureCompat => AbsencePolicy::Optional,
        CheckKind::Functional => AbsencePolicy::Optional,
    }
}

fn resolve<T>(kind: CheckKind, result: CollectResult<T>) -> Result<Option<T>> {
    absence_policy(kind)
        .resolve(kind.context(), result)
        .with_context(|| format!("{} report could not be collected", kind))
}

/// Sequential collector pipeline.
pub struct Pipeline {
    inputs: InputsConfig,
    lint: LintConfig,
    show_progress: bool,
}

impl Pipeline {
    /// `inputs` must already be resolved against the working directory.
    pub fn new(inputs: InputsConfig, lint: LintConfig) -> Self {
        Self {
            inputs,
            lint,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(6);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }

    /// Run every collector. Hard failures (missing pylint report, broken
    /// JSON or XML) abort the run.
    pub fn run(&self) -> Result<Aggregate> {
        let inputs = &self.inputs;
        let pb = self.progress_bar();

        pb.set_message("pylint");
        let pylint = resolve(
            CheckKind::Pylint,
            pylint::collect(&inputs.pylint_report, &self.lint),
        )?
        .ok_or_else(|| anyhow!("pylint report is required"))?;
        pb.inc(1);

        pb.set_message("pylint py3k");
        let pylint3k = resolve(CheckKind::Pylint3k, pylint3k::collect(&inputs.pylint3k_report))?;
        pb.inc(1);

        pb.set_message("unit tests");
        let unit_tests = absence_policy(CheckKind::UnitTests)
            .resolve_or(
                CheckKind::UnitTests.context(),
                unittests::collect(
                    &inputs.base_unit_tests,
                    &inputs.test_unit_tests,
                    &inputs.unstable_tests,
                ),
                unittests::empty_report,
            )
            .context("unit test reports could not be collected")?;
        pb.inc(1);

        pb.set_message("futurize");
        let future = futurize::collect(&inputs.futurize_dir)
            .context("futurize reports could not be collected")?;
        pb.inc(1);

        pb.set_message("pycodestyle");
        let style = resolve(
            CheckKind::Pycodestyle,
            pycodestyle::collect(&inputs.pycodestyle_report),
        )?;
        pb.inc(1);

        pb.set_message("functional tests");
        let functional = resolve(
            CheckKind::Functional,
            functional::collect(&inputs.functional_dir),
        )?;
        pb.inc(1);

        pb.finish_and_clear();

        let aggregate = Aggregate {
            pylint,
            pylint3k,
            unit_tests,
            pycodestyle: style,
            future,
            functional,
        };
        info!("Collected all reports (failed: {})", aggregate.failed());

        Ok(aggregate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UnitTestChanges;
    use std::fs;
    use std::path::Path;

    fn pipeline(root: &Path) -> Pipeline {
        Pipeline::new(InputsConfig::default().rooted_at(root), LintConfig::default())
    }

    fn write_passing_pylint(root: &Path) {
        fs::create_dir_all(root.join("LatestPylint")).unwrap();
        fs::write(
            root.join("LatestPylint/pylintReport.json"),
            r#"{"src/python/WMCore/Foo.py": {
                   "test": {"events": [[10, "C", "0301", "Line too long"]], "score": 9.5},
                   "base": {"events": [], "score": 9.0}}}"#,
        )
        .unwrap();
    }

    #[test]
    fn test_missing_pylint_report_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(pipeline(dir.path()).run().is_err());
    }

    #[test]
    fn test_passing_pylint_only_run() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_passing_pylint(root);
        fs::create_dir_all(root.join("MasterUnitTests")).unwrap();
        fs::create_dir_all(root.join("LatestUnitTests")).unwrap();

        let aggregate = pipeline(root).run().unwrap();

        assert!(!aggregate.failed());
        let message = aggregate.status_message();
        assert!(message.contains("Pylint check: succeeded"));
        assert!(message.contains("Unit tests: succeeded"));

        let html = aggregate.html_document();
        assert!(html.contains("name=\"pylint\""));
        assert!(html.contains("name=\"unittests\""));
        assert!(html.contains("No changes in unit test results."));
        assert!(!html.contains("name=\"pylint3k\""));
        assert!(!html.contains("name=\"pycodestyle\""));
        assert!(!html.contains("name=\"pyfuture\""));
        assert!(!html.contains("name=\"CRABClientTests\""));
    }

    #[test]
    fn test_missing_unit_test_trees_render_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        write_passing_pylint(dir.path());

        let aggregate = pipeline(dir.path()).run().unwrap();
        assert!(!aggregate.failed());
        assert_eq!(
            aggregate.unit_tests.as_ref().map(|r| &r.summary),
            Some(&UnitTestChanges::default())
        );
        assert!(aggregate.status_message().contains(" * Unit tests: succeeded\n"));

        let html = aggregate.html_document();
        assert!(html.contains("name=\"pylint\""));
        assert!(html.contains("name=\"unittests\""));
        assert!(html.contains("No changes in unit test results."));
        for anchor in ["pylint3k", "pycodestyle", "pyfuture", "CRABClientTests"] {
            assert!(!html.contains(&format!("name=\"{}\"", anchor)), "unexpected {}", anchor);
        }
    }

    #[test]
    fn test_broken_xunit_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_passing_pylint(dir.path());
        fs::create_dir_all(dir.path().join("MasterUnitTests/py2")).unwrap();
        fs::create_dir_all(dir.path().join("LatestUnitTests/py2")).unwrap();
        fs::write(
            dir.path().join("LatestUnitTests/py2/nosetests-1.xml"),
            "<testsuite><testcase name=\"a\"></testsuite>",
        )
        .unwrap();

        assert!(pipeline(dir.path()).run().is_err());
    }

    #[test]
    fn test_broken_py3k_report_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_passing_pylint(dir.path());
        fs::write(dir.path().join("LatestPylint/pylint3kReport.json"), "{not json").unwrap();

        assert!(pipeline(dir.path()).run().is_err());
    }

    #[test]
    fn test_broken_style_report_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_passing_pylint(dir.path());
        fs::write(dir.path().join("LatestPylint/pep8.txt"), "garbage\n").unwrap();

        let aggregate = pipeline(dir.path()).run().unwrap();
        assert!(aggregate.pycodestyle.is_none());
        assert!(aggregate.status_message().contains("Pycodestyle check: succeeded"));
    }

    #[test]
    fn test_every_artifact_present() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_passing_pylint(root);
        fs::write(
            root.join("LatestPylint/pylint3kReport.json"),
            r#"{"a.py": {"test": {"errors": 0, "warnings": 0, "comments": 0}}}"#,
        )
        .unwrap();
        fs::write(root.join("LatestPylint/pep8.txt"), "a.py:1:[E302] expected 2 blank lines\n")
            .unwrap();
        fs::create_dir_all(root.join("LatestFuturize")).unwrap();
        fs::write(root.join("LatestFuturize/idioms.patch"), "+x\n").unwrap();
        fs::create_dir_all(root.join("CRABSubmitResults/task")).unwrap();
        fs::write(
            root.join("CRABSubmitResults/task/log"),
            "TEST_COMMAND: crab submit\nTEST_RESULT: [FAILED]\n",
        )
        .unwrap();

        let aggregate = pipeline(root).run().unwrap();
        assert!(aggregate.failed());
        assert!(aggregate.pylint3k.is_some());
        assert_eq!(aggregate.pycodestyle.as_ref().unwrap().summary.comments, 1);
        assert!(!aggregate.future.failed);
        assert!(aggregate.functional.as_ref().unwrap().failed);

        let html = aggregate.html_document();
        for anchor in ["pylint", "pylint3k", "pycodestyle", "pyfuture", "CRABClientTests"] {
            assert!(html.contains(&format!("name=\"{}\"", anchor)), "missing {}", anchor);
        }
    }
}

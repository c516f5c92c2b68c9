//! Unit test diff collector.
//!
//! Compares the xunit results of the baseline (master) build with those of
//! the pull request build. Only tests whose status changed, appeared or
//! disappeared are reported.

use super::{read_text, CheckReport};
use crate::error::{AbsencePolicy, CollectError, CollectResult};
use crate::models::{ChangeBucket, TestChange, TestOutcome, TestStatus, UnitTestChanges};
use crate::report::generate_unit_test_report;
use crate::scanner::{ArtifactScanner, ScanConfig};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

/// Collect and compare both xunit trees.
///
/// A missing tree is reported as [`CollectError::Absent`].
pub fn collect(
    base_dir: &Path,
    test_dir: &Path,
    unstable_file: &Path,
) -> CollectResult<CheckReport<UnitTestChanges>> {
    info!("Evaluating base/test unit tests report files");

    let unstable = AbsencePolicy::Optional
        .resolve("unstable tests", read_unstable_tests(unstable_file))?
        .unwrap_or_default();

    let base = collect_tree(base_dir)?;
    let test = collect_tree(test_dir)?;

    let outcomes = merge_outcomes(base, test);
    let (failed, changes) = compare(&outcomes, &unstable);

    info!("Unit test summary {:?}", changes.summary());

    Ok(CheckReport {
        failed,
        html: generate_unit_test_report(&changes),
        summary: changes,
    })
}

/// Report for a run without any unit test results.
pub fn empty_report() -> CheckReport<UnitTestChanges> {
    let changes = UnitTestChanges::default();
    CheckReport {
        failed: false,
        html: generate_unit_test_report(&changes),
        summary: changes,
    }
}

/// Read the list of tests known to be flaky, one identifier per line.
pub fn read_unstable_tests(path: &Path) -> CollectResult<HashSet<String>> {
    let content = read_text(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

/// Read every `*/nosetests-*.xml` below `root`.
pub fn collect_tree(root: &Path) -> CollectResult<BTreeMap<String, TestStatus>> {
    info!("Scanning directory {}", root.display());

    let files = ArtifactScanner::new(root, ScanConfig::xunit()).scan()?;
    let mut results = BTreeMap::new();

    for file in files {
        debug!("Opening file {}", file.display());
        let content = read_text(&file)?;
        let cases = parse_xunit(&content).map_err(|source| CollectError::Xml {
            path: file.clone(),
            source,
        })?;
        results.extend(cases);
    }

    Ok(results)
}

/// Parse the test cases of one xunit document into `(classname:name, status)`.
pub fn parse_xunit(content: &str) -> Result<Vec<(String, TestStatus)>, quick_xml::Error> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut cases = Vec::new();
    let mut current: Option<(String, TestStatus)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"testcase" => current = Some((case_name(&e)?, TestStatus::Success)),
                other => apply_result(&mut current, other),
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"testcase" => cases.push((case_name(&e)?, TestStatus::Success)),
                other => apply_result(&mut current, other),
            },
            Event::End(e) if e.name().as_ref() == b"testcase" => {
                if let Some(case) = current.take() {
                    cases.push(case);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(cases)
}

fn case_name(element: &BytesStart<'_>) -> Result<String, quick_xml::Error> {
    let mut classname = String::new();
    let mut name = String::new();

    for attr in element.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"classname" => classname = attr.unescape_value()?.into_owned(),
            b"name" => name = attr.unescape_value()?.into_owned(),
            _ => {}
        }
    }

    Ok(format!("{}:{}", classname, name))
}

fn apply_result(current: &mut Option<(String, TestStatus)>, element: &[u8]) {
    let status = match element {
        b"error" => TestStatus::Error,
        b"failure" => TestStatus::Failure,
        b"skipped" => TestStatus::Skipped,
        _ => return,
    };
    if let Some((_, ref mut current_status)) = current {
        *current_status = (*current_status).max(status);
    }
}

/// Pair up baseline and current statuses by test identifier.
pub fn merge_outcomes(
    base: BTreeMap<String, TestStatus>,
    test: BTreeMap<String, TestStatus>,
) -> BTreeMap<String, TestOutcome> {
    let mut outcomes: BTreeMap<String, TestOutcome> = BTreeMap::new();

    for (name, status) in base {
        outcomes.entry(name).or_default().base_status = Some(status);
    }
    for (name, status) in test {
        outcomes.entry(name).or_default().test_status = Some(status);
    }

    outcomes
}

/// Classify one test. Returns the bucket and whether it fails the build,
/// or `None` when nothing worth reporting changed.
pub fn classify(outcome: &TestOutcome, unstable: bool) -> Option<(ChangeBucket, bool)> {
    match (outcome.base_status, outcome.test_status) {
        (Some(old), Some(new)) if old == new => None,
        (Some(_), Some(_)) if unstable => Some((ChangeBucket::UnstableChange, false)),
        (Some(_), Some(new)) if new.is_failing() => Some((ChangeBucket::NewFailure, true)),
        (Some(_), Some(_)) => Some((ChangeBucket::OkChange, false)),
        (None, Some(new)) => Some((ChangeBucket::Added, new.is_failing())),
        (Some(_), None) => Some((ChangeBucket::Deleted, false)),
        (None, None) => None,
    }
}

/// Sort every changed test into its bucket.
pub fn compare(
    outcomes: &BTreeMap<String, TestOutcome>,
    unstable: &HashSet<String>,
) -> (bool, UnitTestChanges) {
    let mut failed = false;
    let mut changes = UnitTestChanges::default();

    for (name, outcome) in outcomes {
        let Some((bucket, fails)) = classify(outcome, unstable.contains(name)) else {
            continue;
        };
        failed |= fails;
        changes.bucket_mut(bucket).push(TestChange {
            name: name.clone(),
            old: outcome.base_status,
            new: outcome.test_status,
        });
    }

    (failed, changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn outcome(base: Option<TestStatus>, test: Option<TestStatus>) -> TestOutcome {
        TestOutcome {
            base_status: base,
            test_status: test,
        }
    }

    use TestStatus::{Error, Failure, Skipped, Success};

    #[test]
    fn test_classify_branches() {
        assert_eq!(classify(&outcome(Some(Success), Some(Success)), false), None);
        assert_eq!(classify(&outcome(Some(Error), Some(Error)), true), None);
        assert_eq!(
            classify(&outcome(Some(Success), Some(Error)), true),
            Some((ChangeBucket::UnstableChange, false))
        );
        assert_eq!(
            classify(&outcome(Some(Success), Some(Error)), false),
            Some((ChangeBucket::NewFailure, true))
        );
        assert_eq!(
            classify(&outcome(Some(Skipped), Some(Failure)), false),
            Some((ChangeBucket::NewFailure, true))
        );
        assert_eq!(
            classify(&outcome(Some(Failure), Some(Success)), false),
            Some((ChangeBucket::OkChange, false))
        );
        assert_eq!(
            classify(&outcome(None, Some(Failure)), false),
            Some((ChangeBucket::Added, true))
        );
        assert_eq!(
            classify(&outcome(None, Some(Success)), false),
            Some((ChangeBucket::Added, false))
        );
        assert_eq!(
            classify(&outcome(Some(Error), None), false),
            Some((ChangeBucket::Deleted, false))
        );
    }

    #[test]
    fn test_unstable_list_does_not_affect_added_tests() {
        assert_eq!(
            classify(&outcome(None, Some(Error)), true),
            Some((ChangeBucket::Added, true))
        );
    }

    #[test]
    fn test_parse_xunit() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuite name="nosetests" tests="4" errors="1" failures="1" skip="1">
  <testcase classname="WMCore_t.A_t.ATest" name="testOk" time="0.1"/>
  <testcase classname="WMCore_t.A_t.ATest" name="testBroken" time="0.2">
    <error type="KeyError" message="&apos;x&apos;">Traceback</error>
  </testcase>
  <testcase classname="WMCore_t.B_t.BTest" name="testWrong">
    <failure type="AssertionError">1 != 2</failure>
  </testcase>
  <testcase classname="WMCore_t.B_t.BTest" name="testLater">
    <skipped type="SkipTest" message="later"/>
  </testcase>
</testsuite>"#;

        let cases = parse_xunit(xml).unwrap();
        assert_eq!(
            cases,
            vec![
                ("WMCore_t.A_t.ATest:testOk".to_string(), Success),
                ("WMCore_t.A_t.ATest:testBroken".to_string(), Error),
                ("WMCore_t.B_t.BTest:testWrong".to_string(), Failure),
                ("WMCore_t.B_t.BTest:testLater".to_string(), Skipped),
            ]
        );
    }

    #[test]
    fn test_parse_xunit_rejects_broken_xml() {
        assert!(parse_xunit("<testsuite><testcase name=\"a\"></testsuite>").is_err());
    }

    fn write_suite(root: &Path, job: &str, cases: &[(&str, &str)]) {
        let dir = root.join(job);
        fs::create_dir_all(&dir).unwrap();
        let mut xml = String::from("<testsuite>\n");
        for (name, result) in cases {
            match *result {
                "success" => xml.push_str(&format!("<testcase classname=\"T\" name=\"{}\"/>\n", name)),
                other => xml.push_str(&format!(
                    "<testcase classname=\"T\" name=\"{}\"><{}/></testcase>\n",
                    name, other
                )),
            }
        }
        xml.push_str("</testsuite>\n");
        fs::write(dir.join("nosetests-1.xml"), xml).unwrap();
    }

    #[test]
    fn test_collect_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write_suite(
            &root.join("MasterUnitTests"),
            "py2",
            &[("a", "success"), ("b", "failure"), ("c", "success"), ("flaky", "success")],
        );
        write_suite(
            &root.join("LatestUnitTests"),
            "py2",
            &[("a", "error"), ("b", "success"), ("d", "success"), ("flaky", "failure")],
        );
        fs::write(root.join("UnstableTests.txt"), "T:flaky\n\n").unwrap();

        let report = collect(
            &root.join("MasterUnitTests"),
            &root.join("LatestUnitTests"),
            &root.join("UnstableTests.txt"),
        )
        .unwrap();

        assert!(report.failed);
        let summary = report.summary.summary();
        assert_eq!(summary.new_failures, 1);
        assert_eq!(summary.ok_changes, 1);
        assert_eq!(summary.added, 1);
        assert_eq!(summary.deleted, 1);
        assert_eq!(summary.unstable_changes, 1);
        assert_eq!(report.summary.new_failures[0].name, "T:a");
    }

    #[test]
    fn test_missing_tree_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("MasterUnitTests")).unwrap();

        let err = collect(
            &dir.path().join("MasterUnitTests"),
            &dir.path().join("LatestUnitTests"),
            &dir.path().join("UnstableTests.txt"),
        )
        .unwrap_err();
        assert!(err.is_absent());
    }

    #[test]
    fn test_empty_trees_render_empty_state() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("MasterUnitTests")).unwrap();
        fs::create_dir_all(dir.path().join("LatestUnitTests")).unwrap();

        let report = collect(
            &dir.path().join("MasterUnitTests"),
            &dir.path().join("LatestUnitTests"),
            &dir.path().join("UnstableTests.txt"),
        )
        .unwrap();
        assert!(!report.failed);
        assert_eq!(report.summary, UnitTestChanges::default());
        assert!(report.html.contains("No changes in unit test results."));
    }
}

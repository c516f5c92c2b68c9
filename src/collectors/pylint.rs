//! Pylint report collector.
//!
//! Input is `pylintReport.json`, a mapping of file name to the baseline
//! (`base`) and pull request (`test`) pylint results. A build fails on any
//! warning or error outside the allow-list, or on a file score that is
//! too low.

use super::{read_json, CheckReport};
use crate::config::LintConfig;
use crate::error::CollectResult;
use crate::models::{LintReport, LintSummary};
use crate::report::{generate_pylint_details, generate_pylint_summary};
use std::path::Path;
use tracing::{debug, info};

/// Collect the pylint report at `path`.
pub fn collect(path: &Path, config: &LintConfig) -> CollectResult<CheckReport<LintSummary>> {
    info!("Evaluating pylint report for file: {}", path.display());

    let report: LintReport = read_json(path)?;
    let (failed, summary) = evaluate(&report, config);

    let mut html = generate_pylint_summary(&report, &summary);
    html.push_str(&generate_pylint_details(&report, &config.ok_warnings));

    Ok(CheckReport {
        failed,
        summary,
        html,
    })
}

/// Count events and decide whether the pylint check fails.
pub fn evaluate(report: &LintReport, config: &LintConfig) -> (bool, LintSummary) {
    let mut failed = false;
    let mut summary = LintSummary::default();

    for (filename, file) in report {
        let Some(ref test) = file.test else {
            continue;
        };

        for event in &test.events {
            let allowed = config.ok_warnings.iter().any(|code| code == event.code());
            if event.is_warning_or_error() && !allowed {
                failed = true;
                summary.failures += 1;
            } else if event.is_warning_or_error() {
                summary.warnings += 1;
            } else {
                summary.comments += 1;
            }
        }

        // pylint reports 0 for files it could not rate (e.g. empty modules)
        if let Some(score) = file.test_score().filter(|s| *s != 0.0) {
            let base = file.base_score().unwrap_or(0.0);
            if score_fails(score, base, config) {
                debug!("{} fails on score {:.2} (base {:.2})", filename, score, base);
                failed = true;
            }
        }
    }

    (failed, summary)
}

/// A file fails when it scores below `regression_below` and dropped below
/// its baseline, or when it scores below `fail_below` regardless.
pub fn score_fails(score: f64, base: f64, config: &LintConfig) -> bool {
    (score < config.regression_below && score < base) || score < config.fail_below
}

//! Pylint py3k collector.
//!
//! Same file layout as the main pylint report, but each file only carries
//! `errors`, `warnings` and `comments` counters. Any non-zero total fails.

use super::{read_json, CheckReport};
use crate::error::CollectResult;
use crate::models::{Py3kReport, Py3kSummary};
use crate::report::generate_pylint3k_report;
use std::path::Path;
use tracing::info;

pub fn collect(path: &Path) -> CollectResult<CheckReport<Py3kSummary>> {
    info!("Evaluating pylint report for file: {}", path.display());

    let report: Py3kReport = read_json(path)?;
    let summary = summarize(&report);

    Ok(CheckReport {
        failed: summary.total() > 0,
        summary,
        html: generate_pylint3k_report(&report, &summary),
    })
}

/// Sum the counters over every file.
pub fn summarize(report: &Py3kReport) -> Py3kSummary {
    report
        .values()
        .fold(Py3kSummary::default(), |mut acc, file| {
            acc.errors += file.test.errors;
            acc.warnings += file.test.warnings;
            acc.comments += file.test.comments;
            acc
        })
}
